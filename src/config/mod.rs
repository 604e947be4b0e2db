/// Season and anti-fraud filter configuration loading

pub mod filters;
pub mod season;

pub use filters::FilterConfig;
pub use season::SeasonFile;
