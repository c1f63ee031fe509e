pub mod engine;
pub mod model;
pub mod star_log;
