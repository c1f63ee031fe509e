pub mod chart;
pub mod plot;
pub mod viewer;
pub mod xlsx;
