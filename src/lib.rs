pub mod metrics;
pub mod models;
pub mod simulator;
pub mod utils;
