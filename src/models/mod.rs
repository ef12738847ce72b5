pub mod balances;
pub mod common;
pub mod errors;
pub mod simulation;
