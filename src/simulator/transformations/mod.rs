pub mod balances;
pub mod native;
pub mod transfers;
