pub mod debt;
pub mod deposit;
pub mod fx;
pub mod loan;
pub mod tax;
