pub mod fx;
pub mod provider;
