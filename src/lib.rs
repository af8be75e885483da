pub mod config;
pub mod csv_store;
pub mod errors;
pub mod services;
pub mod store;
