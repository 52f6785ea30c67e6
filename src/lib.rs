pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod inventory;
pub mod keys;
pub mod mirror;
pub mod store;
pub mod utils;
pub mod validation;
