pub mod api;
pub mod config;
pub mod database;
pub mod global;
pub mod identity;
pub mod radio;
pub mod store;
