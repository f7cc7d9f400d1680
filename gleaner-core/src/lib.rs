pub mod backends;
pub mod models;
pub mod services;
