pub mod category;
pub mod client;
pub mod db_connect;
pub mod env_loader;
pub mod error;
pub mod financial;
pub mod flexible;
pub mod models;
pub mod report;
pub mod settings;
pub mod store;
pub mod suggestions;
pub mod wire;
