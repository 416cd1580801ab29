/// Database configuration and connection management
pub mod database;

/// Line-item defaults loaded from taxbill.toml
pub mod settings;
