/// Database configuration and connection management
pub mod database;

/// Curated game data loading from gamedata.toml
pub mod gamedata;
