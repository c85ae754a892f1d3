//! Entity module - Contains all SeaORM entity definitions for the database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod api_key;
pub mod game_document;

// Re-export specific types to avoid conflicts
pub use api_key::{Column as ApiKeyColumn, Entity as ApiKey, Model as ApiKeyModel};
pub use game_document::{
    Column as GameDocumentColumn, Entity as GameDocument, Model as GameDocumentModel,
};
