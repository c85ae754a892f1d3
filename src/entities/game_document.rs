//! Game document entity - static game data stored as JSON documents.
//!
//! Each row holds one document (profession, specialization, trait, skill, pet,
//! legend or item) serialized as JSON, keyed by its collection and its id in that
//! collection.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Game document database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "game_documents")]
pub struct Model {
    /// Row id
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Collection name (e.g. "skills", "professions")
    pub collection: String,
    /// Id of the document within its collection
    pub doc_id: String,
    /// Display name, used for name searches
    pub name: Option<String>,
    /// The JSON document
    #[sea_orm(column_type = "Text")]
    pub body: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
