//! API key entity - a Discord user's registered Guild Wars 2 API key.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// API key database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "api_keys")]
pub struct Model {
    /// Discord user id owning the key
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// The API key itself
    pub key: String,
    /// Account name the key belongs to (e.g. "Name.1234")
    pub account_name: String,
    /// Comma separated permissions granted to the key
    pub permissions: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Permissions granted to this key.
    pub fn permission_list(&self) -> impl Iterator<Item = &str> {
        self.permissions
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Whether the key grants the given permission.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permission_list().any(|p| p == permission)
    }
}
