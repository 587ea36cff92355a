use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Static mapping from a finished-goods item code to the coil item code it
/// is cut from. Consulted by the CTL resolution path only.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item_relationships")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub item_code: String,
    pub coil_relationship: Option<String>,
    pub item_description: Option<String>,
    pub coil_description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
