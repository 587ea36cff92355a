use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A physical coil (or other stock unit) on hand. `snapshot` is the last
/// known on-hand weight in `snapshot_unit`. Rows are read-only during
/// allocation; consumption is tracked in the per-run allocation ledger, not
/// written back here.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub item_id: String,
    pub tag_number: String,
    pub description: String,
    pub snapshot: Option<Decimal>,
    pub snapshot_unit: Option<String>,
    pub location: Option<String>,
    pub branch_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::branch::Entity",
        from = "Column::BranchId",
        to = "super::branch::Column::Id"
    )]
    Branch,
}

impl Related<super::branch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Branch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
