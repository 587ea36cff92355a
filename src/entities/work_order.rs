use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::machine::MachineCategory;

/// Work order state machine:
/// `Pending -> InProgress <-> Paused -> Completed`, with `Canceled` reachable
/// only before actual production starts. `Completed` and `Canceled` are
/// terminal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "work_order_status")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkOrderStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "paused")]
    Paused,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "canceled")]
    Canceled,
    #[sea_orm(string_value = "awaiting")]
    Awaiting,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderPriority {
    #[sea_orm(num_value = 1)]
    Low,
    #[sea_orm(num_value = 2)]
    Normal,
    #[sea_orm(num_value = 3)]
    High,
    #[sea_orm(num_value = 4)]
    Urgent,
}

/// A scheduled production run on one machine, consuming one or more physical
/// coils to fulfill one or more order lines. The parent-item columns are a
/// snapshot of the coil the order was planned against; the usage history
/// records the coils actually mounted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub work_order_number: String,
    pub branch_id: i32,
    pub machine_id: i32,
    pub machine_category: MachineCategory,
    pub tag_number: String,
    pub coil_inventory_id: Option<i32>,
    pub parent_item_id: Option<String>,
    pub parent_item_description: Option<String>,
    pub parent_item_weight: Option<Decimal>,
    pub instructions: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub status: WorkOrderStatus,
    pub priority: WorkOrderPriority,
    /// Id of the open row in `work_order_coil_usages`, if any. Kept as a
    /// plain id rather than a loaded relation so the usage collection can be
    /// reloaded independently.
    pub active_coil_usage_id: Option<i32>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated_by: Option<String>,
    pub last_updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::branch::Entity",
        from = "Column::BranchId",
        to = "super::branch::Column::Id"
    )]
    Branch,
    #[sea_orm(
        belongs_to = "super::machine::Entity",
        from = "Column::MachineId",
        to = "super::machine::Column::Id"
    )]
    Machine,
    #[sea_orm(has_many = "super::work_order_item::Entity")]
    Items,
    #[sea_orm(has_many = "super::work_order_coil_usage::Entity")]
    CoilUsages,
}

impl Related<super::branch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Branch.def()
    }
}

impl Related<super::machine::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Machine.def()
    }
}

impl Related<super::work_order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::work_order_coil_usage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CoilUsages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
