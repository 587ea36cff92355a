use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle of a single order line, from ingestion through production.
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
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "picking_line_status")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PickingLineStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "assigned_production")]
    AssignedProduction,
    #[sea_orm(string_value = "assigned_pulling")]
    AssignedPulling,
    #[sea_orm(string_value = "work_order")]
    WorkOrder,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "packed")]
    Packed,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "canceled")]
    Canceled,
    #[sea_orm(string_value = "awaiting")]
    Awaiting,
}

/// A single requested item on a picking list. Assignment to a machine (and
/// status `assigned_production`) makes the line eligible for work order
/// generation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "picking_list_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub picking_list_id: i32,
    pub item_id: String,
    pub description: String,
    pub quantity: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub width: Option<Decimal>,
    pub length: Option<Decimal>,
    pub unit: Option<String>,
    pub machine_id: Option<i32>,
    pub assigned_by: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub status: PickingLineStatus,
    pub scheduled_ship_date: Option<DateTime<Utc>>,
    pub scheduled_processing_date: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::picking_list::Entity",
        from = "Column::PickingListId",
        to = "super::picking_list::Column::Id"
    )]
    PickingList,
    #[sea_orm(
        belongs_to = "super::machine::Entity",
        from = "Column::MachineId",
        to = "super::machine::Column::Id"
    )]
    Machine,
}

impl Related<super::picking_list::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PickingList.def()
    }
}

impl Related<super::machine::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Machine.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
