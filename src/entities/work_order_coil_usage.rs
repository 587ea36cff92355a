use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Why a coil was mounted on the machine.
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
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "coil_swap_reason")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CoilSwapReason {
    #[sea_orm(string_value = "initial")]
    Initial,
    #[sea_orm(string_value = "end_of_coil")]
    EndOfCoil,
    #[sea_orm(string_value = "defect")]
    Defect,
    #[sea_orm(string_value = "other")]
    Other,
}

/// One continuous interval during which a physical coil was mounted for a
/// work order's run. Sequences are 1-based and strictly increasing within a
/// work order; at most one usage is open (`ended_at` null) at a time.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work_order_coil_usages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub work_order_id: i32,
    pub sequence: i32,
    pub coil_inventory_id: i32,
    pub coil_tag_number: String,
    pub coil_item_id: String,
    pub coil_description: Option<String>,
    pub start_weight_lbs: Option<Decimal>,
    pub from_location: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub reason: CoilSwapReason,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::work_order::Entity",
        from = "Column::WorkOrderId",
        to = "super::work_order::Column::Id"
    )]
    WorkOrder,
}

impl Related<super::work_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
