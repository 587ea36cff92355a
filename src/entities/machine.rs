use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Processing line family. Work order generation only targets coil-fed
/// categories (CTL and slitter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "machine_category")]
#[serde(rename_all = "snake_case")]
pub enum MachineCategory {
    #[sea_orm(string_value = "ctl")]
    Ctl,
    #[sea_orm(string_value = "slitter")]
    Slitter,
    #[sea_orm(string_value = "sheet")]
    Sheet,
}

/// Unit for a machine's nominal throughput rate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "throughput_unit")]
#[serde(rename_all = "snake_case")]
pub enum ThroughputUnit {
    #[sea_orm(string_value = "lbs_per_hour")]
    LbsPerHour,
    #[sea_orm(string_value = "sheets_per_hour")]
    SheetsPerHour,
}

/// A production machine on a branch site. Immutable reference data during a
/// planning run.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "machines")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub code: String,
    pub name: String,
    pub branch_id: i32,
    pub category: MachineCategory,
    pub throughput_rate: Option<Decimal>,
    pub throughput_unit: Option<ThroughputUnit>,
    pub default_setup_minutes: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::branch::Entity",
        from = "Column::BranchId",
        to = "super::branch::Column::Id"
    )]
    Branch,
    #[sea_orm(has_many = "super::work_order::Entity")]
    WorkOrders,
    #[sea_orm(has_many = "super::picking_list_item::Entity")]
    PickingListItems,
}

impl Related<super::branch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Branch.def()
    }
}

impl Related<super::work_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
