use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "work_order_item_status")]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderItemStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
}

/// A produced line within a work order. `picking_list_item_id` is null for
/// ad hoc stock lines that do not originate from a customer order.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work_order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub work_order_id: i32,
    pub picking_list_item_id: Option<i32>,
    pub item_code: String,
    pub description: String,
    pub sales_order_number: Option<String>,
    pub customer_name: Option<String>,
    pub order_quantity: Option<Decimal>,
    pub order_weight: Option<Decimal>,
    pub width: Option<Decimal>,
    pub length: Option<Decimal>,
    pub unit: Option<String>,
    pub produced_quantity: Option<Decimal>,
    pub produced_weight: Option<Decimal>,
    pub status: WorkOrderItemStatus,
    pub is_stock_item: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::work_order::Entity",
        from = "Column::WorkOrderId",
        to = "super::work_order::Column::Id"
    )]
    WorkOrder,
    #[sea_orm(
        belongs_to = "super::picking_list_item::Entity",
        from = "Column::PickingListItemId",
        to = "super::picking_list_item::Column::Id"
    )]
    PickingListItem,
}

impl Related<super::work_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
