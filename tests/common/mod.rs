#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use metalworks_api::clock::FixedClock;
use metalworks_api::entities::{
    branch, inventory_item, item_relationship,
    machine::{self, MachineCategory, ThroughputUnit},
    picking_list::{self, PickingListStatus},
    picking_list_item::{self, PickingLineStatus},
    work_order::{self, WorkOrderPriority, WorkOrderStatus},
    work_order_item::{self, WorkOrderItemStatus},
};
use metalworks_api::migrator::Migrator;

/// Fresh in-memory SQLite database with the full schema applied. A single
/// connection keeps the in-memory database alive and visible to every query.
pub async fn setup_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt)
        .await
        .expect("failed to open in-memory sqlite");
    Migrator::up(&db, None).await.expect("failed to migrate");
    db
}

/// The instant every test clock is pinned to.
pub fn test_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 14, 12, 0, 0).unwrap()
}

pub fn test_clock() -> FixedClock {
    FixedClock(test_instant())
}

pub async fn seed_branch(db: &DatabaseConnection, code: &str) -> branch::Model {
    branch::ActiveModel {
        code: Set(code.to_string()),
        name: Set(format!("Branch {code}")),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed branch")
}

pub async fn seed_machine(
    db: &DatabaseConnection,
    branch_id: i32,
    code: &str,
    category: MachineCategory,
) -> machine::Model {
    machine::ActiveModel {
        code: Set(code.to_string()),
        name: Set(format!("Machine {code}")),
        branch_id: Set(branch_id),
        category: Set(category),
        throughput_rate: Set(Some(Decimal::new(10_000, 0))),
        throughput_unit: Set(Some(ThroughputUnit::LbsPerHour)),
        default_setup_minutes: Set(15),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed machine")
}

pub async fn seed_coil(
    db: &DatabaseConnection,
    branch_id: i32,
    item_id: &str,
    tag_number: &str,
    snapshot: Decimal,
) -> inventory_item::Model {
    inventory_item::ActiveModel {
        item_id: Set(item_id.to_string()),
        tag_number: Set(tag_number.to_string()),
        description: Set(format!("Coil {item_id}")),
        snapshot: Set(Some(snapshot)),
        snapshot_unit: Set(Some("LBS".to_string())),
        location: Set(Some("A-01".to_string())),
        branch_id: Set(branch_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed coil")
}

pub async fn seed_relationship(
    db: &DatabaseConnection,
    item_code: &str,
    coil_code: &str,
) -> item_relationship::Model {
    item_relationship::ActiveModel {
        item_code: Set(item_code.to_string()),
        coil_relationship: Set(Some(coil_code.to_string())),
        item_description: Set(None),
        coil_description: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed relationship")
}

pub async fn seed_list(
    db: &DatabaseConnection,
    branch_id: i32,
    list_number: &str,
    ship_date: DateTime<Utc>,
    priority: i32,
) -> picking_list::Model {
    picking_list::ActiveModel {
        branch_id: Set(branch_id),
        list_number: Set(list_number.to_string()),
        sales_order_number: Set(Some(format!("SO-{list_number}"))),
        sold_to: Set(Some("Acme Fabrication".to_string())),
        ship_date: Set(Some(ship_date)),
        priority: Set(priority),
        status: Set(PickingListStatus::Pending),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed picking list")
}

pub async fn seed_assigned_line(
    db: &DatabaseConnection,
    picking_list_id: i32,
    item_code: &str,
    weight: Decimal,
    machine_id: i32,
) -> picking_list_item::Model {
    picking_list_item::ActiveModel {
        picking_list_id: Set(picking_list_id),
        item_id: Set(item_code.to_string()),
        description: Set(format!("Cut item {item_code}")),
        quantity: Set(Some(Decimal::ONE)),
        weight: Set(Some(weight)),
        width: Set(None),
        length: Set(None),
        unit: Set(Some("LBS".to_string())),
        machine_id: Set(Some(machine_id)),
        assigned_by: Set(Some("planner".to_string())),
        assigned_at: Set(Some(test_instant())),
        status: Set(PickingLineStatus::AssignedProduction),
        scheduled_ship_date: Set(None),
        scheduled_processing_date: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed picking line")
}

/// Inserts a pending work order planned against a coil, with one item per
/// given picking line.
pub async fn seed_work_order(
    db: &DatabaseConnection,
    branch_id: i32,
    machine: &machine::Model,
    coil: &inventory_item::Model,
    lines: &[picking_list_item::Model],
) -> work_order::Model {
    let now = test_instant();
    let wo = work_order::ActiveModel {
        work_order_number: Set("W010000001".to_string()),
        branch_id: Set(branch_id),
        machine_id: Set(machine.id),
        machine_category: Set(machine.category),
        tag_number: Set(coil.tag_number.clone()),
        coil_inventory_id: Set(Some(coil.id)),
        parent_item_id: Set(Some(coil.item_id.clone())),
        parent_item_description: Set(Some(coil.description.clone())),
        parent_item_weight: Set(coil.snapshot),
        instructions: Set(None),
        due_date: Set(None),
        scheduled_start: Set(Some(now)),
        scheduled_end: Set(Some(now + chrono::Duration::hours(1))),
        status: Set(WorkOrderStatus::Pending),
        priority: Set(WorkOrderPriority::Normal),
        created_by: Set(Some("system".to_string())),
        created_at: Set(now),
        last_updated_by: Set(Some("system".to_string())),
        last_updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed work order");

    for line in lines {
        work_order_item::ActiveModel {
            work_order_id: Set(wo.id),
            picking_list_item_id: Set(Some(line.id)),
            item_code: Set(line.item_id.clone()),
            description: Set(line.description.clone()),
            sales_order_number: Set(None),
            customer_name: Set(None),
            order_quantity: Set(line.quantity),
            order_weight: Set(line.weight),
            width: Set(None),
            length: Set(None),
            unit: Set(line.unit.clone()),
            status: Set(WorkOrderItemStatus::Pending),
            is_stock_item: Set(false),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("seed work order item");
    }

    wo
}
