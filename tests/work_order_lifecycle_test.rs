mod common;

use chrono::Duration;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, ModelTrait, QueryFilter};
use std::sync::Arc;

use common::*;
use metalworks_api::clock::{Clock, FixedClock};
use metalworks_api::entities::{
    machine::MachineCategory,
    picking_list::{self, PickingListStatus},
    picking_list_item::{self, PickingLineStatus},
    work_order::{self, WorkOrderStatus},
    work_order_coil_usage::{self, CoilSwapReason},
    work_order_item,
};
use metalworks_api::errors::ServiceError;
use metalworks_api::services::work_orders::{ProducedFigures, WorkOrderService};

fn lifecycle(db: &Arc<sea_orm::DatabaseConnection>, clock: FixedClock) -> WorkOrderService {
    let clock: Arc<dyn Clock> = Arc::new(clock);
    WorkOrderService::new(db.clone(), clock, None)
}

struct Fixture {
    db: Arc<sea_orm::DatabaseConnection>,
    coil: metalworks_api::entities::inventory_item::Model,
    spare_coil: metalworks_api::entities::inventory_item::Model,
    line: picking_list_item::Model,
    work_order_id: i32,
}

async fn fixture() -> Fixture {
    let db = Arc::new(setup_db().await);
    let branch = seed_branch(&db, "01").await;
    let machine = seed_machine(&db, branch.id, "CTL-1", MachineCategory::Ctl).await;
    let coil = seed_coil(&db, branch.id, "COIL-1", "T100", dec!(1000)).await;
    let spare_coil = seed_coil(&db, branch.id, "COIL-2", "T200", dec!(900)).await;

    let list = seed_list(&db, branch.id, "PL-1", test_instant(), 1).await;
    let line = seed_assigned_line(&db, list.id, "SHEET-A", dec!(400), machine.id).await;

    let wo = seed_work_order(&db, branch.id, &machine, &coil, &[line.clone()]).await;

    Fixture {
        db,
        coil,
        spare_coil,
        line,
        work_order_id: wo.id,
    }
}

async fn usages_of(
    db: &sea_orm::DatabaseConnection,
    work_order_id: i32,
) -> Vec<work_order_coil_usage::Model> {
    work_order_coil_usage::Entity::find()
        .filter(work_order_coil_usage::Column::WorkOrderId.eq(work_order_id))
        .all(db)
        .await
        .unwrap()
}

#[tokio::test]
async fn start_opens_initial_coil_usage() {
    let f = fixture().await;
    let svc = lifecycle(&f.db, test_clock());

    let updated = svc.start_work_order(f.work_order_id, "operator-1").await.unwrap();

    assert_eq!(updated.status, WorkOrderStatus::InProgress);
    assert_eq!(updated.actual_start, Some(test_instant()));
    assert_eq!(updated.last_updated_by.as_deref(), Some("operator-1"));

    let usages = usages_of(&f.db, f.work_order_id).await;
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].sequence, 1);
    assert_eq!(usages[0].reason, CoilSwapReason::Initial);
    assert_eq!(usages[0].coil_inventory_id, f.coil.id);
    assert_eq!(usages[0].start_weight_lbs, f.coil.snapshot);
    assert!(usages[0].ended_at.is_none());
    assert_eq!(updated.active_coil_usage_id, Some(usages[0].id));

    // Source lines follow the work order into production.
    let line_after = picking_list_item::Entity::find_by_id(f.line.id)
        .one(&*f.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(line_after.status, PickingLineStatus::InProgress);
}

#[tokio::test]
async fn restart_after_pause_keeps_first_start_and_single_initial_usage() {
    let f = fixture().await;
    let first_clock = test_clock();
    let later_clock = FixedClock(test_instant() + Duration::hours(2));

    let svc_first = lifecycle(&f.db, first_clock);
    svc_first
        .start_work_order(f.work_order_id, "operator-1")
        .await
        .unwrap();
    svc_first
        .pause_work_order(f.work_order_id, "operator-1")
        .await
        .unwrap();

    let svc_later = lifecycle(&f.db, later_clock);
    let restarted = svc_later
        .start_work_order(f.work_order_id, "operator-2")
        .await
        .unwrap();

    // The original start timestamp survives the restart.
    assert_eq!(restarted.status, WorkOrderStatus::InProgress);
    assert_eq!(restarted.actual_start, Some(test_instant()));

    // And no second "initial" usage was opened.
    let usages = usages_of(&f.db, f.work_order_id).await;
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].reason, CoilSwapReason::Initial);
}

#[tokio::test]
async fn pause_requires_in_progress() {
    let f = fixture().await;
    let svc = lifecycle(&f.db, test_clock());

    let err = svc
        .pause_work_order(f.work_order_id, "operator-1")
        .await
        .unwrap_err();
    match err {
        ServiceError::InvalidOperation(message) => {
            assert!(message.contains("pause"), "message: {message}");
            assert!(message.contains("pending"), "message: {message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let wo = work_order::Entity::find_by_id(f.work_order_id)
        .one(&*f.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(wo.status, WorkOrderStatus::Pending);
}

#[tokio::test]
async fn resume_requires_paused() {
    let f = fixture().await;
    let svc = lifecycle(&f.db, test_clock());

    svc.start_work_order(f.work_order_id, "operator-1")
        .await
        .unwrap();
    let err = svc
        .resume_work_order(f.work_order_id, "operator-1")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn complete_closes_active_usage_and_cascades() {
    let f = fixture().await;
    let svc = lifecycle(&f.db, test_clock());

    svc.start_work_order(f.work_order_id, "operator-1")
        .await
        .unwrap();
    let completed = svc
        .complete_work_order(f.work_order_id, Vec::new(), "operator-1")
        .await
        .unwrap();

    assert_eq!(completed.status, WorkOrderStatus::Completed);
    assert_eq!(completed.actual_end, Some(test_instant()));
    assert_eq!(completed.active_coil_usage_id, None);

    let usages = usages_of(&f.db, f.work_order_id).await;
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].ended_at, Some(test_instant()));

    let items = work_order_item::Entity::find()
        .filter(work_order_item::Column::WorkOrderId.eq(f.work_order_id))
        .all(&*f.db)
        .await
        .unwrap();
    assert!(items
        .iter()
        .all(|i| i.status == work_order_item::WorkOrderItemStatus::Completed));

    let line_after = picking_list_item::Entity::find_by_id(f.line.id)
        .one(&*f.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(line_after.status, PickingLineStatus::Completed);

    let list_after = picking_list::Entity::find_by_id(f.line.picking_list_id)
        .one(&*f.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(list_after.status, PickingListStatus::Completed);
}

#[tokio::test]
async fn complete_records_produced_figures() {
    let f = fixture().await;
    let svc = lifecycle(&f.db, test_clock());

    svc.start_work_order(f.work_order_id, "operator-1")
        .await
        .unwrap();

    let item = work_order_item::Entity::find()
        .filter(work_order_item::Column::WorkOrderId.eq(f.work_order_id))
        .one(&*f.db)
        .await
        .unwrap()
        .unwrap();

    svc.complete_work_order(
        f.work_order_id,
        vec![ProducedFigures {
            work_order_item_id: item.id,
            produced_quantity: Some(dec!(1)),
            produced_weight: Some(dec!(395)),
        }],
        "operator-1",
    )
    .await
    .unwrap();

    let item_after = work_order_item::Entity::find_by_id(item.id)
        .one(&*f.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item_after.produced_quantity, Some(dec!(1)));
    assert_eq!(item_after.produced_weight, Some(dec!(395)));
}

#[tokio::test]
async fn swap_coil_appends_to_usage_history() {
    let f = fixture().await;
    let svc = lifecycle(&f.db, test_clock());

    svc.start_work_order(f.work_order_id, "operator-1")
        .await
        .unwrap();
    let new_usage = svc
        .swap_coil(
            f.work_order_id,
            f.spare_coil.id,
            CoilSwapReason::EndOfCoil,
            Some("tail ran out".to_string()),
            "operator-1",
        )
        .await
        .unwrap();

    assert_eq!(new_usage.sequence, 2);
    assert_eq!(new_usage.coil_inventory_id, f.spare_coil.id);
    assert_eq!(new_usage.reason, CoilSwapReason::EndOfCoil);
    assert!(new_usage.ended_at.is_none());

    let mut usages = usages_of(&f.db, f.work_order_id).await;
    usages.sort_by_key(|u| u.sequence);
    assert_eq!(usages.len(), 2);
    assert_eq!(usages[0].sequence, 1);
    assert!(usages[0].ended_at.is_some());

    let wo = work_order::Entity::find_by_id(f.work_order_id)
        .one(&*f.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(wo.active_coil_usage_id, Some(new_usage.id));
    // The planned-coil snapshot on the order itself is not rewritten.
    assert_eq!(wo.parent_item_id.as_deref(), Some("COIL-1"));
    assert_eq!(wo.coil_inventory_id, Some(f.coil.id));
}

#[tokio::test]
async fn swap_coil_on_completed_work_order_fails_without_mutation() {
    let f = fixture().await;
    let svc = lifecycle(&f.db, test_clock());

    svc.start_work_order(f.work_order_id, "operator-1")
        .await
        .unwrap();
    svc.complete_work_order(f.work_order_id, Vec::new(), "operator-1")
        .await
        .unwrap();

    let err = svc
        .swap_coil(
            f.work_order_id,
            f.spare_coil.id,
            CoilSwapReason::Defect,
            None,
            "operator-1",
        )
        .await
        .unwrap_err();

    match err {
        ServiceError::InvalidOperation(message) => {
            assert!(message.contains("swap coils on"), "message: {message}");
            assert!(message.contains("completed"), "message: {message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let usages = usages_of(&f.db, f.work_order_id).await;
    assert_eq!(usages.len(), 1, "no usage row may be added");
}

#[tokio::test]
async fn cancel_returns_lines_to_pending() {
    let f = fixture().await;
    let svc = lifecycle(&f.db, test_clock());

    let canceled = svc
        .cancel_work_order(f.work_order_id, "supervisor-1")
        .await
        .unwrap();
    assert_eq!(canceled.status, WorkOrderStatus::Canceled);

    let line_after = picking_list_item::Entity::find_by_id(f.line.id)
        .one(&*f.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(line_after.status, PickingLineStatus::Pending);
}

#[tokio::test]
async fn cancel_is_refused_once_production_started() {
    let f = fixture().await;
    let svc = lifecycle(&f.db, test_clock());

    svc.start_work_order(f.work_order_id, "operator-1")
        .await
        .unwrap();
    let err = svc
        .cancel_work_order(f.work_order_id, "supervisor-1")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn start_fails_when_declared_coil_is_missing() {
    let f = fixture().await;

    // The coil the order was planned against disappears from inventory.
    let coil = metalworks_api::entities::inventory_item::Entity::find_by_id(f.coil.id)
        .one(&*f.db)
        .await
        .unwrap()
        .unwrap();
    coil.delete(&*f.db).await.unwrap();

    let svc = lifecycle(&f.db, test_clock());
    let err = svc
        .start_work_order(f.work_order_id, "operator-1")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    // The failed start must not leave the order half-transitioned.
    let wo = work_order::Entity::find_by_id(f.work_order_id)
        .one(&*f.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(wo.status, WorkOrderStatus::Pending);
    assert!(wo.actual_start.is_none());
    assert!(usages_of(&f.db, f.work_order_id).await.is_empty());
}
