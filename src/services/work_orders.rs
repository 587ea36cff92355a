use chrono::{DateTime, Utc};
use dashmap::DashMap;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::{
    clock::Clock,
    entities::{
        inventory_item::{self, Entity as InventoryItemEntity},
        picking_list_item::{self, Entity as PickingListItemEntity, PickingLineStatus},
        work_order::{self, Entity as WorkOrderEntity, WorkOrderStatus},
        work_order_coil_usage::{self, CoilSwapReason, Entity as CoilUsageEntity},
        work_order_item::{self, Entity as WorkOrderItemEntity, WorkOrderItemStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::picking_lists::PickingListService,
};

/// Operator actions that move a work order through its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum LifecycleAction {
    #[strum(serialize = "start")]
    Start,
    #[strum(serialize = "pause")]
    Pause,
    #[strum(serialize = "resume")]
    Resume,
    #[strum(serialize = "complete")]
    Complete,
    #[strum(serialize = "cancel")]
    Cancel,
    #[strum(serialize = "swap coils on")]
    SwapCoil,
}

/// Checks transition legality. Every illegal combination fails with a
/// domain error naming the current status and the attempted action.
pub(crate) fn ensure_transition(
    status: WorkOrderStatus,
    action: LifecycleAction,
) -> Result<(), ServiceError> {
    use LifecycleAction::*;
    use WorkOrderStatus::*;

    let allowed = matches!(
        (action, status),
        (Start, Pending | Paused)
            | (Pause, InProgress)
            | (Resume, Paused)
            | (Complete, InProgress | Paused)
            | (SwapCoil, InProgress | Paused)
            | (Cancel, Pending | Awaiting)
    );

    if allowed {
        Ok(())
    } else {
        Err(ServiceError::InvalidOperation(format!(
            "Cannot {action} a work order with status '{status}'."
        )))
    }
}

/// Next 1-based usage sequence given the usages recorded so far.
pub(crate) fn next_usage_sequence(existing: &[work_order_coil_usage::Model]) -> i32 {
    existing.iter().map(|u| u.sequence).max().unwrap_or(0) + 1
}

/// Per-item production figures reported on completion.
#[derive(Debug, Clone)]
pub struct ProducedFigures {
    pub work_order_item_id: i32,
    pub produced_quantity: Option<Decimal>,
    pub produced_weight: Option<Decimal>,
}

/// A work order with its owned collections loaded.
#[derive(Debug, Clone)]
pub struct WorkOrderDetail {
    pub work_order: work_order::Model,
    pub items: Vec<work_order_item::Model>,
    pub coil_usages: Vec<work_order_coil_usage::Model>,
}

/// Filters for the work order listing.
#[derive(Debug, Clone, Default)]
pub struct WorkOrderFilter {
    pub branch_id: Option<i32>,
    pub status: Option<WorkOrderStatus>,
    pub machine_id: Option<i32>,
}

/// Operator-facing lifecycle of persisted work orders: start, pause, resume,
/// complete, cancel and coil swaps, plus read queries.
///
/// Transitions on one work order are serialized through a per-id lock so
/// concurrent operator actions cannot race the status and the active-usage
/// pointer. Transitions on different work orders run in parallel.
pub struct WorkOrderService {
    db: Arc<DatabaseConnection>,
    clock: Arc<dyn Clock>,
    event_sender: Option<EventSender>,
    transition_locks: DashMap<i32, Arc<Mutex<()>>>,
}

impl WorkOrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        clock: Arc<dyn Clock>,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            db,
            clock,
            event_sender,
            transition_locks: DashMap::new(),
        }
    }

    fn transition_lock(&self, work_order_id: i32) -> Arc<Mutex<()>> {
        self.transition_locks
            .entry(work_order_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Starts (or resumes after a pause, via the start button) a work order.
    /// On the first-ever start the actual start time is stamped and coil
    /// usage #1 is opened against the coil the order was planned for; later
    /// starts only flip the status back to in-progress.
    #[instrument(skip(self))]
    pub async fn start_work_order(
        &self,
        work_order_id: i32,
        user: &str,
    ) -> Result<work_order::Model, ServiceError> {
        let lock = self.transition_lock(work_order_id);
        let _guard = lock.lock().await;

        let txn = self.db.begin().await?;
        let wo = load_work_order(&txn, work_order_id).await?;
        ensure_transition(wo.status, LifecycleAction::Start)?;

        let now = self.clock.now();
        let was_already_started = wo.actual_start.is_some();
        let mut opened_usage_id: Option<i32> = None;

        if !was_already_started {
            if let Some(coil_inventory_id) = wo.coil_inventory_id {
                let coil = InventoryItemEntity::find_by_id(coil_inventory_id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(
                            "Initial coil inventory item not found".to_string(),
                        )
                    })?;

                let usage = new_usage(work_order_id, 1, &coil, CoilSwapReason::Initial, None, now);
                let inserted = usage.insert(&txn).await?;
                opened_usage_id = Some(inserted.id);
            }
        }

        let mut active: work_order::ActiveModel = wo.into();
        active.status = Set(WorkOrderStatus::InProgress);
        if !was_already_started {
            active.actual_start = Set(Some(now));
        }
        if opened_usage_id.is_some() {
            active.active_coil_usage_id = Set(opened_usage_id);
        }
        active.last_updated_by = Set(Some(user.to_string()));
        active.last_updated_at = Set(now);
        let updated = active.update(&txn).await?;

        cascade_line_status(&txn, work_order_id, PickingLineStatus::InProgress).await?;

        txn.commit().await?;

        counter!("work_orders.started", 1);
        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::WorkOrderStarted { work_order_id })
                .await;
        }
        info!(work_order_id, "work order started");

        Ok(updated)
    }

    /// Pauses an in-progress work order. Coil usage is untouched; the mounted
    /// coil stays mounted.
    #[instrument(skip(self))]
    pub async fn pause_work_order(
        &self,
        work_order_id: i32,
        user: &str,
    ) -> Result<work_order::Model, ServiceError> {
        let updated = self
            .toggle_status(work_order_id, LifecycleAction::Pause, user)
            .await?;

        counter!("work_orders.paused", 1);
        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::WorkOrderPaused { work_order_id })
                .await;
        }
        Ok(updated)
    }

    /// Resumes a paused work order.
    #[instrument(skip(self))]
    pub async fn resume_work_order(
        &self,
        work_order_id: i32,
        user: &str,
    ) -> Result<work_order::Model, ServiceError> {
        let updated = self
            .toggle_status(work_order_id, LifecycleAction::Resume, user)
            .await?;

        counter!("work_orders.resumed", 1);
        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::WorkOrderResumed { work_order_id })
                .await;
        }
        Ok(updated)
    }

    async fn toggle_status(
        &self,
        work_order_id: i32,
        action: LifecycleAction,
        user: &str,
    ) -> Result<work_order::Model, ServiceError> {
        let lock = self.transition_lock(work_order_id);
        let _guard = lock.lock().await;

        let wo = load_work_order(&*self.db, work_order_id).await?;
        ensure_transition(wo.status, action)?;

        let target = match action {
            LifecycleAction::Pause => WorkOrderStatus::Paused,
            _ => WorkOrderStatus::InProgress,
        };

        let now = self.clock.now();
        let mut active: work_order::ActiveModel = wo.into();
        active.status = Set(target);
        active.last_updated_by = Set(Some(user.to_string()));
        active.last_updated_at = Set(now);
        let updated = active.update(&*self.db).await?;

        info!(work_order_id, %action, "work order status toggled");
        Ok(updated)
    }

    /// Completes a work order: stamps the actual end, closes the open coil
    /// usage, records any reported production figures, and fans the status
    /// out to the source picking lines.
    #[instrument(skip(self, produced))]
    pub async fn complete_work_order(
        &self,
        work_order_id: i32,
        produced: Vec<ProducedFigures>,
        user: &str,
    ) -> Result<work_order::Model, ServiceError> {
        let lock = self.transition_lock(work_order_id);
        let _guard = lock.lock().await;

        let txn = self.db.begin().await?;
        let wo = load_work_order(&txn, work_order_id).await?;
        ensure_transition(wo.status, LifecycleAction::Complete)?;

        let now = self.clock.now();

        if let Some(active_usage_id) = wo.active_coil_usage_id {
            close_usage(&txn, active_usage_id, now).await?;
        }

        for figures in &produced {
            let item = WorkOrderItemEntity::find_by_id(figures.work_order_item_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Work order item {} not found",
                        figures.work_order_item_id
                    ))
                })?;
            if item.work_order_id != work_order_id {
                return Err(ServiceError::InvalidInput(format!(
                    "Work order item {} does not belong to work order {}",
                    figures.work_order_item_id, work_order_id
                )));
            }
            let mut item_active: work_order_item::ActiveModel = item.into();
            item_active.produced_quantity = Set(figures.produced_quantity);
            item_active.produced_weight = Set(figures.produced_weight);
            item_active.update(&txn).await?;
        }

        WorkOrderItemEntity::update_many()
            .set(work_order_item::ActiveModel {
                status: Set(WorkOrderItemStatus::Completed),
                ..Default::default()
            })
            .filter(work_order_item::Column::WorkOrderId.eq(work_order_id))
            .exec(&txn)
            .await?;

        let mut active: work_order::ActiveModel = wo.into();
        active.status = Set(WorkOrderStatus::Completed);
        active.actual_end = Set(Some(now));
        active.active_coil_usage_id = Set(None);
        active.last_updated_by = Set(Some(user.to_string()));
        active.last_updated_at = Set(now);
        let updated = active.update(&txn).await?;

        cascade_line_status(&txn, work_order_id, PickingLineStatus::Completed).await?;

        txn.commit().await?;

        counter!("work_orders.completed", 1);
        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::WorkOrderCompleted { work_order_id })
                .await;
        }
        info!(work_order_id, "work order completed");

        Ok(updated)
    }

    /// Cancels a work order that has not started production. Its source
    /// picking lines return to the pending pool.
    #[instrument(skip(self))]
    pub async fn cancel_work_order(
        &self,
        work_order_id: i32,
        user: &str,
    ) -> Result<work_order::Model, ServiceError> {
        let lock = self.transition_lock(work_order_id);
        let _guard = lock.lock().await;

        let txn = self.db.begin().await?;
        let wo = load_work_order(&txn, work_order_id).await?;
        ensure_transition(wo.status, LifecycleAction::Cancel)?;

        let now = self.clock.now();
        let mut active: work_order::ActiveModel = wo.into();
        active.status = Set(WorkOrderStatus::Canceled);
        active.last_updated_by = Set(Some(user.to_string()));
        active.last_updated_at = Set(now);
        let updated = active.update(&txn).await?;

        cascade_line_status(&txn, work_order_id, PickingLineStatus::Pending).await?;

        txn.commit().await?;

        counter!("work_orders.canceled", 1);
        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::WorkOrderCanceled { work_order_id })
                .await;
        }
        info!(work_order_id, "work order canceled");

        Ok(updated)
    }

    /// Swaps the mounted coil: closes the open usage and opens the next one
    /// in sequence against the new coil. The work order's planned-coil
    /// snapshot columns are left as planned; only the usage history records
    /// the swap.
    #[instrument(skip(self, notes))]
    pub async fn swap_coil(
        &self,
        work_order_id: i32,
        new_coil_inventory_id: i32,
        reason: CoilSwapReason,
        notes: Option<String>,
        user: &str,
    ) -> Result<work_order_coil_usage::Model, ServiceError> {
        let lock = self.transition_lock(work_order_id);
        let _guard = lock.lock().await;

        let txn = self.db.begin().await?;
        let wo = load_work_order(&txn, work_order_id).await?;
        ensure_transition(wo.status, LifecycleAction::SwapCoil)?;

        let new_coil = InventoryItemEntity::find_by_id(new_coil_inventory_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound("New coil inventory item not found".to_string())
            })?;

        let now = self.clock.now();

        if let Some(active_usage_id) = wo.active_coil_usage_id {
            close_usage(&txn, active_usage_id, now).await?;
        }

        let existing = CoilUsageEntity::find()
            .filter(work_order_coil_usage::Column::WorkOrderId.eq(work_order_id))
            .all(&txn)
            .await?;
        let sequence = next_usage_sequence(&existing);

        let usage = new_usage(work_order_id, sequence, &new_coil, reason, notes, now);
        let inserted = usage.insert(&txn).await?;

        let mut active: work_order::ActiveModel = wo.into();
        active.active_coil_usage_id = Set(Some(inserted.id));
        active.last_updated_by = Set(Some(user.to_string()));
        active.last_updated_at = Set(now);
        active.update(&txn).await?;

        txn.commit().await?;

        counter!("work_orders.coil_swaps", 1);
        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::CoilSwapped {
                    work_order_id,
                    sequence,
                    coil_inventory_id: new_coil_inventory_id,
                    reason,
                })
                .await;
        }
        info!(work_order_id, sequence, "coil swapped");

        Ok(inserted)
    }

    /// Fetches one work order with its items and usage history.
    #[instrument(skip(self))]
    pub async fn get_work_order_detail(
        &self,
        work_order_id: i32,
    ) -> Result<WorkOrderDetail, ServiceError> {
        let work_order = load_work_order(&*self.db, work_order_id).await?;

        let items = WorkOrderItemEntity::find()
            .filter(work_order_item::Column::WorkOrderId.eq(work_order_id))
            .order_by_asc(work_order_item::Column::Id)
            .all(&*self.db)
            .await?;

        let coil_usages = CoilUsageEntity::find()
            .filter(work_order_coil_usage::Column::WorkOrderId.eq(work_order_id))
            .order_by_asc(work_order_coil_usage::Column::Sequence)
            .all(&*self.db)
            .await?;

        Ok(WorkOrderDetail {
            work_order,
            items,
            coil_usages,
        })
    }

    /// Pages through work orders matching the filter, newest first.
    #[instrument(skip(self))]
    pub async fn list_work_orders(
        &self,
        filter: WorkOrderFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<work_order::Model>, u64), ServiceError> {
        let mut condition = sea_orm::Condition::all();
        if let Some(branch_id) = filter.branch_id {
            condition = condition.add(work_order::Column::BranchId.eq(branch_id));
        }
        if let Some(status) = filter.status {
            condition = condition.add(work_order::Column::Status.eq(status));
        }
        if let Some(machine_id) = filter.machine_id {
            condition = condition.add(work_order::Column::MachineId.eq(machine_id));
        }

        let total = WorkOrderEntity::find()
            .filter(condition.clone())
            .count(&*self.db)
            .await?;

        let page = page.max(1);
        let work_orders = WorkOrderEntity::find()
            .filter(condition)
            .order_by_desc(work_order::Column::CreatedAt)
            .order_by_desc(work_order::Column::Id)
            .paginate(&*self.db, limit.max(1))
            .fetch_page(page - 1)
            .await?;

        Ok((work_orders, total))
    }
}

async fn load_work_order<C: ConnectionTrait>(
    conn: &C,
    work_order_id: i32,
) -> Result<work_order::Model, ServiceError> {
    WorkOrderEntity::find_by_id(work_order_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Work order {work_order_id} not found")))
}

fn new_usage(
    work_order_id: i32,
    sequence: i32,
    coil: &inventory_item::Model,
    reason: CoilSwapReason,
    notes: Option<String>,
    started_at: DateTime<Utc>,
) -> work_order_coil_usage::ActiveModel {
    work_order_coil_usage::ActiveModel {
        work_order_id: Set(work_order_id),
        sequence: Set(sequence),
        coil_inventory_id: Set(coil.id),
        coil_tag_number: Set(coil.tag_number.clone()),
        coil_item_id: Set(coil.item_id.clone()),
        coil_description: Set(Some(coil.description.clone())),
        start_weight_lbs: Set(coil.snapshot),
        from_location: Set(coil.location.clone()),
        started_at: Set(started_at),
        ended_at: Set(None),
        reason: Set(reason),
        notes: Set(notes),
        ..Default::default()
    }
}

async fn close_usage<C: ConnectionTrait>(
    conn: &C,
    usage_id: i32,
    ended_at: DateTime<Utc>,
) -> Result<(), ServiceError> {
    if let Some(usage) = CoilUsageEntity::find_by_id(usage_id).one(conn).await? {
        if usage.ended_at.is_none() {
            let mut active: work_order_coil_usage::ActiveModel = usage.into();
            active.ended_at = Set(Some(ended_at));
            active.update(conn).await?;
        }
    }
    Ok(())
}

/// Fans a status change out to the picking lines a work order was built
/// from, then refreshes the aggregate status of each touched list. Ad hoc
/// stock lines (no source picking line) are skipped.
async fn cascade_line_status<C: ConnectionTrait>(
    conn: &C,
    work_order_id: i32,
    status: PickingLineStatus,
) -> Result<(), ServiceError> {
    let items = WorkOrderItemEntity::find()
        .filter(work_order_item::Column::WorkOrderId.eq(work_order_id))
        .all(conn)
        .await?;

    let line_ids: Vec<i32> = items
        .iter()
        .filter_map(|i| i.picking_list_item_id)
        .collect();
    if line_ids.is_empty() {
        return Ok(());
    }

    PickingListService::set_line_statuses(conn, &line_ids, status).await?;

    let lines = PickingListItemEntity::find()
        .filter(picking_list_item::Column::Id.is_in(line_ids))
        .all(conn)
        .await?;
    let list_ids: HashSet<i32> = lines.iter().map(|l| l.picking_list_id).collect();
    for list_id in list_ids {
        PickingListService::refresh_list_status(conn, list_id).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case(WorkOrderStatus::Pending)]
    #[case(WorkOrderStatus::Paused)]
    fn start_is_allowed_from(#[case] status: WorkOrderStatus) {
        assert!(ensure_transition(status, LifecycleAction::Start).is_ok());
    }

    #[rstest]
    #[case(WorkOrderStatus::Draft)]
    #[case(WorkOrderStatus::InProgress)]
    #[case(WorkOrderStatus::Completed)]
    #[case(WorkOrderStatus::Canceled)]
    #[case(WorkOrderStatus::Awaiting)]
    fn start_is_rejected_from(#[case] status: WorkOrderStatus) {
        let err = ensure_transition(status, LifecycleAction::Start).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidOperation(_)));
    }

    #[rstest]
    #[case(LifecycleAction::Pause, WorkOrderStatus::InProgress, true)]
    #[case(LifecycleAction::Pause, WorkOrderStatus::Paused, false)]
    #[case(LifecycleAction::Pause, WorkOrderStatus::Pending, false)]
    #[case(LifecycleAction::Resume, WorkOrderStatus::Paused, true)]
    #[case(LifecycleAction::Resume, WorkOrderStatus::InProgress, false)]
    #[case(LifecycleAction::Complete, WorkOrderStatus::InProgress, true)]
    #[case(LifecycleAction::Complete, WorkOrderStatus::Paused, true)]
    #[case(LifecycleAction::Complete, WorkOrderStatus::Pending, false)]
    #[case(LifecycleAction::Complete, WorkOrderStatus::Completed, false)]
    #[case(LifecycleAction::SwapCoil, WorkOrderStatus::InProgress, true)]
    #[case(LifecycleAction::SwapCoil, WorkOrderStatus::Paused, true)]
    #[case(LifecycleAction::SwapCoil, WorkOrderStatus::Completed, false)]
    #[case(LifecycleAction::Cancel, WorkOrderStatus::Pending, true)]
    #[case(LifecycleAction::Cancel, WorkOrderStatus::Awaiting, true)]
    #[case(LifecycleAction::Cancel, WorkOrderStatus::InProgress, false)]
    fn transition_matrix(
        #[case] action: LifecycleAction,
        #[case] status: WorkOrderStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(ensure_transition(status, action).is_ok(), allowed);
    }

    #[test]
    fn completed_is_terminal() {
        for action in [
            LifecycleAction::Start,
            LifecycleAction::Pause,
            LifecycleAction::Resume,
            LifecycleAction::Complete,
            LifecycleAction::Cancel,
            LifecycleAction::SwapCoil,
        ] {
            assert!(ensure_transition(WorkOrderStatus::Completed, action).is_err());
        }
    }

    #[test]
    fn transition_error_names_status_and_action() {
        let err = ensure_transition(WorkOrderStatus::Completed, LifecycleAction::SwapCoil)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("swap coils on"), "message: {message}");
        assert!(message.contains("completed"), "message: {message}");
    }

    #[test]
    fn usage_sequence_starts_at_one_and_increments() {
        assert_eq!(next_usage_sequence(&[]), 1);

        let started = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
        let usage = |sequence: i32| work_order_coil_usage::Model {
            id: sequence,
            work_order_id: 1,
            sequence,
            coil_inventory_id: 10,
            coil_tag_number: "T1".into(),
            coil_item_id: "COIL-1".into(),
            coil_description: None,
            start_weight_lbs: None,
            from_location: None,
            started_at: started,
            ended_at: None,
            reason: CoilSwapReason::Initial,
            notes: None,
        };

        assert_eq!(next_usage_sequence(&[usage(1)]), 2);
        assert_eq!(next_usage_sequence(&[usage(1), usage(2), usage(3)]), 4);
    }
}
