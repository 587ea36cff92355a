use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::{
    clock::Clock,
    entities::{
        branch::Entity as BranchEntity,
        inventory_item,
        machine::{self, Entity as MachineEntity, MachineCategory},
        picking_list_item::PickingLineStatus,
        work_order::{self, Entity as WorkOrderEntity, WorkOrderPriority, WorkOrderStatus},
        work_order_item::{self, WorkOrderItemStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        allocation::CoilAllocationLedger,
        coil_resolution::CoilResolver,
        inventory::InventoryService,
        picking_lists::{PickingListService, QueuedLine},
    },
};

/// Gap left between consecutive work orders on one machine.
const SCHEDULE_BUFFER_MINUTES: i64 = 15;

/// Flat per-line duration estimate. Deliberately not derived from machine
/// throughput rates; see DESIGN.md.
const ESTIMATED_MINUTES_PER_LINE: i64 = 30;

/// Hour of day (UTC) a machine's schedule starts from when it has no
/// persisted work orders yet.
const FALLBACK_DAY_START_HOUR: u32 = 8;

const SYSTEM_USER: &str = "system";

/// Aggregate result of one planning pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanningOutcome {
    /// Work orders created.
    pub created: usize,
    /// Eligible lines that could not be folded into any work order.
    pub unscheduled: usize,
}

/// A work order fully assembled in memory, pending the single batched write
/// at the end of the pass.
struct PlannedWorkOrder {
    number: String,
    machine_id: i32,
    machine_category: MachineCategory,
    coil: inventory_item::Model,
    scheduled_start: DateTime<Utc>,
    scheduled_end: DateTime<Utc>,
    due_date: Option<DateTime<Utc>>,
    lines: Vec<QueuedLine>,
}

/// Builds work orders from the eligible picking backlog of a branch.
///
/// One planning pass loads its inputs once, packs lines machine by machine
/// against coil capacity tracked in a [`CoilAllocationLedger`], and persists
/// everything in a single transaction. Passes for the same branch are
/// serialized through an in-process lease; concurrent passes for one branch
/// from multiple processes are not guarded and must be prevented by the
/// deployment (see DESIGN.md).
pub struct WorkOrderCreationService {
    db: Arc<DatabaseConnection>,
    resolver: CoilResolver,
    clock: Arc<dyn Clock>,
    event_sender: Option<EventSender>,
    branch_leases: DashMap<i32, Arc<Mutex<()>>>,
}

impl WorkOrderCreationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        inventory: Arc<InventoryService>,
        clock: Arc<dyn Clock>,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            db,
            resolver: CoilResolver::new(inventory),
            clock,
            event_sender,
            branch_leases: DashMap::new(),
        }
    }

    /// Runs one planning pass over a branch's eligible backlog and reports
    /// how many work orders were created and how many lines were left
    /// unscheduled. Lines that cannot be resolved to a coil, or that no coil
    /// has capacity for, are left untouched for a later pass; that is a
    /// reported outcome, not an error.
    #[instrument(skip(self))]
    pub async fn create_from_eligible_picking_lists(
        &self,
        branch_id: i32,
    ) -> Result<PlanningOutcome, ServiceError> {
        let lease = self
            .branch_leases
            .entry(branch_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lease.lock().await;

        let branch_code = BranchEntity::find_by_id(branch_id)
            .one(&*self.db)
            .await?
            .map(|b| b.code)
            .unwrap_or_else(|| "00".to_string());

        let machines: HashMap<i32, machine::Model> = MachineEntity::find()
            .filter(machine::Column::BranchId.eq(branch_id))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let picking = PickingListService::new(self.db.clone(), self.clock.clone(), None);
        let queued = picking.eligible_production_lines(branch_id).await?;

        // Only coil-fed machines participate; lines routed elsewhere are not
        // part of this pass at all.
        let eligible: Vec<QueuedLine> = queued
            .into_iter()
            .filter(|q| {
                q.item
                    .machine_id
                    .and_then(|id| machines.get(&id))
                    .map(|m| {
                        matches!(m.category, MachineCategory::Ctl | MachineCategory::Slitter)
                    })
                    .unwrap_or(false)
            })
            .collect();

        let total_eligible = eligible.len();
        if total_eligible == 0 {
            info!(branch_id, "no eligible lines to schedule");
            return Ok(PlanningOutcome {
                created: 0,
                unscheduled: 0,
            });
        }

        // BTreeMap keeps machine iteration order stable across runs.
        let mut by_machine: BTreeMap<i32, Vec<QueuedLine>> = BTreeMap::new();
        for line in eligible {
            let machine_id = line.item.machine_id.expect("machine filter guarantees id");
            by_machine.entry(machine_id).or_default().push(line);
        }

        let mut wo_counter = WorkOrderEntity::find()
            .filter(work_order::Column::BranchId.eq(branch_id))
            .count(&*self.db)
            .await?;

        let mut ledger = CoilAllocationLedger::new();
        let mut schedule_book: HashMap<i32, DateTime<Utc>> = HashMap::new();
        let mut planned: Vec<PlannedWorkOrder> = Vec::new();
        let mut scheduled_line_ids: Vec<i32> = Vec::new();

        for (machine_id, mut queue) in by_machine {
            let category = machines[&machine_id].category;

            while !queue.is_empty() {
                let first = &queue[0];
                let coil = self
                    .resolver
                    .find_parent_coil(branch_id, &first.item, category, &ledger)
                    .await?;

                let Some(coil) = coil else {
                    queue.remove(0);
                    continue;
                };

                let available = ledger.available(&coil);
                if available <= Decimal::ZERO {
                    queue.remove(0);
                    continue;
                }

                let last_end = match schedule_book.get(&machine_id) {
                    Some(end) => *end,
                    None => self.seed_last_schedule_end(machine_id).await?,
                };
                let start = last_end + Duration::minutes(SCHEDULE_BUFFER_MINUTES);

                let (picked, total_weight) = select_fitting_lines(&queue, available);

                if picked.is_empty() {
                    // Degenerate case: the triggering line does not fit the
                    // best coil on its own.
                    queue.remove(0);
                    continue;
                }

                let mut lines = Vec::with_capacity(picked.len());
                for idx in picked.iter().rev() {
                    lines.push(queue.remove(*idx));
                }
                lines.reverse();

                let end = start
                    + Duration::minutes(ESTIMATED_MINUTES_PER_LINE * lines.len() as i64);
                schedule_book.insert(machine_id, end);

                ledger.add(coil.id, total_weight);
                scheduled_line_ids.extend(lines.iter().map(|q| q.item.id));

                wo_counter += 1;
                planned.push(PlannedWorkOrder {
                    number: format!("W{branch_code}{wo_counter:07}"),
                    machine_id,
                    machine_category: category,
                    coil,
                    scheduled_start: start,
                    scheduled_end: end,
                    due_date: earliest_ship_date(&lines),
                    lines,
                });
            }
        }

        if planned.is_empty() {
            warn!(
                branch_id,
                total_eligible, "planning pass produced no work orders"
            );
            return Ok(PlanningOutcome {
                created: 0,
                unscheduled: total_eligible,
            });
        }

        let created = planned.len();
        let unscheduled = total_eligible - scheduled_line_ids.len();
        let now = self.clock.now();

        // Single batched write: either every work order of this pass lands,
        // or none do.
        let txn = self.db.begin().await?;

        let mut created_refs: Vec<(i32, String, i32)> = Vec::with_capacity(created);
        let mut touched_lists: HashSet<i32> = HashSet::new();

        for plan in &planned {
            let active = work_order::ActiveModel {
                work_order_number: Set(plan.number.clone()),
                branch_id: Set(branch_id),
                machine_id: Set(plan.machine_id),
                machine_category: Set(plan.machine_category),
                tag_number: Set(plan.coil.tag_number.clone()),
                coil_inventory_id: Set(Some(plan.coil.id)),
                parent_item_id: Set(Some(plan.coil.item_id.clone())),
                parent_item_description: Set(Some(plan.coil.description.clone())),
                parent_item_weight: Set(plan.coil.snapshot),
                instructions: Set(Some("Created from picking list backlog.".to_string())),
                due_date: Set(plan.due_date),
                scheduled_start: Set(Some(plan.scheduled_start)),
                scheduled_end: Set(Some(plan.scheduled_end)),
                status: Set(WorkOrderStatus::Pending),
                priority: Set(WorkOrderPriority::Normal),
                created_by: Set(Some(SYSTEM_USER.to_string())),
                created_at: Set(now),
                last_updated_by: Set(Some(SYSTEM_USER.to_string())),
                last_updated_at: Set(now),
                ..Default::default()
            };
            let inserted = active.insert(&txn).await?;

            let item_models: Vec<work_order_item::ActiveModel> = plan
                .lines
                .iter()
                .map(|q| work_order_item::ActiveModel {
                    work_order_id: Set(inserted.id),
                    picking_list_item_id: Set(Some(q.item.id)),
                    item_code: Set(q.item.item_id.clone()),
                    description: Set(q.item.description.clone()),
                    sales_order_number: Set(q.list.sales_order_number.clone()),
                    customer_name: Set(q.list.sold_to.clone()),
                    order_quantity: Set(q.item.quantity),
                    order_weight: Set(q.item.weight),
                    width: Set(q.item.width),
                    length: Set(q.item.length),
                    unit: Set(q.item.unit.clone()),
                    status: Set(WorkOrderItemStatus::Pending),
                    is_stock_item: Set(false),
                    ..Default::default()
                })
                .collect();
            work_order_item::Entity::insert_many(item_models)
                .exec(&txn)
                .await?;

            touched_lists.extend(plan.lines.iter().map(|q| q.list.id));
            created_refs.push((inserted.id, plan.number.clone(), plan.machine_id));
        }

        PickingListService::set_line_statuses(
            &txn,
            &scheduled_line_ids,
            PickingLineStatus::WorkOrder,
        )
        .await?;

        for list_id in touched_lists {
            PickingListService::refresh_list_status(&txn, list_id).await?;
        }

        txn.commit().await?;

        counter!("planning.work_orders_created", created as u64);
        counter!("planning.lines_unscheduled", unscheduled as u64);

        if let Some(sender) = &self.event_sender {
            for (work_order_id, work_order_number, machine_id) in &created_refs {
                sender
                    .send_or_log(Event::WorkOrderCreated {
                        work_order_id: *work_order_id,
                        work_order_number: work_order_number.clone(),
                        machine_id: *machine_id,
                    })
                    .await;
            }
            sender
                .send_or_log(Event::WorkOrdersPlanned {
                    branch_id,
                    created,
                    unscheduled,
                })
                .await;
        }

        info!(
            branch_id,
            created, unscheduled, "planning pass committed"
        );

        Ok(PlanningOutcome {
            created,
            unscheduled,
        })
    }

    /// First schedule anchor for a machine in this pass: the latest persisted
    /// scheduled end, or today's fallback day start when the machine has no
    /// scheduled work orders yet.
    async fn seed_last_schedule_end(
        &self,
        machine_id: i32,
    ) -> Result<DateTime<Utc>, ServiceError> {
        let persisted = WorkOrderEntity::find()
            .filter(work_order::Column::MachineId.eq(machine_id))
            .filter(work_order::Column::ScheduledEnd.is_not_null())
            .order_by_desc(work_order::Column::ScheduledEnd)
            .one(&*self.db)
            .await?
            .and_then(|wo| wo.scheduled_end);

        Ok(persisted.unwrap_or_else(|| {
            self.clock
                .now()
                .date_naive()
                .and_hms_opt(FALLBACK_DAY_START_HOUR, 0, 0)
                .expect("valid fallback time of day")
                .and_utc()
        }))
    }
}

/// Greedy fill: walk the queue in order, taking every line whose weight still
/// fits under the coil's available weight. Skipped lines stay queued for a
/// later coil. Lines without a positive weight are never taken.
fn select_fitting_lines(queue: &[QueuedLine], available: Decimal) -> (Vec<usize>, Decimal) {
    let mut picked = Vec::new();
    let mut total = Decimal::ZERO;

    for (idx, line) in queue.iter().enumerate() {
        let weight = line.item.weight.unwrap_or(Decimal::ZERO);
        if weight <= Decimal::ZERO {
            continue;
        }
        if total + weight <= available {
            picked.push(idx);
            total += weight;
        }
    }

    (picked, total)
}

/// Due date of a planned work order: the earliest ship date among its lines.
fn earliest_ship_date(lines: &[QueuedLine]) -> Option<DateTime<Utc>> {
    let line_dates = lines.iter().filter_map(|q| q.item.scheduled_ship_date);
    match line_dates.min() {
        Some(min) => Some(min),
        None => lines.iter().filter_map(|q| q.list.ship_date).min(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{picking_list, picking_list_item};
    use rust_decimal_macros::dec;

    fn queued(id: i32, weight: Option<Decimal>) -> QueuedLine {
        QueuedLine {
            item: picking_list_item::Model {
                id,
                picking_list_id: 1,
                item_id: format!("ITEM-{id}"),
                description: "line".into(),
                quantity: Some(dec!(1)),
                weight,
                width: None,
                length: None,
                unit: Some("LBS".into()),
                machine_id: Some(1),
                assigned_by: None,
                assigned_at: None,
                status: PickingLineStatus::AssignedProduction,
                scheduled_ship_date: None,
                scheduled_processing_date: None,
            },
            list: picking_list::Model {
                id: 1,
                branch_id: 1,
                list_number: "PL-1".into(),
                sales_order_number: None,
                sold_to: None,
                ship_date: None,
                priority: 0,
                status: crate::entities::picking_list::PickingListStatus::Pending,
            },
        }
    }

    #[test]
    fn fills_greedily_up_to_available_weight() {
        let queue = vec![
            queued(1, Some(dec!(400))),
            queued(2, Some(dec!(400))),
            queued(3, Some(dec!(400))),
        ];
        let (picked, total) = select_fitting_lines(&queue, dec!(1000));
        assert_eq!(picked, vec![0, 1]);
        assert_eq!(total, dec!(800));
    }

    #[test]
    fn exact_fit_is_taken() {
        let queue = vec![queued(1, Some(dec!(600))), queued(2, Some(dec!(400)))];
        let (picked, total) = select_fitting_lines(&queue, dec!(1000));
        assert_eq!(picked, vec![0, 1]);
        assert_eq!(total, dec!(1000));
    }

    #[test]
    fn later_smaller_line_can_fill_remaining_capacity() {
        let queue = vec![
            queued(1, Some(dec!(700))),
            queued(2, Some(dec!(500))),
            queued(3, Some(dec!(300))),
        ];
        let (picked, total) = select_fitting_lines(&queue, dec!(1000));
        assert_eq!(picked, vec![0, 2]);
        assert_eq!(total, dec!(1000));
    }

    #[test]
    fn non_positive_weights_are_never_taken() {
        let queue = vec![
            queued(1, Some(dec!(0))),
            queued(2, None),
            queued(3, Some(dec!(-5))),
            queued(4, Some(dec!(250))),
        ];
        let (picked, total) = select_fitting_lines(&queue, dec!(1000));
        assert_eq!(picked, vec![3]);
        assert_eq!(total, dec!(250));
    }

    #[test]
    fn oversized_first_line_yields_empty_pick() {
        let queue = vec![queued(1, Some(dec!(1200)))];
        let (picked, total) = select_fitting_lines(&queue, dec!(1000));
        assert!(picked.is_empty());
        assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn earliest_ship_date_prefers_line_dates() {
        use chrono::TimeZone;
        let mut a = queued(1, Some(dec!(100)));
        let mut b = queued(2, Some(dec!(100)));
        let early = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 9, 5, 0, 0, 0).unwrap();
        a.item.scheduled_ship_date = Some(late);
        b.item.scheduled_ship_date = Some(early);
        assert_eq!(earliest_ship_date(&[a, b]), Some(early));
    }
}
