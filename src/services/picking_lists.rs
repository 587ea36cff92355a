use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    clock::Clock,
    entities::{
        machine::Entity as MachineEntity,
        picking_list::{self, Entity as PickingListEntity, PickingListStatus},
        picking_list_item::{self, Entity as PickingListItemEntity, PickingLineStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// An order line paired with its parent list, the unit the planner works in.
#[derive(Debug, Clone)]
pub struct QueuedLine {
    pub item: picking_list_item::Model,
    pub list: picking_list::Model,
}

/// Behavior around picking lists and their lines: machine assignment, the
/// planner's eligible backlog, and status fan-out when work orders move.
pub struct PickingListService {
    db: Arc<DatabaseConnection>,
    clock: Arc<dyn Clock>,
    event_sender: Option<EventSender>,
}

impl PickingListService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        clock: Arc<dyn Clock>,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            db,
            clock,
            event_sender,
        }
    }

    /// Lines eligible for work order generation on a branch: status
    /// `assigned_production` with a machine assigned, ordered by the parent
    /// list's ship date, then priority, then line id for a stable ordering.
    #[instrument(skip(self))]
    pub async fn eligible_production_lines(
        &self,
        branch_id: i32,
    ) -> Result<Vec<QueuedLine>, ServiceError> {
        let lists = PickingListEntity::find()
            .filter(picking_list::Column::BranchId.eq(branch_id))
            .all(&*self.db)
            .await?;

        if lists.is_empty() {
            return Ok(Vec::new());
        }

        let lists_by_id: HashMap<i32, picking_list::Model> =
            lists.into_iter().map(|l| (l.id, l)).collect();
        let list_ids: Vec<i32> = lists_by_id.keys().copied().collect();

        let items = PickingListItemEntity::find()
            .filter(picking_list_item::Column::PickingListId.is_in(list_ids))
            .filter(picking_list_item::Column::Status.eq(PickingLineStatus::AssignedProduction))
            .filter(picking_list_item::Column::MachineId.is_not_null())
            .order_by_asc(picking_list_item::Column::Id)
            .all(&*self.db)
            .await?;

        let mut queued: Vec<QueuedLine> = items
            .into_iter()
            .filter_map(|item| {
                lists_by_id
                    .get(&item.picking_list_id)
                    .cloned()
                    .map(|list| QueuedLine { item, list })
            })
            .collect();

        queued.sort_by(|a, b| {
            let a_ship = a.list.ship_date.unwrap_or(DateTime::<Utc>::MAX_UTC);
            let b_ship = b.list.ship_date.unwrap_or(DateTime::<Utc>::MAX_UTC);
            a_ship
                .cmp(&b_ship)
                .then(a.list.priority.cmp(&b.list.priority))
                .then(a.item.id.cmp(&b.item.id))
        });

        Ok(queued)
    }

    /// Assigns a line to a machine and moves it to `assigned_production`,
    /// making it visible to the planner.
    #[instrument(skip(self))]
    pub async fn assign_machine(
        &self,
        line_id: i32,
        machine_id: i32,
        user: &str,
    ) -> Result<picking_list_item::Model, ServiceError> {
        let line = PickingListItemEntity::find_by_id(line_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Picking line {line_id} not found")))?;

        match line.status {
            PickingLineStatus::Pending | PickingLineStatus::AssignedProduction => {}
            other => {
                return Err(ServiceError::InvalidOperation(format!(
                    "Cannot assign a machine to a picking line with status '{other}'."
                )))
            }
        }

        MachineEntity::find_by_id(machine_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Machine {machine_id} not found")))?;

        let now = self.clock.now();
        let mut active: picking_list_item::ActiveModel = line.into();
        active.machine_id = Set(Some(machine_id));
        active.assigned_by = Set(Some(user.to_string()));
        active.assigned_at = Set(Some(now));
        active.status = Set(PickingLineStatus::AssignedProduction);

        let updated = active.update(&*self.db).await?;

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::MachineAssigned {
                    picking_list_item_id: updated.id,
                    machine_id,
                })
                .await;
        }

        info!(line_id, machine_id, "picking line assigned to machine");

        Ok(updated)
    }

    /// Moves a set of lines to a new status in one statement. Used by the
    /// work order services when orders are created, started, completed or
    /// canceled.
    pub async fn set_line_statuses<C: ConnectionTrait>(
        conn: &C,
        line_ids: &[i32],
        status: PickingLineStatus,
    ) -> Result<(), ServiceError> {
        if line_ids.is_empty() {
            return Ok(());
        }

        PickingListItemEntity::update_many()
            .set(picking_list_item::ActiveModel {
                status: Set(status),
                ..Default::default()
            })
            .filter(picking_list_item::Column::Id.is_in(line_ids.to_vec()))
            .exec(conn)
            .await?;

        Ok(())
    }

    /// Recomputes a picking list's aggregate status from its line statuses.
    pub async fn refresh_list_status<C: ConnectionTrait>(
        conn: &C,
        picking_list_id: i32,
    ) -> Result<(), ServiceError> {
        let list = PickingListEntity::find_by_id(picking_list_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Picking list {picking_list_id} not found"))
            })?;

        let items = PickingListItemEntity::find()
            .filter(picking_list_item::Column::PickingListId.eq(picking_list_id))
            .all(conn)
            .await?;

        let aggregate = derive_list_status(&items);

        if aggregate != list.status {
            let mut active: picking_list::ActiveModel = list.into();
            active.status = Set(aggregate);
            active.update(conn).await?;
        }

        Ok(())
    }
}

/// Aggregate status rules: every line finished means the list is complete,
/// any line actively producing pulls the list in progress, lines folded
/// into work orders leave it awaiting production, anything else is pending.
pub(crate) fn derive_list_status(items: &[picking_list_item::Model]) -> PickingListStatus {
    if items.is_empty() {
        return PickingListStatus::Pending;
    }

    let all_done = items.iter().all(|i| {
        matches!(
            i.status,
            PickingLineStatus::Completed | PickingLineStatus::Canceled
        )
    });
    if all_done {
        return PickingListStatus::Completed;
    }

    if items
        .iter()
        .any(|i| matches!(i.status, PickingLineStatus::InProgress))
    {
        return PickingListStatus::InProgress;
    }

    if items
        .iter()
        .any(|i| matches!(i.status, PickingLineStatus::WorkOrder))
    {
        return PickingListStatus::Awaiting;
    }

    PickingListStatus::Pending
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: i32, status: PickingLineStatus) -> picking_list_item::Model {
        picking_list_item::Model {
            id,
            picking_list_id: 1,
            item_id: format!("ITEM-{id}"),
            description: "test line".into(),
            quantity: None,
            weight: None,
            width: None,
            length: None,
            unit: None,
            machine_id: None,
            assigned_by: None,
            assigned_at: None,
            status,
            scheduled_ship_date: None,
            scheduled_processing_date: None,
        }
    }

    #[test]
    fn empty_list_is_pending() {
        assert_eq!(derive_list_status(&[]), PickingListStatus::Pending);
    }

    #[test]
    fn all_completed_lines_complete_the_list() {
        let items = vec![
            line(1, PickingLineStatus::Completed),
            line(2, PickingLineStatus::Canceled),
        ];
        assert_eq!(derive_list_status(&items), PickingListStatus::Completed);
    }

    #[test]
    fn any_in_progress_line_wins() {
        let items = vec![
            line(1, PickingLineStatus::WorkOrder),
            line(2, PickingLineStatus::InProgress),
        ];
        assert_eq!(derive_list_status(&items), PickingListStatus::InProgress);
    }

    #[test]
    fn work_order_lines_leave_the_list_awaiting() {
        let items = vec![
            line(1, PickingLineStatus::WorkOrder),
            line(2, PickingLineStatus::Pending),
        ];
        assert_eq!(derive_list_status(&items), PickingListStatus::Awaiting);
    }
}
