use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::entities::work_order_coil_usage::CoilSwapReason;

/// Domain events emitted by the services and consumed in-process. The UI
/// push channel of the original deployment hangs off this stream; here the
/// default consumer just logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// A planning pass finished for a branch.
    WorkOrdersPlanned {
        branch_id: i32,
        created: usize,
        unscheduled: usize,
    },
    WorkOrderCreated {
        work_order_id: i32,
        work_order_number: String,
        machine_id: i32,
    },
    WorkOrderStarted {
        work_order_id: i32,
    },
    WorkOrderPaused {
        work_order_id: i32,
    },
    WorkOrderResumed {
        work_order_id: i32,
    },
    WorkOrderCompleted {
        work_order_id: i32,
    },
    WorkOrderCanceled {
        work_order_id: i32,
    },
    CoilSwapped {
        work_order_id: i32,
        sequence: i32,
        coil_inventory_id: i32,
        reason: CoilSwapReason,
    },
    MachineAssigned {
        picking_list_item_id: i32,
        machine_id: i32,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, failing if the channel is closed or full.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {e}"))
    }

    /// Sends an event and logs (rather than propagates) delivery failures.
    /// Event delivery is never allowed to fail a business operation.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!("event delivery failed: {e}");
        }
    }
}

/// Long-running consumer task for the domain event stream.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::WorkOrdersPlanned {
                branch_id,
                created,
                unscheduled,
            } => {
                info!(
                    branch_id,
                    created, unscheduled, "planning pass completed for branch"
                );
            }
            Event::WorkOrderCreated {
                work_order_id,
                work_order_number,
                machine_id,
            } => {
                info!(
                    work_order_id,
                    %work_order_number,
                    machine_id,
                    "work order created"
                );
            }
            Event::WorkOrderStarted { work_order_id } => {
                info!(work_order_id, "work order started");
            }
            Event::WorkOrderPaused { work_order_id } => {
                info!(work_order_id, "work order paused");
            }
            Event::WorkOrderResumed { work_order_id } => {
                info!(work_order_id, "work order resumed");
            }
            Event::WorkOrderCompleted { work_order_id } => {
                info!(work_order_id, "work order completed");
            }
            Event::WorkOrderCanceled { work_order_id } => {
                info!(work_order_id, "work order canceled");
            }
            Event::CoilSwapped {
                work_order_id,
                sequence,
                coil_inventory_id,
                reason,
            } => {
                info!(
                    work_order_id,
                    sequence,
                    coil_inventory_id,
                    %reason,
                    "coil swapped"
                );
            }
            Event::MachineAssigned {
                picking_list_item_id,
                machine_id,
            } => {
                info!(picking_list_item_id, machine_id, "line assigned to machine");
            }
        }
    }

    info!("event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        // Must not panic or error out.
        sender
            .send_or_log(Event::WorkOrderStarted { work_order_id: 1 })
            .await;
    }

    #[tokio::test]
    async fn events_round_trip_through_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        sender
            .send(Event::WorkOrdersPlanned {
                branch_id: 1,
                created: 2,
                unscheduled: 3,
            })
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            Event::WorkOrdersPlanned {
                branch_id,
                created,
                unscheduled,
            } => {
                assert_eq!(branch_id, 1);
                assert_eq!(created, 2);
                assert_eq!(unscheduled, 3);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
