use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use sea_orm::DatabaseConnection;
use std::convert::Infallible;
use std::sync::Arc;

use crate::{
    clock::Clock,
    events::EventSender,
    services::{
        inventory::InventoryService, picking_lists::PickingListService,
        work_order_creation::WorkOrderCreationService, work_orders::WorkOrderService,
    },
};

pub mod health;
pub mod picking_lists;
pub mod work_orders;

/// Header carrying the acting user for mutating requests. Authentication
/// itself is handled upstream of this service; the value is only stamped
/// into audit columns.
pub const USER_HEADER: &str = "x-user-id";

const DEFAULT_USER: &str = "system";

/// Acting user extracted from the request headers, defaulting to the system
/// account for unattended callers.
#[derive(Debug, Clone)]
pub struct ActingUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_USER)
            .to_string();
        Ok(ActingUser(user))
    }
}

/// Service instances shared by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub work_orders: Arc<WorkOrderService>,
    pub planning: Arc<WorkOrderCreationService>,
    pub picking_lists: Arc<PickingListService>,
    pub inventory: Arc<InventoryService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let inventory = Arc::new(InventoryService::new(db.clone()));
        Self {
            work_orders: Arc::new(WorkOrderService::new(
                db.clone(),
                clock.clone(),
                Some(event_sender.clone()),
            )),
            planning: Arc::new(WorkOrderCreationService::new(
                db.clone(),
                inventory.clone(),
                clock.clone(),
                Some(event_sender.clone()),
            )),
            picking_lists: Arc::new(PickingListService::new(
                db,
                clock,
                Some(event_sender),
            )),
            inventory,
        }
    }
}
