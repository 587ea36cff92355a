use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    entities::{
        machine::MachineCategory,
        work_order::{self, WorkOrderPriority, WorkOrderStatus},
        work_order_coil_usage::{self, CoilSwapReason},
        work_order_item::{self, WorkOrderItemStatus},
    },
    errors::ServiceError,
    handlers::ActingUser,
    services::work_orders::{ProducedFigures, WorkOrderFilter},
    ApiResponse, AppState, PaginatedResponse,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GenerateWorkOrdersRequest {
    /// Branch whose eligible backlog should be planned
    #[validate(range(min = 1))]
    pub branch_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlanningOutcomeResponse {
    /// Work orders created by the pass
    pub created: usize,
    /// Eligible lines left unscheduled by the pass
    pub unscheduled: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SwapCoilRequest {
    pub new_coil_inventory_id: i32,
    pub reason: CoilSwapReason,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProducedItemFigures {
    pub work_order_item_id: i32,
    pub produced_quantity: Option<Decimal>,
    pub produced_weight: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CompleteWorkOrderRequest {
    /// Optional per-item production figures
    #[serde(default)]
    pub items: Vec<ProducedItemFigures>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListWorkOrdersQuery {
    pub branch_id: Option<i32>,
    pub status: Option<WorkOrderStatus>,
    pub machine_id: Option<i32>,
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WorkOrderSummary {
    pub id: i32,
    pub work_order_number: String,
    pub branch_id: i32,
    pub machine_id: i32,
    pub machine_category: MachineCategory,
    pub tag_number: String,
    pub parent_item_id: Option<String>,
    pub parent_item_weight: Option<Decimal>,
    pub due_date: Option<DateTime<Utc>>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub status: WorkOrderStatus,
    pub priority: WorkOrderPriority,
}

impl From<work_order::Model> for WorkOrderSummary {
    fn from(m: work_order::Model) -> Self {
        Self {
            id: m.id,
            work_order_number: m.work_order_number,
            branch_id: m.branch_id,
            machine_id: m.machine_id,
            machine_category: m.machine_category,
            tag_number: m.tag_number,
            parent_item_id: m.parent_item_id,
            parent_item_weight: m.parent_item_weight,
            due_date: m.due_date,
            scheduled_start: m.scheduled_start,
            scheduled_end: m.scheduled_end,
            actual_start: m.actual_start,
            actual_end: m.actual_end,
            status: m.status,
            priority: m.priority,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WorkOrderItemDto {
    pub id: i32,
    pub picking_list_item_id: Option<i32>,
    pub item_code: String,
    pub description: String,
    pub customer_name: Option<String>,
    pub order_quantity: Option<Decimal>,
    pub order_weight: Option<Decimal>,
    pub produced_quantity: Option<Decimal>,
    pub produced_weight: Option<Decimal>,
    pub unit: Option<String>,
    pub status: WorkOrderItemStatus,
}

impl From<work_order_item::Model> for WorkOrderItemDto {
    fn from(m: work_order_item::Model) -> Self {
        Self {
            id: m.id,
            picking_list_item_id: m.picking_list_item_id,
            item_code: m.item_code,
            description: m.description,
            customer_name: m.customer_name,
            order_quantity: m.order_quantity,
            order_weight: m.order_weight,
            produced_quantity: m.produced_quantity,
            produced_weight: m.produced_weight,
            unit: m.unit,
            status: m.status,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CoilUsageDto {
    pub id: i32,
    pub sequence: i32,
    pub coil_inventory_id: i32,
    pub coil_tag_number: String,
    pub coil_item_id: String,
    pub start_weight_lbs: Option<Decimal>,
    pub from_location: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub reason: CoilSwapReason,
    pub notes: Option<String>,
}

impl From<work_order_coil_usage::Model> for CoilUsageDto {
    fn from(m: work_order_coil_usage::Model) -> Self {
        Self {
            id: m.id,
            sequence: m.sequence,
            coil_inventory_id: m.coil_inventory_id,
            coil_tag_number: m.coil_tag_number,
            coil_item_id: m.coil_item_id,
            start_weight_lbs: m.start_weight_lbs,
            from_location: m.from_location,
            started_at: m.started_at,
            ended_at: m.ended_at,
            reason: m.reason,
            notes: m.notes,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WorkOrderDetailResponse {
    #[serde(flatten)]
    pub work_order: WorkOrderSummary,
    pub active_coil_usage_id: Option<i32>,
    pub items: Vec<WorkOrderItemDto>,
    pub coil_usages: Vec<CoilUsageDto>,
}

/// Create the work orders router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_work_orders))
        .route("/generate", post(generate_work_orders))
        .route("/:id", get(get_work_order))
        .route("/:id/start", post(start_work_order))
        .route("/:id/pause", post(pause_work_order))
        .route("/:id/resume", post(resume_work_order))
        .route("/:id/complete", post(complete_work_order))
        .route("/:id/cancel", post(cancel_work_order))
        .route("/:id/swap-coil", post(swap_coil))
}

/// Run one planning pass over a branch's eligible picking backlog
#[utoipa::path(
    post,
    path = "/api/v1/work-orders/generate",
    request_body = GenerateWorkOrdersRequest,
    responses(
        (status = 202, description = "Planning pass finished; counts reported"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
    ),
    tag = "work-orders"
)]
pub async fn generate_work_orders(
    State(state): State<AppState>,
    Json(req): Json<GenerateWorkOrdersRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    req.validate()?;

    let outcome = state
        .services
        .planning
        .create_from_eligible_picking_lists(req.branch_id)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        axum::Json(ApiResponse::success(PlanningOutcomeResponse {
            created: outcome.created,
            unscheduled: outcome.unscheduled,
        })),
    ))
}

/// List work orders
#[utoipa::path(
    get,
    path = "/api/v1/work-orders",
    params(ListWorkOrdersQuery),
    responses(
        (status = 200, description = "Page of work orders"),
    ),
    tag = "work-orders"
)]
pub async fn list_work_orders(
    State(state): State<AppState>,
    Query(query): Query<ListWorkOrdersQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let filter = WorkOrderFilter {
        branch_id: query.branch_id,
        status: query.status,
        machine_id: query.machine_id,
    };

    let (work_orders, total) = state
        .services
        .work_orders
        .list_work_orders(filter, query.page, query.limit)
        .await?;

    let limit = query.limit.max(1);
    let response = PaginatedResponse {
        items: work_orders
            .into_iter()
            .map(WorkOrderSummary::from)
            .collect::<Vec<_>>(),
        total,
        page: query.page.max(1),
        limit,
        total_pages: total.div_ceil(limit),
    };

    Ok(axum::Json(ApiResponse::success(response)))
}

/// Fetch one work order with items and coil usage history
#[utoipa::path(
    get,
    path = "/api/v1/work-orders/{id}",
    params(("id" = i32, Path, description = "Work order id")),
    responses(
        (status = 200, description = "Work order detail"),
        (status = 404, description = "Unknown work order", body = crate::errors::ErrorResponse),
    ),
    tag = "work-orders"
)]
pub async fn get_work_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.work_orders.get_work_order_detail(id).await?;

    let active_coil_usage_id = detail.work_order.active_coil_usage_id;
    let response = WorkOrderDetailResponse {
        work_order: WorkOrderSummary::from(detail.work_order),
        active_coil_usage_id,
        items: detail.items.into_iter().map(Into::into).collect(),
        coil_usages: detail.coil_usages.into_iter().map(Into::into).collect(),
    };

    Ok(axum::Json(ApiResponse::success(response)))
}

/// Start a pending or paused work order
#[utoipa::path(
    post,
    path = "/api/v1/work-orders/{id}/start",
    params(("id" = i32, Path, description = "Work order id")),
    responses(
        (status = 200, description = "Work order started"),
        (status = 404, description = "Unknown work order", body = crate::errors::ErrorResponse),
        (status = 422, description = "Illegal transition", body = crate::errors::ErrorResponse),
    ),
    tag = "work-orders"
)]
pub async fn start_work_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ActingUser(user): ActingUser,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .services
        .work_orders
        .start_work_order(id, &user)
        .await?;
    Ok(axum::Json(ApiResponse::success(WorkOrderSummary::from(
        updated,
    ))))
}

/// Pause an in-progress work order
#[utoipa::path(
    post,
    path = "/api/v1/work-orders/{id}/pause",
    params(("id" = i32, Path, description = "Work order id")),
    responses(
        (status = 200, description = "Work order paused"),
        (status = 422, description = "Illegal transition", body = crate::errors::ErrorResponse),
    ),
    tag = "work-orders"
)]
pub async fn pause_work_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ActingUser(user): ActingUser,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .services
        .work_orders
        .pause_work_order(id, &user)
        .await?;
    Ok(axum::Json(ApiResponse::success(WorkOrderSummary::from(
        updated,
    ))))
}

/// Resume a paused work order
#[utoipa::path(
    post,
    path = "/api/v1/work-orders/{id}/resume",
    params(("id" = i32, Path, description = "Work order id")),
    responses(
        (status = 200, description = "Work order resumed"),
        (status = 422, description = "Illegal transition", body = crate::errors::ErrorResponse),
    ),
    tag = "work-orders"
)]
pub async fn resume_work_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ActingUser(user): ActingUser,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .services
        .work_orders
        .resume_work_order(id, &user)
        .await?;
    Ok(axum::Json(ApiResponse::success(WorkOrderSummary::from(
        updated,
    ))))
}

/// Complete a work order, optionally reporting produced figures
#[utoipa::path(
    post,
    path = "/api/v1/work-orders/{id}/complete",
    params(("id" = i32, Path, description = "Work order id")),
    request_body = CompleteWorkOrderRequest,
    responses(
        (status = 200, description = "Work order completed"),
        (status = 422, description = "Illegal transition", body = crate::errors::ErrorResponse),
    ),
    tag = "work-orders"
)]
pub async fn complete_work_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ActingUser(user): ActingUser,
    body: Option<Json<CompleteWorkOrderRequest>>,
) -> Result<impl IntoResponse, ServiceError> {
    let produced = body
        .map(|Json(req)| req.items)
        .unwrap_or_default()
        .into_iter()
        .map(|f| ProducedFigures {
            work_order_item_id: f.work_order_item_id,
            produced_quantity: f.produced_quantity,
            produced_weight: f.produced_weight,
        })
        .collect();

    let updated = state
        .services
        .work_orders
        .complete_work_order(id, produced, &user)
        .await?;
    Ok(axum::Json(ApiResponse::success(WorkOrderSummary::from(
        updated,
    ))))
}

/// Cancel a work order that has not started production
#[utoipa::path(
    post,
    path = "/api/v1/work-orders/{id}/cancel",
    params(("id" = i32, Path, description = "Work order id")),
    responses(
        (status = 200, description = "Work order canceled"),
        (status = 422, description = "Illegal transition", body = crate::errors::ErrorResponse),
    ),
    tag = "work-orders"
)]
pub async fn cancel_work_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ActingUser(user): ActingUser,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .services
        .work_orders
        .cancel_work_order(id, &user)
        .await?;
    Ok(axum::Json(ApiResponse::success(WorkOrderSummary::from(
        updated,
    ))))
}

/// Swap the mounted coil on a running work order
#[utoipa::path(
    post,
    path = "/api/v1/work-orders/{id}/swap-coil",
    params(("id" = i32, Path, description = "Work order id")),
    request_body = SwapCoilRequest,
    responses(
        (status = 200, description = "Coil swapped; new usage opened"),
        (status = 404, description = "Unknown work order or coil", body = crate::errors::ErrorResponse),
        (status = 422, description = "Illegal transition", body = crate::errors::ErrorResponse),
    ),
    tag = "work-orders"
)]
pub async fn swap_coil(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ActingUser(user): ActingUser,
    Json(req): Json<SwapCoilRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let usage = state
        .services
        .work_orders
        .swap_coil(id, req.new_coil_inventory_id, req.reason, req.notes, &user)
        .await?;
    Ok(axum::Json(ApiResponse::success(CoilUsageDto::from(usage))))
}
