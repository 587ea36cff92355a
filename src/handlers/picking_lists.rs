use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    entities::picking_list_item::{self, PickingLineStatus},
    errors::ServiceError,
    handlers::ActingUser,
    ApiResponse, AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EligibleLinesQuery {
    pub branch_id: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignMachineRequest {
    pub machine_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PickingLineDto {
    pub id: i32,
    pub picking_list_id: i32,
    pub item_id: String,
    pub description: String,
    pub quantity: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub machine_id: Option<i32>,
    pub status: PickingLineStatus,
    pub scheduled_ship_date: Option<DateTime<Utc>>,
}

impl From<picking_list_item::Model> for PickingLineDto {
    fn from(m: picking_list_item::Model) -> Self {
        Self {
            id: m.id,
            picking_list_id: m.picking_list_id,
            item_id: m.item_id,
            description: m.description,
            quantity: m.quantity,
            weight: m.weight,
            machine_id: m.machine_id,
            status: m.status,
            scheduled_ship_date: m.scheduled_ship_date,
        }
    }
}

/// Create the picking list items router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/eligible", get(list_eligible_lines))
        .route("/:id/assign-machine", post(assign_machine))
}

/// Lines currently eligible for work order generation on a branch
#[utoipa::path(
    get,
    path = "/api/v1/picking-list-items/eligible",
    params(EligibleLinesQuery),
    responses(
        (status = 200, description = "Eligible lines in planning order"),
    ),
    tag = "picking-lists"
)]
pub async fn list_eligible_lines(
    State(state): State<AppState>,
    Query(query): Query<EligibleLinesQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let queued = state
        .services
        .picking_lists
        .eligible_production_lines(query.branch_id)
        .await?;

    let lines: Vec<PickingLineDto> = queued.into_iter().map(|q| q.item.into()).collect();
    Ok(axum::Json(ApiResponse::success(lines)))
}

/// Assign a picking line to a machine, feeding the planner's backlog
#[utoipa::path(
    post,
    path = "/api/v1/picking-list-items/{id}/assign-machine",
    params(("id" = i32, Path, description = "Picking line id")),
    request_body = AssignMachineRequest,
    responses(
        (status = 200, description = "Line assigned"),
        (status = 404, description = "Unknown line or machine", body = crate::errors::ErrorResponse),
        (status = 422, description = "Line not assignable", body = crate::errors::ErrorResponse),
    ),
    tag = "picking-lists"
)]
pub async fn assign_machine(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ActingUser(user): ActingUser,
    Json(req): Json<AssignMachineRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .services
        .picking_lists
        .assign_machine(id, req.machine_id, &user)
        .await?;
    Ok(axum::Json(ApiResponse::success(PickingLineDto::from(
        updated,
    ))))
}
