use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{
    machine::MachineCategory,
    picking_list_item::PickingLineStatus,
    work_order::{WorkOrderPriority, WorkOrderStatus},
    work_order_coil_usage::CoilSwapReason,
    work_order_item::WorkOrderItemStatus,
};
use crate::errors::ErrorResponse;
use crate::handlers::{picking_lists, work_orders};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Metalworks API",
        description = "Work order generation, coil allocation and production tracking for a metals service center"
    ),
    paths(
        work_orders::generate_work_orders,
        work_orders::list_work_orders,
        work_orders::get_work_order,
        work_orders::start_work_order,
        work_orders::pause_work_order,
        work_orders::resume_work_order,
        work_orders::complete_work_order,
        work_orders::cancel_work_order,
        work_orders::swap_coil,
        picking_lists::list_eligible_lines,
        picking_lists::assign_machine,
    ),
    components(schemas(
        ErrorResponse,
        MachineCategory,
        PickingLineStatus,
        WorkOrderStatus,
        WorkOrderPriority,
        WorkOrderItemStatus,
        CoilSwapReason,
        work_orders::GenerateWorkOrdersRequest,
        work_orders::PlanningOutcomeResponse,
        work_orders::SwapCoilRequest,
        work_orders::CompleteWorkOrderRequest,
        work_orders::ProducedItemFigures,
        work_orders::WorkOrderSummary,
        work_orders::WorkOrderItemDto,
        work_orders::CoilUsageDto,
        work_orders::WorkOrderDetailResponse,
        picking_lists::PickingLineDto,
        picking_lists::AssignMachineRequest,
    )),
    tags(
        (name = "work-orders", description = "Work order planning and lifecycle"),
        (name = "picking-lists", description = "Picking backlog and machine assignment"),
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at `/docs`, serving the OpenAPI document at
/// `/api-docs/openapi.json`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
