use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::{
    entities::{inventory_item, machine::MachineCategory, picking_list_item},
    errors::ServiceError,
    services::{allocation::CoilAllocationLedger, inventory::InventoryService},
};

/// Matches item ids carrying a cut suffix (`-2`, `-12`, `-2.5`) on top of a
/// dash-numbered base coil id; group 1 is the base coil id.
static CUT_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*-\d+)-\d+(\.\d+)?$").expect("invalid cut-suffix pattern"));

/// Strips a trailing `-<number>` or `-<number.number>` cut suffix from an
/// item id, yielding the base coil id (`ABC-100-2` -> `ABC-100`). An id that
/// is already a base coil id (`ABC-100`, `ABC`) is returned unchanged.
pub fn normalize_to_base_coil_id(item_id: &str) -> &str {
    if item_id.trim().is_empty() {
        return item_id;
    }
    match CUT_SUFFIX.captures(item_id) {
        Some(caps) => caps.get(1).map_or(item_id, |m| m.as_str()),
        None => item_id,
    }
}

/// Resolves the parent coil an order line must be cut from.
///
/// CTL lines resolve through the item relationship table; slitter lines
/// resolve by trying the line's own item id and its normalized base id.
/// Any other machine category never resolves.
pub struct CoilResolver {
    inventory: Arc<InventoryService>,
}

impl CoilResolver {
    pub fn new(inventory: Arc<InventoryService>) -> Self {
        Self { inventory }
    }

    /// Returns the best-fit parent coil for the line, or `None` when no coil
    /// with enough uncommitted weight for the line itself exists. A `None`
    /// is not an error: the caller leaves the line unscheduled.
    #[instrument(skip(self, line, ledger), fields(line_id = line.id, item = %line.item_id))]
    pub async fn find_parent_coil(
        &self,
        branch_id: i32,
        line: &picking_list_item::Model,
        category: MachineCategory,
        ledger: &CoilAllocationLedger,
    ) -> Result<Option<inventory_item::Model>, ServiceError> {
        let parent_item_ids: Vec<String> = match category {
            MachineCategory::Ctl => {
                let Some(relationship) =
                    self.inventory.get_item_relationship(&line.item_id).await?
                else {
                    return Ok(None);
                };
                match relationship.coil_relationship {
                    Some(parent) if !parent.is_empty() => vec![parent],
                    _ => return Ok(None),
                }
            }
            MachineCategory::Slitter => {
                let id = line.item_id.clone();
                let base_id = normalize_to_base_coil_id(&id).to_string();
                if base_id == id {
                    vec![id]
                } else {
                    vec![id, base_id]
                }
            }
            // Sheet lines never consume coils directly.
            MachineCategory::Sheet => return Ok(None),
        };

        let candidates = self
            .inventory
            .find_coil_candidates(branch_id, &parent_item_ids)
            .await?;

        let first_item_weight = line.weight.unwrap_or(Decimal::ZERO);

        for coil in candidates {
            let snapshot = coil.snapshot.unwrap_or(Decimal::ZERO);
            if snapshot <= Decimal::ZERO {
                continue;
            }
            let available = snapshot - ledger.committed(coil.id);
            if available >= first_item_weight {
                return Ok(Some(coil));
            }
            debug!(
                coil_id = coil.id,
                %available,
                "coil lacks capacity for triggering line, trying next candidate"
            );
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_single_cut_suffix() {
        assert_eq!(normalize_to_base_coil_id("ABC-100-2"), "ABC-100");
    }

    #[test]
    fn strips_fractional_cut_suffix() {
        assert_eq!(normalize_to_base_coil_id("ABC-100-2.5"), "ABC-100");
    }

    #[test]
    fn base_id_is_unchanged() {
        assert_eq!(normalize_to_base_coil_id("ABC-100"), "ABC-100");
        assert_eq!(normalize_to_base_coil_id("ABC"), "ABC");
    }

    #[test]
    fn normalization_is_idempotent_on_base_ids() {
        let once = normalize_to_base_coil_id("CL-4820-3");
        assert_eq!(once, "CL-4820");
        assert_eq!(normalize_to_base_coil_id(once), once);
    }

    #[test]
    fn empty_and_whitespace_ids_pass_through() {
        assert_eq!(normalize_to_base_coil_id(""), "");
        assert_eq!(normalize_to_base_coil_id("   "), "   ");
    }
}
