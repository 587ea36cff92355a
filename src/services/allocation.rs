use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::entities::inventory_item;

/// Running record of coil weight already committed to work orders built
/// during a single planning pass. Scoped to one invocation and passed
/// explicitly through the planning call graph; never shared across runs.
///
/// Inventory snapshots are not written back during planning, so this ledger
/// is the only thing preventing two work orders in the same pass from
/// over-drawing one physical coil.
#[derive(Debug, Default)]
pub struct CoilAllocationLedger {
    committed: HashMap<i32, Decimal>,
}

impl CoilAllocationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weight already promised against a coil this pass. Zero for coils the
    /// pass has not touched.
    pub fn committed(&self, coil_id: i32) -> Decimal {
        self.committed
            .get(&coil_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Records additional weight committed against a coil.
    pub fn add(&mut self, coil_id: i32, weight: Decimal) {
        *self.committed.entry(coil_id).or_insert(Decimal::ZERO) += weight;
    }

    /// Remaining uncommitted weight of a coil, given its snapshot. Missing
    /// snapshots count as zero on hand.
    pub fn available(&self, coil: &inventory_item::Model) -> Decimal {
        coil.snapshot.unwrap_or(Decimal::ZERO) - self.committed(coil.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn coil(id: i32, snapshot: Option<Decimal>) -> inventory_item::Model {
        inventory_item::Model {
            id,
            item_id: format!("COIL-{id}"),
            tag_number: format!("T{id}"),
            description: "test coil".into(),
            snapshot,
            snapshot_unit: Some("LBS".into()),
            location: None,
            branch_id: 1,
        }
    }

    #[test]
    fn untouched_coil_has_zero_committed() {
        let ledger = CoilAllocationLedger::new();
        assert_eq!(ledger.committed(42), Decimal::ZERO);
    }

    #[test]
    fn commitments_accumulate_per_coil() {
        let mut ledger = CoilAllocationLedger::new();
        ledger.add(1, dec!(400));
        ledger.add(1, dec!(250));
        ledger.add(2, dec!(100));
        assert_eq!(ledger.committed(1), dec!(650));
        assert_eq!(ledger.committed(2), dec!(100));
    }

    #[test]
    fn available_subtracts_committed_from_snapshot() {
        let mut ledger = CoilAllocationLedger::new();
        ledger.add(7, dec!(800));
        assert_eq!(ledger.available(&coil(7, Some(dec!(1000)))), dec!(200));
    }

    #[test]
    fn missing_snapshot_counts_as_zero() {
        let ledger = CoilAllocationLedger::new();
        assert_eq!(ledger.available(&coil(9, None)), Decimal::ZERO);
    }
}
