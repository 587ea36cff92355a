use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::instrument;

use crate::{
    entities::{
        inventory_item::{self, Entity as InventoryItemEntity},
        item_relationship::{self, Entity as ItemRelationshipEntity},
    },
    errors::ServiceError,
};

use rust_decimal::Decimal;

/// Weight unit a coil snapshot must carry to be usable as a work order
/// parent.
pub const COIL_WEIGHT_UNIT: &str = "LBS";

/// Read-side access to on-hand inventory and the item relationship table.
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Coils on a branch matching any of the given item codes, restricted to
    /// positive LBS snapshots. Ordered by snapshot weight descending, then by
    /// id ascending so equal-weight candidates resolve deterministically.
    #[instrument(skip(self, item_codes))]
    pub async fn find_coil_candidates(
        &self,
        branch_id: i32,
        item_codes: &[String],
    ) -> Result<Vec<inventory_item::Model>, ServiceError> {
        if item_codes.is_empty() {
            return Ok(Vec::new());
        }

        let coils = InventoryItemEntity::find()
            .filter(inventory_item::Column::BranchId.eq(branch_id))
            .filter(inventory_item::Column::ItemId.is_in(item_codes.to_vec()))
            .filter(inventory_item::Column::SnapshotUnit.eq(COIL_WEIGHT_UNIT))
            .filter(inventory_item::Column::Snapshot.gt(Decimal::ZERO))
            .order_by_desc(inventory_item::Column::Snapshot)
            .order_by_asc(inventory_item::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(coils)
    }

    /// Fetches a single coil by its inventory id.
    #[instrument(skip(self))]
    pub async fn get_coil(
        &self,
        inventory_id: i32,
    ) -> Result<Option<inventory_item::Model>, ServiceError> {
        let coil = InventoryItemEntity::find_by_id(inventory_id)
            .one(&*self.db)
            .await?;
        Ok(coil)
    }

    /// Looks up the coil relationship row for a finished-goods item code.
    #[instrument(skip(self))]
    pub async fn get_item_relationship(
        &self,
        item_code: &str,
    ) -> Result<Option<item_relationship::Model>, ServiceError> {
        let relationship = ItemRelationshipEntity::find()
            .filter(item_relationship::Column::ItemCode.eq(item_code))
            .one(&*self.db)
            .await?;
        Ok(relationship)
    }
}
