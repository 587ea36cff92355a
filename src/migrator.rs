use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_reference_tables::Migration),
            Box::new(m20250901_000002_create_picking_tables::Migration),
            Box::new(m20250901_000003_create_work_order_tables::Migration),
        ]
    }
}

mod m20250901_000001_create_reference_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250901_000001_create_reference_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Branches::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Branches::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Branches::Code).string().not_null())
                        .col(ColumnDef::new(Branches::Name).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Machines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Machines::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Machines::Code).string().not_null())
                        .col(ColumnDef::new(Machines::Name).string().not_null())
                        .col(ColumnDef::new(Machines::BranchId).integer().not_null())
                        .col(ColumnDef::new(Machines::Category).string().not_null())
                        .col(
                            ColumnDef::new(Machines::ThroughputRate)
                                .decimal_len(18, 3)
                                .null(),
                        )
                        .col(ColumnDef::new(Machines::ThroughputUnit).string().null())
                        .col(
                            ColumnDef::new(Machines::DefaultSetupMinutes)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryItems::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryItems::ItemId).string().not_null())
                        .col(
                            ColumnDef::new(InventoryItems::TagNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::Description)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::Snapshot)
                                .decimal_len(18, 3)
                                .null(),
                        )
                        .col(ColumnDef::new(InventoryItems::SnapshotUnit).string().null())
                        .col(ColumnDef::new(InventoryItems::Location).string().null())
                        .col(ColumnDef::new(InventoryItems::BranchId).integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_inventory_items_item_id")
                        .table(InventoryItems::Table)
                        .col(InventoryItems::ItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ItemRelationships::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ItemRelationships::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ItemRelationships::ItemCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ItemRelationships::CoilRelationship)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ItemRelationships::ItemDescription)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ItemRelationships::CoilDescription)
                                .string()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ItemRelationships::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(InventoryItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Machines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Branches::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum Branches {
        Table,
        Id,
        Code,
        Name,
    }

    #[derive(DeriveIden)]
    pub enum Machines {
        Table,
        Id,
        Code,
        Name,
        BranchId,
        Category,
        ThroughputRate,
        ThroughputUnit,
        DefaultSetupMinutes,
    }

    #[derive(DeriveIden)]
    pub enum InventoryItems {
        Table,
        Id,
        ItemId,
        TagNumber,
        Description,
        Snapshot,
        SnapshotUnit,
        Location,
        BranchId,
    }

    #[derive(DeriveIden)]
    pub enum ItemRelationships {
        Table,
        Id,
        ItemCode,
        CoilRelationship,
        ItemDescription,
        CoilDescription,
    }
}

mod m20250901_000002_create_picking_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250901_000002_create_picking_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PickingLists::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PickingLists::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PickingLists::BranchId).integer().not_null())
                        .col(ColumnDef::new(PickingLists::ListNumber).string().not_null())
                        .col(
                            ColumnDef::new(PickingLists::SalesOrderNumber)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(PickingLists::SoldTo).string().null())
                        .col(
                            ColumnDef::new(PickingLists::ShipDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PickingLists::Priority)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(PickingLists::Status).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PickingListItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PickingListItems::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PickingListItems::PickingListId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PickingListItems::ItemId).string().not_null())
                        .col(
                            ColumnDef::new(PickingListItems::Description)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PickingListItems::Quantity)
                                .decimal_len(18, 3)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PickingListItems::Weight)
                                .decimal_len(18, 3)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PickingListItems::Width)
                                .decimal_len(18, 3)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PickingListItems::Length)
                                .decimal_len(18, 3)
                                .null(),
                        )
                        .col(ColumnDef::new(PickingListItems::Unit).string().null())
                        .col(ColumnDef::new(PickingListItems::MachineId).integer().null())
                        .col(ColumnDef::new(PickingListItems::AssignedBy).string().null())
                        .col(
                            ColumnDef::new(PickingListItems::AssignedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(PickingListItems::Status).string().not_null())
                        .col(
                            ColumnDef::new(PickingListItems::ScheduledShipDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PickingListItems::ScheduledProcessingDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_picking_list_items_picking_list")
                                .from(PickingListItems::Table, PickingListItems::PickingListId)
                                .to(PickingLists::Table, PickingLists::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_picking_list_items_status")
                        .table(PickingListItems::Table)
                        .col(PickingListItems::Status)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PickingListItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PickingLists::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum PickingLists {
        Table,
        Id,
        BranchId,
        ListNumber,
        SalesOrderNumber,
        SoldTo,
        ShipDate,
        Priority,
        Status,
    }

    #[derive(DeriveIden)]
    pub enum PickingListItems {
        Table,
        Id,
        PickingListId,
        ItemId,
        Description,
        Quantity,
        Weight,
        Width,
        Length,
        Unit,
        MachineId,
        AssignedBy,
        AssignedAt,
        Status,
        ScheduledShipDate,
        ScheduledProcessingDate,
    }
}

mod m20250901_000003_create_work_order_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250901_000003_create_work_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(WorkOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WorkOrders::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::WorkOrderNumber)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WorkOrders::BranchId).integer().not_null())
                        .col(ColumnDef::new(WorkOrders::MachineId).integer().not_null())
                        .col(
                            ColumnDef::new(WorkOrders::MachineCategory)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WorkOrders::TagNumber).string().not_null())
                        .col(ColumnDef::new(WorkOrders::CoilInventoryId).integer().null())
                        .col(ColumnDef::new(WorkOrders::ParentItemId).string().null())
                        .col(
                            ColumnDef::new(WorkOrders::ParentItemDescription)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::ParentItemWeight)
                                .decimal_len(18, 3)
                                .null(),
                        )
                        .col(ColumnDef::new(WorkOrders::Instructions).string().null())
                        .col(
                            ColumnDef::new(WorkOrders::DueDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::ScheduledStart)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::ScheduledEnd)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::ActualStart)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::ActualEnd)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(WorkOrders::Status).string().not_null())
                        .col(
                            ColumnDef::new(WorkOrders::Priority)
                                .integer()
                                .not_null()
                                .default(2),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::ActiveCoilUsageId)
                                .integer()
                                .null(),
                        )
                        .col(ColumnDef::new(WorkOrders::CreatedBy).string().null())
                        .col(
                            ColumnDef::new(WorkOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WorkOrders::LastUpdatedBy).string().null())
                        .col(
                            ColumnDef::new(WorkOrders::LastUpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_work_orders_machine_scheduled_end")
                        .table(WorkOrders::Table)
                        .col(WorkOrders::MachineId)
                        .col(WorkOrders::ScheduledEnd)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WorkOrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WorkOrderItems::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderItems::WorkOrderId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderItems::PickingListItemId)
                                .integer()
                                .null(),
                        )
                        .col(ColumnDef::new(WorkOrderItems::ItemCode).string().not_null())
                        .col(
                            ColumnDef::new(WorkOrderItems::Description)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderItems::SalesOrderNumber)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(WorkOrderItems::CustomerName).string().null())
                        .col(
                            ColumnDef::new(WorkOrderItems::OrderQuantity)
                                .decimal_len(18, 3)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderItems::OrderWeight)
                                .decimal_len(18, 3)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderItems::Width)
                                .decimal_len(18, 3)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderItems::Length)
                                .decimal_len(18, 3)
                                .null(),
                        )
                        .col(ColumnDef::new(WorkOrderItems::Unit).string().null())
                        .col(
                            ColumnDef::new(WorkOrderItems::ProducedQuantity)
                                .decimal_len(18, 3)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderItems::ProducedWeight)
                                .decimal_len(18, 3)
                                .null(),
                        )
                        .col(ColumnDef::new(WorkOrderItems::Status).string().not_null())
                        .col(
                            ColumnDef::new(WorkOrderItems::IsStockItem)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_work_order_items_work_order")
                                .from(WorkOrderItems::Table, WorkOrderItems::WorkOrderId)
                                .to(WorkOrders::Table, WorkOrders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WorkOrderCoilUsages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WorkOrderCoilUsages::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderCoilUsages::WorkOrderId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderCoilUsages::Sequence)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderCoilUsages::CoilInventoryId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderCoilUsages::CoilTagNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderCoilUsages::CoilItemId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderCoilUsages::CoilDescription)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderCoilUsages::StartWeightLbs)
                                .decimal_len(18, 3)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderCoilUsages::FromLocation)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderCoilUsages::StartedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderCoilUsages::EndedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderCoilUsages::Reason)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WorkOrderCoilUsages::Notes).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_work_order_coil_usages_work_order")
                                .from(
                                    WorkOrderCoilUsages::Table,
                                    WorkOrderCoilUsages::WorkOrderId,
                                )
                                .to(WorkOrders::Table, WorkOrders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WorkOrderCoilUsages::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WorkOrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WorkOrders::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum WorkOrders {
        Table,
        Id,
        WorkOrderNumber,
        BranchId,
        MachineId,
        MachineCategory,
        TagNumber,
        CoilInventoryId,
        ParentItemId,
        ParentItemDescription,
        ParentItemWeight,
        Instructions,
        DueDate,
        ScheduledStart,
        ScheduledEnd,
        ActualStart,
        ActualEnd,
        Status,
        Priority,
        ActiveCoilUsageId,
        CreatedBy,
        CreatedAt,
        LastUpdatedBy,
        LastUpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum WorkOrderItems {
        Table,
        Id,
        WorkOrderId,
        PickingListItemId,
        ItemCode,
        Description,
        SalesOrderNumber,
        CustomerName,
        OrderQuantity,
        OrderWeight,
        Width,
        Length,
        Unit,
        ProducedQuantity,
        ProducedWeight,
        Status,
        IsStockItem,
    }

    #[derive(DeriveIden)]
    pub enum WorkOrderCoilUsages {
        Table,
        Id,
        WorkOrderId,
        Sequence,
        CoilInventoryId,
        CoilTagNumber,
        CoilItemId,
        CoilDescription,
        StartWeightLbs,
        FromLocation,
        StartedAt,
        EndedAt,
        Reason,
        Notes,
    }
}
