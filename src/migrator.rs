use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_inventory_items_table::Migration),
            Box::new(m20240101_000002_create_purchase_lots_table::Migration),
            Box::new(m20240101_000003_create_bom_tables::Migration),
            Box::new(m20240101_000004_create_assembly_tables::Migration),
            Box::new(m20240101_000005_create_sales_tables::Migration),
            Box::new(m20240101_000006_create_audit_logs_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_inventory_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_inventory_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryItems::Name).string().not_null())
                        .col(
                            ColumnDef::new(InventoryItems::UnitOfMeasure)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::StockCurrent)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::SerialTracked)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryItems::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum InventoryItems {
        Table,
        Id,
        Name,
        UnitOfMeasure,
        StockCurrent,
        SerialTracked,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_purchase_lots_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_purchase_lots_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchaseLots::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseLots::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseLots::InventoryItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseLots::Quantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseLots::RemainingQuantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseLots::Received)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(PurchaseLots::ReceivedAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(PurchaseLots::PoNumber).string())
                        .col(ColumnDef::new(PurchaseLots::VendorName).string())
                        .col(
                            ColumnDef::new(PurchaseLots::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseLots::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // FIFO consumption scans lots per item in received order
            manager
                .create_index(
                    Index::create()
                        .name("idx_purchase_lots_item_received_at")
                        .table(PurchaseLots::Table)
                        .col(PurchaseLots::InventoryItemId)
                        .col(PurchaseLots::ReceivedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchaseLots::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum PurchaseLots {
        Table,
        Id,
        InventoryItemId,
        Quantity,
        RemainingQuantity,
        Received,
        ReceivedAt,
        PoNumber,
        VendorName,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_bom_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_bom_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Boms::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Boms::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Boms::ProductItemId).uuid().not_null())
                        .col(ColumnDef::new(Boms::Name).string().not_null())
                        .col(
                            ColumnDef::new(Boms::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(BomComponents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BomComponents::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BomComponents::BomId).uuid().not_null())
                        .col(
                            ColumnDef::new(BomComponents::ComponentItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BomComponents::QuantityPerUnit)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BomComponents::Position)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(BomComponents::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_bom_components_bom_id")
                        .table(BomComponents::Table)
                        .col(BomComponents::BomId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BomComponents::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Boms::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Boms {
        Table,
        Id,
        ProductItemId,
        Name,
        CreatedAt,
    }

    #[derive(Iden)]
    enum BomComponents {
        Table,
        Id,
        BomId,
        ComponentItemId,
        QuantityPerUnit,
        Position,
        CreatedAt,
    }
}

mod m20240101_000004_create_assembly_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_assembly_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Assemblies::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Assemblies::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Assemblies::BomId).uuid().not_null())
                        .col(ColumnDef::new(Assemblies::AssemblyName).string().not_null())
                        .col(ColumnDef::new(Assemblies::Quantity).integer().not_null())
                        .col(ColumnDef::new(Assemblies::PoNumber).string())
                        .col(ColumnDef::new(Assemblies::CreatedBy).uuid())
                        .col(
                            ColumnDef::new(Assemblies::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(AssemblyUnits::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AssemblyUnits::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(AssemblyUnits::AssemblyId).uuid().not_null())
                        .col(
                            ColumnDef::new(AssemblyUnits::UnitNumber)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(AssemblyUnits::SerialNumber).string())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_assembly_units_assembly_id")
                        .table(AssemblyUnits::Table)
                        .col(AssemblyUnits::AssemblyId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(AssemblyItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AssemblyItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AssemblyItems::AssemblyUnitId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AssemblyItems::ComponentItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(AssemblyItems::SerialNumber).string())
                        .col(ColumnDef::new(AssemblyItems::SourceLotId).uuid())
                        .col(ColumnDef::new(AssemblyItems::VendorName).string())
                        .col(
                            ColumnDef::new(AssemblyItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_assembly_items_unit_id")
                        .table(AssemblyItems::Table)
                        .col(AssemblyItems::AssemblyUnitId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AssemblyItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(AssemblyUnits::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Assemblies::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Assemblies {
        Table,
        Id,
        BomId,
        AssemblyName,
        Quantity,
        PoNumber,
        CreatedBy,
        CreatedAt,
    }

    #[derive(Iden)]
    enum AssemblyUnits {
        Table,
        Id,
        AssemblyId,
        UnitNumber,
        SerialNumber,
    }

    #[derive(Iden)]
    enum AssemblyItems {
        Table,
        Id,
        AssemblyUnitId,
        ComponentItemId,
        SerialNumber,
        SourceLotId,
        VendorName,
        CreatedAt,
    }
}

mod m20240101_000005_create_sales_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_sales_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Sales::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Sales::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Sales::CustomerName).string().not_null())
                        .col(
                            ColumnDef::new(Sales::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Deliveries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Deliveries::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Deliveries::SaleId).uuid().not_null())
                        .col(
                            ColumnDef::new(Deliveries::Delivered)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Deliveries::DeliveredAt).timestamp_with_time_zone())
                        .col(
                            ColumnDef::new(Deliveries::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SaleItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SaleItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SaleItems::SaleId).uuid().not_null())
                        .col(ColumnDef::new(SaleItems::AssemblyUnitId).uuid().not_null())
                        .col(
                            ColumnDef::new(SaleItems::Delivered)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(SaleItems::DeliveryId).uuid())
                        .col(
                            ColumnDef::new(SaleItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_sale_items_delivery_id")
                        .table(SaleItems::Table)
                        .col(SaleItems::DeliveryId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SaleItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Deliveries::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Sales::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Sales {
        Table,
        Id,
        CustomerName,
        CreatedAt,
    }

    #[derive(Iden)]
    enum Deliveries {
        Table,
        Id,
        SaleId,
        Delivered,
        DeliveredAt,
        CreatedAt,
    }

    #[derive(Iden)]
    enum SaleItems {
        Table,
        Id,
        SaleId,
        AssemblyUnitId,
        Delivered,
        DeliveryId,
        CreatedAt,
    }
}

mod m20240101_000006_create_audit_logs_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_audit_logs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AuditLogs::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(AuditLogs::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(AuditLogs::ActorId).uuid())
                        .col(ColumnDef::new(AuditLogs::Action).string().not_null())
                        .col(ColumnDef::new(AuditLogs::EntityType).string().not_null())
                        .col(ColumnDef::new(AuditLogs::EntityId).uuid().not_null())
                        .col(ColumnDef::new(AuditLogs::Detail).json())
                        .col(
                            ColumnDef::new(AuditLogs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum AuditLogs {
        Table,
        Id,
        ActorId,
        Action,
        EntityType,
        EntityId,
        Detail,
        CreatedAt,
    }
}
