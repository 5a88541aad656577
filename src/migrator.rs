use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_master_data::Migration),
            Box::new(m20240101_000002_create_bill_of_materials::Migration),
            Box::new(m20240101_000003_create_production_orders::Migration),
            Box::new(m20240101_000004_create_delivery_tables::Migration),
            Box::new(m20240101_000005_create_supply_tables::Migration),
        ]
    }
}

mod m20240101_000001_create_master_data {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_master_data"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Products::Code)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Description).string().null())
                        .col(
                            ColumnDef::new(Products::Stock)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::StockMin)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::UnitPrice)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RawMaterials::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RawMaterials::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(RawMaterials::Code)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(RawMaterials::Name).string().not_null())
                        .col(
                            ColumnDef::new(RawMaterials::Stock)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(RawMaterials::StockMin)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(RawMaterials::Unit).string_len(16).not_null())
                        .col(
                            ColumnDef::new(RawMaterials::UnitPrice)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(RawMaterials::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RawMaterials::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Customers::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Customers::Code)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Customers::Name).string().not_null())
                        .col(ColumnDef::new(Customers::Email).string().null())
                        .col(ColumnDef::new(Customers::Phone).string().null())
                        .col(ColumnDef::new(Customers::Address).string().null())
                        .col(
                            ColumnDef::new(Customers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Customers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Suppliers::Code)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(ColumnDef::new(Suppliers::Email).string().null())
                        .col(ColumnDef::new(Suppliers::Phone).string().null())
                        .col(ColumnDef::new(Suppliers::Rating).integer().null())
                        .col(ColumnDef::new(Suppliers::LeadTimeDays).integer().null())
                        .col(
                            ColumnDef::new(Suppliers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Suppliers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(RawMaterials::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        Code,
        Name,
        Description,
        Stock,
        StockMin,
        UnitPrice,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum RawMaterials {
        Table,
        Id,
        Code,
        Name,
        Stock,
        StockMin,
        Unit,
        UnitPrice,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Customers {
        Table,
        Id,
        Code,
        Name,
        Email,
        Phone,
        Address,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Suppliers {
        Table,
        Id,
        Code,
        Name,
        Email,
        Phone,
        Rating,
        LeadTimeDays,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_bill_of_materials {
    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_master_data::{Products, RawMaterials, Suppliers};

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_bill_of_materials"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BillOfMaterials::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BillOfMaterials::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(BillOfMaterials::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BillOfMaterials::RawMaterialId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BillOfMaterials::Quantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BillOfMaterials::Unit)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BillOfMaterials::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BillOfMaterials::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bom_product_id")
                                .from(BillOfMaterials::Table, BillOfMaterials::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bom_raw_material_id")
                                .from(BillOfMaterials::Table, BillOfMaterials::RawMaterialId)
                                .to(RawMaterials::Table, RawMaterials::Id),
                        )
                        .to_owned(),
                )
                .await?;

            // A recipe references a given material at most once.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bom_product_material")
                        .table(BillOfMaterials::Table)
                        .col(BillOfMaterials::ProductId)
                        .col(BillOfMaterials::RawMaterialId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SupplierRawMaterials::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierRawMaterials::SupplierId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierRawMaterials::RawMaterialId)
                                .big_integer()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(SupplierRawMaterials::SupplierId)
                                .col(SupplierRawMaterials::RawMaterialId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_supplier_raw_materials_supplier_id")
                                .from(
                                    SupplierRawMaterials::Table,
                                    SupplierRawMaterials::SupplierId,
                                )
                                .to(Suppliers::Table, Suppliers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_supplier_raw_materials_raw_material_id")
                                .from(
                                    SupplierRawMaterials::Table,
                                    SupplierRawMaterials::RawMaterialId,
                                )
                                .to(RawMaterials::Table, RawMaterials::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SupplierRawMaterials::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(BillOfMaterials::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum BillOfMaterials {
        Table,
        Id,
        ProductId,
        RawMaterialId,
        Quantity,
        Unit,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum SupplierRawMaterials {
        Table,
        SupplierId,
        RawMaterialId,
    }
}

mod m20240101_000003_create_production_orders {
    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_master_data::Products;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_production_orders"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductionOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductionOrders::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::OrderNumber)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::Quantity)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::Status)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::StartDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::EndDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_production_orders_product_id")
                                .from(ProductionOrders::Table, ProductionOrders::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_orders_status")
                        .table(ProductionOrders::Table)
                        .col(ProductionOrders::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductionOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ProductionOrders {
        Table,
        Id,
        OrderNumber,
        ProductId,
        Quantity,
        Status,
        StartDate,
        EndDate,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_delivery_tables {
    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_master_data::{Customers, Products};

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_delivery_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DeliveryOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DeliveryOrders::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(DeliveryOrders::OrderNumber)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(DeliveryOrders::CustomerId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryOrders::Status)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryOrders::ExpectedDeliveryDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryOrders::ActualDeliveryDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_delivery_orders_customer_id")
                                .from(DeliveryOrders::Table, DeliveryOrders::CustomerId)
                                .to(Customers::Table, Customers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_delivery_orders_status")
                        .table(DeliveryOrders::Table)
                        .col(DeliveryOrders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DeliveryOrderLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DeliveryOrderLines::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(DeliveryOrderLines::DeliveryOrderId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryOrderLines::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryOrderLines::Quantity)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryOrderLines::UnitPrice)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryOrderLines::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryOrderLines::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_delivery_order_lines_order_id")
                                .from(
                                    DeliveryOrderLines::Table,
                                    DeliveryOrderLines::DeliveryOrderId,
                                )
                                .to(DeliveryOrders::Table, DeliveryOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_delivery_order_lines_product_id")
                                .from(DeliveryOrderLines::Table, DeliveryOrderLines::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_delivery_order_lines_order_id")
                        .table(DeliveryOrderLines::Table)
                        .col(DeliveryOrderLines::DeliveryOrderId)
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
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Deliveries::DeliveryNumber)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Deliveries::DeliveryOrderId)
                                .big_integer()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Deliveries::Status).string_len(32).not_null())
                        .col(ColumnDef::new(Deliveries::Carrier).string().null())
                        .col(ColumnDef::new(Deliveries::TrackingNumber).string().null())
                        .col(
                            ColumnDef::new(Deliveries::ActualDeliveryDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Deliveries::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Deliveries::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_deliveries_delivery_order_id")
                                .from(Deliveries::Table, Deliveries::DeliveryOrderId)
                                .to(DeliveryOrders::Table, DeliveryOrders::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Deliveries::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DeliveryOrderLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DeliveryOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum DeliveryOrders {
        Table,
        Id,
        OrderNumber,
        CustomerId,
        Status,
        ExpectedDeliveryDate,
        ActualDeliveryDate,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum DeliveryOrderLines {
        Table,
        Id,
        DeliveryOrderId,
        ProductId,
        Quantity,
        UnitPrice,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Deliveries {
        Table,
        Id,
        DeliveryNumber,
        DeliveryOrderId,
        Status,
        Carrier,
        TrackingNumber,
        ActualDeliveryDate,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000005_create_supply_tables {
    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_master_data::{RawMaterials, Suppliers};

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_supply_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SupplyOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplyOrders::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(SupplyOrders::OrderNumber)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(SupplyOrders::SupplierId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplyOrders::Status)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplyOrders::ExpectedDeliveryDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(SupplyOrders::ActualDeliveryDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(SupplyOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplyOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_supply_orders_supplier_id")
                                .from(SupplyOrders::Table, SupplyOrders::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_supply_orders_status")
                        .table(SupplyOrders::Table)
                        .col(SupplyOrders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SupplyOrderLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplyOrderLines::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(SupplyOrderLines::SupplyOrderId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplyOrderLines::RawMaterialId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplyOrderLines::Quantity)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplyOrderLines::UnitPrice)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplyOrderLines::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplyOrderLines::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_supply_order_lines_order_id")
                                .from(SupplyOrderLines::Table, SupplyOrderLines::SupplyOrderId)
                                .to(SupplyOrders::Table, SupplyOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_supply_order_lines_raw_material_id")
                                .from(SupplyOrderLines::Table, SupplyOrderLines::RawMaterialId)
                                .to(RawMaterials::Table, RawMaterials::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_supply_order_lines_order_id")
                        .table(SupplyOrderLines::Table)
                        .col(SupplyOrderLines::SupplyOrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SupplyOrderLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SupplyOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum SupplyOrders {
        Table,
        Id,
        OrderNumber,
        SupplierId,
        Status,
        ExpectedDeliveryDate,
        ActualDeliveryDate,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum SupplyOrderLines {
        Table,
        Id,
        SupplyOrderId,
        RawMaterialId,
        Quantity,
        UnitPrice,
        CreatedAt,
        UpdatedAt,
    }
}
