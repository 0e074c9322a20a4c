use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_people_tables::Migration),
            Box::new(m20240601_000002_create_purchasing_tables::Migration),
            Box::new(m20240601_000003_create_documents_table::Migration),
            Box::new(m20240601_000004_create_saved_views_table::Migration),
            Box::new(m20240601_000005_create_schedule_tables::Migration),
            Box::new(m20240601_000006_create_receipt_and_invoice_tables::Migration),
            Box::new(m20240601_000007_create_item_tables::Migration),
            Box::new(m20240601_000008_create_sales_tables::Migration),
        ]
    }
}

mod m20240601_000001_create_people_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000001_create_people_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Companies::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Companies::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Companies::Name).string().not_null())
                        .col(ColumnDef::new(Companies::Email).string().null())
                        .col(ColumnDef::new(Companies::Phone).string().null())
                        .col(ColumnDef::new(Companies::AddressLine1).string().null())
                        .col(ColumnDef::new(Companies::City).string().null())
                        .col(ColumnDef::new(Companies::PostalCode).string().null())
                        .col(ColumnDef::new(Companies::CountryCode).string().null())
                        .col(
                            ColumnDef::new(Companies::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Email).string().not_null())
                        .col(ColumnDef::new(Users::FullName).string().null())
                        .col(ColumnDef::new(Users::CompanyId).uuid().not_null())
                        .col(
                            ColumnDef::new(Users::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Users::DeactivatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Invites::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Invites::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Invites::Code).string().not_null())
                        .col(ColumnDef::new(Invites::Email).string().not_null())
                        .col(ColumnDef::new(Invites::CompanyId).uuid().not_null())
                        .col(
                            ColumnDef::new(Invites::AcceptedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Invites::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invites_email_company")
                        .table(Invites::Table)
                        .col(Invites::Email)
                        .col(Invites::CompanyId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Invites::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Companies::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Companies {
        Table,
        Id,
        Name,
        Email,
        Phone,
        AddressLine1,
        City,
        PostalCode,
        CountryCode,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        Email,
        FullName,
        CompanyId,
        Active,
        DeactivatedAt,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Invites {
        Table,
        Id,
        Code,
        Email,
        CompanyId,
        AcceptedAt,
        CreatedAt,
    }
}

mod m20240601_000002_create_purchasing_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000002_create_purchasing_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Suppliers::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Suppliers::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(ColumnDef::new(Suppliers::SupplierStatus).string().null())
                        .col(ColumnDef::new(Suppliers::TaxId).string().null())
                        .col(ColumnDef::new(Suppliers::CurrencyCode).string_len(3).null())
                        .col(ColumnDef::new(Suppliers::Website).string().null())
                        .col(ColumnDef::new(Suppliers::CreatedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(Suppliers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Suppliers::UpdatedBy).uuid().null())
                        .col(
                            ColumnDef::new(Suppliers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SupplierContacts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierContacts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SupplierContacts::SupplierId).uuid().not_null())
                        .col(ColumnDef::new(SupplierContacts::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(SupplierContacts::Email).string().not_null())
                        .col(ColumnDef::new(SupplierContacts::FullName).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_supplier_contacts_supplier")
                                .from(SupplierContacts::Table, SupplierContacts::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SupplierInteractions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierInteractions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SupplierInteractions::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(SupplierInteractions::SupplierId).uuid().not_null())
                        .col(
                            ColumnDef::new(SupplierInteractions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::PurchaseOrderId)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseOrders::SupplierId).uuid().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrders::SupplierInteractionId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::SupplierContactId).uuid().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::SupplierReference)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::Status)
                                .string_len(32)
                                .not_null()
                                .default("Draft"),
                        )
                        .col(ColumnDef::new(PurchaseOrders::OrderDate).date().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrders::CurrencyCode)
                                .string_len(3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::ExchangeRate)
                                .decimal_len(16, 6)
                                .not_null()
                                .default(1),
                        )
                        .col(ColumnDef::new(PurchaseOrders::InternalNotes).json_binary().null())
                        .col(ColumnDef::new(PurchaseOrders::ExternalNotes).json_binary().null())
                        .col(ColumnDef::new(PurchaseOrders::CustomFields).json_binary().null())
                        .col(ColumnDef::new(PurchaseOrders::CreatedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::UpdatedBy).uuid().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::ReleasedBy).uuid().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::ReleasedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_orders_company_status")
                        .table(PurchaseOrders::Table)
                        .col(PurchaseOrders::CompanyId)
                        .col(PurchaseOrders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::PurchaseOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderLines::CompanyId).uuid().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrderLines::Description)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::Quantity)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::UnitPrice)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::InternalNotes)
                                .json_binary()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::ExternalNotes)
                                .json_binary()
                                .null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderLines::UpdatedBy).uuid().null())
                        .col(
                            ColumnDef::new(PurchaseOrderLines::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_order_lines_order")
                                .from(
                                    PurchaseOrderLines::Table,
                                    PurchaseOrderLines::PurchaseOrderId,
                                )
                                .to(PurchaseOrders::Table, PurchaseOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderDeliveries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderDeliveries::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderDeliveries::CompanyId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderDeliveries::LocationId).uuid().null())
                        .col(
                            ColumnDef::new(PurchaseOrderDeliveries::SupplierShippingCost)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderDeliveries::ShippingMethodId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderDeliveries::ShippingTermId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderDeliveries::TrackingNumber)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderDeliveries::ReceiptRequestedDate)
                                .date()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderDeliveries::ReceiptPromisedDate)
                                .date()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderDeliveries::DeliveryDate)
                                .date()
                                .null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderDeliveries::Notes).text().null())
                        .col(
                            ColumnDef::new(PurchaseOrderDeliveries::DropShipment)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(PurchaseOrderDeliveries::CustomerId).uuid().null())
                        .col(
                            ColumnDef::new(PurchaseOrderDeliveries::CustomerLocationId)
                                .uuid()
                                .null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderDeliveries::UpdatedBy).uuid().null())
                        .col(
                            ColumnDef::new(PurchaseOrderDeliveries::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderPayments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderPayments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderPayments::CompanyId).uuid().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrderPayments::InvoiceSupplierId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderPayments::InvoiceSupplierContactId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderPayments::InvoiceSupplierLocationId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderPayments::PaymentTermId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderPayments::PaymentComplete)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(PurchaseOrderPayments::UpdatedBy).uuid().null())
                        .col(
                            ColumnDef::new(PurchaseOrderPayments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SupplierQuotes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierQuotes::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SupplierQuotes::SupplierQuoteId).string().not_null())
                        .col(ColumnDef::new(SupplierQuotes::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(SupplierQuotes::SupplierId).uuid().not_null())
                        .col(
                            ColumnDef::new(SupplierQuotes::SupplierInteractionId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SupplierQuotes::InternalNotes).json_binary().null())
                        .col(ColumnDef::new(SupplierQuotes::ExternalNotes).json_binary().null())
                        .col(ColumnDef::new(SupplierQuotes::UpdatedBy).uuid().null())
                        .col(
                            ColumnDef::new(SupplierQuotes::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SupplierQuoteLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierQuoteLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierQuoteLines::SupplierQuoteId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SupplierQuoteLines::CompanyId).uuid().not_null())
                        .col(
                            ColumnDef::new(SupplierQuoteLines::Description)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierQuoteLines::InternalNotes)
                                .json_binary()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(SupplierQuoteLines::ExternalNotes)
                                .json_binary()
                                .null(),
                        )
                        .col(ColumnDef::new(SupplierQuoteLines::UpdatedBy).uuid().null())
                        .col(
                            ColumnDef::new(SupplierQuoteLines::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                SupplierQuoteLines::Table.into_iden(),
                SupplierQuotes::Table.into_iden(),
                PurchaseOrderPayments::Table.into_iden(),
                PurchaseOrderDeliveries::Table.into_iden(),
                PurchaseOrderLines::Table.into_iden(),
                PurchaseOrders::Table.into_iden(),
                SupplierInteractions::Table.into_iden(),
                SupplierContacts::Table.into_iden(),
                Suppliers::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum Suppliers {
        Table,
        Id,
        CompanyId,
        Name,
        SupplierStatus,
        TaxId,
        CurrencyCode,
        Website,
        CreatedBy,
        CreatedAt,
        UpdatedBy,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum SupplierContacts {
        Table,
        Id,
        SupplierId,
        CompanyId,
        Email,
        FullName,
    }

    #[derive(DeriveIden)]
    enum SupplierInteractions {
        Table,
        Id,
        CompanyId,
        SupplierId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum PurchaseOrders {
        Table,
        Id,
        PurchaseOrderId,
        CompanyId,
        SupplierId,
        SupplierInteractionId,
        SupplierContactId,
        SupplierReference,
        Status,
        OrderDate,
        CurrencyCode,
        ExchangeRate,
        InternalNotes,
        ExternalNotes,
        CustomFields,
        CreatedBy,
        CreatedAt,
        UpdatedBy,
        UpdatedAt,
        ReleasedBy,
        ReleasedAt,
    }

    #[derive(DeriveIden)]
    enum PurchaseOrderLines {
        Table,
        Id,
        PurchaseOrderId,
        CompanyId,
        Description,
        Quantity,
        UnitPrice,
        InternalNotes,
        ExternalNotes,
        UpdatedBy,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum PurchaseOrderDeliveries {
        Table,
        Id,
        CompanyId,
        LocationId,
        SupplierShippingCost,
        ShippingMethodId,
        ShippingTermId,
        TrackingNumber,
        ReceiptRequestedDate,
        ReceiptPromisedDate,
        DeliveryDate,
        Notes,
        DropShipment,
        CustomerId,
        CustomerLocationId,
        UpdatedBy,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum PurchaseOrderPayments {
        Table,
        Id,
        CompanyId,
        InvoiceSupplierId,
        InvoiceSupplierContactId,
        InvoiceSupplierLocationId,
        PaymentTermId,
        PaymentComplete,
        UpdatedBy,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum SupplierQuotes {
        Table,
        Id,
        SupplierQuoteId,
        CompanyId,
        SupplierId,
        SupplierInteractionId,
        InternalNotes,
        ExternalNotes,
        UpdatedBy,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum SupplierQuoteLines {
        Table,
        Id,
        SupplierQuoteId,
        CompanyId,
        Description,
        InternalNotes,
        ExternalNotes,
        UpdatedBy,
        UpdatedAt,
    }
}

mod m20240601_000003_create_documents_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000003_create_documents_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Documents::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Documents::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Documents::Path)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Documents::Name).string().not_null())
                        .col(
                            ColumnDef::new(Documents::Size)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Documents::SourceDocument).string().null())
                        .col(ColumnDef::new(Documents::SourceDocumentId).string().null())
                        .col(ColumnDef::new(Documents::ReadGroups).json_binary().not_null())
                        .col(ColumnDef::new(Documents::WriteGroups).json_binary().not_null())
                        .col(ColumnDef::new(Documents::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(Documents::CreatedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(Documents::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Documents::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_documents_source")
                        .table(Documents::Table)
                        .col(Documents::SourceDocument)
                        .col(Documents::SourceDocumentId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Documents::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Documents {
        Table,
        Id,
        Path,
        Name,
        Size,
        SourceDocument,
        SourceDocumentId,
        ReadGroups,
        WriteGroups,
        CompanyId,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000004_create_saved_views_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000004_create_saved_views_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SavedViews::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(SavedViews::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(SavedViews::UserId).uuid().not_null())
                        .col(ColumnDef::new(SavedViews::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(SavedViews::GroupKey).string().not_null())
                        .col(ColumnDef::new(SavedViews::Name).string().not_null())
                        .col(ColumnDef::new(SavedViews::Path).string().not_null())
                        .col(
                            ColumnDef::new(SavedViews::SortOrder)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SavedViews::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_saved_views_user_group")
                        .table(SavedViews::Table)
                        .col(SavedViews::UserId)
                        .col(SavedViews::GroupKey)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SavedViews::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum SavedViews {
        Table,
        Id,
        UserId,
        CompanyId,
        GroupKey,
        Name,
        Path,
        SortOrder,
        CreatedAt,
    }
}

mod m20240601_000005_create_schedule_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000005_create_schedule_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ScheduleColumns::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ScheduleColumns::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ScheduleColumns::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(ScheduleColumns::Title).string().not_null())
                        .col(
                            ColumnDef::new(ScheduleColumns::SortOrder)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ScheduleColumns::Active)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ScheduleItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ScheduleItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ScheduleItems::ColumnId).uuid().not_null())
                        .col(ColumnDef::new(ScheduleItems::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(ScheduleItems::Title).string().not_null())
                        .col(
                            ColumnDef::new(ScheduleItems::Priority)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(ScheduleItems::DurationMs).big_integer().null())
                        .col(ColumnDef::new(ScheduleItems::ProgressMs).big_integer().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_schedule_items_column")
                                .from(ScheduleItems::Table, ScheduleItems::ColumnId)
                                .to(ScheduleColumns::Table, ScheduleColumns::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ScheduleItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ScheduleColumns::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ScheduleColumns {
        Table,
        Id,
        CompanyId,
        Title,
        SortOrder,
        Active,
    }

    #[derive(DeriveIden)]
    enum ScheduleItems {
        Table,
        Id,
        ColumnId,
        CompanyId,
        Title,
        Priority,
        DurationMs,
        ProgressMs,
    }
}

mod m20240601_000006_create_receipt_and_invoice_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000006_create_receipt_and_invoice_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Receipts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Receipts::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Receipts::ReceiptId).string().not_null())
                        .col(ColumnDef::new(Receipts::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(Receipts::SupplierId).uuid().null())
                        .col(ColumnDef::new(Receipts::SupplierInteractionId).uuid().null())
                        .col(ColumnDef::new(Receipts::InternalNotes).json_binary().null())
                        .col(ColumnDef::new(Receipts::ExternalNotes).json_binary().null())
                        .col(ColumnDef::new(Receipts::UpdatedBy).uuid().null())
                        .col(
                            ColumnDef::new(Receipts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseInvoices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseInvoices::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseInvoices::InvoiceId).string().not_null())
                        .col(ColumnDef::new(PurchaseInvoices::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseInvoices::SupplierId).uuid().not_null())
                        .col(
                            ColumnDef::new(PurchaseInvoices::SupplierInteractionId)
                                .uuid()
                                .null(),
                        )
                        .col(ColumnDef::new(PurchaseInvoices::InternalNotes).json_binary().null())
                        .col(ColumnDef::new(PurchaseInvoices::ExternalNotes).json_binary().null())
                        .col(ColumnDef::new(PurchaseInvoices::UpdatedBy).uuid().null())
                        .col(
                            ColumnDef::new(PurchaseInvoices::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseInvoiceLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseInvoiceLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseInvoiceLines::InvoiceId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseInvoiceLines::CompanyId).uuid().not_null())
                        .col(
                            ColumnDef::new(PurchaseInvoiceLines::Description)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseInvoiceLines::Quantity)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseInvoiceLines::UnitPrice)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseInvoiceLines::InternalNotes)
                                .json_binary()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseInvoiceLines::ExternalNotes)
                                .json_binary()
                                .null(),
                        )
                        .col(ColumnDef::new(PurchaseInvoiceLines::UpdatedBy).uuid().null())
                        .col(
                            ColumnDef::new(PurchaseInvoiceLines::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_invoice_lines_invoice")
                                .from(PurchaseInvoiceLines::Table, PurchaseInvoiceLines::InvoiceId)
                                .to(PurchaseInvoices::Table, PurchaseInvoices::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                PurchaseInvoiceLines::Table.into_iden(),
                PurchaseInvoices::Table.into_iden(),
                Receipts::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum Receipts {
        Table,
        Id,
        ReceiptId,
        CompanyId,
        SupplierId,
        SupplierInteractionId,
        InternalNotes,
        ExternalNotes,
        UpdatedBy,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum PurchaseInvoices {
        Table,
        Id,
        InvoiceId,
        CompanyId,
        SupplierId,
        SupplierInteractionId,
        InternalNotes,
        ExternalNotes,
        UpdatedBy,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum PurchaseInvoiceLines {
        Table,
        Id,
        InvoiceId,
        CompanyId,
        Description,
        Quantity,
        UnitPrice,
        InternalNotes,
        ExternalNotes,
        UpdatedBy,
        UpdatedAt,
    }
}

mod m20240601_000007_create_item_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000007_create_item_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ItemPostingGroups::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ItemPostingGroups::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ItemPostingGroups::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(ItemPostingGroups::Name).string().not_null())
                        .col(ColumnDef::new(ItemPostingGroups::Description).string().null())
                        .col(ColumnDef::new(ItemPostingGroups::CustomFields).json_binary().null())
                        .col(ColumnDef::new(ItemPostingGroups::CreatedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(ItemPostingGroups::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ItemPostingGroups::UpdatedBy).uuid().null())
                        .col(
                            ColumnDef::new(ItemPostingGroups::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_item_posting_groups_company_name")
                        .table(ItemPostingGroups::Table)
                        .col(ItemPostingGroups::CompanyId)
                        .col(ItemPostingGroups::Name)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ItemCosts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(ItemCosts::ItemId).uuid().primary_key().not_null())
                        .col(ColumnDef::new(ItemCosts::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(ItemCosts::ReadableId).string().not_null())
                        .col(
                            ColumnDef::new(ItemCosts::CostingMethod)
                                .string_len(16)
                                .not_null()
                                .default("Standard"),
                        )
                        .col(
                            ColumnDef::new(ItemCosts::StandardCost)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ItemCosts::UnitCost)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ItemCosts::CostIsAdjusted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(ItemCosts::ItemPostingGroupId).uuid().null())
                        .col(ColumnDef::new(ItemCosts::CustomFields).json_binary().null())
                        .col(ColumnDef::new(ItemCosts::UpdatedBy).uuid().null())
                        .col(
                            ColumnDef::new(ItemCosts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ItemCostHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ItemCostHistory::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ItemCostHistory::ItemId).uuid().not_null())
                        .col(ColumnDef::new(ItemCostHistory::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(ItemCostHistory::PostingDate).date().not_null())
                        .col(
                            ColumnDef::new(ItemCostHistory::Quantity)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ItemCostHistory::Cost)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ItemCostHistory::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                ItemCostHistory::Table.into_iden(),
                ItemCosts::Table.into_iden(),
                ItemPostingGroups::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum ItemPostingGroups {
        Table,
        Id,
        CompanyId,
        Name,
        Description,
        CustomFields,
        CreatedBy,
        CreatedAt,
        UpdatedBy,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ItemCosts {
        Table,
        ItemId,
        CompanyId,
        ReadableId,
        CostingMethod,
        StandardCost,
        UnitCost,
        CostIsAdjusted,
        ItemPostingGroupId,
        CustomFields,
        UpdatedBy,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ItemCostHistory {
        Table,
        Id,
        ItemId,
        CompanyId,
        PostingDate,
        Quantity,
        Cost,
        CreatedAt,
    }
}

mod m20240601_000008_create_sales_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000008_create_sales_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(QuoteOperations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QuoteOperations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(QuoteOperations::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(QuoteOperations::QuoteMakeMethodId).uuid().null())
                        .col(ColumnDef::new(QuoteOperations::Description).string().null())
                        .col(ColumnDef::new(QuoteOperations::WorkCenterId).uuid().null())
                        .col(
                            ColumnDef::new(QuoteOperations::SetupHours)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(QuoteOperations::LaborRate).decimal_len(16, 4).null())
                        .col(
                            ColumnDef::new(QuoteOperations::MachineRate)
                                .decimal_len(16, 4)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(QuoteOperations::OperationSupplierProcessId)
                                .uuid()
                                .null(),
                        )
                        .col(ColumnDef::new(QuoteOperations::WorkInstruction).json_binary().null())
                        .col(
                            ColumnDef::new(QuoteOperations::SortOrder)
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
                        .table(QuoteMaterials::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QuoteMaterials::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(QuoteMaterials::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(QuoteMaterials::QuoteMakeMethodId).uuid().not_null())
                        .col(ColumnDef::new(QuoteMaterials::ItemReadableId).string().not_null())
                        .col(
                            ColumnDef::new(QuoteMaterials::ItemType)
                                .string_len(32)
                                .not_null()
                                .default("Part"),
                        )
                        .col(ColumnDef::new(QuoteMaterials::Description).string().not_null())
                        .col(
                            ColumnDef::new(QuoteMaterials::Quantity)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(QuoteMaterials::UnitCost)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(QuoteMaterials::UnitOfMeasureCode).string().null())
                        .col(ColumnDef::new(QuoteMaterials::QuoteOperationId).uuid().null())
                        .col(
                            ColumnDef::new(QuoteMaterials::SortOrder)
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
                        .table(SalesRfqs::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(SalesRfqs::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(SalesRfqs::RfqId).string().not_null())
                        .col(ColumnDef::new(SalesRfqs::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(SalesRfqs::CustomerId).uuid().null())
                        .col(
                            ColumnDef::new(SalesRfqs::Status)
                                .string_len(32)
                                .not_null()
                                .default("Draft"),
                        )
                        .col(ColumnDef::new(SalesRfqs::CreatedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(SalesRfqs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SalesRfqLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SalesRfqLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SalesRfqLines::SalesRfqId).uuid().not_null())
                        .col(ColumnDef::new(SalesRfqLines::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(SalesRfqLines::CustomerPartId).string().not_null())
                        .col(
                            ColumnDef::new(SalesRfqLines::CustomerPartRevision)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(SalesRfqLines::Description).string().null())
                        .col(ColumnDef::new(SalesRfqLines::ItemId).uuid().null())
                        .col(
                            ColumnDef::new(SalesRfqLines::Quantity)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(SalesRfqLines::UnitOfMeasureCode)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SalesRfqLines::CustomFields).json_binary().null())
                        .col(ColumnDef::new(SalesRfqLines::CreatedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(SalesRfqLines::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sales_rfq_lines_rfq")
                                .from(SalesRfqLines::Table, SalesRfqLines::SalesRfqId)
                                .to(SalesRfqs::Table, SalesRfqs::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                SalesRfqLines::Table.into_iden(),
                SalesRfqs::Table.into_iden(),
                QuoteMaterials::Table.into_iden(),
                QuoteOperations::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum QuoteOperations {
        Table,
        Id,
        CompanyId,
        QuoteMakeMethodId,
        Description,
        WorkCenterId,
        SetupHours,
        LaborRate,
        MachineRate,
        OperationSupplierProcessId,
        WorkInstruction,
        SortOrder,
    }

    #[derive(DeriveIden)]
    enum QuoteMaterials {
        Table,
        Id,
        CompanyId,
        QuoteMakeMethodId,
        ItemReadableId,
        ItemType,
        Description,
        Quantity,
        UnitCost,
        UnitOfMeasureCode,
        QuoteOperationId,
        SortOrder,
    }

    #[derive(DeriveIden)]
    enum SalesRfqs {
        Table,
        Id,
        RfqId,
        CompanyId,
        CustomerId,
        Status,
        CreatedBy,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum SalesRfqLines {
        Table,
        Id,
        SalesRfqId,
        CompanyId,
        CustomerPartId,
        CustomerPartRevision,
        Description,
        ItemId,
        Quantity,
        UnitOfMeasureCode,
        CustomFields,
        CreatedBy,
        CreatedAt,
    }
}
