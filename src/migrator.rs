// The sea-orm `MigrationTrait` methods take `&SchemaManager` with a late-bound
// lifetime that cannot be written explicitly as `<'_>` (doing so makes it
// early-bound and fails E0195). Allow the elided-lifetime lint here so the
// crate-wide `deny(rust_2018_idioms)` does not reject the required signature.
#![allow(elided_lifetimes_in_paths)]

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_user_table::Migration),
            Box::new(m20240101_000002_create_menu_item_table::Migration),
            Box::new(m20240101_000003_create_item_image_table::Migration),
            Box::new(m20240101_000004_create_order_table::Migration),
            Box::new(m20240101_000005_create_order_item_table::Migration),
            Box::new(m20240101_000006_create_payment_table::Migration),
            Box::new(m20240101_000007_create_notifications_table::Migration),
        ]
    }
}

mod m20240101_000001_create_user_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_user_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(User::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(User::UserId).uuid().primary_key().not_null())
                        .col(ColumnDef::new(User::Email).string().not_null())
                        .col(ColumnDef::new(User::Name).string().null())
                        .col(ColumnDef::new(User::Role).string().null())
                        .col(ColumnDef::new(User::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_user_email")
                        .table(User::Table)
                        .col(User::Email)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(User::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum User {
        Table,
        UserId,
        Email,
        Name,
        Role,
        CreatedAt,
    }
}

mod m20240101_000002_create_menu_item_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_menu_item_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MenuItem::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MenuItem::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MenuItem::Name).string().not_null())
                        .col(ColumnDef::new(MenuItem::Price).decimal().null())
                        .col(ColumnDef::new(MenuItem::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MenuItem::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum MenuItem {
        Table,
        Id,
        Name,
        Price,
        CreatedAt,
    }
}

mod m20240101_000003_create_item_image_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_item_image_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ItemImage::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ItemImage::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ItemImage::MenuItemId).uuid().not_null())
                        .col(ColumnDef::new(ItemImage::Url).string().not_null())
                        .col(
                            ColumnDef::new(ItemImage::Position)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(ItemImage::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_item_image_menu_item_id")
                        .table(ItemImage::Table)
                        .col(ItemImage::MenuItemId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ItemImage::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ItemImage {
        Table,
        Id,
        MenuItemId,
        Url,
        Position,
        CreatedAt,
    }
}

mod m20240101_000004_create_order_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_order_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Order::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Order::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Order::UserId).uuid().not_null())
                        .col(ColumnDef::new(Order::Status).string().not_null())
                        .col(
                            ColumnDef::new(Order::Total)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Order::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Order::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_user_id")
                        .table(Order::Table)
                        .col(Order::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_status")
                        .table(Order::Table)
                        .col(Order::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Order::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Order {
        Table,
        Id,
        UserId,
        Status,
        Total,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000005_create_order_item_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_order_item_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderItem::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItem::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItem::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItem::MenuItemId).uuid().not_null())
                        .col(ColumnDef::new(OrderItem::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(OrderItem::Subtotal)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(OrderItem::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_item_order_id")
                        .table(OrderItem::Table)
                        .col(OrderItem::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItem::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum OrderItem {
        Table,
        Id,
        OrderId,
        MenuItemId,
        Quantity,
        Subtotal,
        CreatedAt,
    }
}

mod m20240101_000006_create_payment_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_payment_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Payment::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Payment::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Payment::OrderId).uuid().not_null())
                        .col(ColumnDef::new(Payment::Amount).decimal().not_null())
                        .col(ColumnDef::new(Payment::Method).string().not_null())
                        .col(ColumnDef::new(Payment::Status).string().not_null())
                        .col(ColumnDef::new(Payment::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Payment::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payment_order_id")
                        .table(Payment::Table)
                        .col(Payment::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payment_status")
                        .table(Payment::Table)
                        .col(Payment::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Payment::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Payment {
        Table,
        Id,
        OrderId,
        Amount,
        Method,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000007_create_notifications_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_notifications_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Notifications::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Notifications::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Notifications::UserId).uuid().not_null())
                        .col(ColumnDef::new(Notifications::Message).string().not_null())
                        .col(
                            ColumnDef::new(Notifications::IsRead)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Notifications::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_notifications_user_id")
                        .table(Notifications::Table)
                        .col(Notifications::UserId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Notifications::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Notifications {
        Table,
        Id,
        UserId,
        Message,
        IsRead,
        CreatedAt,
    }
}
