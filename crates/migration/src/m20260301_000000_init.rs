//! Initial schema migration - creates all tables from scratch.
//!
//! - `users`: authentication and roles
//! - `accounts`: coin and wallet balances, one row per user, created lazily
//! - `transactions`: immutable log of every balance movement
//! - `campaigns`: advertising campaigns and their payment state
//! - `thread_messages`: per-account chat thread, including withdrawal requests

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
    Role,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    CoinBalance,
    WalletBalanceMinor,
    UpdatedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    AccountId,
    Kind,
    Amount,
    Status,
    CreatedAt,
    ExternalRef,
    IdempotencyKey,
    Note,
}

#[derive(Iden)]
enum Campaigns {
    Table,
    Id,
    AccountId,
    Name,
    FeeCoins,
    CostMinor,
    Status,
    RejectionReason,
    FeePaid,
    RefundTxnId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ThreadMessages {
    Table,
    Id,
    AccountId,
    Kind,
    Text,
    BankName,
    AccountTitle,
    Iban,
    AmountMinor,
    Status,
    Sender,
    IsRead,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string()
                            .not_null()
                            .default("customer"),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::CoinBalance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Accounts::WalletBalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Accounts::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-accounts-id")
                            .from(Accounts::Table, Accounts::Id)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::AccountId).string().not_null())
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Status).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::ExternalRef).string())
                    .col(ColumnDef::new(Transactions::IdempotencyKey).string())
                    .col(ColumnDef::new(Transactions::Note).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-account_id-kind-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::AccountId)
                    .col(Transactions::Kind)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-external_ref-unique")
                    .table(Transactions::Table)
                    .col(Transactions::ExternalRef)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-account_id-idempotency_key-unique")
                    .table(Transactions::Table)
                    .col(Transactions::AccountId)
                    .col(Transactions::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Campaigns
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Campaigns::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Campaigns::AccountId).string().not_null())
                    .col(ColumnDef::new(Campaigns::Name).string().not_null())
                    .col(ColumnDef::new(Campaigns::FeeCoins).big_integer().not_null())
                    .col(ColumnDef::new(Campaigns::CostMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Campaigns::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Campaigns::RejectionReason).string())
                    .col(
                        ColumnDef::new(Campaigns::FeePaid)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Campaigns::RefundTxnId).string())
                    .col(ColumnDef::new(Campaigns::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Campaigns::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-campaigns-account_id")
                            .from(Campaigns::Table, Campaigns::AccountId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-campaigns-account_id-status")
                    .table(Campaigns::Table)
                    .col(Campaigns::AccountId)
                    .col(Campaigns::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Thread messages
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ThreadMessages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ThreadMessages::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ThreadMessages::AccountId).string().not_null())
                    .col(ColumnDef::new(ThreadMessages::Kind).string().not_null())
                    .col(ColumnDef::new(ThreadMessages::Text).string())
                    .col(ColumnDef::new(ThreadMessages::BankName).string())
                    .col(ColumnDef::new(ThreadMessages::AccountTitle).string())
                    .col(ColumnDef::new(ThreadMessages::Iban).string())
                    .col(ColumnDef::new(ThreadMessages::AmountMinor).big_integer())
                    .col(ColumnDef::new(ThreadMessages::Status).string())
                    .col(ColumnDef::new(ThreadMessages::Sender).string().not_null())
                    .col(
                        ColumnDef::new(ThreadMessages::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ThreadMessages::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-thread_messages-account_id")
                            .from(ThreadMessages::Table, ThreadMessages::AccountId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-thread_messages-account_id-status")
                    .table(ThreadMessages::Table)
                    .col(ThreadMessages::AccountId)
                    .col(ThreadMessages::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ThreadMessages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Campaigns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
