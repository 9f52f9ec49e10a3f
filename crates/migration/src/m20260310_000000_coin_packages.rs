//! Adds the coin package price table.
//!
//! Coin bundles are priced server-side; a purchase request names a coin
//! amount and the price is looked up here, never taken from the client.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum CoinPackages {
    Table,
    Id,
    CoinAmount,
    PriceMinor,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CoinPackages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CoinPackages::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CoinPackages::CoinAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CoinPackages::PriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-coin_packages-coin_amount-unique")
                    .table(CoinPackages::Table)
                    .col(CoinPackages::CoinAmount)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CoinPackages::Table).to_owned())
            .await?;
        Ok(())
    }
}
