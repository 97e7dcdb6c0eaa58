//! Ledger schema: accounts, entries and postings.
//!
//! Balances are never stored. Postings are append-only; only the status
//! and approval columns of an entry ever change.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

/// Digits kept for posting amounts on Postgres.
const AMOUNT_PRECISION: u32 = 19;
/// Largest precision the SQLite builder accepts.
const SQLITE_AMOUNT_PRECISION: u32 = 16;
const AMOUNT_SCALE: u32 = 2;

/// Posting amount column: fixed two decimal places, strictly positive.
fn amount_column(backend: DatabaseBackend) -> ColumnDef {
    let precision = match backend {
        DatabaseBackend::Sqlite => SQLITE_AMOUNT_PRECISION,
        _ => AMOUNT_PRECISION,
    };
    ColumnDef::new(LedgerPostings::Amount)
        .decimal_len(precision, AMOUNT_SCALE)
        .not_null()
        .check(Expr::col(LedgerPostings::Amount).gt(0))
        .to_owned()
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Accounts::AccountNumber)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Accounts::OwnerKind).string_len(20).not_null())
                    .col(ColumnDef::new(Accounts::CustomerId).uuid().null())
                    .col(ColumnDef::new(Accounts::AccountType).string_len(20).not_null())
                    .col(ColumnDef::new(Accounts::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(Accounts::Status).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_accounts_customer")
                    .table(Accounts::Table)
                    .col(Accounts::CustomerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::Reference)
                            .string_len(12)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::EntryType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(LedgerEntries::Details).json().not_null())
                    .col(ColumnDef::new(LedgerEntries::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(LedgerEntries::Status).string_len(20).not_null())
                    .col(ColumnDef::new(LedgerEntries::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(LedgerEntries::InitiatedAs)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(LedgerEntries::ApprovedBy).uuid().null())
                    .col(
                        ColumnDef::new(LedgerEntries::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(LedgerEntries::Memo).text().not_null())
                    .col(
                        ColumnDef::new(LedgerEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Review queue and sweeper: PENDING entries by age.
        manager
            .create_index(
                Index::create()
                    .name("idx_ledger_entries_status_created")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::Status)
                    .col(LedgerEntries::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LedgerPostings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerPostings::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LedgerPostings::EntryId).uuid().not_null())
                    .col(ColumnDef::new(LedgerPostings::AccountId).uuid().not_null())
                    .col(ColumnDef::new(LedgerPostings::Position).integer().not_null())
                    .col(
                        ColumnDef::new(LedgerPostings::Direction)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(amount_column(backend))
                    .col(ColumnDef::new(LedgerPostings::Description).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_postings_entry")
                            .from(LedgerPostings::Table, LedgerPostings::EntryId)
                            .to(LedgerEntries::Table, LedgerEntries::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_postings_account")
                            .from(LedgerPostings::Table, LedgerPostings::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ledger_postings_account")
                    .table(LedgerPostings::Table)
                    .col(LedgerPostings::AccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ledger_postings_entry")
                    .table(LedgerPostings::Table)
                    .col(LedgerPostings::EntryId)
                    .col(LedgerPostings::Position)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LedgerPostings::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    AccountNumber,
    OwnerKind,
    CustomerId,
    AccountType,
    Currency,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum LedgerEntries {
    Table,
    Id,
    Reference,
    EntryType,
    Details,
    Currency,
    Status,
    CreatedBy,
    InitiatedAs,
    ApprovedBy,
    ApprovedAt,
    Memo,
    CreatedAt,
}

#[derive(DeriveIden)]
enum LedgerPostings {
    Table,
    Id,
    EntryId,
    AccountId,
    Position,
    Direction,
    Amount,
    Description,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postings_ddl(backend: DatabaseBackend) -> String {
        let table = Table::create()
            .table(LedgerPostings::Table)
            .col(amount_column(backend))
            .to_owned();
        match backend {
            DatabaseBackend::Sqlite => table.to_string(SqliteQueryBuilder),
            _ => table.to_string(PostgresQueryBuilder),
        }
    }

    #[test]
    fn test_amount_column_builds_on_sqlite() {
        let ddl = postings_ddl(DatabaseBackend::Sqlite);
        assert!(ddl.contains("(16, 2)"), "{ddl}");
        assert!(ddl.contains("CHECK"), "{ddl}");
    }

    #[test]
    fn test_amount_column_keeps_full_precision_on_postgres() {
        let ddl = postings_ddl(DatabaseBackend::Postgres);
        assert!(ddl.contains("(19, 2)"), "{ddl}");
    }
}
