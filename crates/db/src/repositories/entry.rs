//! Entry and posting repository.
//!
//! Entries and their postings are written together and never edited, except
//! for the status and approval columns changed by a guarded update.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
};
use snel_core::ledger::balance::{BalanceSums, PostingSums, StatementPosting};
use snel_core::ledger::{
    Direction, EntryDetails, EntryFilter, LedgerEntry, LedgerError, LedgerPosting,
};
use snel_core::workflow::EntryStatus;
use snel_shared::types::{
    AccountId, CurrencyCode, EntryId, PageRequest, PageResponse, PostingId, UserId,
};
use uuid::Uuid;

use crate::entities::sea_orm_active_enums as db_enums;
use crate::entities::{ledger_entries, ledger_postings};

use super::{RowError, is_unique_violation, money, storage};

/// Statuses whose postings count toward the balance.
const COMMITTED: [db_enums::EntryStatus; 2] =
    [db_enums::EntryStatus::Posted, db_enums::EntryStatus::Reversed];

/// Entry repository over any connection or transaction.
pub struct EntryRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> EntryRepository<'a, C> {
    /// Creates a repository borrowing `conn`.
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Inserts an entry and all of its postings.
    ///
    /// Run inside a transaction, after the accounts were checked there, to
    /// make the write atomic.
    ///
    /// # Errors
    ///
    /// Returns `Storage` for a duplicate reference or any database failure.
    pub async fn insert(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        let details = serde_json::to_value(&entry.details)
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        let row = ledger_entries::ActiveModel {
            id: Set(entry.id.into_inner()),
            reference: Set(entry.reference.clone()),
            entry_type: Set(entry.entry_type().into()),
            details: Set(details),
            currency: Set(entry.currency.as_str().to_string()),
            status: Set(entry.status.into()),
            created_by: Set(entry.created_by.into_inner()),
            initiated_as: Set(entry.initiated_as.into()),
            approved_by: Set(entry.approved_by.map(UserId::into_inner)),
            approved_at: Set(entry.approved_at),
            memo: Set(entry.memo.clone()),
            created_at: Set(entry.created_at),
        };
        if let Err(err) = row.insert(self.conn).await {
            if is_unique_violation(&err) {
                return Err(LedgerError::Storage(format!(
                    "duplicate entry reference {}",
                    entry.reference
                )));
            }
            return Err(storage(err));
        }

        let postings = entry
            .postings
            .iter()
            .zip(0i32..)
            .map(|(posting, position)| ledger_postings::ActiveModel {
                id: Set(posting.id.into_inner()),
                entry_id: Set(entry.id.into_inner()),
                account_id: Set(posting.account_id.into_inner()),
                position: Set(position),
                direction: Set(posting.direction.into()),
                amount: Set(posting.amount),
                description: Set(posting.description.clone()),
            })
            .collect::<Vec<_>>();
        if !postings.is_empty() {
            ledger_postings::Entity::insert_many(postings)
                .exec(self.conn)
                .await
                .map_err(storage)?;
        }
        Ok(())
    }

    /// Finds an entry with its postings.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails or a row is corrupt.
    pub async fn find_by_id(&self, id: EntryId) -> Result<Option<LedgerEntry>, LedgerError> {
        self.load_one(ledger_entries::Entity::find_by_id(id.into_inner()))
            .await
    }

    /// Finds an entry and, on Postgres, row-locks it until the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails or a row is corrupt.
    pub async fn find_for_update(&self, id: EntryId) -> Result<Option<LedgerEntry>, LedgerError> {
        let mut query = ledger_entries::Entity::find_by_id(id.into_inner());
        if self.conn.get_database_backend() == DbBackend::Postgres {
            query = query.lock_exclusive();
        }
        self.load_one(query).await
    }

    /// Current status of an entry.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails.
    pub async fn status_of(&self, id: EntryId) -> Result<Option<EntryStatus>, LedgerError> {
        Ok(ledger_entries::Entity::find_by_id(id.into_inner())
            .one(self.conn)
            .await
            .map_err(storage)?
            .map(|row| row.status.into()))
    }

    /// Writes the status and approval columns of `entry`, but only if the
    /// stored status is still `expected`. Returns the number of rows changed.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the update fails.
    pub async fn compare_and_set(
        &self,
        entry: &LedgerEntry,
        expected: EntryStatus,
    ) -> Result<u64, LedgerError> {
        let result = ledger_entries::Entity::update_many()
            .col_expr(
                ledger_entries::Column::Status,
                Expr::value(db_enums::EntryStatus::from(entry.status)),
            )
            .col_expr(
                ledger_entries::Column::ApprovedBy,
                Expr::value(entry.approved_by.map(UserId::into_inner)),
            )
            .col_expr(
                ledger_entries::Column::ApprovedAt,
                Expr::value(entry.approved_at),
            )
            .filter(ledger_entries::Column::Id.eq(entry.id.into_inner()))
            .filter(ledger_entries::Column::Status.eq(db_enums::EntryStatus::from(expected)))
            .exec(self.conn)
            .await
            .map_err(storage)?;

        Ok(result.rows_affected)
    }

    /// Lists entries matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails or a row is corrupt.
    pub async fn list(
        &self,
        filter: &EntryFilter,
        page: PageRequest,
    ) -> Result<PageResponse<LedgerEntry>, LedgerError> {
        let query = filtered(filter);
        let total = query.clone().count(self.conn).await.map_err(storage)?;
        let rows = query
            .order_by_desc(ledger_entries::Column::CreatedAt)
            .order_by_desc(ledger_entries::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(self.conn)
            .await
            .map_err(storage)?;

        let data = self.attach_postings(rows).await?;
        Ok(PageResponse::new(data, page, total))
    }

    /// Posting totals of one account by status.
    ///
    /// Declined postings are dropped.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails.
    pub async fn balance_sums(&self, account_id: AccountId) -> Result<BalanceSums, LedgerError> {
        let rows: Vec<(String, String, Option<Decimal>)> = ledger_postings::Entity::find()
            .select_only()
            .column(ledger_entries::Column::Status)
            .column(ledger_postings::Column::Direction)
            .column_as(
                Expr::col((ledger_postings::Entity, ledger_postings::Column::Amount)).sum(),
                "total",
            )
            .join(JoinType::InnerJoin, ledger_postings::Relation::LedgerEntries.def())
            .filter(ledger_postings::Column::AccountId.eq(account_id.into_inner()))
            .group_by(ledger_entries::Column::Status)
            .group_by(ledger_postings::Column::Direction)
            .into_tuple()
            .all(self.conn)
            .await
            .map_err(storage)?;

        let mut sums = BalanceSums::default();
        for (status, direction, total) in rows {
            let status = EntryStatus::parse(&status)
                .ok_or_else(|| LedgerError::Storage(format!("unknown entry status {status}")))?;
            let bucket = if status.counts_toward_balance() {
                &mut sums.committed
            } else if status == EntryStatus::Pending {
                &mut sums.pending
            } else {
                continue;
            };
            bucket.add(parse_direction(&direction)?, money(total.unwrap_or_default()));
        }
        Ok(sums)
    }

    /// Committed posting totals across `accounts` within `[from, before)`.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails.
    pub async fn committed_sums(
        &self,
        accounts: &[AccountId],
        from: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Result<PostingSums, LedgerError> {
        let mut query = ledger_postings::Entity::find()
            .select_only()
            .column(ledger_postings::Column::Direction)
            .column_as(
                Expr::col((ledger_postings::Entity, ledger_postings::Column::Amount)).sum(),
                "total",
            )
            .join(JoinType::InnerJoin, ledger_postings::Relation::LedgerEntries.def())
            .filter(
                ledger_postings::Column::AccountId
                    .is_in(accounts.iter().map(|id| id.into_inner())),
            )
            .filter(ledger_entries::Column::Status.is_in(COMMITTED));
        if let Some(from) = from {
            query = query.filter(ledger_entries::Column::CreatedAt.gte(from));
        }
        if let Some(before) = before {
            query = query.filter(ledger_entries::Column::CreatedAt.lt(before));
        }

        let rows: Vec<(String, Option<Decimal>)> = query
            .group_by(ledger_postings::Column::Direction)
            .into_tuple()
            .all(self.conn)
            .await
            .map_err(storage)?;

        let mut sums = PostingSums::default();
        for (direction, total) in rows {
            sums.add(parse_direction(&direction)?, money(total.unwrap_or_default()));
        }
        Ok(sums)
    }

    /// Committed postings of one account within `[from, to)`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails or a row is corrupt.
    pub async fn statement_postings(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<StatementPosting>, LedgerError> {
        let rows = ledger_postings::Entity::find()
            .find_also_related(ledger_entries::Entity)
            .filter(ledger_postings::Column::AccountId.eq(account_id.into_inner()))
            .filter(ledger_entries::Column::Status.is_in(COMMITTED))
            .filter(ledger_entries::Column::CreatedAt.gte(from))
            .filter(ledger_entries::Column::CreatedAt.lt(to))
            .order_by_asc(ledger_entries::Column::CreatedAt)
            .order_by_asc(ledger_entries::Column::Id)
            .order_by_asc(ledger_postings::Column::Position)
            .all(self.conn)
            .await
            .map_err(storage)?;

        rows.into_iter()
            .filter_map(|(posting, entry)| entry.map(|entry| (posting, entry)))
            .map(|(posting, entry)| {
                Ok(StatementPosting {
                    entry_id: EntryId::from_uuid(entry.id),
                    reference: entry.reference,
                    entry_type: entry.entry_type.into(),
                    created_at: entry.created_at,
                    direction: posting.direction.into(),
                    amount: money(posting.amount),
                    description: posting.description,
                })
            })
            .collect()
    }

    async fn load_one(
        &self,
        query: Select<ledger_entries::Entity>,
    ) -> Result<Option<LedgerEntry>, LedgerError> {
        let Some(row) = query.one(self.conn).await.map_err(storage)? else {
            return Ok(None);
        };
        Ok(self.attach_postings(vec![row]).await?.pop())
    }

    async fn attach_postings(
        &self,
        rows: Vec<ledger_entries::Model>,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let postings = ledger_postings::Entity::find()
            .filter(ledger_postings::Column::EntryId.is_in(rows.iter().map(|r| r.id)))
            .order_by_asc(ledger_postings::Column::EntryId)
            .order_by_asc(ledger_postings::Column::Position)
            .all(self.conn)
            .await
            .map_err(storage)?;

        let mut by_entry: HashMap<Uuid, Vec<ledger_postings::Model>> = HashMap::new();
        for posting in postings {
            by_entry.entry(posting.entry_id).or_default().push(posting);
        }

        rows.into_iter()
            .map(|row| {
                let postings = by_entry.remove(&row.id).unwrap_or_default();
                to_domain(row, postings)
            })
            .collect()
    }
}

/// Builds the entry query for `filter`, without ordering or paging.
fn filtered(filter: &EntryFilter) -> Select<ledger_entries::Entity> {
    let mut query = ledger_entries::Entity::find();
    if let Some(status) = filter.status {
        query = query.filter(ledger_entries::Column::Status.eq(db_enums::EntryStatus::from(status)));
    }
    if let Some(entry_type) = filter.entry_type {
        query = query
            .filter(ledger_entries::Column::EntryType.eq(db_enums::EntryType::from(entry_type)));
    }
    if let Some(user) = filter.created_by {
        query = query.filter(ledger_entries::Column::CreatedBy.eq(user.into_inner()));
    }
    if let Some(accounts) = &filter.accounts {
        query = query.filter(
            ledger_entries::Column::Id.in_subquery(
                Query::select()
                    .column(ledger_postings::Column::EntryId)
                    .from(ledger_postings::Entity)
                    .and_where(
                        ledger_postings::Column::AccountId
                            .is_in(accounts.iter().map(|id| id.into_inner())),
                    )
                    .to_owned(),
            ),
        );
    }
    if let Some(from) = filter.created_from {
        query = query.filter(ledger_entries::Column::CreatedAt.gte(from));
    }
    if let Some(before) = filter.created_before {
        query = query.filter(ledger_entries::Column::CreatedAt.lt(before));
    }
    query
}

fn parse_direction(value: &str) -> Result<Direction, LedgerError> {
    Direction::parse(value)
        .ok_or_else(|| LedgerError::Storage(format!("unknown posting direction {value}")))
}

/// Converts a stored entry and its postings into a domain entry.
///
/// # Errors
///
/// Returns `RowError` if the row violates the domain's invariants.
pub fn to_domain(
    row: ledger_entries::Model,
    postings: Vec<ledger_postings::Model>,
) -> Result<LedgerEntry, LedgerError> {
    let details: EntryDetails =
        serde_json::from_value(row.details).map_err(|source| RowError::Details {
            id: row.id,
            source,
        })?;
    let currency = CurrencyCode::parse(&row.currency).map_err(|_| RowError::Currency {
        id: row.id,
        currency: row.currency.clone(),
    })?;
    let entry_id = EntryId::from_uuid(row.id);

    Ok(LedgerEntry {
        id: entry_id,
        reference: row.reference,
        details,
        currency,
        created_by: UserId::from_uuid(row.created_by),
        initiated_as: row.initiated_as.into(),
        created_at: row.created_at,
        status: row.status.into(),
        approved_by: row.approved_by.map(UserId::from_uuid),
        approved_at: row.approved_at,
        memo: row.memo,
        postings: postings
            .into_iter()
            .map(|p| LedgerPosting {
                id: PostingId::from_uuid(p.id),
                entry_id,
                account_id: AccountId::from_uuid(p.account_id),
                direction: p.direction.into(),
                amount: money(p.amount),
                description: p.description,
            })
            .collect(),
    })
}
