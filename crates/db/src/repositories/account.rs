//! Account repository.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use snel_core::ledger::{Account, AccountOwner, AccountStatus, LedgerError};
use snel_shared::types::{AccountId, CurrencyCode, CustomerId};

use crate::entities::accounts;
use crate::entities::sea_orm_active_enums::{self as db_enums, OwnerKind};

use super::{RowError, storage};

/// Account repository over any connection or transaction.
pub struct AccountRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> AccountRepository<'a, C> {
    /// Creates a repository borrowing `conn`.
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Inserts a new account row.
    ///
    /// The raw `DbErr` is returned so callers can tell a taken account
    /// number apart from other failures.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert(&self, account: &Account) -> Result<(), DbErr> {
        let (owner_kind, customer_id) = match account.owner {
            AccountOwner::Customer(customer) => (OwnerKind::Customer, Some(customer.into_inner())),
            AccountOwner::System => (OwnerKind::System, None),
        };

        accounts::ActiveModel {
            id: Set(account.id.into_inner()),
            account_number: Set(account.account_number.clone()),
            owner_kind: Set(owner_kind),
            customer_id: Set(customer_id),
            account_type: Set(account.account_type.into()),
            currency: Set(account.currency.as_str().to_string()),
            status: Set(account.status.into()),
            created_at: Set(account.created_at),
        }
        .insert(self.conn)
        .await?;

        Ok(())
    }

    /// Finds an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails or the row is corrupt.
    pub async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, LedgerError> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(self.conn)
            .await
            .map_err(storage)?
            .map(to_domain)
            .transpose()
    }

    /// Finds an account by its account number.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails or the row is corrupt.
    pub async fn find_by_number(&self, number: &str) -> Result<Option<Account>, LedgerError> {
        accounts::Entity::find()
            .filter(accounts::Column::AccountNumber.eq(number))
            .one(self.conn)
            .await
            .map_err(storage)?
            .map(to_domain)
            .transpose()
    }

    /// Finds every account in `ids` that exists.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails or a row is corrupt.
    pub async fn find_many(&self, ids: &[AccountId]) -> Result<Vec<Account>, LedgerError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        accounts::Entity::find()
            .filter(accounts::Column::Id.is_in(ids.iter().map(|id| id.into_inner())))
            .all(self.conn)
            .await
            .map_err(storage)?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    /// Finds several accounts and, on Postgres, share-locks them until the
    /// transaction ends. A concurrent status change waits for the commit.
    ///
    /// Rows are locked in id order.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails or a row is corrupt.
    pub async fn find_many_for_share(&self, ids: &[AccountId]) -> Result<Vec<Account>, LedgerError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query = accounts::Entity::find()
            .filter(accounts::Column::Id.is_in(ids.iter().map(|id| id.into_inner())))
            .order_by_asc(accounts::Column::Id);
        if self.conn.get_database_backend() == DbBackend::Postgres {
            query = query.lock_shared();
        }
        query
            .all(self.conn)
            .await
            .map_err(storage)?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    /// Lists an owner's accounts, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails or a row is corrupt.
    pub async fn list_by_owner(&self, owner: AccountOwner) -> Result<Vec<Account>, LedgerError> {
        let query = match owner {
            AccountOwner::Customer(customer) => accounts::Entity::find()
                .filter(accounts::Column::OwnerKind.eq(OwnerKind::Customer))
                .filter(accounts::Column::CustomerId.eq(customer.into_inner())),
            AccountOwner::System => {
                accounts::Entity::find().filter(accounts::Column::OwnerKind.eq(OwnerKind::System))
            }
        };

        query
            .order_by_asc(accounts::Column::CreatedAt)
            .order_by_asc(accounts::Column::AccountNumber)
            .all(self.conn)
            .await
            .map_err(storage)?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    /// Sets an account's status. Returns the number of rows changed.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the update fails.
    pub async fn update_status(&self, id: AccountId, status: AccountStatus) -> Result<u64, LedgerError> {
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Status,
                Expr::value(db_enums::AccountStatus::from(status)),
            )
            .filter(accounts::Column::Id.eq(id.into_inner()))
            .exec(self.conn)
            .await
            .map_err(storage)?;

        Ok(result.rows_affected)
    }
}

/// Converts a stored row into a domain account.
///
/// # Errors
///
/// Returns `RowError` if the row violates the domain's invariants.
pub fn to_domain(model: accounts::Model) -> Result<Account, LedgerError> {
    let owner = match (model.owner_kind, model.customer_id) {
        (OwnerKind::Customer, Some(customer)) => {
            AccountOwner::Customer(CustomerId::from_uuid(customer))
        }
        (OwnerKind::Customer, None) => return Err(RowError::MissingCustomer(model.id).into()),
        (OwnerKind::System, _) => AccountOwner::System,
    };
    let currency = CurrencyCode::parse(&model.currency).map_err(|_| RowError::Currency {
        id: model.id,
        currency: model.currency.clone(),
    })?;

    Ok(Account {
        id: AccountId::from_uuid(model.id),
        owner,
        account_type: model.account_type.into(),
        currency,
        status: model.status.into(),
        account_number: model.account_number,
        created_at: model.created_at,
    })
}
