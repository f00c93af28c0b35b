//! Postgres-backed ledger store.
//!
//! Every session is one database transaction. The tenant is bound with
//! `set_config('app.current_tenant_id', $1, true)`, which is transaction-local:
//! it is reset at commit or rollback and never leaks to the next user of the
//! pooled connection. Row-level security policies key on that setting, and
//! every scoped query also carries an explicit `tenant_id = $1` predicate.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `LedgerError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | LedgerError | Scenario |
//! |------------|----------------------|-------------|----------|
//! | Database (unique violation) | `23505` | `FailedPrecondition` | Account number already used by the tenant |
//! | Database (foreign key violation) | `23503` | `InvalidInput` | Unknown account type, currency or parent |
//! | Database (`account_balances_within_range`) | `23514` | `FailedPrecondition` | Running balance would overflow |
//! | Database (check constraint violation) | `23514` | `InvalidInput` | Negative amount, empty required column |
//! | Database (other) | Any other | `Internal` | |
//! | PoolTimedOut / PoolClosed / Io | N/A | `Unavailable` | Pool exhausted, shutting down, network |
//! | Other | N/A | `Internal` | |

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tokio::time::timeout;
use tracing::{debug, instrument, Span};

use tally_accounting::{
    Account, AccountBalance, AccountType, BalanceDelta, Currency, JournalEntry, JournalEntryLine,
    NormalBalance, Tenant,
};
use tally_core::{
    AccountId, JournalEntryId, JournalLineId, LedgerError, LedgerResult, OperationContext, Page,
    Pagination, TenantId,
};

use crate::config::DatabaseConfig;
use crate::store::{AccountFilter, JournalFilter, LedgerStore, ScopedSession};

const SCHEMA: &str = include_str!("../migrations/0001_ledger_schema.sql");

/// Check constraint that keeps running balances decodable.
const BALANCE_RANGE_CONSTRAINT: &str = "account_balances_within_range";

/// Postgres-backed ledger store.
///
/// Uses SQLx connection pool which is thread-safe (Arc + Send + Sync). The
/// pool's `max_connections` bounds the number of concurrent sessions.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: Arc<PgPool>,
    acquire_timeout: Duration,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool, acquire_timeout: Duration) -> Self {
        Self {
            pool: Arc::new(pool),
            acquire_timeout,
        }
    }

    /// Build the pool from configuration and connect eagerly.
    #[instrument(skip(config), fields(host = %config.host, dbname = %config.dbname), err)]
    pub async fn connect(config: &DatabaseConfig) -> LedgerResult<Self> {
        let options = config
            .connect_options()
            .map_err(|e| LedgerError::internal(e.to_string()))?;
        let pool = config
            .pool_options()
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        Ok(Self::new(pool, config.acquire_timeout()))
    }

    /// Apply the ledger schema. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> LedgerResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    type Session = PostgresSession;

    #[instrument(skip(self, tenant), fields(tenant_id = %tenant.id), err)]
    async fn insert_tenant(&self, tenant: &Tenant) -> LedgerResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tenants (id, name, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(tenant.id.as_uuid())
        .bind(&tenant.name)
        .bind(tenant.created_at)
        .bind(tenant.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_tenant", e))?;
        Ok(())
    }

    async fn tenant_by_id(&self, id: TenantId) -> LedgerResult<Option<Tenant>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, created_at, updated_at
            FROM tenants
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("tenant_by_id", e))?;

        row.map(|r| decode::<TenantRow>(&r).map(Into::into)).transpose()
    }

    async fn tenant_by_name(&self, name: &str) -> LedgerResult<Option<Tenant>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, created_at, updated_at
            FROM tenants
            WHERE name = $1
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("tenant_by_name", e))?;

        row.map(|r| decode::<TenantRow>(&r).map(Into::into)).transpose()
    }

    async fn list_account_types(&self) -> LedgerResult<Vec<AccountType>> {
        let rows = sqlx::query("SELECT id, code, name, normal_balance FROM account_types ORDER BY id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_account_types", e))?;

        rows.iter()
            .map(|r| decode::<AccountTypeRow>(r).and_then(TryInto::try_into))
            .collect()
    }

    async fn list_currencies(&self) -> LedgerResult<Vec<Currency>> {
        let rows =
            sqlx::query("SELECT id, code, name, symbol, precision FROM currencies ORDER BY code")
                .fetch_all(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("list_currencies", e))?;

        rows.iter()
            .map(|r| decode::<CurrencyRow>(r).map(Into::into))
            .collect()
    }

    #[instrument(skip(self, ctx), fields(tenant_id = %tenant_id), err)]
    async fn scope(&self, tenant_id: TenantId, ctx: &OperationContext) -> LedgerResult<PostgresSession> {
        if ctx.is_expired() {
            return Err(LedgerError::unavailable("deadline exceeded"));
        }

        let wait = ctx.bound(self.acquire_timeout);
        let mut tx = match timeout(wait, self.pool.begin()).await {
            Ok(tx) => tx.map_err(|e| map_sqlx_error("begin_transaction", e))?,
            Err(_) => {
                return Err(LedgerError::unavailable(format!(
                    "no connection available within {}ms",
                    wait.as_millis()
                )));
            }
        };

        sqlx::query("SELECT set_config('app.current_tenant_id', $1, true)")
            .bind(tenant_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| LedgerError::internal(format!("failed to set tenant context: {e}")))?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tenants WHERE id = $1)")
            .bind(tenant_id.as_uuid())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("scope", e))?;
        if !exists {
            return Err(LedgerError::not_found(format!("tenant {tenant_id}")));
        }

        debug!("session opened");
        Ok(PostgresSession { tenant_id, tx })
    }
}

/// Tenant-bound transaction. Dropping it rolls back.
pub struct PostgresSession {
    tenant_id: TenantId,
    tx: Transaction<'static, Postgres>,
}

impl std::fmt::Debug for PostgresSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresSession")
            .field("tenant_id", &self.tenant_id)
            .finish_non_exhaustive()
    }
}

const ACCOUNT_COLUMNS: &str = "id, tenant_id, account_number, name, description, account_type_id, \
     currency_code, parent_account_id, is_active, created_at, updated_at";

const LINE_COLUMNS: &str =
    "id, journal_entry_id, account_id, line_number, debit, credit, description, created_at";

impl PostgresSession {
    async fn lines_for(&mut self, entry_ids: &[uuid::Uuid]) -> LedgerResult<HashMap<uuid::Uuid, Vec<JournalEntryLine>>> {
        let rows = sqlx::query(&format!(
            "SELECT {LINE_COLUMNS} FROM journal_entry_lines \
             WHERE tenant_id = $1 AND journal_entry_id = ANY($2) \
             ORDER BY journal_entry_id, line_number, created_at"
        ))
        .bind(self.tenant_id.as_uuid())
        .bind(entry_ids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("load_lines", e))?;

        let mut grouped: HashMap<uuid::Uuid, Vec<JournalEntryLine>> = HashMap::new();
        for row in &rows {
            let line: JournalEntryLine = decode::<LineRow>(row)?.into();
            grouped
                .entry(*line.journal_entry_id.as_uuid())
                .or_default()
                .push(line);
        }
        Ok(grouped)
    }
}

#[async_trait]
impl ScopedSession for PostgresSession {
    async fn account_type_exists(&mut self, account_type_id: i32) -> LedgerResult<bool> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM account_types WHERE id = $1)")
            .bind(account_type_id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("account_type_exists", e))
    }

    async fn currency_exists(&mut self, code: &str) -> LedgerResult<bool> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM currencies WHERE code = $1)")
            .bind(code)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("currency_exists", e))
    }

    async fn find_account(&mut self, id: AccountId) -> LedgerResult<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(self.tenant_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_account", e))?;

        row.map(|r| decode::<AccountRow>(&r).map(Into::into)).transpose()
    }

    async fn account_number_exists(&mut self, account_number: &str) -> LedgerResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM accounts WHERE tenant_id = $1 AND account_number = $2)",
        )
        .bind(self.tenant_id.as_uuid())
        .bind(account_number)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("account_number_exists", e))
    }

    #[instrument(skip_all, fields(account_id = %account.id), err)]
    async fn insert_account(&mut self, account: &Account, balance: &AccountBalance) -> LedgerResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, tenant_id, account_number, name, description, account_type_id,
                currency_code, parent_account_id, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(self.tenant_id.as_uuid())
        .bind(&account.account_number)
        .bind(&account.name)
        .bind(account.description.as_deref())
        .bind(account.account_type_id)
        .bind(&account.currency_code)
        .bind(account.parent_account_id.map(|p| *p.as_uuid()))
        .bind(account.is_active)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_account", e))?;

        sqlx::query(
            r#"
            INSERT INTO account_balances (account_id, tenant_id, debit_balance, credit_balance, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(balance.account_id.as_uuid())
        .bind(self.tenant_id.as_uuid())
        .bind(balance.debit_balance)
        .bind(balance.credit_balance)
        .bind(balance.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_account_balance", e))?;

        Ok(())
    }

    async fn list_accounts(
        &mut self,
        filter: &AccountFilter,
        pagination: Pagination,
    ) -> LedgerResult<Page<Account>> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM accounts
            WHERE tenant_id = $1
                AND ($2::int IS NULL OR account_type_id = $2)
                AND ($3::text IS NULL OR currency_code = $3)
            "#,
        )
        .bind(self.tenant_id.as_uuid())
        .bind(filter.account_type_id)
        .bind(filter.currency_code.as_deref())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("count_accounts", e))?;

        let rows = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts \
             WHERE tenant_id = $1 \
                AND ($2::int IS NULL OR account_type_id = $2) \
                AND ($3::text IS NULL OR currency_code = $3) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $4 OFFSET $5"
        ))
        .bind(self.tenant_id.as_uuid())
        .bind(filter.account_type_id)
        .bind(filter.currency_code.as_deref())
        .bind(pagination.limit as i64)
        .bind(offset(pagination))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_accounts", e))?;

        let accounts = rows
            .iter()
            .map(|r| decode::<AccountRow>(r).map(Into::into))
            .collect::<LedgerResult<Vec<Account>>>()?;

        Ok(Page::new(accounts, total as u64))
    }

    async fn balance(&mut self, account_id: AccountId) -> LedgerResult<Option<AccountBalance>> {
        let row = sqlx::query(
            r#"
            SELECT account_id, debit_balance, credit_balance, updated_at
            FROM account_balances
            WHERE tenant_id = $1 AND account_id = $2
            "#,
        )
        .bind(self.tenant_id.as_uuid())
        .bind(account_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("balance", e))?;

        row.map(|r| decode::<BalanceRow>(&r).map(Into::into)).transpose()
    }

    async fn apply_balance_delta(
        &mut self,
        delta: &BalanceDelta,
        now: DateTime<Utc>,
    ) -> LedgerResult<Option<AccountBalance>> {
        // Single-statement increment; the row lock serialises concurrent writers.
        let row = sqlx::query(
            r#"
            UPDATE account_balances
            SET debit_balance = debit_balance + $3,
                credit_balance = credit_balance + $4,
                updated_at = $5
            WHERE tenant_id = $1 AND account_id = $2
            RETURNING account_id, debit_balance, credit_balance, updated_at
            "#,
        )
        .bind(self.tenant_id.as_uuid())
        .bind(delta.account_id.as_uuid())
        .bind(delta.debit)
        .bind(delta.credit)
        .bind(now)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("apply_balance_delta", e))?;

        row.map(|r| decode::<BalanceRow>(&r).map(Into::into)).transpose()
    }

    #[instrument(
        skip_all,
        fields(entry_id = %entry.id, line_count = entry.lines.len(), operation = tracing::field::Empty),
        err
    )]
    async fn insert_journal_entry(&mut self, entry: &JournalEntry) -> LedgerResult<()> {
        Span::current().record("operation", "insert_journal_entry");

        sqlx::query(
            r#"
            INSERT INTO journal_entries (
                id, tenant_id, reference_number, description, entry_date, metadata,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(self.tenant_id.as_uuid())
        .bind(&entry.reference_number)
        .bind(&entry.description)
        .bind(entry.entry_date)
        .bind(entry.metadata.clone())
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_journal_entry", e))?;

        for line in &entry.lines {
            sqlx::query(
                r#"
                INSERT INTO journal_entry_lines (
                    id, tenant_id, journal_entry_id, account_id, line_number,
                    debit, credit, description, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(line.id.as_uuid())
            .bind(self.tenant_id.as_uuid())
            .bind(entry.id.as_uuid())
            .bind(line.account_id.as_uuid())
            .bind(line.line_number)
            .bind(line.debit)
            .bind(line.credit)
            .bind(&line.description)
            .bind(line.created_at)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_journal_entry_line", e))?;
        }

        Ok(())
    }

    async fn journal_entry(&mut self, id: JournalEntryId) -> LedgerResult<Option<JournalEntry>> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, reference_number, description, entry_date, metadata,
                   created_at, updated_at
            FROM journal_entries
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(self.tenant_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("journal_entry", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let header = decode::<EntryRow>(&row)?;
        let mut lines = self.lines_for(&[header.id]).await?;
        let entry_lines = lines.remove(&header.id).unwrap_or_default();
        Ok(Some(header.into_entry(entry_lines)))
    }

    async fn list_journal_entries(
        &mut self,
        filter: &JournalFilter,
        pagination: Pagination,
    ) -> LedgerResult<Page<JournalEntry>> {
        let account_param = filter.account_id.map(|a| *a.as_uuid());

        // EXISTS rather than a join keeps entries distinct under the account filter.
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM journal_entries je
            WHERE je.tenant_id = $1
                AND ($2::uuid IS NULL OR EXISTS (
                    SELECT 1 FROM journal_entry_lines jel
                    WHERE jel.tenant_id = $1
                      AND jel.journal_entry_id = je.id
                      AND jel.account_id = $2
                ))
                AND ($3::timestamptz IS NULL OR je.entry_date >= $3)
                AND ($4::timestamptz IS NULL OR je.entry_date <= $4)
            "#,
        )
        .bind(self.tenant_id.as_uuid())
        .bind(account_param)
        .bind(filter.from_date)
        .bind(filter.to_date)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("count_journal_entries", e))?;

        let rows = sqlx::query(
            r#"
            SELECT je.id, je.tenant_id, je.reference_number, je.description, je.entry_date,
                   je.metadata, je.created_at, je.updated_at
            FROM journal_entries je
            WHERE je.tenant_id = $1
                AND ($2::uuid IS NULL OR EXISTS (
                    SELECT 1 FROM journal_entry_lines jel
                    WHERE jel.tenant_id = $1
                      AND jel.journal_entry_id = je.id
                      AND jel.account_id = $2
                ))
                AND ($3::timestamptz IS NULL OR je.entry_date >= $3)
                AND ($4::timestamptz IS NULL OR je.entry_date <= $4)
            ORDER BY je.entry_date DESC, je.created_at DESC, je.id DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(self.tenant_id.as_uuid())
        .bind(account_param)
        .bind(filter.from_date)
        .bind(filter.to_date)
        .bind(pagination.limit as i64)
        .bind(offset(pagination))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_journal_entries", e))?;

        let headers = rows
            .iter()
            .map(decode::<EntryRow>)
            .collect::<LedgerResult<Vec<EntryRow>>>()?;
        if headers.is_empty() {
            return Ok(Page::new(Vec::new(), total as u64));
        }

        let ids: Vec<uuid::Uuid> = headers.iter().map(|h| h.id).collect();
        let mut lines = self.lines_for(&ids).await?;
        let entries = headers
            .into_iter()
            .map(|h| {
                let entry_lines = lines.remove(&h.id).unwrap_or_default();
                h.into_entry(entry_lines)
            })
            .collect();

        Ok(Page::new(entries, total as u64))
    }

    async fn commit(self) -> LedgerResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        debug!("session committed");
        Ok(())
    }
}

fn offset(pagination: Pagination) -> i64 {
    i64::try_from(pagination.offset).unwrap_or(i64::MAX)
}

/// Map SQLx errors to caller-facing `LedgerError`s.
pub fn map_sqlx_error(operation: &str, err: sqlx::Error) -> LedgerError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            if db_err.constraint() == Some(BALANCE_RANGE_CONSTRAINT) {
                return LedgerError::failed_precondition(format!(
                    "balance overflow in {}",
                    operation
                ));
            }

            match db_err.code().as_deref() {
                // Unique violation
                Some("23505") => LedgerError::failed_precondition(msg),
                // Foreign key violation
                Some("23503") => LedgerError::invalid_input(msg),
                // Check constraint violation
                Some("23514") => LedgerError::invalid_input(msg),
                _ => LedgerError::internal(msg),
            }
        }
        sqlx::Error::PoolTimedOut => {
            LedgerError::unavailable(format!("connection pool exhausted in {}", operation))
        }
        sqlx::Error::PoolClosed => {
            LedgerError::unavailable(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::Io(e) => LedgerError::unavailable(format!("i/o error in {}: {}", operation, e)),
        sqlx::Error::RowNotFound => {
            LedgerError::internal(format!("unexpected row not found in {}", operation))
        }
        _ => LedgerError::internal(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn decode<'r, T>(row: &'r PgRow) -> LedgerResult<T>
where
    T: FromRow<'r, PgRow>,
{
    T::from_row(row).map_err(|e| LedgerError::internal(format!("failed to decode row: {e}")))
}

// SQLx row types

#[derive(Debug)]
struct TenantRow {
    id: uuid::Uuid,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for TenantRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(TenantRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Tenant {
            id: TenantId::from_uuid(row.id),
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug)]
struct AccountTypeRow {
    id: i32,
    code: String,
    name: String,
    normal_balance: String,
}

impl<'r> sqlx::FromRow<'r, PgRow> for AccountTypeRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(AccountTypeRow {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            normal_balance: row.try_get("normal_balance")?,
        })
    }
}

impl TryFrom<AccountTypeRow> for AccountType {
    type Error = LedgerError;

    fn try_from(row: AccountTypeRow) -> Result<Self, Self::Error> {
        let normal_balance = NormalBalance::parse(&row.normal_balance).ok_or_else(|| {
            LedgerError::internal(format!(
                "account type {} has unknown normal balance {}",
                row.code, row.normal_balance
            ))
        })?;
        Ok(AccountType {
            id: row.id,
            code: row.code,
            name: row.name,
            normal_balance,
        })
    }
}

#[derive(Debug)]
struct CurrencyRow {
    id: i32,
    code: String,
    name: String,
    symbol: String,
    precision: i32,
}

impl<'r> sqlx::FromRow<'r, PgRow> for CurrencyRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CurrencyRow {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            symbol: row.try_get("symbol")?,
            precision: row.try_get("precision")?,
        })
    }
}

impl From<CurrencyRow> for Currency {
    fn from(row: CurrencyRow) -> Self {
        Currency {
            id: row.id,
            code: row.code,
            name: row.name,
            symbol: row.symbol,
            precision: row.precision.max(0) as u32,
        }
    }
}

#[derive(Debug)]
struct AccountRow {
    id: uuid::Uuid,
    tenant_id: uuid::Uuid,
    account_number: String,
    name: String,
    description: Option<String>,
    account_type_id: i32,
    currency_code: String,
    parent_account_id: Option<uuid::Uuid>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for AccountRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(AccountRow {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            account_number: row.try_get("account_number")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            account_type_id: row.try_get("account_type_id")?,
            currency_code: row.try_get("currency_code")?,
            parent_account_id: row.try_get("parent_account_id")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: AccountId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            account_number: row.account_number,
            name: row.name,
            description: row.description,
            account_type_id: row.account_type_id,
            currency_code: row.currency_code,
            parent_account_id: row.parent_account_id.map(AccountId::from_uuid),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug)]
struct BalanceRow {
    account_id: uuid::Uuid,
    debit_balance: Decimal,
    credit_balance: Decimal,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for BalanceRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(BalanceRow {
            account_id: row.try_get("account_id")?,
            debit_balance: row.try_get("debit_balance")?,
            credit_balance: row.try_get("credit_balance")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<BalanceRow> for AccountBalance {
    fn from(row: BalanceRow) -> Self {
        AccountBalance {
            account_id: AccountId::from_uuid(row.account_id),
            debit_balance: row.debit_balance,
            credit_balance: row.credit_balance,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug)]
struct EntryRow {
    id: uuid::Uuid,
    tenant_id: uuid::Uuid,
    reference_number: String,
    description: String,
    entry_date: DateTime<Utc>,
    metadata: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for EntryRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(EntryRow {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            reference_number: row.try_get("reference_number")?,
            description: row.try_get("description")?,
            entry_date: row.try_get("entry_date")?,
            metadata: row.try_get("metadata")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl EntryRow {
    fn into_entry(self, lines: Vec<JournalEntryLine>) -> JournalEntry {
        JournalEntry {
            id: JournalEntryId::from_uuid(self.id),
            tenant_id: TenantId::from_uuid(self.tenant_id),
            reference_number: self.reference_number,
            description: self.description,
            entry_date: self.entry_date,
            metadata: self.metadata,
            lines,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug)]
struct LineRow {
    id: uuid::Uuid,
    journal_entry_id: uuid::Uuid,
    account_id: uuid::Uuid,
    line_number: i32,
    debit: Decimal,
    credit: Decimal,
    description: String,
    created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for LineRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(LineRow {
            id: row.try_get("id")?,
            journal_entry_id: row.try_get("journal_entry_id")?,
            account_id: row.try_get("account_id")?,
            line_number: row.try_get("line_number")?,
            debit: row.try_get("debit")?,
            credit: row.try_get("credit")?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<LineRow> for JournalEntryLine {
    fn from(row: LineRow) -> Self {
        JournalEntryLine {
            id: JournalLineId::from_uuid(row.id),
            journal_entry_id: JournalEntryId::from_uuid(row.journal_entry_id),
            account_id: AccountId::from_uuid(row.account_id),
            line_number: row.line_number,
            debit: row.debit,
            credit: row.credit,
            description: row.description,
            created_at: row.created_at,
        }
    }
}
