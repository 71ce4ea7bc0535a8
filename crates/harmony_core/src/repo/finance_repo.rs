//! Financial record repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist income/expense records and provide range sums.
//!
//! # Invariants
//! - Amounts are integer cents; sums never go through floating point.
//! - Range queries treat `since` as inclusive and `until` as exclusive.

use crate::model::entity::{EntityId, Transaction, TransactionKind};
use crate::repo::{decode_column, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

/// Date-range query for transaction listings.
#[derive(Debug, Clone, Default)]
pub struct TransactionRangeQuery {
    pub since: Option<i64>,
    pub until: Option<i64>,
    pub kind: Option<TransactionKind>,
}

/// Repository interface for financial records.
pub trait FinanceRepository {
    fn create_transaction(&self, transaction: &Transaction) -> RepoResult<EntityId>;
    fn get_transaction(&self, id: EntityId) -> RepoResult<Option<Transaction>>;
    fn list_transactions(&self, query: &TransactionRangeQuery) -> RepoResult<Vec<Transaction>>;
    /// Sums amounts in cents for one flow direction within a range.
    fn sum_by_kind(&self, kind: TransactionKind, query: &TransactionRangeQuery)
        -> RepoResult<i64>;
    fn delete_transaction(&self, id: EntityId) -> RepoResult<()>;
}

/// SQLite-backed finance repository.
pub struct SqliteFinanceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFinanceRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl FinanceRepository for SqliteFinanceRepository<'_> {
    fn create_transaction(&self, transaction: &Transaction) -> RepoResult<EntityId> {
        self.conn.execute(
            "INSERT INTO transactions (amount_cents, kind, category, occurred_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                transaction.amount_cents,
                transaction.kind.as_str(),
                transaction.category.as_str(),
                transaction.occurred_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_transaction(&self, id: EntityId) -> RepoResult<Option<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, amount_cents, kind, category, occurred_at
             FROM transactions
             WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_transaction_row(row)?));
        }
        Ok(None)
    }

    fn list_transactions(&self, query: &TransactionRangeQuery) -> RepoResult<Vec<Transaction>> {
        let mut sql = String::from(
            "SELECT id, amount_cents, kind, category, occurred_at
             FROM transactions
             WHERE 1 = 1",
        );
        let mut bind_values: Vec<Value> = Vec::new();
        push_range_filters(&mut sql, &mut bind_values, query);

        sql.push_str(" ORDER BY occurred_at DESC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut transactions = Vec::new();
        while let Some(row) = rows.next()? {
            transactions.push(parse_transaction_row(row)?);
        }
        Ok(transactions)
    }

    fn sum_by_kind(
        &self,
        kind: TransactionKind,
        query: &TransactionRangeQuery,
    ) -> RepoResult<i64> {
        let mut sql = String::from(
            "SELECT COALESCE(SUM(amount_cents), 0)
             FROM transactions
             WHERE kind = ?",
        );
        let mut bind_values: Vec<Value> = vec![Value::Text(kind.as_str().to_string())];

        if let Some(since) = query.since {
            sql.push_str(" AND occurred_at >= ?");
            bind_values.push(Value::Integer(since));
        }
        if let Some(until) = query.until {
            sql.push_str(" AND occurred_at < ?");
            bind_values.push(Value::Integer(until));
        }

        let sum = self
            .conn
            .query_row(&sql, params_from_iter(bind_values), |row| row.get(0))?;
        Ok(sum)
    }

    fn delete_transaction(&self, id: EntityId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "transaction",
                id,
            });
        }
        Ok(())
    }
}

fn push_range_filters(sql: &mut String, bind_values: &mut Vec<Value>, query: &TransactionRangeQuery) {
    if let Some(since) = query.since {
        sql.push_str(" AND occurred_at >= ?");
        bind_values.push(Value::Integer(since));
    }
    if let Some(until) = query.until {
        sql.push_str(" AND occurred_at < ?");
        bind_values.push(Value::Integer(until));
    }
    if let Some(kind) = query.kind {
        sql.push_str(" AND kind = ?");
        bind_values.push(Value::Text(kind.as_str().to_string()));
    }
}

fn parse_transaction_row(row: &Row<'_>) -> RepoResult<Transaction> {
    let kind_text: String = row.get("kind")?;
    Ok(Transaction {
        id: row.get("id")?,
        amount_cents: row.get("amount_cents")?,
        kind: decode_column(TransactionKind::parse, &kind_text, "transactions.kind")?,
        category: row.get("category")?,
        occurred_at: row.get("occurred_at")?,
    })
}
