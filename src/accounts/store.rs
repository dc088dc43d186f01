//! Postgres-backed [`AccountStore`].
//!
//! Primary keys on `owner_id` enforce one confirmed and one pending link per
//! owner. Promotion deletes the pending row and upserts the confirmed row in
//! a single transaction.

use sqlx::{PgPool, Row};

use super::{AccountLink, AccountStore};

#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn link(owner_id: &str, row: &sqlx::postgres::PgRow) -> AccountLink {
    AccountLink { owner_id: owner_id.to_string(), connection_id: row.get("connection_id") }
}

#[async_trait::async_trait]
impl AccountStore for PgAccountStore {
    async fn confirmed(&self, owner_id: &str) -> Result<Option<AccountLink>, sqlx::Error> {
        let row = sqlx::query("SELECT connection_id FROM account_links WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| link(owner_id, &r)))
    }

    async fn pending(&self, owner_id: &str) -> Result<Option<AccountLink>, sqlx::Error> {
        let row = sqlx::query("SELECT connection_id FROM pending_account_links WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| link(owner_id, &r)))
    }

    async fn upsert_pending(&self, link: &AccountLink) -> Result<(), sqlx::Error> {
        sqlx::query(
            r"INSERT INTO pending_account_links (owner_id, connection_id)
              VALUES ($1, $2)
              ON CONFLICT (owner_id) DO UPDATE
                  SET connection_id = EXCLUDED.connection_id, created_at = now()",
        )
        .bind(&link.owner_id)
        .bind(&link.connection_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn replace_connection(&self, owner_id: &str, connection_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE account_links SET connection_id = $2, updated_at = now() WHERE owner_id = $1",
        )
        .bind(owner_id)
        .bind(connection_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn promote_pending(&self, owner_id: &str) -> Result<Option<AccountLink>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let Some(pending) =
            sqlx::query("DELETE FROM pending_account_links WHERE owner_id = $1 RETURNING connection_id")
                .bind(owner_id)
                .fetch_optional(tx.as_mut())
                .await?
        else {
            return Ok(None);
        };
        let connection_id: String = pending.get("connection_id");

        // An existing confirmed row wins; RETURNING yields whichever is stored.
        let row = sqlx::query(
            r"INSERT INTO account_links (owner_id, connection_id)
              VALUES ($1, $2)
              ON CONFLICT (owner_id) DO UPDATE SET connection_id = account_links.connection_id
              RETURNING connection_id",
        )
        .bind(owner_id)
        .bind(&connection_id)
        .fetch_one(tx.as_mut())
        .await?;

        tx.commit().await?;
        Ok(Some(link(owner_id, &row)))
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
