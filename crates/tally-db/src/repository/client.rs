//! # Client Repository
//!
//! Database operations for clients.
//!
//! `credit_cents`, `total_debt_cents` and `last_interaction` belong to the
//! ledger: `create`/`update` never write them, only [`update_balances`]
//! does, inside a ledger transaction.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{payment, sale};
use tally_core::{Client, ClientStatement, ClientUpdate, NewClient};

const CLIENT_COLUMNS: &str = "id, name, phone, credit_cents, total_debt_cents, \
                              last_interaction, created_at, updated_at";

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Lists all clients by name.
    pub async fn list(&self) -> DbResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY name COLLATE NOCASE, created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        let mut conn = self.pool.acquire().await?;
        fetch_client(&mut conn, id).await
    }

    /// Creates a client with zero credit and zero debt.
    pub async fn create(&self, new: &NewClient) -> DbResult<Client> {
        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            phone: normalize_phone(new.phone.as_deref()),
            credit_cents: 0,
            total_debt_cents: 0,
            last_interaction: None,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %client.id, name = %client.name, "Inserting client");

        sqlx::query(
            r#"
            INSERT INTO clients (
                id, name, phone, credit_cents, total_debt_cents,
                last_interaction, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&client.id)
        .bind(&client.name)
        .bind(&client.phone)
        .bind(client.credit_cents)
        .bind(client.total_debt_cents)
        .bind(client.last_interaction)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(client)
    }

    /// Updates name and phone.
    pub async fn update(&self, id: &str, update: &ClientUpdate) -> DbResult<Client> {
        let mut conn = self.pool.acquire().await?;

        let result = sqlx::query(
            r#"
            UPDATE clients SET
                name = ?2,
                phone = ?3,
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.name.trim())
        .bind(normalize_phone(update.phone.as_deref()))
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }

        fetch_client(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Client", id))
    }

    /// The client with its unpaid sales (payment order) and payment history.
    pub async fn statement(&self, id: &str) -> DbResult<ClientStatement> {
        let mut conn = self.pool.acquire().await?;

        let client = fetch_client(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Client", id))?;
        let open_sales = sale::open_sales_for_client(&mut conn, id).await?;
        let payments = payment::payments_for_client(&mut conn, id).await?;

        Ok(ClientStatement {
            client,
            open_sales,
            payments,
        })
    }
}

fn normalize_phone(phone: Option<&str>) -> Option<String> {
    phone
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Transaction-scoped operations
// =============================================================================

pub(crate) async fn fetch_client(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Client>> {
    let client = sqlx::query_as::<_, Client>(&format!(
        "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(client)
}

/// Writes the ledger-owned fields of `client`.
pub(crate) async fn update_balances(conn: &mut SqliteConnection, client: &Client) -> DbResult<()> {
    debug!(
        id = %client.id,
        credit_cents = client.credit_cents,
        total_debt_cents = client.total_debt_cents,
        "Updating client balances"
    );

    let result = sqlx::query(
        r#"
        UPDATE clients SET
            credit_cents = ?2,
            total_debt_cents = ?3,
            last_interaction = ?4,
            updated_at = ?5
        WHERE id = ?1
        "#,
    )
    .bind(&client.id)
    .bind(client.credit_cents)
    .bind(client.total_debt_cents)
    .bind(client.last_interaction)
    .bind(client.updated_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Client", &client.id));
    }

    Ok(())
}
