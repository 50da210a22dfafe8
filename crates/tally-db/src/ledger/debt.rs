//! Debt bookkeeping shared by payments and sales.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tally_core::allocation::{plan_allocation, AllocationPlan, OpenBalance};
use tally_core::{Client, CoreError, DebtTracking, Money};

use crate::error::{LedgerError, LedgerResult};
use crate::repository::{client, sale};

pub(super) async fn load_client(conn: &mut SqliteConnection, client_id: &str) -> LedgerResult<Client> {
    client::fetch_client(conn, client_id)
        .await?
        .ok_or_else(|| LedgerError::not_found("Client", client_id))
}

/// Spreads `amount` over the client's unpaid sales, oldest first, and
/// persists every balance it touched.
pub(super) async fn allocate(
    conn: &mut SqliteConnection,
    client_id: &str,
    amount: Money,
    tolerance: Money,
    now: DateTime<Utc>,
) -> LedgerResult<AllocationPlan> {
    let open: Vec<OpenBalance> = sale::open_sales_for_client(conn, client_id)
        .await?
        .iter()
        .map(OpenBalance::from)
        .collect();

    let plan = plan_allocation(&open, amount, tolerance);

    for step in &plan.allocations {
        sale::set_balance(conn, &step.sale_id, step.new_balance, step.new_status, now).await?;
    }

    Ok(plan)
}

/// Sets `total_debt_cents` from the sales table.
pub(super) async fn recompute(conn: &mut SqliteConnection, client: &mut Client) -> LedgerResult<()> {
    client.total_debt_cents = sale::outstanding_for_client(conn, &client.id).await?.cents();
    Ok(())
}

/// Brings the client's debt up to date after a credit sale was written and
/// stamps the interaction.
///
/// `delta` is the change in final totals the sale caused; only
/// [`DebtTracking::Incremental`] uses it.
pub(super) async fn after_credit_sale(
    conn: &mut SqliteConnection,
    client_id: &str,
    tracking: DebtTracking,
    delta: Money,
    now: DateTime<Utc>,
) -> LedgerResult<Client> {
    let mut client = load_client(conn, client_id).await?;

    match tracking {
        DebtTracking::Recompute => recompute(conn, &mut client).await?,
        DebtTracking::Incremental => {
            client.total_debt_cents = client
                .total_debt()
                .checked_add(delta)
                .ok_or_else(|| CoreError::AmountOverflow {
                    field: "client debt".to_string(),
                })?
                .cents();
        }
    }

    client.last_interaction = Some(now);
    client.updated_at = now;
    client::update_balances(conn, &client).await?;

    Ok(client)
}
