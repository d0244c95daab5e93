//! Purchase persistence.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::Instrument;
use uuid::Uuid;

use super::models::{NewPurchase, Purchase, PurchaseContainer, PurchaseStatus, PurchaseWithContainer};
use crate::catalog::models::ContainerSize;

#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created(Purchase),
    ContainerNotFound,
}

fn purchase_from_row(row: &PgRow) -> Result<Purchase, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(Purchase {
        id: row.try_get("id")?,
        container_id: row.try_get("container_id")?,
        payment_id: row.try_get("payment_id")?,
        amount_cents: row.try_get("amount_cents")?,
        buyer_email: row.try_get("buyer_email")?,
        status: PurchaseStatus::from_db(&status)?,
        customer_id: row.try_get("customer_id")?,
        payment_method: row.try_get("payment_method")?,
        shipping_address: row.try_get("shipping_address")?,
        tracking_number: row.try_get("tracking_number")?,
        estimated_delivery: row.try_get("estimated_delivery")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Record a purchase and take the container off the market in one transaction.
///
/// # Errors
/// Returns an error if any statement or the commit fails.
pub async fn create_purchase(pool: &PgPool, purchase: &NewPurchase) -> Result<CreateOutcome> {
    let mut tx = pool
        .begin()
        .await
        .context("failed to start purchase transaction")?;

    let query = r"
        UPDATE containers
        SET is_available = FALSE, updated_at = NOW()
        WHERE id = $1
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let container = sqlx::query(query)
        .bind(purchase.container_id)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to mark container unavailable")?;

    if container.is_none() {
        let _ = tx.rollback().await;
        return Ok(CreateOutcome::ContainerNotFound);
    }

    let query = r"
        INSERT INTO purchases (
            container_id, payment_id, amount_cents, buyer_email, status,
            customer_id, payment_method, estimated_delivery
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, container_id, payment_id, amount_cents, buyer_email, status,
                  customer_id, payment_method, shipping_address, tracking_number,
                  estimated_delivery, created_at, updated_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(purchase.container_id)
        .bind(&purchase.payment_id)
        .bind(purchase.amount_cents)
        .bind(&purchase.buyer_email)
        .bind(purchase.status.as_str())
        .bind(purchase.customer_id.as_deref())
        .bind(purchase.payment_method.as_deref())
        .bind(purchase.estimated_delivery)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await
        .context("failed to insert purchase")?;

    let created = purchase_from_row(&row).context("failed to decode purchase")?;

    tx.commit()
        .await
        .context("failed to commit purchase transaction")?;

    Ok(CreateOutcome::Created(created))
}

/// Sales listing for the dashboard, newest first.
///
/// # Errors
/// Returns an error if the query fails or a row cannot be decoded.
pub async fn list_purchases(pool: &PgPool) -> Result<Vec<PurchaseWithContainer>> {
    let query = r"
        SELECT p.id, p.container_id, p.payment_id, p.amount_cents, p.buyer_email, p.status,
               p.customer_id, p.payment_method, p.shipping_address, p.tracking_number,
               p.estimated_delivery, p.created_at, p.updated_at,
               c.title AS container_title,
               c.price_cents AS container_price_cents,
               c.size AS container_size
        FROM purchases p
        JOIN containers c ON c.id = p.container_id
        ORDER BY p.created_at DESC
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list purchases")?;

    rows.iter()
        .map(|row| -> Result<PurchaseWithContainer, sqlx::Error> {
            let size: String = row.try_get("container_size")?;
            Ok(PurchaseWithContainer {
                purchase: purchase_from_row(row)?,
                container: PurchaseContainer {
                    title: row.try_get("container_title")?,
                    price_cents: row.try_get("container_price_cents")?,
                    size: ContainerSize::from_db(&size)?,
                },
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()
        .context("failed to decode purchase")
}

/// Remove a purchase record. The container keeps its availability flag.
///
/// Returns `false` when no purchase has that id.
///
/// # Errors
/// Returns an error if the delete fails.
pub async fn delete_purchase(pool: &PgPool, id: Uuid) -> Result<bool> {
    let query = "DELETE FROM purchases WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete purchase")?;

    Ok(result.rows_affected() > 0)
}
