//! Container persistence.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row, postgres::PgRow, types::Json};
use tracing::Instrument;
use uuid::Uuid;

use super::models::{Container, ContainerFields, ContainerSize, Specification};
use crate::db::is_foreign_key_violation;

const CONTAINER_COLUMNS: &str = r"
    id, title, description, price_cents, images, size, condition, location,
    is_available, supplier_id, manufacturer_info, year_manufactured,
    specifications, created_at, updated_at
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// Purchases still reference the container.
    InUse,
}

fn container_from_row(row: &PgRow) -> Result<Container, sqlx::Error> {
    let size: String = row.try_get("size")?;
    let Json(specifications): Json<Vec<Specification>> = row.try_get("specifications")?;
    Ok(Container {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        price_cents: row.try_get("price_cents")?,
        images: row.try_get("images")?,
        size: ContainerSize::from_db(&size)?,
        condition: row.try_get("condition")?,
        location: row.try_get("location")?,
        is_available: row.try_get("is_available")?,
        supplier_id: row.try_get("supplier_id")?,
        manufacturer_info: row.try_get("manufacturer_info")?,
        year_manufactured: row.try_get("year_manufactured")?,
        specifications,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// All containers, newest first.
///
/// # Errors
/// Returns an error if the query fails or a row cannot be decoded.
pub async fn list_containers(pool: &PgPool) -> Result<Vec<Container>> {
    let query = format!("SELECT {CONTAINER_COLUMNS} FROM containers ORDER BY created_at DESC");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query
    );
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list containers")?;

    rows.iter()
        .map(container_from_row)
        .collect::<Result<Vec<_>, _>>()
        .context("failed to decode container")
}

/// # Errors
/// Returns an error if the query fails or the row cannot be decoded.
pub async fn get_container(pool: &PgPool, id: Uuid) -> Result<Option<Container>> {
    let query = format!("SELECT {CONTAINER_COLUMNS} FROM containers WHERE id = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch container")?;

    row.as_ref()
        .map(container_from_row)
        .transpose()
        .context("failed to decode container")
}

/// # Errors
/// Returns an error if the insert fails.
pub async fn create_container(pool: &PgPool, fields: &ContainerFields) -> Result<Container> {
    let query = format!(
        r"
        INSERT INTO containers (
            title, description, price_cents, images, size, condition, location,
            is_available, supplier_id, manufacturer_info, year_manufactured, specifications
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING {CONTAINER_COLUMNS}
        "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.price_cents)
        .bind(&fields.images)
        .bind(fields.size.as_str())
        .bind(&fields.condition)
        .bind(&fields.location)
        .bind(fields.is_available)
        .bind(&fields.supplier_id)
        .bind(&fields.manufacturer_info)
        .bind(fields.year_manufactured)
        .bind(Json(&fields.specifications))
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert container")?;

    container_from_row(&row).context("failed to decode container")
}

/// Replace every editable field. `Ok(None)` when the id is unknown.
///
/// # Errors
/// Returns an error if the update fails.
pub async fn update_container(
    pool: &PgPool,
    id: Uuid,
    fields: &ContainerFields,
) -> Result<Option<Container>> {
    let query = format!(
        r"
        UPDATE containers
        SET title = $2,
            description = $3,
            price_cents = $4,
            images = $5,
            size = $6,
            condition = $7,
            location = $8,
            is_available = $9,
            supplier_id = $10,
            manufacturer_info = $11,
            year_manufactured = $12,
            specifications = $13,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {CONTAINER_COLUMNS}
        "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.price_cents)
        .bind(&fields.images)
        .bind(fields.size.as_str())
        .bind(&fields.condition)
        .bind(&fields.location)
        .bind(fields.is_available)
        .bind(&fields.supplier_id)
        .bind(&fields.manufacturer_info)
        .bind(fields.year_manufactured)
        .bind(Json(&fields.specifications))
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to update container")?;

    row.as_ref()
        .map(container_from_row)
        .transpose()
        .context("failed to decode container")
}

/// # Errors
/// Returns an error if the delete fails for a reason other than a purchase reference.
pub async fn delete_container(pool: &PgPool, id: Uuid) -> Result<DeleteOutcome> {
    let query = "DELETE FROM containers WHERE id = $1";
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
        .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => Ok(DeleteOutcome::NotFound),
        Ok(_) => Ok(DeleteOutcome::Deleted),
        Err(err) if is_foreign_key_violation(&err) => Ok(DeleteOutcome::InUse),
        Err(err) => Err(err).context("failed to delete container"),
    }
}
