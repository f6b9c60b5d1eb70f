//! Catalog persistence and read queries
//!
//! The write side is one replace-all transaction: the previous catalog is
//! deleted and the new one inserted atomically, so readers only ever see
//! a complete data set - the new one after commit, the old one otherwise.

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use crate::db::models::{Category, CategoryKind, Item};
use crate::events::Progress;
use crate::{Error, Result};

/// Items are inserted in multi-row batches of this size
pub const ITEM_BATCH_SIZE: usize = 500;

/// Row counts from a completed catalog write
#[derive(Debug, Clone)]
pub struct PersistStats {
    pub categories_written: usize,
    pub items_written: usize,
}

/// Replace the stored catalog with `categories` in one transaction
///
/// Existing items and categories are deleted (items first - they
/// reference categories), then the new set is inserted: categories one by
/// one to capture their assigned ids, items in batches of
/// [`ITEM_BATCH_SIZE`]. On any failure the transaction is rolled back
/// before the error is returned, leaving the store exactly as it was.
///
/// `on_progress` is advisory; it is invoked after each category insert
/// and after each item batch, and cannot abort persistence.
pub async fn replace_catalog(
    pool: &SqlitePool,
    categories: &[Category],
    mut on_progress: impl FnMut(Progress),
) -> Result<PersistStats> {
    let mut tx = pool.begin().await.map_err(persist_error)?;

    match write_catalog(&mut tx, categories, &mut on_progress).await {
        Ok(stats) => {
            tx.commit().await.map_err(persist_error)?;
            info!(
                categories = stats.categories_written,
                items = stats.items_written,
                "Catalog replaced"
            );
            Ok(stats)
        }
        Err(e) => {
            // The store must be untouched by the time the error surfaces.
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback after failed catalog write also failed");
            }
            Err(e)
        }
    }
}

async fn write_catalog(
    tx: &mut Transaction<'_, Sqlite>,
    categories: &[Category],
    on_progress: &mut impl FnMut(Progress),
) -> Result<PersistStats> {
    sqlx::query("DELETE FROM items")
        .execute(&mut **tx)
        .await
        .map_err(persist_error)?;
    sqlx::query("DELETE FROM categories")
        .execute(&mut **tx)
        .await
        .map_err(persist_error)?;

    let mut category_ids = Vec::with_capacity(categories.len());
    for (inserted, category) in categories.iter().enumerate() {
        let result = sqlx::query("INSERT INTO categories (name, type) VALUES (?, ?)")
            .bind(&category.name)
            .bind(category.kind.as_str())
            .execute(&mut **tx)
            .await
            .map_err(persist_error)?;
        category_ids.push(result.last_insert_rowid());

        let percent = ratio_percent(inserted + 1, categories.len());
        on_progress(Progress::with_percent(
            format!("Saving categories: {}%", percent),
            percent,
        ));
    }

    let total_items: usize = categories.iter().map(|c| c.items.len()).sum();
    let mut items_written = 0usize;

    for (category, category_id) in categories.iter().zip(&category_ids) {
        for batch in category.items.chunks(ITEM_BATCH_SIZE) {
            insert_item_batch(tx, *category_id, batch).await?;
            items_written += batch.len();

            let percent = ratio_percent(items_written, total_items);
            on_progress(Progress::with_percent(
                format!(
                    "Saving items: {}% ({}/{})",
                    percent, items_written, total_items
                ),
                percent,
            ));
        }
    }

    Ok(PersistStats {
        categories_written: categories.len(),
        items_written,
    })
}

/// Multi-row insert for one batch of items
///
/// The VALUES list is built as literal text (a placeholder per column per
/// row would overrun SQLite's bind limit on full batches), so every
/// string field goes through [`sql_quote`].
async fn insert_item_batch(
    tx: &mut Transaction<'_, Sqlite>,
    category_id: i64,
    batch: &[Item],
) -> Result<()> {
    let mut sql = String::from("INSERT INTO items (name, logo, url, category_id) VALUES ");
    for (i, item) in batch.iter().enumerate() {
        if i > 0 {
            sql.push(',');
        }
        let logo = match &item.logo {
            Some(logo) => sql_quote(logo),
            None => String::from("NULL"),
        };
        sql.push_str(&format!(
            "({}, {}, {}, {})",
            sql_quote(&item.name),
            logo,
            sql_quote(&item.url),
            category_id
        ));
    }

    sqlx::query(&sql)
        .execute(&mut **tx)
        .await
        .map_err(persist_error)?;

    debug!(category_id, rows = batch.len(), "Inserted item batch");
    Ok(())
}

/// List persisted categories of one kind, in storage order
///
/// Items are not loaded; `items` is empty on every returned category.
pub async fn categories_by_kind(
    pool: &SqlitePool,
    kind: CategoryKind,
) -> Result<Vec<Category>> {
    let rows = sqlx::query_as::<_, (i64, String, String)>(
        "SELECT id, name, type FROM categories WHERE type = ?",
    )
    .bind(kind.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, kind)| Category {
            id: Some(id),
            name,
            kind: CategoryKind::from_db(&kind),
            items: Vec::new(),
        })
        .collect())
}

/// Load one category together with all of its items
pub async fn category_with_items(pool: &SqlitePool, category_id: i64) -> Result<Category> {
    let (id, name, kind) = sqlx::query_as::<_, (i64, String, String)>(
        "SELECT id, name, type FROM categories WHERE id = ?",
    )
    .bind(category_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("category {}", category_id)))?;

    let items = sqlx::query_as::<_, (i64, String, Option<String>, String)>(
        "SELECT id, name, logo, url FROM items WHERE category_id = ?",
    )
    .bind(category_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|(id, name, logo, url)| Item {
        id: Some(id),
        name,
        logo,
        url,
    })
    .collect();

    Ok(Category {
        id: Some(id),
        name,
        kind: CategoryKind::from_db(&kind),
        items,
    })
}

fn persist_error(e: sqlx::Error) -> Error {
    Error::Persist(e.to_string())
}

/// Quote a string for direct inclusion in a VALUES list; a quote
/// character in the value must not terminate the literal.
fn sql_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Integer percentage of `done` over `total`, rounded to nearest
fn ratio_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as f64 / total as f64) * 100.0).round() as u8
}
