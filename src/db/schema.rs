use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

use crate::error::DbError;
use crate::matching::phonetic::{PhoneticCode, PhoneticEncoder};
use crate::models::{NameRecord, StoredName, join_variations, split_variations};
use crate::store::NameStore;

fn validate_ident(name: &str) -> Result<()> {
    if !crate::config::is_ident(name) {
        return Err(DbError::Query(format!("invalid table identifier: {}", name)).into());
    }
    Ok(())
}

const SELECT_COLUMNS: &str =
    "id, name, classification, metaphone, name_variations, created_at, updated_at";

fn row_to_stored(row: &MySqlRow) -> Result<StoredName> {
    let id: i64 = row.try_get("id")?;
    let variations: Option<String> = row.try_get("name_variations")?;
    Ok(StoredName {
        id: u64::try_from(id).with_context(|| format!("negative id {}", id))?,
        record: NameRecord {
            name: row.try_get("name")?,
            classification: row
                .try_get::<Option<String>, _>("classification")?
                .unwrap_or_default(),
            phonetic_code: PhoneticCode::new(
                row.try_get::<Option<String>, _>("metaphone")?
                    .unwrap_or_default(),
            ),
            variations: split_variations(variations.as_deref().unwrap_or("")),
        },
        created_at: row.try_get::<Option<NaiveDateTime>, _>("created_at")?,
        updated_at: row.try_get::<Option<NaiveDateTime>, _>("updated_at")?,
    })
}

pub async fn ensure_schema(pool: &MySqlPool, table: &str) -> Result<()> {
    validate_ident(table)?;
    let sql = format!(
        r#"CREATE TABLE IF NOT EXISTS `{table}` (
            id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
            name VARCHAR(191) NOT NULL,
            classification VARCHAR(64) NULL,
            metaphone VARCHAR(64) NULL,
            name_variations TEXT NULL,
            created_at DATETIME NULL,
            updated_at DATETIME NULL,
            UNIQUE KEY uq_{table}_name (name),
            KEY idx_{table}_metaphone (metaphone)
        )"#
    );
    sqlx::query(&sql)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to create table {}", table))?;
    Ok(())
}

pub async fn count_names(pool: &MySqlPool, table: &str) -> Result<i64> {
    validate_ident(table)?;
    let sql = format!("SELECT COUNT(*) FROM `{}`", table);
    let n: i64 = sqlx::query_scalar(&sql)
        .fetch_one(pool)
        .await
        .with_context(|| format!("Failed to count {}", table))?;
    Ok(n)
}

/// Load every row. Rows stored without a phonetic code get one computed.
pub async fn fetch_all_names(
    pool: &MySqlPool,
    table: &str,
    encoder: &dyn PhoneticEncoder,
) -> Result<Vec<StoredName>> {
    validate_ident(table)?;
    let sql = format!("SELECT {} FROM `{}` ORDER BY id", SELECT_COLUMNS, table);
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to read {}", table))?;
    let mut out = Vec::with_capacity(rows.len());
    let mut recomputed = 0usize;
    for r in &rows {
        let mut s = row_to_stored(r)?;
        if s.record.phonetic_code.is_empty() {
            s.record.phonetic_code = encoder.encode(&s.record.name);
            recomputed += 1;
        }
        out.push(s);
    }
    if recomputed > 0 {
        log::warn!("{} rows in {} had no phonetic code; computed on load", recomputed, table);
    }
    Ok(out)
}

pub async fn get_name_by_name(
    pool: &MySqlPool,
    table: &str,
    name: &str,
) -> Result<Option<StoredName>> {
    validate_ident(table)?;
    let sql = format!("SELECT {} FROM `{}` WHERE name = ?", SELECT_COLUMNS, table);
    let row = sqlx::query(&sql)
        .bind(name.to_uppercase())
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to look up '{}' in {}", name, table))?;
    row.as_ref().map(row_to_stored).transpose()
}

pub async fn insert_name(pool: &MySqlPool, table: &str, record: &NameRecord) -> Result<u64> {
    validate_ident(table)?;
    let sql = format!(
        "INSERT INTO `{}` (name, classification, metaphone, name_variations, created_at, updated_at) \
         VALUES (?, ?, ?, ?, UTC_TIMESTAMP(), UTC_TIMESTAMP())",
        table
    );
    let res = sqlx::query(&sql)
        .bind(&record.name)
        .bind(&record.classification)
        .bind(record.phonetic_code.as_str())
        .bind(join_variations(&record.variations))
        .execute(pool)
        .await
        .with_context(|| format!("Failed to insert '{}' into {}", record.name, table))?;
    Ok(res.last_insert_id())
}

/// Returns false when no row has `id`.
pub async fn update_name(
    pool: &MySqlPool,
    table: &str,
    id: u64,
    record: &NameRecord,
) -> Result<bool> {
    validate_ident(table)?;
    let sql = format!(
        "UPDATE `{}` SET name = ?, classification = ?, metaphone = ?, name_variations = ?, \
         updated_at = UTC_TIMESTAMP() WHERE id = ?",
        table
    );
    let res = sqlx::query(&sql)
        .bind(&record.name)
        .bind(&record.classification)
        .bind(record.phonetic_code.as_str())
        .bind(join_variations(&record.variations))
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to update id {} in {}", id, table))?;
    Ok(res.rows_affected() > 0)
}

pub async fn delete_name(pool: &MySqlPool, table: &str, id: u64) -> Result<bool> {
    validate_ident(table)?;
    let sql = format!("DELETE FROM `{}` WHERE id = ?", table);
    let res = sqlx::query(&sql)
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete id {} from {}", id, table))?;
    Ok(res.rows_affected() > 0)
}

/// Reload the whole table into `store`; returns the row count.
pub async fn load_store(pool: &MySqlPool, table: &str, store: &NameStore) -> Result<usize> {
    let encoder = store.encoder();
    let rows = fetch_all_names(pool, table, encoder.as_ref()).await?;
    let n = rows.len();
    store.replace_all(rows);
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_checked() {
        assert!(validate_ident("name_types").is_ok());
        assert!(validate_ident("name-types").is_err());
        assert!(validate_ident("").is_err());
        assert!(validate_ident("x`; DROP TABLE y").is_err());
    }
}
