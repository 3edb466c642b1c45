//! Legislator persistence

use crate::error::Result;
use crate::models::Legislator;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

/// Upsert a legislator keyed on `bioguide_id`.
///
/// A record with the same ID always overwrites the prior stored
/// version, never duplicates.
pub async fn upsert_legislator(pool: &SqlitePool, record: &Legislator) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO legislators (
            bioguide_id, full_name, first_name, last_name, party, state,
            chamber, term_start_date, term_end_date, profile_url, image_url,
            last_updated
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(bioguide_id) DO UPDATE SET
            full_name = excluded.full_name,
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            party = excluded.party,
            state = excluded.state,
            chamber = excluded.chamber,
            term_start_date = excluded.term_start_date,
            term_end_date = excluded.term_end_date,
            profile_url = excluded.profile_url,
            image_url = excluded.image_url,
            last_updated = excluded.last_updated
        "#,
    )
    .bind(&record.bioguide_id)
    .bind(&record.full_name)
    .bind(&record.first_name)
    .bind(&record.last_name)
    .bind(&record.party)
    .bind(&record.state)
    .bind(&record.chamber)
    .bind(&record.term_start_date)
    .bind(&record.term_end_date)
    .bind(&record.profile_url)
    .bind(&record.image_url)
    .bind(record.last_updated.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Check whether a legislator row exists for the given ID
pub async fn exists(pool: &SqlitePool, bioguide_id: &str) -> Result<bool> {
    let row = sqlx::query("SELECT 1 FROM legislators WHERE bioguide_id = ?")
        .bind(bioguide_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.is_some())
}

/// Load a legislator by bioguide ID
pub async fn load_legislator(pool: &SqlitePool, bioguide_id: &str) -> Result<Option<Legislator>> {
    let row = sqlx::query(
        r#"
        SELECT bioguide_id, full_name, first_name, last_name, party, state,
               chamber, term_start_date, term_end_date, profile_url, image_url,
               last_updated
        FROM legislators
        WHERE bioguide_id = ?
        "#,
    )
    .bind(bioguide_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let last_updated: String = row.get("last_updated");
            Ok(Some(Legislator {
                bioguide_id: row.get("bioguide_id"),
                full_name: row.get("full_name"),
                first_name: row.get("first_name"),
                last_name: row.get("last_name"),
                party: row.get("party"),
                state: row.get("state"),
                chamber: row.get("chamber"),
                term_start_date: row.get("term_start_date"),
                term_end_date: row.get("term_end_date"),
                profile_url: row.get("profile_url"),
                image_url: row.get("image_url"),
                last_updated: DateTime::parse_from_rfc3339(&last_updated)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            }))
        }
        None => Ok(None),
    }
}

/// Count legislator rows
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM legislators")
        .fetch_one(pool)
        .await?;
    Ok(row.get("n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawMember;

    async fn test_pool() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    fn sample(id: &str, party: &str) -> Legislator {
        let raw: RawMember = serde_json::from_value(serde_json::json!({
            "bioguideId": id,
            "fullName": "Test Member",
            "partyHistory": [{"partyName": party}],
            "state": "VT",
        }))
        .unwrap();
        Legislator::from_raw(&raw).unwrap()
    }

    #[tokio::test]
    async fn upsert_inserts_then_overwrites() {
        let pool = test_pool().await;

        upsert_legislator(&pool, &sample("S000033", "Independent"))
            .await
            .unwrap();
        assert!(exists(&pool, "S000033").await.unwrap());
        assert_eq!(count(&pool).await.unwrap(), 1);

        // Same ID again: overwrite, not duplicate
        upsert_legislator(&pool, &sample("S000033", "Democratic"))
            .await
            .unwrap();
        assert_eq!(count(&pool).await.unwrap(), 1);

        let loaded = load_legislator(&pool, "S000033").await.unwrap().unwrap();
        assert_eq!(loaded.party.as_deref(), Some("Democratic"));
        assert_eq!(loaded.state.as_deref(), Some("VT"));
    }

    #[tokio::test]
    async fn exists_is_false_for_unknown_id() {
        let pool = test_pool().await;
        assert!(!exists(&pool, "Z999999").await.unwrap());
        assert!(load_legislator(&pool, "Z999999").await.unwrap().is_none());
    }
}
