//! Advisory import locks
//!
//! A lock is a row in `system_locks`; its presence is the lock. The
//! store is the only coordination point, so acquisition must be a
//! single conditional insert enforced by the unique key. A separate
//! check-then-insert would race against a second concurrent invocation.

use crate::error::Result;
use chrono::Utc;
use sqlx::SqlitePool;

/// Try to acquire the named lock. Returns false if another holder
/// already has it. No row is written on a failed acquisition.
pub async fn acquire(pool: &SqlitePool, lock_key: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO system_locks (lock_key, acquired_at)
        VALUES (?, ?)
        ON CONFLICT(lock_key) DO NOTHING
        "#,
    )
    .bind(lock_key)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Release the named lock unconditionally. Deleting an absent row is
/// not an error.
pub async fn release(pool: &SqlitePool, lock_key: &str) -> Result<()> {
    sqlx::query("DELETE FROM system_locks WHERE lock_key = ?")
        .bind(lock_key)
        .execute(pool)
        .await?;

    Ok(())
}
