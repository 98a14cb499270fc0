//! Join-rule repository.
//!
//! Accept keywords and blacklisted applicants, both keyed by group.

use super::DbError;
use sqlx::SqlitePool;
use warden_proto::{GroupId, UserId};

/// Repository for join-rule rows.
pub struct JoinRuleRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> JoinRuleRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Every stored keyword, in insertion order per group.
    pub async fn keywords(&self) -> Result<Vec<(GroupId, String)>, DbError> {
        let rows = sqlx::query_as::<_, (i64, String)>(
            "SELECT group_id, keyword FROM join_keywords ORDER BY group_id, added_at, rowid",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(group, keyword)| (GroupId(group), keyword))
            .collect())
    }

    /// Insert a keyword. Returns `false` if the exact row already existed.
    pub async fn add_keyword(&self, group: GroupId, keyword: &str) -> Result<bool, DbError> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            "INSERT OR IGNORE INTO join_keywords (group_id, keyword, added_at) VALUES (?, ?, ?)",
        )
        .bind(group.get())
        .bind(keyword)
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_keyword(&self, group: GroupId, keyword: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM join_keywords WHERE group_id = ? AND keyword = ?")
            .bind(group.get())
            .bind(keyword)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Every blacklist entry.
    pub async fn blacklist(&self) -> Result<Vec<(GroupId, UserId)>, DbError> {
        let rows = sqlx::query_as::<_, (i64, i64)>(
            "SELECT group_id, user_id FROM join_blacklist ORDER BY group_id, added_at, user_id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(group, user)| (GroupId(group), UserId(user)))
            .collect())
    }

    /// Insert an entry. Returns `false` if it was already present.
    pub async fn add_blacklist(&self, group: GroupId, user: UserId) -> Result<bool, DbError> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            "INSERT OR IGNORE INTO join_blacklist (group_id, user_id, added_at) VALUES (?, ?, ?)",
        )
        .bind(group.get())
        .bind(user.get())
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_blacklist(&self, group: GroupId, user: UserId) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM join_blacklist WHERE group_id = ? AND user_id = ?")
            .bind(group.get())
            .bind(user.get())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
