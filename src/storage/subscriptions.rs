use super::schema::Database;
use super::types::{DatabaseError, Subscription};

impl Database {
    // ========================================================================
    // Subscription Operations
    // ========================================================================

    /// Look up the subscription tracking `url`, whoever owns it.
    pub async fn find_subscription_by_url(
        &self,
        url: &str,
    ) -> Result<Option<Subscription>, DatabaseError> {
        let sub = sqlx::query_as::<_, Subscription>(
            "SELECT id, user_id, url, name FROM subscriptions WHERE url = ?",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sub)
    }

    /// Insert a subscription unless the feed URL is already tracked.
    ///
    /// The duplicate check and the write are one statement
    /// (`ON CONFLICT(url) DO NOTHING`), so two concurrent inserts of the same
    /// URL produce exactly one row; the loser gets
    /// [`DatabaseError::DuplicateSubscription`].
    pub async fn insert_subscription(
        &self,
        user_id: i64,
        url: &str,
        name: &str,
    ) -> Result<Subscription, DatabaseError> {
        let result = sqlx::query(
            r#"
            INSERT INTO subscriptions (user_id, url, name)
            VALUES (?, ?, ?)
            ON CONFLICT(url) DO NOTHING
        "#,
        )
        .bind(user_id)
        .bind(url)
        .bind(name)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::DuplicateSubscription(url.to_owned()));
        }

        Ok(Subscription {
            id: result.last_insert_rowid(),
            user_id,
            url: url.to_owned(),
            name: name.to_owned(),
        })
    }

    /// All subscriptions owned by `user_id`, oldest first.
    pub async fn list_subscriptions(&self, user_id: i64) -> Result<Vec<Subscription>, DatabaseError> {
        let subs = sqlx::query_as::<_, Subscription>(
            "SELECT id, user_id, url, name FROM subscriptions WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(subs)
    }

    /// Delete subscription `id` if, and only if, it belongs to `user_id`.
    ///
    /// A missing id and an id owned by someone else are indistinguishable to
    /// the caller: both return [`DatabaseError::NotFound`].
    pub async fn delete_subscription(&self, id: i64, user_id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }
}
