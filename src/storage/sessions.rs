use super::schema::Database;
use super::types::DatabaseError;

impl Database {
    /// Owner of a session token, if the token is known.
    pub async fn user_for_session_token(&self, token: &str) -> Result<Option<i64>, DatabaseError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(user_id,)| user_id))
    }

    /// Record a session token for `user_id`, replacing any previous owner.
    pub async fn create_session(&self, token: &str, user_id: i64) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token, user_id) VALUES (?, ?)
            ON CONFLICT(token) DO UPDATE SET user_id = excluded.user_id
        "#,
        )
        .bind(token)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
