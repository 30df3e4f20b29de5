use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct OutboxRecordRow {
    pub idempotency_key: String,
    pub kind: String,
    pub payload: String,
    pub status: String,
    pub attempts: i64,
    /// Epoch microseconds; drives FIFO ordering within a kind.
    pub created_at: i64,
    pub synced_at: Option<i64>,
    pub last_error: Option<String>,
}
