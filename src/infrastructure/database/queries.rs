pub(super) const INSERT_RECORD: &str = r#"
    INSERT INTO outbox_records (
        idempotency_key, kind, payload, status, attempts, created_at, synced_at, last_error
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, NULL)
"#;

pub(super) const SELECT_BY_KEY: &str = r#"
    SELECT idempotency_key, kind, payload, status, attempts, created_at, synced_at, last_error
    FROM outbox_records
    WHERE idempotency_key = ?1
"#;

pub(super) const SELECT_PENDING_BY_KIND: &str = r#"
    SELECT idempotency_key, kind, payload, status, attempts, created_at, synced_at, last_error
    FROM outbox_records
    WHERE kind = ?1 AND status = 'pending'
    ORDER BY created_at ASC
"#;

pub(super) const SELECT_FAILED_BY_KIND: &str = r#"
    SELECT idempotency_key, kind, payload, status, attempts, created_at, synced_at, last_error
    FROM outbox_records
    WHERE kind = ?1 AND status = 'failed'
    ORDER BY created_at ASC
"#;

pub(super) const MARK_SYNCING: &str = r#"
    UPDATE outbox_records
    SET status = 'syncing'
    WHERE idempotency_key = ?1 AND status = 'pending'
"#;

pub(super) const MARK_SYNCED: &str = r#"
    UPDATE outbox_records
    SET status = 'synced', synced_at = ?2, last_error = NULL
    WHERE idempotency_key = ?1 AND status = 'syncing'
"#;

pub(super) const MARK_FAILED: &str = r#"
    UPDATE outbox_records
    SET status = 'failed', last_error = ?2
    WHERE idempotency_key = ?1 AND status = 'syncing'
"#;

pub(super) const MARK_PENDING: &str = r#"
    UPDATE outbox_records
    SET status = 'pending', last_error = ?2
    WHERE idempotency_key = ?1 AND status = 'syncing'
"#;

pub(super) const INCREMENT_ATTEMPT: &str = r#"
    UPDATE outbox_records
    SET attempts = attempts + 1
    WHERE idempotency_key = ?1
"#;

pub(super) const RECOVER_INTERRUPTED: &str = r#"
    UPDATE outbox_records
    SET status = 'pending'
    WHERE status = 'syncing'
"#;

pub(super) const PURGE_SYNCED_BEFORE: &str = r#"
    DELETE FROM outbox_records
    WHERE status = 'synced' AND synced_at IS NOT NULL AND synced_at < ?1
"#;

pub(super) const DELETE_BY_KEY: &str = r#"
    DELETE FROM outbox_records
    WHERE idempotency_key = ?1
"#;

pub(super) const SELECT_SUMMARY: &str = r#"
    SELECT kind,
           SUM(status = 'pending') AS pending_count,
           SUM(status = 'failed') AS failed_count
    FROM outbox_records
    GROUP BY kind
"#;
