use crate::domain::value_objects::EntityKind;

// Entity table statements; `{table}` is replaced with the kind's table name.

pub(super) const SELECT_ALL_RECORDS: &str = r#"
    SELECT id, payload, synced, last_modified
    FROM {table}
    ORDER BY rowid ASC
"#;

pub(super) const SELECT_RECORD_BY_ID: &str = r#"
    SELECT id, payload, synced, last_modified
    FROM {table}
    WHERE id = ?1
"#;

pub(super) const INSERT_RECORD: &str = r#"
    INSERT INTO {table} (id, payload, synced, last_modified)
    VALUES (?1, ?2, ?3, ?4)
"#;

pub(super) const UPDATE_RECORD: &str = r#"
    UPDATE {table}
    SET payload = ?2, synced = ?3, last_modified = ?4
    WHERE id = ?1
"#;

pub(super) const UPSERT_RECORD: &str = r#"
    INSERT INTO {table} (id, payload, synced, last_modified)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(id) DO UPDATE SET
        payload = excluded.payload,
        synced = excluded.synced,
        last_modified = excluded.last_modified
"#;

pub(super) const DELETE_RECORD: &str = r#"
    DELETE FROM {table}
    WHERE id = ?1
"#;

pub(super) const DELETE_ALL_RECORDS: &str = r#"
    DELETE FROM {table}
"#;

pub(super) const DELETE_SETTLED_RECORDS: &str = r#"
    DELETE FROM {table}
    WHERE synced = 1
      AND NOT EXISTS (
          SELECT 1 FROM sync_queue
          WHERE store = ?1 AND record_id = {table}.id
      )
"#;

// Skips ids with queued changes and never overwrites a dirty row.
pub(super) const HYDRATE_RECORD: &str = r#"
    INSERT INTO {table} (id, payload, synced, last_modified)
    SELECT ?1, ?2, 1, ?3
    WHERE NOT EXISTS (
        SELECT 1 FROM sync_queue
        WHERE store = ?4 AND record_id = ?1
    )
    ON CONFLICT(id) DO UPDATE SET
        payload = excluded.payload,
        synced = 1,
        last_modified = excluded.last_modified
    WHERE {table}.synced = 1
"#;

pub(super) const SELECT_UNSYNCED_IDS: &str = r#"
    SELECT id
    FROM {table}
    WHERE synced = 0
    ORDER BY rowid ASC
"#;

pub(super) const RENAME_RECORD: &str = r#"
    UPDATE {table}
    SET id = ?2, payload = ?3
    WHERE id = ?1
"#;

pub(super) const MARK_RECORD_SYNCED_IF_SETTLED: &str = r#"
    UPDATE {table}
    SET synced = 1
    WHERE id = ?1
      AND NOT EXISTS (
          SELECT 1 FROM sync_queue
          WHERE store = ?2 AND record_id = ?1
      )
"#;

// Sync queue

pub(super) const INSERT_QUEUE_ENTRY: &str = r#"
    INSERT INTO sync_queue (action, store, record_id, data, timestamp)
    VALUES (?1, ?2, ?3, ?4, ?5)
"#;

pub(super) const SELECT_QUEUE_ENTRIES: &str = r#"
    SELECT id, action, store, record_id, data, timestamp, attempts, last_error
    FROM sync_queue
    ORDER BY id ASC
"#;

pub(super) const SELECT_QUEUE_ENTRIES_FOR_RECORD: &str = r#"
    SELECT id, data
    FROM sync_queue
    WHERE store = ?1 AND record_id = ?2
    ORDER BY id ASC
"#;

pub(super) const RETARGET_QUEUE_ENTRY: &str = r#"
    UPDATE sync_queue
    SET record_id = ?2, data = ?3
    WHERE id = ?1
"#;

pub(super) const DELETE_QUEUE_ENTRY: &str = r#"
    DELETE FROM sync_queue
    WHERE id = ?1
"#;

pub(super) const COUNT_QUEUE_ENTRIES: &str = r#"
    SELECT COUNT(*) FROM sync_queue
"#;

pub(super) const RECORD_QUEUE_FAILURE: &str = r#"
    UPDATE sync_queue
    SET attempts = attempts + 1, last_error = ?2
    WHERE id = ?1
"#;

pub(super) const DELETE_ALL_QUEUE_ENTRIES: &str = r#"
    DELETE FROM sync_queue
"#;

// Metadata

pub(super) const SELECT_METADATA: &str = r#"
    SELECT value FROM metadata
    WHERE key = ?1
"#;

pub(super) const UPSERT_METADATA: &str = r#"
    INSERT INTO metadata (key, value)
    VALUES (?1, ?2)
    ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#;

pub(super) const DELETE_ALL_METADATA: &str = r#"
    DELETE FROM metadata
"#;

pub(super) fn for_table(template: &str, kind: EntityKind) -> String {
    template.replace("{table}", kind.table_name())
}
