use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{inerr, StoreError};

pub fn get_config(conn: &Connection, key: &str) -> Result<Option<String>, StoreError> {
    conn.query_row("SELECT value FROM config WHERE key = ?1", params![key], |row| {
        row.get(0)
    })
    .optional()
    .map_err(inerr("get_config"))
}

pub fn require_config(conn: &Connection, key: &str) -> Result<String, StoreError> {
    get_config(conn, key)?.ok_or_else(|| StoreError::MissingConfig { key: key.to_string() })
}

pub fn set_config(conn: &Connection, key: &str, value: &str) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO config (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )
    .map_err(inerr("set_config"))?;
    Ok(())
}

pub fn delete_config(conn: &Connection, key: &str) -> Result<(), StoreError> {
    conn.execute("DELETE FROM config WHERE key = ?1", params![key])
        .map_err(inerr("delete_config"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::open_in_memory;

    #[test]
    fn roundtrips_a_value() {
        let conn = open_in_memory().unwrap();
        assert_eq!(get_config(&conn, "root_id").unwrap(), None);
        set_config(&conn, "root_id", "abc123").unwrap();
        assert_eq!(get_config(&conn, "root_id").unwrap(), Some("abc123".to_string()));
        set_config(&conn, "root_id", "def456").unwrap();
        assert_eq!(get_config(&conn, "root_id").unwrap(), Some("def456".to_string()));
    }

    #[test]
    fn require_config_errors_when_absent() {
        let conn = open_in_memory().unwrap();
        assert!(require_config(&conn, "delta_link").is_err());
    }

    #[test]
    fn delete_removes_the_key() {
        let conn = open_in_memory().unwrap();
        set_config(&conn, "token", "xyz").unwrap();
        delete_config(&conn, "token").unwrap();
        assert_eq!(get_config(&conn, "token").unwrap(), None);
    }
}
