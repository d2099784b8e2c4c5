//! credentials table queries.
//!
//! Secret columns hold ciphertext. Reads that need plaintext attach a
//! `CryptContext` hook to the cursor; the cursor flushes it between rows and
//! releases it at cleanup, so decrypted material never outlives the row it
//! belongs to.

use rusqlite::params;
use vigil_core::{CryptContext, StoreError};

use crate::connection::Database;

/// A credential row. `secret` stays encrypted here.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub id: i64,
    pub uuid: String,
    pub owner: Option<i64>,
    pub name: String,
    pub login: Option<String>,
}

/// Insert a credential with an engine-generated uuid and a uniquified name
/// (scanner imports retry with the same proposed name; uniquify keeps the
/// rows distinguishable).
pub fn create_credential(
    db: &Database,
    owner: Option<i64>,
    name: &str,
    login: Option<&str>,
    secret: Option<&[u8]>,
) -> Result<CredentialRecord, StoreError> {
    let id = db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO credentials
             (uuid, owner, name, login, secret, creation_time, modification_time)
             VALUES (make_uuid(), ?1, uniquify('credential', ?2, ?1, ''), ?3, ?4,
                     now(), now())",
            params![owner, name, login, secret],
        )?;
        Ok(conn.last_insert_rowid())
    })?;
    get_credential(db, id)?.ok_or_else(|| StoreError::fatal("credential row vanished after insert"))
}

/// Fetch a credential by rowid.
pub fn get_credential(db: &Database, id: i64) -> Result<Option<CredentialRecord>, StoreError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare_cached(
            "SELECT id, uuid, owner, name, login FROM credentials WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], |row| {
            Ok(CredentialRecord {
                id: row.get(0)?,
                uuid: row.get(1)?,
                owner: row.get(2)?,
                name: row.get(3)?,
                login: row.get(4)?,
            })
        })?;
        rows.next().transpose().map_err(Into::into)
    })
}

/// Stream every credential's name and login through a decrypting cursor.
///
/// The hook's `flush` runs before each step so plaintext buffered for one
/// row is drained before the next is read; `release` runs once when the
/// cursor scope ends.
pub fn credential_logins(
    db: &Database,
    hook: Box<dyn CryptContext>,
) -> Result<Vec<(String, Option<String>)>, StoreError> {
    db.with_decrypting_cursor(
        "SELECT name, login FROM credentials ORDER BY id",
        &[],
        hook,
        |cursor| {
            let mut out = Vec::new();
            while cursor.advance()? {
                let name = cursor
                    .column_string(0)?
                    .ok_or_else(|| StoreError::fatal("credential name column is NULL"))?;
                out.push((name, cursor.column_string(1)?));
            }
            Ok(out)
        },
    )
}
