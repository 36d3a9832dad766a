//! Program database queries.
//!
//! This module provides operations for programs (playable library items)
//! and the ids they carry in external media sources.

use onair_common::{Error, ExternalId, Program, ProgramId, Result, SourceType};
use rusqlite::{Connection, OptionalExtension, Row};

use super::parse_column;

pub(crate) const PROGRAM_COLUMNS: &str = "p.id, p.title, p.duration_ms, p.location, p.kind";

pub(crate) fn row_to_program(row: &Row<'_>) -> rusqlite::Result<Program> {
    program_at(row, 0)
}

/// Map [`PROGRAM_COLUMNS`] starting at column `base`.
pub(crate) fn program_at(row: &Row<'_>, base: usize) -> rusqlite::Result<Program> {
    Ok(Program {
        id: parse_column(row, base)?,
        title: row.get(base + 1)?,
        duration_ms: row.get(base + 2)?,
        location: row.get(base + 3)?,
        kind: parse_column(row, base + 4)?,
    })
}

/// Insert a program, or replace the stored fields of an existing one.
pub fn upsert_program(conn: &Connection, program: &Program) -> Result<()> {
    conn.execute(
        "INSERT INTO programs (id, title, duration_ms, location, kind)
         VALUES (:id, :title, :duration_ms, :location, :kind)
         ON CONFLICT(id) DO UPDATE SET
             title = excluded.title,
             duration_ms = excluded.duration_ms,
             location = excluded.location,
             kind = excluded.kind",
        rusqlite::named_params! {
            ":id": program.id.to_string(),
            ":title": program.title,
            ":duration_ms": program.duration_ms,
            ":location": program.location,
            ":kind": program.kind.to_string(),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// Get a program by ID.
///
/// # Returns
///
/// * `Ok(Some(Program))` - The program if found
/// * `Ok(None)` - If the program does not exist
/// * `Err(Error)` - If a database error occurs
pub fn get_program(conn: &Connection, id: ProgramId) -> Result<Option<Program>> {
    conn.query_row(
        &format!("SELECT {PROGRAM_COLUMNS} FROM programs p WHERE p.id = :id"),
        rusqlite::named_params! { ":id": id.to_string() },
        row_to_program,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Replace the external ids recorded for a program.
pub fn set_external_ids(conn: &Connection, id: ProgramId, external_ids: &[ExternalId]) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    tx.execute(
        "DELETE FROM program_external_ids WHERE program_id = ?",
        [id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    for external in external_ids {
        tx.execute(
            "INSERT OR IGNORE INTO program_external_ids (program_id, source_type, external_key)
             VALUES (?, ?, ?)",
            rusqlite::params![
                id.to_string(),
                external.source_type.to_string(),
                external.external_key
            ],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))
}

/// Get the external ids of a program, restricted to `source_types`.
///
/// An empty `source_types` slice returns every external id.
pub fn get_external_ids(
    conn: &Connection,
    id: ProgramId,
    source_types: &[SourceType],
) -> Result<Vec<ExternalId>> {
    let mut stmt = conn
        .prepare(
            "SELECT source_type, external_key FROM program_external_ids
             WHERE program_id = ? ORDER BY source_type, external_key",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let ids = stmt
        .query_map([id.to_string()], |row| {
            Ok(ExternalId {
                source_type: parse_column(row, 0)?,
                external_key: row.get(1)?,
            })
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(ids
        .into_iter()
        .filter(|ext| source_types.is_empty() || source_types.contains(&ext.source_type))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use crate::queries::test_support::sample_program;

    #[test]
    fn test_upsert_and_get_program() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let mut program = sample_program("Heat", 10_200_000);
        upsert_program(&conn, &program).unwrap();

        let found = get_program(&conn, program.id).unwrap().unwrap();
        assert_eq!(found, program);

        program.title = "Heat (1995)".to_string();
        upsert_program(&conn, &program).unwrap();
        let found = get_program(&conn, program.id).unwrap().unwrap();
        assert_eq!(found.title, "Heat (1995)");
    }

    #[test]
    fn test_get_program_not_found() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        assert!(get_program(&conn, ProgramId::new()).unwrap().is_none());
    }

    #[test]
    fn test_external_ids_filtered_by_source() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let program = sample_program("Alien", 7_020_000);
        upsert_program(&conn, &program).unwrap();
        set_external_ids(
            &conn,
            program.id,
            &[
                ExternalId {
                    source_type: SourceType::Plex,
                    external_key: "1234".to_string(),
                },
                ExternalId {
                    source_type: SourceType::Jellyfin,
                    external_key: "abcd".to_string(),
                },
            ],
        )
        .unwrap();

        let all = get_external_ids(&conn, program.id, &[]).unwrap();
        assert_eq!(all.len(), 2);

        let plex = get_external_ids(&conn, program.id, &[SourceType::Plex]).unwrap();
        assert_eq!(plex.len(), 1);
        assert_eq!(plex[0].external_key, "1234");
    }

    #[test]
    fn test_set_external_ids_replaces() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let program = sample_program("Brazil", 8_520_000);
        upsert_program(&conn, &program).unwrap();
        let first = ExternalId {
            source_type: SourceType::Emby,
            external_key: "old".to_string(),
        };
        set_external_ids(&conn, program.id, &[first]).unwrap();
        set_external_ids(&conn, program.id, &[]).unwrap();

        assert!(get_external_ids(&conn, program.id, &[]).unwrap().is_empty());
    }
}
