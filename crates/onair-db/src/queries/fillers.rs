//! Filler list database queries.

use onair_common::{ChannelFillerList, ChannelId, Error, FillerListId, ProgramId, Result};
use rusqlite::Connection;
use std::collections::HashMap;

use super::parse_column;
use super::programs::{program_at, PROGRAM_COLUMNS};

/// Create or rename a filler list and replace its ordered clips.
pub fn save_filler_list(
    conn: &Connection,
    id: FillerListId,
    name: &str,
    programs: &[ProgramId],
) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    tx.execute(
        "INSERT INTO filler_lists (id, name) VALUES (?1, ?2)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        rusqlite::params![id.to_string(), name],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    tx.execute(
        "DELETE FROM filler_list_programs WHERE filler_list_id = ?",
        [id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    for (position, program_id) in programs.iter().enumerate() {
        tx.execute(
            "INSERT INTO filler_list_programs (filler_list_id, program_id, position)
             VALUES (?, ?, ?)",
            rusqlite::params![id.to_string(), program_id.to_string(), position as i64],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))
}

/// Attach a filler list to a channel with rotation settings.
pub fn attach_filler_list(
    conn: &Connection,
    channel_id: ChannelId,
    filler_list_id: FillerListId,
    weight: u32,
    cooldown_ms: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO channel_filler_lists (channel_id, filler_list_id, weight, cooldown_ms)
         VALUES (:channel_id, :filler_list_id, :weight, :cooldown_ms)
         ON CONFLICT(channel_id, filler_list_id) DO UPDATE SET
             weight = excluded.weight,
             cooldown_ms = excluded.cooldown_ms",
        rusqlite::named_params! {
            ":channel_id": channel_id.to_string(),
            ":filler_list_id": filler_list_id.to_string(),
            ":weight": weight,
            ":cooldown_ms": cooldown_ms,
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// Get every filler list attached to a channel, with its clips.
pub fn get_channel_filler_lists(
    conn: &Connection,
    channel_id: ChannelId,
) -> Result<Vec<ChannelFillerList>> {
    let mut stmt = conn
        .prepare(
            "SELECT filler_list_id, weight, cooldown_ms FROM channel_filler_lists
             WHERE channel_id = ? ORDER BY filler_list_id",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let mut lists = stmt
        .query_map([channel_id.to_string()], |row| {
            Ok(ChannelFillerList {
                filler_list_id: parse_column(row, 0)?,
                weight: row.get(1)?,
                cooldown_ms: row.get(2)?,
                programs: Vec::new(),
            })
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    let mut clip_stmt = conn
        .prepare(&format!(
            "SELECT l.filler_list_id, {PROGRAM_COLUMNS} FROM channel_filler_lists c
             JOIN filler_list_programs l ON l.filler_list_id = c.filler_list_id
             JOIN programs p ON p.id = l.program_id
             WHERE c.channel_id = ?
             ORDER BY l.filler_list_id, l.position"
        ))
        .map_err(|e| Error::database(e.to_string()))?;

    let mut clips: HashMap<FillerListId, Vec<_>> = HashMap::new();
    let rows = clip_stmt
        .query_map([channel_id.to_string()], |row| {
            let list_id: FillerListId = parse_column(row, 0)?;
            let program = program_at(row, 1)?;
            Ok((list_id, program))
        })
        .map_err(|e| Error::database(e.to_string()))?;
    for row in rows {
        let (list_id, program) = row.map_err(|e| Error::database(e.to_string()))?;
        clips.entry(list_id).or_default().push(program);
    }

    for list in &mut lists {
        list.programs = clips.remove(&list.filler_list_id).unwrap_or_default();
    }

    Ok(lists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use crate::queries::channels::upsert_channel;
    use crate::queries::programs::upsert_program;
    use crate::queries::test_support::{sample_channel, sample_program};

    #[test]
    fn test_channel_filler_lists_with_clips() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let channel = sample_channel(2, "Retro");
        upsert_channel(&conn, &channel).unwrap();

        let bumper = sample_program("Bumper", 15_000);
        let promo = sample_program("Promo", 30_000);
        upsert_program(&conn, &bumper).unwrap();
        upsert_program(&conn, &promo).unwrap();

        let list = FillerListId::new();
        save_filler_list(&conn, list, "Bumpers", &[promo.id, bumper.id]).unwrap();
        attach_filler_list(&conn, channel.id, list, 3, 600_000).unwrap();

        let lists = get_channel_filler_lists(&conn, channel.id).unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].weight, 3);
        assert_eq!(lists[0].cooldown_ms, 600_000);
        assert_eq!(lists[0].programs, vec![promo, bumper]);
    }

    #[test]
    fn test_empty_filler_list_is_returned() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let channel = sample_channel(5, "Quiet");
        upsert_channel(&conn, &channel).unwrap();
        let list = FillerListId::new();
        save_filler_list(&conn, list, "Empty", &[]).unwrap();
        attach_filler_list(&conn, channel.id, list, 1, 0).unwrap();

        let lists = get_channel_filler_lists(&conn, channel.id).unwrap();
        assert_eq!(lists.len(), 1);
        assert!(lists[0].programs.is_empty());
    }

    #[test]
    fn test_unattached_channel_has_no_fillers() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let channel = sample_channel(6, "Plain");
        upsert_channel(&conn, &channel).unwrap();
        assert!(get_channel_filler_lists(&conn, channel.id).unwrap().is_empty());
    }
}
