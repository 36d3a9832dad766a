//! Channel database queries.
//!
//! This module provides operations for channel records, their materialized
//! lineups and their ordered fallback programs.

use onair_common::{
    Channel, ChannelId, Error, Lineup, LineupItem, OfflineSettings, Program, ProgramId, Result,
};
use rusqlite::{Connection, OptionalExtension, Row};

use super::programs::{row_to_program, PROGRAM_COLUMNS};
use super::{json_column, parse_column};

const CHANNEL_COLUMNS: &str = "id, number, name, start_time_ms, duration_ms, offline_mode, \
     offline_picture, offline_sound, filler_repeat_cooldown_ms";

fn row_to_channel(row: &Row<'_>) -> rusqlite::Result<Channel> {
    Ok(Channel {
        id: parse_column(row, 0)?,
        number: row.get(1)?,
        name: row.get(2)?,
        start_time_ms: row.get(3)?,
        duration_ms: row.get(4)?,
        offline: OfflineSettings {
            mode: parse_column(row, 5)?,
            picture: row.get(6)?,
            sound: row.get(7)?,
        },
        filler_repeat_cooldown_ms: row.get(8)?,
    })
}

/// Insert a channel, or replace the stored fields of an existing one.
pub fn upsert_channel(conn: &Connection, channel: &Channel) -> Result<()> {
    conn.execute(
        "INSERT INTO channels (id, number, name, start_time_ms, duration_ms, offline_mode,
                               offline_picture, offline_sound, filler_repeat_cooldown_ms)
         VALUES (:id, :number, :name, :start_time_ms, :duration_ms, :offline_mode,
                 :offline_picture, :offline_sound, :filler_repeat_cooldown_ms)
         ON CONFLICT(id) DO UPDATE SET
             number = excluded.number,
             name = excluded.name,
             start_time_ms = excluded.start_time_ms,
             duration_ms = excluded.duration_ms,
             offline_mode = excluded.offline_mode,
             offline_picture = excluded.offline_picture,
             offline_sound = excluded.offline_sound,
             filler_repeat_cooldown_ms = excluded.filler_repeat_cooldown_ms",
        rusqlite::named_params! {
            ":id": channel.id.to_string(),
            ":number": channel.number,
            ":name": channel.name,
            ":start_time_ms": channel.start_time_ms,
            ":duration_ms": channel.duration_ms,
            ":offline_mode": channel.offline.mode.to_string(),
            ":offline_picture": channel.offline.picture,
            ":offline_sound": channel.offline.sound,
            ":filler_repeat_cooldown_ms": channel.filler_repeat_cooldown_ms,
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// Get a channel by ID.
pub fn get_channel(conn: &Connection, id: ChannelId) -> Result<Option<Channel>> {
    conn.query_row(
        &format!("SELECT {CHANNEL_COLUMNS} FROM channels WHERE id = :id"),
        rusqlite::named_params! { ":id": id.to_string() },
        row_to_channel,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// List all channels ordered by channel number.
pub fn list_channels(conn: &Connection) -> Result<Vec<Channel>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {CHANNEL_COLUMNS} FROM channels ORDER BY number"
        ))
        .map_err(|e| Error::database(e.to_string()))?;

    let channels = stmt
        .query_map([], row_to_channel)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(channels)
}

/// Count all channels.
pub fn count_channels(conn: &Connection) -> Result<usize> {
    conn.query_row("SELECT COUNT(*) FROM channels", [], |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))
}

/// Delete a channel together with its lineup, fallbacks and filler links.
///
/// Returns `true` if a channel was deleted.
pub fn delete_channel(conn: &Connection, id: ChannelId) -> Result<bool> {
    let affected = conn
        .execute(
            "DELETE FROM channels WHERE id = :id",
            rusqlite::named_params! { ":id": id.to_string() },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(affected > 0)
}

/// Store the materialized lineup of a channel, replacing any previous one.
pub fn save_lineup(conn: &Connection, channel_id: ChannelId, lineup: &Lineup) -> Result<()> {
    let items = serde_json::to_string(lineup.items())?;
    let offsets = serde_json::to_string(lineup.offsets())?;

    conn.execute(
        "INSERT INTO channel_lineups (channel_id, schema_version, items, offsets)
         VALUES (:channel_id, :schema_version, :items, :offsets)
         ON CONFLICT(channel_id) DO UPDATE SET
             schema_version = excluded.schema_version,
             items = excluded.items,
             offsets = excluded.offsets,
             updated_at = datetime('now')",
        rusqlite::named_params! {
            ":channel_id": channel_id.to_string(),
            ":schema_version": lineup.schema_version,
            ":items": items,
            ":offsets": offsets,
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// Load the lineup of a channel.
///
/// Stored offsets are validated against the items; a mismatch is reported
/// as [`Error::InvalidInput`].
pub fn get_lineup(conn: &Connection, channel_id: ChannelId) -> Result<Option<Lineup>> {
    let row = conn
        .query_row(
            "SELECT schema_version, items, offsets FROM channel_lineups WHERE channel_id = :id",
            rusqlite::named_params! { ":id": channel_id.to_string() },
            |row| {
                let schema_version: u32 = row.get(0)?;
                let items: Vec<LineupItem> = json_column(row, 1)?;
                let offsets: Vec<i64> = json_column(row, 2)?;
                Ok((schema_version, items, offsets))
            },
        )
        .optional()
        .map_err(|e| Error::database(e.to_string()))?;

    row.map(|(schema_version, items, offsets)| Lineup::from_parts(schema_version, items, offsets))
        .transpose()
}

/// Replace the ordered fallback programs of a channel.
pub fn set_fallbacks(conn: &Connection, channel_id: ChannelId, programs: &[ProgramId]) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    tx.execute(
        "DELETE FROM channel_fallbacks WHERE channel_id = ?",
        [channel_id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    for (position, program_id) in programs.iter().enumerate() {
        tx.execute(
            "INSERT INTO channel_fallbacks (channel_id, program_id, position) VALUES (?, ?, ?)",
            rusqlite::params![channel_id.to_string(), program_id.to_string(), position as i64],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))
}

/// Get the fallback programs of a channel in configured order.
pub fn get_fallback_programs(conn: &Connection, channel_id: ChannelId) -> Result<Vec<Program>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {PROGRAM_COLUMNS} FROM channel_fallbacks f
             JOIN programs p ON p.id = f.program_id
             WHERE f.channel_id = ?
             ORDER BY f.position"
        ))
        .map_err(|e| Error::database(e.to_string()))?;

    let programs = stmt
        .query_map([channel_id.to_string()], row_to_program)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(programs)
}
