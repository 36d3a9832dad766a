//! Playback continuity queries.
//!
//! Every write is an upsert keyed by channel (and program or filler list),
//! so replaying the same decision twice leaves the same rows behind.

use onair_common::{ChannelId, Error, FillerListId, ProgramId, Result};
use rusqlite::{Connection, OptionalExtension, Row};

use super::{json_column, parse_column};
use crate::models::{FillerPlayRow, ProgramPlayRow, StreamStateRow};

fn row_to_stream_state(row: &Row<'_>) -> rusqlite::Result<StreamStateRow> {
    Ok(StreamStateRow {
        channel_id: parse_column(row, 0)?,
        recorded_at_ms: row.get(1)?,
        anchored_at_ms: row.get(2)?,
        item: json_column(row, 3)?,
    })
}

/// Write the last resolved item of a channel.
pub fn upsert_stream_state(conn: &Connection, state: &StreamStateRow) -> Result<()> {
    let item = serde_json::to_string(&state.item)?;

    conn.execute(
        "INSERT INTO channel_stream_state (channel_id, recorded_at_ms, anchored_at_ms, item)
         VALUES (:channel_id, :recorded_at_ms, :anchored_at_ms, :item)
         ON CONFLICT(channel_id) DO UPDATE SET
             recorded_at_ms = excluded.recorded_at_ms,
             anchored_at_ms = excluded.anchored_at_ms,
             item = excluded.item",
        rusqlite::named_params! {
            ":channel_id": state.channel_id.to_string(),
            ":recorded_at_ms": state.recorded_at_ms,
            ":anchored_at_ms": state.anchored_at_ms,
            ":item": item,
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

pub fn get_stream_state(conn: &Connection, channel_id: ChannelId) -> Result<Option<StreamStateRow>> {
    conn.query_row(
        "SELECT channel_id, recorded_at_ms, anchored_at_ms, item
         FROM channel_stream_state WHERE channel_id = :channel_id",
        rusqlite::named_params! { ":channel_id": channel_id.to_string() },
        row_to_stream_state,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

pub fn list_stream_states(conn: &Connection) -> Result<Vec<StreamStateRow>> {
    let mut stmt = conn
        .prepare("SELECT channel_id, recorded_at_ms, anchored_at_ms, item FROM channel_stream_state")
        .map_err(|e| Error::database(e.to_string()))?;

    let rows = stmt
        .query_map([], row_to_stream_state)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows)
}

/// Remove the last resolved item of a channel.
///
/// Play history is kept. Returns `true` if a row was removed.
pub fn delete_stream_state(conn: &Connection, channel_id: ChannelId) -> Result<bool> {
    let affected = conn
        .execute(
            "DELETE FROM channel_stream_state WHERE channel_id = :channel_id",
            rusqlite::named_params! { ":channel_id": channel_id.to_string() },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(affected > 0)
}

pub fn upsert_program_play(
    conn: &Connection,
    channel_id: ChannelId,
    program_id: ProgramId,
    played_until_ms: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO program_play_history (channel_id, program_id, played_until_ms)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(channel_id, program_id) DO UPDATE SET
             played_until_ms = excluded.played_until_ms",
        rusqlite::params![channel_id.to_string(), program_id.to_string(), played_until_ms],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

pub fn upsert_filler_play(
    conn: &Connection,
    channel_id: ChannelId,
    filler_list_id: FillerListId,
    played_until_ms: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO filler_play_history (channel_id, filler_list_id, played_until_ms)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(channel_id, filler_list_id) DO UPDATE SET
             played_until_ms = excluded.played_until_ms",
        rusqlite::params![
            channel_id.to_string(),
            filler_list_id.to_string(),
            played_until_ms
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

pub fn list_program_plays(conn: &Connection) -> Result<Vec<ProgramPlayRow>> {
    let mut stmt = conn
        .prepare("SELECT channel_id, program_id, played_until_ms FROM program_play_history")
        .map_err(|e| Error::database(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(ProgramPlayRow {
                channel_id: parse_column(row, 0)?,
                program_id: parse_column(row, 1)?,
                played_until_ms: row.get(2)?,
            })
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows)
}

pub fn list_filler_plays(conn: &Connection) -> Result<Vec<FillerPlayRow>> {
    let mut stmt = conn
        .prepare("SELECT channel_id, filler_list_id, played_until_ms FROM filler_play_history")
        .map_err(|e| Error::database(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(FillerPlayRow {
                channel_id: parse_column(row, 0)?,
                filler_list_id: parse_column(row, 1)?,
                played_until_ms: row.get(2)?,
            })
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows)
}
