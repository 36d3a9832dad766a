//! Durable backing for the continuity cache.

use onair_common::{ChannelId, FillerListId, ProgramId, Result};
use onair_db::models::{FillerPlayRow, ProgramPlayRow, StreamStateRow};
use onair_db::pool::{get_conn, DbPool};
use onair_db::queries::continuity;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Everything persisted for the continuity cache.
#[derive(Debug, Clone, Default)]
pub struct ContinuitySnapshot {
    pub streams: Vec<StreamStateRow>,
    pub program_plays: Vec<ProgramPlayRow>,
    pub filler_plays: Vec<FillerPlayRow>,
}

/// Write-through persistence for playback continuity.
///
/// Every write is an upsert, so repeating a write is harmless.
pub trait ContinuityStore: Send + Sync {
    fn load(&self) -> Result<ContinuitySnapshot>;

    fn put_stream(&self, row: &StreamStateRow) -> Result<()>;

    fn remove_stream(&self, channel: ChannelId) -> Result<()>;

    fn put_program_play(&self, channel: ChannelId, program: ProgramId, until_ms: i64) -> Result<()>;

    fn put_filler_play(&self, channel: ChannelId, list: FillerListId, until_ms: i64) -> Result<()>;
}

/// Continuity persisted in the SQLite database.
#[derive(Clone)]
pub struct SqliteContinuityStore {
    pool: DbPool,
}

impl SqliteContinuityStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ContinuityStore for SqliteContinuityStore {
    fn load(&self) -> Result<ContinuitySnapshot> {
        let conn = get_conn(&self.pool)?;
        Ok(ContinuitySnapshot {
            streams: continuity::list_stream_states(&conn)?,
            program_plays: continuity::list_program_plays(&conn)?,
            filler_plays: continuity::list_filler_plays(&conn)?,
        })
    }

    fn put_stream(&self, row: &StreamStateRow) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        continuity::upsert_stream_state(&conn, row)
    }

    fn remove_stream(&self, channel: ChannelId) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        continuity::delete_stream_state(&conn, channel)?;
        Ok(())
    }

    fn put_program_play(&self, channel: ChannelId, program: ProgramId, until_ms: i64) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        continuity::upsert_program_play(&conn, channel, program, until_ms)
    }

    fn put_filler_play(&self, channel: ChannelId, list: FillerListId, until_ms: i64) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        continuity::upsert_filler_play(&conn, channel, list, until_ms)
    }
}

#[derive(Default)]
struct MemoryState {
    streams: HashMap<ChannelId, StreamStateRow>,
    program_plays: HashMap<(ChannelId, ProgramId), i64>,
    filler_plays: HashMap<(ChannelId, FillerListId), i64>,
}

/// Continuity kept in process memory.
#[derive(Default)]
pub struct MemoryContinuityStore {
    state: Mutex<MemoryState>,
}

impl MemoryContinuityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContinuityStore for MemoryContinuityStore {
    fn load(&self) -> Result<ContinuitySnapshot> {
        let state = self.state.lock();
        Ok(ContinuitySnapshot {
            streams: state.streams.values().cloned().collect(),
            program_plays: state
                .program_plays
                .iter()
                .map(|(&(channel_id, program_id), &played_until_ms)| ProgramPlayRow {
                    channel_id,
                    program_id,
                    played_until_ms,
                })
                .collect(),
            filler_plays: state
                .filler_plays
                .iter()
                .map(|(&(channel_id, filler_list_id), &played_until_ms)| FillerPlayRow {
                    channel_id,
                    filler_list_id,
                    played_until_ms,
                })
                .collect(),
        })
    }

    fn put_stream(&self, row: &StreamStateRow) -> Result<()> {
        self.state.lock().streams.insert(row.channel_id, row.clone());
        Ok(())
    }

    fn remove_stream(&self, channel: ChannelId) -> Result<()> {
        self.state.lock().streams.remove(&channel);
        Ok(())
    }

    fn put_program_play(&self, channel: ChannelId, program: ProgramId, until_ms: i64) -> Result<()> {
        self.state
            .lock()
            .program_plays
            .insert((channel, program), until_ms);
        Ok(())
    }

    fn put_filler_play(&self, channel: ChannelId, list: FillerListId, until_ms: i64) -> Result<()> {
        self.state.lock().filler_plays.insert((channel, list), until_ms);
        Ok(())
    }
}
