//! Importing materialized catalogs.
//!
//! A catalog is a JSON document holding programs, filler lists and channels
//! with already-materialized lineups. Importing upserts everything into the
//! database; offsets are recomputed from the items.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use onair_common::{
    Channel, ChannelId, ExternalId, FillerListId, Lineup, LineupItem, OfflineSettings, Program,
    ProgramId,
};
use onair_db::pool::{get_conn, DbPool};
use onair_db::queries::{channels, fillers, programs};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Catalog {
    #[serde(default)]
    pub programs: Vec<CatalogProgram>,

    #[serde(default)]
    pub filler_lists: Vec<CatalogFillerList>,

    #[serde(default)]
    pub channels: Vec<CatalogChannel>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogProgram {
    #[serde(flatten)]
    pub program: Program,

    #[serde(default)]
    pub external_ids: Vec<ExternalId>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogFillerList {
    pub id: FillerListId,
    pub name: String,
    pub programs: Vec<ProgramId>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogChannelFiller {
    pub filler_list_id: FillerListId,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub cooldown_ms: i64,
}

fn default_weight() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogChannel {
    pub id: ChannelId,
    pub number: u32,
    pub name: String,
    pub start_time: DateTime<Utc>,

    #[serde(default)]
    pub offline: OfflineSettings,

    #[serde(default)]
    pub filler_repeat_cooldown_ms: i64,

    pub lineup: Vec<LineupItem>,

    #[serde(default)]
    pub fallbacks: Vec<ProgramId>,

    #[serde(default)]
    pub filler_lists: Vec<CatalogChannelFiller>,
}

impl CatalogChannel {
    /// The channel record, with its cycle length taken from the lineup.
    pub fn to_channel(&self, lineup: &Lineup) -> Channel {
        Channel {
            id: self.id,
            number: self.number,
            name: self.name.clone(),
            start_time_ms: self.start_time.timestamp_millis(),
            duration_ms: lineup.total_duration_ms(),
            offline: self.offline.clone(),
            filler_repeat_cooldown_ms: self.filler_repeat_cooldown_ms,
        }
    }
}

/// Counts of imported records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub programs: usize,
    pub filler_lists: usize,
    pub channels: usize,
}

/// Read a catalog document from disk.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse catalog: {:?}", path))
}

/// Upsert every record of `catalog` into the database.
///
/// Lineup items pointing at unknown programs are kept and only warned
/// about; they air as flex until the program shows up.
pub fn import_catalog(pool: &DbPool, catalog: &Catalog) -> Result<ImportSummary> {
    let conn = get_conn(pool)?;

    for entry in &catalog.programs {
        programs::upsert_program(&conn, &entry.program)
            .with_context(|| format!("Failed to import program {}", entry.program.id))?;
        programs::set_external_ids(&conn, entry.program.id, &entry.external_ids)?;
    }

    for list in &catalog.filler_lists {
        fillers::save_filler_list(&conn, list.id, &list.name, &list.programs)
            .with_context(|| format!("Failed to import filler list '{}'", list.name))?;
    }

    let known: HashSet<ProgramId> = catalog.programs.iter().map(|p| p.program.id).collect();

    for entry in &catalog.channels {
        for item in &entry.lineup {
            if let LineupItem::Content { id, .. } = item {
                if !known.contains(id) && programs::get_program(&conn, *id)?.is_none() {
                    tracing::warn!(channel = entry.number, program_id = %id, "Lineup references unknown program");
                }
            }
        }

        let lineup = Lineup::new(entry.lineup.clone());
        let channel = entry.to_channel(&lineup);
        channels::upsert_channel(&conn, &channel)
            .with_context(|| format!("Failed to import channel {} ({})", entry.number, entry.name))?;
        channels::save_lineup(&conn, channel.id, &lineup)?;
        channels::set_fallbacks(&conn, channel.id, &entry.fallbacks)?;
        for filler in &entry.filler_lists {
            fillers::attach_filler_list(
                &conn,
                channel.id,
                filler.filler_list_id,
                filler.weight,
                filler.cooldown_ms,
            )?;
        }
        tracing::info!(
            channel = entry.number,
            items = lineup.len(),
            duration_ms = lineup.total_duration_ms(),
            "Imported channel"
        );
    }

    Ok(ImportSummary {
        programs: catalog.programs.len(),
        filler_lists: catalog.filler_lists.len(),
        channels: catalog.channels.len(),
    })
}
