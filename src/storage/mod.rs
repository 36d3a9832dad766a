//! Read-only seams to channel configuration and the media library.
//!
//! The resolver only reads through these traits. [`DbCatalog`] serves them
//! from the SQLite store and [`MemoryCatalog`] from in-process maps.

mod db;
mod memory;

pub use db::DbCatalog;
pub use memory::MemoryCatalog;

use async_trait::async_trait;
use onair_common::{
    Channel, ChannelFillerList, ChannelId, ExternalId, Lineup, Program, ProgramId, Result,
    SourceType,
};

#[async_trait]
pub trait ChannelStore: Send + Sync {
    async fn get_channel(&self, id: ChannelId) -> Result<Option<Channel>>;

    /// Materialized lineup of a channel, validated against its offsets.
    async fn load_lineup(&self, id: ChannelId) -> Result<Option<Lineup>>;

    /// Channel and lineup together. A channel without a stored lineup gets
    /// an empty one.
    async fn load_channel_and_lineup(&self, id: ChannelId) -> Result<Option<(Channel, Lineup)>> {
        let Some(channel) = self.get_channel(id).await? else {
            return Ok(None);
        };
        let lineup = self
            .load_lineup(id)
            .await?
            .unwrap_or_else(|| Lineup::new(Vec::new()));
        Ok(Some((channel, lineup)))
    }

    /// Fallback clips shown when a channel in clip mode has nothing to air.
    async fn get_channel_fallback_programs(&self, id: ChannelId) -> Result<Vec<Program>>;

    async fn channel_count(&self) -> Result<usize>;
}

#[async_trait]
pub trait ProgramStore: Send + Sync {
    async fn get_program_by_id(&self, id: ProgramId) -> Result<Option<Program>>;

    /// External ids of a program. An empty `source_types` returns all of them.
    async fn get_program_external_ids(
        &self,
        id: ProgramId,
        source_types: &[SourceType],
    ) -> Result<Vec<ExternalId>>;
}

#[async_trait]
pub trait FillerStore: Send + Sync {
    async fn get_fillers_from_channel(&self, id: ChannelId) -> Result<Vec<ChannelFillerList>>;
}
