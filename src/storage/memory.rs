use async_trait::async_trait;
use onair_common::{
    Channel, ChannelFillerList, ChannelId, ExternalId, Lineup, Program, ProgramId, Result,
    SourceType,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ChannelStore, FillerStore, ProgramStore};

#[derive(Default)]
struct Inner {
    channels: HashMap<ChannelId, Channel>,
    lineups: HashMap<ChannelId, Lineup>,
    programs: HashMap<ProgramId, Program>,
    external_ids: HashMap<ProgramId, Vec<ExternalId>>,
    fallbacks: HashMap<ChannelId, Vec<Program>>,
    fillers: HashMap<ChannelId, Vec<ChannelFillerList>>,
}

/// Catalog stores held in memory, for tests and embedding.
#[derive(Default)]
pub struct MemoryCatalog {
    inner: RwLock<Inner>,
    channel_reads: AtomicUsize,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_program(&self, program: Program) {
        self.inner.write().programs.insert(program.id, program);
    }

    pub fn remove_program(&self, id: ProgramId) -> Option<Program> {
        self.inner.write().programs.remove(&id)
    }

    pub fn set_external_ids(&self, id: ProgramId, external_ids: Vec<ExternalId>) {
        self.inner.write().external_ids.insert(id, external_ids);
    }

    /// Add a channel with its lineup, replacing any previous definition.
    pub fn insert_channel(&self, channel: Channel, lineup: Lineup) {
        let mut inner = self.inner.write();
        inner.lineups.insert(channel.id, lineup);
        inner.channels.insert(channel.id, channel);
    }

    pub fn set_fallbacks(&self, channel: ChannelId, programs: Vec<Program>) {
        self.inner.write().fallbacks.insert(channel, programs);
    }

    pub fn attach_filler_list(&self, channel: ChannelId, list: ChannelFillerList) {
        self.inner
            .write()
            .fillers
            .entry(channel)
            .or_default()
            .push(list);
    }

    /// Number of channel lookups served so far.
    pub fn channel_reads(&self) -> usize {
        self.channel_reads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ChannelStore for MemoryCatalog {
    async fn get_channel(&self, id: ChannelId) -> Result<Option<Channel>> {
        self.channel_reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.inner.read().channels.get(&id).cloned())
    }

    async fn load_lineup(&self, id: ChannelId) -> Result<Option<Lineup>> {
        Ok(self.inner.read().lineups.get(&id).cloned())
    }

    async fn get_channel_fallback_programs(&self, id: ChannelId) -> Result<Vec<Program>> {
        Ok(self
            .inner
            .read()
            .fallbacks
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn channel_count(&self) -> Result<usize> {
        Ok(self.inner.read().channels.len())
    }
}

#[async_trait]
impl ProgramStore for MemoryCatalog {
    async fn get_program_by_id(&self, id: ProgramId) -> Result<Option<Program>> {
        Ok(self.inner.read().programs.get(&id).cloned())
    }

    async fn get_program_external_ids(
        &self,
        id: ProgramId,
        source_types: &[SourceType],
    ) -> Result<Vec<ExternalId>> {
        let inner = self.inner.read();
        Ok(inner
            .external_ids
            .get(&id)
            .map(|ids| {
                ids.iter()
                    .filter(|ext| {
                        source_types.is_empty() || source_types.contains(&ext.source_type)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl FillerStore for MemoryCatalog {
    async fn get_fillers_from_channel(&self, id: ChannelId) -> Result<Vec<ChannelFillerList>> {
        Ok(self.inner.read().fillers.get(&id).cloned().unwrap_or_default())
    }
}
