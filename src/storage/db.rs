use async_trait::async_trait;
use onair_common::{
    Channel, ChannelFillerList, ChannelId, ExternalId, Lineup, Program, ProgramId, Result,
    SourceType,
};
use onair_db::pool::{get_conn, DbPool};
use onair_db::queries::{channels, fillers, programs};

use super::{ChannelStore, FillerStore, ProgramStore};

/// Catalog stores backed by the SQLite database.
#[derive(Clone)]
pub struct DbCatalog {
    pool: DbPool,
}

impl DbCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl ChannelStore for DbCatalog {
    async fn get_channel(&self, id: ChannelId) -> Result<Option<Channel>> {
        let conn = get_conn(&self.pool)?;
        channels::get_channel(&conn, id)
    }

    async fn load_lineup(&self, id: ChannelId) -> Result<Option<Lineup>> {
        let conn = get_conn(&self.pool)?;
        channels::get_lineup(&conn, id)
    }

    async fn get_channel_fallback_programs(&self, id: ChannelId) -> Result<Vec<Program>> {
        let conn = get_conn(&self.pool)?;
        channels::get_fallback_programs(&conn, id)
    }

    async fn channel_count(&self) -> Result<usize> {
        let conn = get_conn(&self.pool)?;
        channels::count_channels(&conn)
    }
}

#[async_trait]
impl ProgramStore for DbCatalog {
    async fn get_program_by_id(&self, id: ProgramId) -> Result<Option<Program>> {
        let conn = get_conn(&self.pool)?;
        programs::get_program(&conn, id)
    }

    async fn get_program_external_ids(
        &self,
        id: ProgramId,
        source_types: &[SourceType],
    ) -> Result<Vec<ExternalId>> {
        let conn = get_conn(&self.pool)?;
        programs::get_external_ids(&conn, id, source_types)
    }
}

#[async_trait]
impl FillerStore for DbCatalog {
    async fn get_fillers_from_channel(&self, id: ChannelId) -> Result<Vec<ChannelFillerList>> {
        let conn = get_conn(&self.pool)?;
        fillers::get_channel_filler_lists(&conn, id)
    }
}
