//! Continuity across process restarts, backed by an on-disk database.

use std::sync::Arc;

use assert_matches::assert_matches;
use onair::calculator::{StreamProgramCalculator, StreamRequest};
use onair::config::PlaybackConfig;
use onair::continuity::{ContinuityCache, PlayHistory, SqliteContinuityStore};
use onair::storage::DbCatalog;
use onair_common::{
    Channel, ChannelId, Lineup, LineupItem, OfflineSettings, Program, ProgramId, ProgramKind,
    StreamLineupItem,
};
use onair_db::pool::{init_pool, DbPool};
use onair_db::queries::{channels, programs};
use tempfile::TempDir;

const START: i64 = 1_700_000_000_000;

fn open(dir: &TempDir) -> DbPool {
    let path = dir.path().join("onair.db");
    init_pool(&path.to_string_lossy()).unwrap()
}

fn seed(pool: &DbPool) -> (Channel, Program) {
    let conn = pool.get().unwrap();
    let program = Program {
        id: ProgramId::new(),
        title: "Feature".to_string(),
        duration_ms: 5_400_000,
        location: "/media/feature.mkv".to_string(),
        kind: ProgramKind::Movie,
    };
    programs::upsert_program(&conn, &program).unwrap();

    let lineup = Lineup::new(vec![LineupItem::Content {
        id: program.id,
        duration_ms: program.duration_ms,
        custom_show_id: None,
        filler_list_id: None,
    }]);
    let channel = Channel {
        id: ChannelId::new(),
        number: 4,
        name: "Movies".to_string(),
        start_time_ms: START,
        duration_ms: lineup.total_duration_ms(),
        offline: OfflineSettings::default(),
        filler_repeat_cooldown_ms: 0,
    };
    channels::upsert_channel(&conn, &channel).unwrap();
    channels::save_lineup(&conn, channel.id, &lineup).unwrap();

    (channel, program)
}

fn calculator(pool: &DbPool) -> StreamProgramCalculator {
    let settings = PlaybackConfig::default();
    let store = Arc::new(SqliteContinuityStore::new(pool.clone()));
    let cache = Arc::new(ContinuityCache::load(store, settings.slack_ms).unwrap());
    StreamProgramCalculator::new(Arc::new(DbCatalog::new(pool.clone())), cache, settings)
}

#[tokio::test]
async fn test_continuity_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let (channel, program) = {
        let pool = open(&dir);
        seed(&pool)
    };

    let first = {
        let pool = open(&dir);
        calculator(&pool)
            .get_current_lineup_item(&StreamRequest::new(channel.id, START + 30_000))
            .await
            .unwrap()
    };
    assert!(!first.from_cache);

    let pool = open(&dir);
    let calculator = calculator(&pool);
    let resumed = calculator
        .resolve(&StreamRequest::new(channel.id, START + 34_000))
        .await
        .unwrap();

    assert!(resumed.from_cache);
    assert_eq!(resumed.item, first.item);
    assert_eq!(
        calculator.cache().program_last_played(channel.id, program.id),
        Some(START + 5_400_000)
    );
}

#[tokio::test]
async fn test_stop_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let pool = open(&dir);
    let (channel, _) = seed(&pool);

    let calc = calculator(&pool);
    calc.get_current_lineup_item(&StreamRequest::new(channel.id, START + 30_000))
        .await
        .unwrap();
    assert!(calc.stop_playback(channel.id).unwrap());
    drop(calc);

    let resolved = calculator(&pool)
        .resolve(&StreamRequest::new(channel.id, START + 31_000))
        .await
        .unwrap();
    assert!(!resolved.from_cache);
    assert_matches!(resolved.item, StreamLineupItem::Program(p) if p.start_offset_ms == 31_000);
}

#[tokio::test]
async fn test_corrupt_lineup_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let pool = open(&dir);
    let (channel, _) = seed(&pool);
    {
        let conn = pool.get().unwrap();
        conn.execute(
            "UPDATE channel_lineups SET offsets = '[0, 5]' WHERE channel_id = ?",
            [channel.id.to_string()],
        )
        .unwrap();
    }

    let result = calculator(&pool)
        .resolve(&StreamRequest::new(channel.id, START))
        .await;
    assert_matches!(result, Err(onair::ResolveError::NoCurrentProgram { .. }));
}
