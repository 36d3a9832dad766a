mod cli;

use onair::{
    calculator::{ResolvedStream, StreamProgramCalculator, StreamRequest},
    catalog, config,
    continuity::{ContinuityCache, SqliteContinuityStore},
    storage::DbCatalog,
    throttle::AttemptThrottle,
};
use onair_common::{ChannelId, StreamLineupItem};
use onair_db::pool::{get_conn, init_pool, DbPool};
use onair_db::queries::channels;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "onair=trace,onair_db=debug,onair_common=debug".to_string()
        } else {
            "onair=info,onair_db=info".to_string()
        }
    });

    // Logs go to stderr so command output stays machine readable.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Resolve {
            channel,
            at,
            session,
            json,
            no_commit,
        } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(resolve_channel(
                &config,
                &channel,
                at.as_deref(),
                session,
                json,
                no_commit,
            ))
        }
        Commands::Stop { channel } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            stop_channel(&config, &channel)
        }
        Commands::Import { file } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            import_catalog(&config, &file)
        }
        Commands::Channels => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            list_channels(&config)
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("onair {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn open_database(config: &config::Config) -> Result<DbPool> {
    let path = config::database_path(config);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }
    }

    tracing::debug!("Opening database at {}", path.display());
    let pool = init_pool(&path.to_string_lossy())
        .with_context(|| format!("Failed to open database: {:?}", path))?;
    Ok(pool)
}

/// Accept either a channel id or a channel number.
fn find_channel(pool: &DbPool, arg: &str) -> Result<ChannelId> {
    if let Ok(id) = arg.parse::<ChannelId>() {
        return Ok(id);
    }

    let number: u32 = arg
        .parse()
        .with_context(|| format!("'{}' is neither a channel number nor a channel id", arg))?;
    let conn = get_conn(pool)?;
    channels::list_channels(&conn)?
        .into_iter()
        .find(|c| c.number == number)
        .map(|c| c.id)
        .ok_or_else(|| anyhow::anyhow!("Channel {} not found", number))
}

fn parse_instant(at: Option<&str>) -> Result<i64> {
    match at {
        Some(s) => {
            let instant = chrono::DateTime::parse_from_rfc3339(s)
                .with_context(|| format!("Invalid timestamp '{}', expected RFC 3339", s))?;
            Ok(instant.timestamp_millis())
        }
        None => Ok(onair_common::now_ms()),
    }
}

async fn resolve_channel(
    config: &config::Config,
    channel: &str,
    at: Option<&str>,
    session: Option<String>,
    json: bool,
    no_commit: bool,
) -> Result<()> {
    let pool = open_database(config)?;
    let channel_id = find_channel(&pool, channel)?;
    let timestamp_ms = parse_instant(at)?;

    let store = Arc::new(SqliteContinuityStore::new(pool.clone()));
    let cache = Arc::new(ContinuityCache::load(store, config.playback.slack_ms)?);
    let calculator = StreamProgramCalculator::new(
        Arc::new(DbCatalog::new(pool)),
        cache,
        config.playback.clone(),
    )
    .with_throttle(AttemptThrottle::new(&config.throttle));

    let mut request = StreamRequest::new(channel_id, timestamp_ms);
    if let Some(token) = session {
        request = request.with_session(token);
    }

    let resolved = if no_commit {
        calculator.resolve(&request).await?
    } else {
        calculator.get_current_lineup_item(&request).await?
    };

    if json {
        let output = serde_json::json!({
            "channel": resolved.source_channel.number,
            "channel_id": resolved.source_channel.id,
            "context_channel": resolved.channel_context.number,
            "from_cache": resolved.from_cache,
            "decided_at_ms": resolved.decided_at_ms,
            "item": resolved.item,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_resolved(&resolved);
    }

    Ok(())
}

fn print_resolved(resolved: &ResolvedStream) {
    let source = &resolved.source_channel;
    println!("Channel {} ({})", source.number, source.name);
    if resolved.channel_context.id != source.id {
        println!(
            "  Via: {} ({})",
            resolved.channel_context.number, resolved.channel_context.name
        );
    }

    let item = &resolved.item;
    println!("  Type: {}", item.kind());
    match item {
        StreamLineupItem::Program(p) => {
            println!("  Title: {}", p.title);
            println!("  Location: {}", p.location);
        }
        StreamLineupItem::Commercial(c) => {
            println!("  Title: {}", c.title);
            println!("  Location: {}", c.location);
            if c.infinite_loop {
                println!("  Looping: yes");
            }
        }
        StreamLineupItem::Offline(o) => println!("  Title: {}", o.title),
        StreamLineupItem::Error(e) => println!("  Reason: {}", e.reason),
        StreamLineupItem::Redirect(r) => println!("  Target: {}", r.channel),
        StreamLineupItem::Loading(_) => {}
    }
    println!("  Start offset: {}", format_ms(item.start_offset_ms()));
    println!("  Stream duration: {}", format_ms(item.stream_duration_ms()));
    if resolved.from_cache {
        println!("  Resumed: yes");
    }
}

fn format_ms(ms: i64) -> String {
    let total_secs = ms / 1000;
    format!(
        "{}:{:02}:{:02}.{:03}",
        total_secs / 3600,
        (total_secs / 60) % 60,
        total_secs % 60,
        ms % 1000
    )
}

fn stop_channel(config: &config::Config, channel: &str) -> Result<()> {
    let pool = open_database(config)?;
    let channel_id = find_channel(&pool, channel)?;

    let store = Arc::new(SqliteContinuityStore::new(pool));
    let cache = ContinuityCache::load(store, config.playback.slack_ms)?;
    if cache.stop(channel_id)? {
        println!("Stopped channel {}", channel);
    } else {
        println!("Channel {} has no active stream", channel);
    }
    Ok(())
}

fn import_catalog(config: &config::Config, file: &Path) -> Result<()> {
    let catalog = catalog::load_catalog(file)?;
    let pool = open_database(config)?;
    let summary = catalog::import_catalog(&pool, &catalog)?;

    println!(
        "Imported {} programs, {} filler lists, {} channels",
        summary.programs, summary.filler_lists, summary.channels
    );
    Ok(())
}

fn list_channels(config: &config::Config) -> Result<()> {
    let pool = open_database(config)?;
    let conn = get_conn(&pool)?;
    let list = channels::list_channels(&conn)?;

    if list.is_empty() {
        println!("No channels configured");
        return Ok(());
    }

    for channel in list {
        println!(
            "{:>4}  {}  cycle {}  ({})",
            channel.number,
            channel.name,
            format_ms(channel.duration_ms),
            channel.id
        );
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Database: {}", config.database.path.display());
    println!("  Slack: {}ms", config.playback.slack_ms);
    println!("  Offline cap: {}ms", config.playback.offline_cap_ms);
    println!(
        "  Throttle: {}",
        if config.throttle.enabled {
            format!(
                "{} attempts per {}s",
                config.throttle.max_attempts, config.throttle.window_secs
            )
        } else {
            "disabled".to_string()
        }
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ms() {
        assert_eq!(format_ms(0), "0:00:00.000");
        assert_eq!(format_ms(3_723_004), "1:02:03.004");
    }

    #[test]
    fn test_parse_instant() {
        assert_eq!(parse_instant(Some("2024-01-01T00:00:00Z")).unwrap(), 1_704_067_200_000);
        assert!(parse_instant(Some("yesterday")).is_err());
    }
}
