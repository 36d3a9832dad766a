//! Onair-DB: Database schema, migrations, and query operations
//!
//! This crate provides SQLite persistence for onair using rusqlite and r2d2
//! connection pooling. It stores the channel catalog (channels, lineups,
//! programs, filler lists) and the playback continuity state that must
//! survive restarts.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rows of the playback state tables
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use onair_db::pool::{init_pool, get_conn};
//! use onair_db::queries::channels;
//!
//! let pool = init_pool("/var/lib/onair/onair.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! for channel in channels::list_channels(&conn).unwrap() {
//!     println!("{} {}", channel.number, channel.name);
//! }
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
