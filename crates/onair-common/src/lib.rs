//! Onair-Common: shared types for the onair channel resolver.
//!
//! This crate provides the data model consumed and produced by the resolver:
//!
//! - **Typed IDs**: UUID wrappers for channels, programs and filler lists
//! - **Lineups**: cyclic item sequences with cumulative offsets
//! - **Channels and programs**: read-only configuration records
//! - **Stream items**: resolved items handed to the transcoding pipeline
//! - **Error Handling**: common error type and result alias
//!
//! # Examples
//!
//! ```
//! use onair_common::{Lineup, LineupItem, ProgramId};
//!
//! let lineup = Lineup::new(vec![
//!     LineupItem::Content {
//!         id: ProgramId::new(),
//!         duration_ms: 2_000,
//!         custom_show_id: None,
//!         filler_list_id: None,
//!     },
//!     LineupItem::Offline { duration_ms: 3_000 },
//! ]);
//!
//! assert_eq!(lineup.offsets(), &[0, 2_000]);
//! assert_eq!(lineup.total_duration_ms(), 5_000);
//! ```

pub mod error;
pub mod ids;
pub mod lineup;
pub mod stream;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use lineup::{Lineup, LineupItem, LINEUP_SCHEMA_VERSION};
pub use stream::*;
pub use types::*;

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
