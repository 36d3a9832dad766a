//! Database query modules.
//!
//! This module organizes all database operations into logical groups:
//! - channels: Channel records, materialized lineups, fallback programs
//! - programs: Program records and their external source ids
//! - fillers: Filler lists and their attachment to channels
//! - continuity: Playback continuity state (last item, last-play times)

pub mod channels;
pub mod continuity;
pub mod fillers;
pub mod programs;

use rusqlite::types::Type;
use rusqlite::Row;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::str::FromStr;

/// Read a text column and parse it with `FromStr`.
pub(crate) fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.to_string().into())
    })
}

/// Read a text column holding JSON.
pub(crate) fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
