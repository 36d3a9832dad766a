//! Onair - linear channels over on-demand media libraries
//!
//! This library crate exposes the resolver for the CLI and for integration
//! testing.

pub mod calculator;
pub mod catalog;
pub mod config;
pub mod continuity;
pub mod error;
pub mod filler;
pub mod lineup;
pub mod redirect;
pub mod storage;
pub mod throttle;

pub use calculator::{ResolvedStream, StreamProgramCalculator, StreamRequest};
pub use error::{RecoveredCondition, ResolveError, ResolveResult};
