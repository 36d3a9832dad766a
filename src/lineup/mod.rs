//! Locating the current item of a channel's cyclic lineup.
//!
//! [`clock`] folds wall-clock time into a position inside the cycle,
//! [`index`] maps that position onto a lineup slot, and [`locator`] turns the
//! slot into something playable by fetching its backing program.

pub mod clock;
pub mod index;
pub mod locator;

pub use clock::{cycle_elapsed, CyclePosition};
pub use index::{locate_index, position_in, SlotPosition};
pub use locator::{LocatedItem, LocatedSlot, Locator};
