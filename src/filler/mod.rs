//! Filling flex time with filler clips, fallback clips or placeholders.

pub mod picker;
pub mod policy;

pub use picker::{FillerPick, FillerPicker, PickedFiller, WeightedFillerPicker};
pub use policy::{FlexPolicy, OFFLINE_TITLE};
