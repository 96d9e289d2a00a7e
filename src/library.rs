//! Sample library: scanning, the media database and record labels.

mod database;
mod display;
mod metadata;
mod model;
mod scan;

pub use database::{MediaDatabase, records_from_scan};
pub use display::{format_duration, label_from_fields};
pub use metadata::probe;
pub use model::*;
pub use scan::{ScanOutcome, ScanSkip, scan};

#[cfg(test)]
mod tests;
