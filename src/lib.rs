#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

//! gpsinfo library: the location-update pipeline behind the `gpsinfo` binary.
//!
//! - `processor`: folds raw fixes into a snapshot, debounced closest-city lookup, marker
//! - `gazetteer`: city list, closest-city search, JSON loader, CSV import
//! - `readout`: fixed, labelled display table over the snapshot
//! - `source`: newline-delimited JSON fix reader
//! - `app`: event loop wiring loader, reader and processor
//! - `config`: TOML + env-var configuration
//! - `fix`, `geo`: raw fix type, coordinates and great-circle distance

pub mod app;
pub mod config;
pub mod fix;
pub mod gazetteer;
pub mod geo;
pub mod processor;
pub mod readout;
pub mod source;

// Re-export key types at crate root for convenience.
pub use config::Config;
pub use fix::Fix;
pub use gazetteer::{CityEntry, Gazetteer};
pub use geo::Coordinate;
pub use processor::{LocationProcessor, Marker, ProcessorSettings, Snapshot};
pub use readout::Readout;
pub use source::SourceEvent;
