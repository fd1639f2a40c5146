#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package registry index for cmirror
//!
//! The index is a directory tree of newline-delimited JSON files, one per
//! package, with one line per published version. This crate decodes those
//! lines, walks the tree lazily, and keeps the git checkout up to date.

mod fs;
mod models;
mod reader;
mod refresh;

pub use fs::{DiskIndexFs, IndexEntry, IndexFs, MemoryIndexFs};
pub use models::{PackageVersionRecord, RegistryIndexConfig};
pub use reader::{IndexReader, RecordStream, ScanSummary};
pub use refresh::{GitIndex, IndexRefresher};
