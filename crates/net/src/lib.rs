#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for cmirror
//!
//! This crate handles the HTTP side of mirroring: a pooled client with
//! optional retries, streaming artifact fetches that hash in flight, and
//! expansion of registry download URL templates.

mod client;
mod fetch;
mod template;

pub use client::{NetClient, NetConfig};
pub use fetch::{ArtifactFetcher, FetchOutcome};
pub use template::{index_prefix, DownloadTemplate};
