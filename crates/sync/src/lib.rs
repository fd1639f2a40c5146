#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Synchronization engine for cmirror
//!
//! Brings a cache directory in line with an index snapshot. The
//! [`SyncCoordinator`] runs a per-record state machine (skip, fetch,
//! re-fetch) across a bounded worker pool, verifying every artifact before
//! it is committed. The [`CacheReconciler`] then removes what the index no
//! longer references.

mod coordinator;
mod processor;
mod reconcile;

pub use coordinator::SyncCoordinator;
pub use processor::RecordProcessor;
pub use reconcile::CacheReconciler;
