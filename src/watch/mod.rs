// src/watch/mod.rs

//! File watching and change classification.
//!
//! This module is responsible for:
//! - Wiring up a cross-platform filesystem watcher (`notify`) over every
//!   configured [`WatchRoot`](crate::types::WatchRoot) and funnelling all of
//!   them into one ordered channel of [`RawEvent`](crate::types::RawEvent)s.
//! - Classifying each raw event into a [`Category`](crate::types::Category).
//!
//! It does **not** know about pipelines or commands.

pub mod classify;
pub mod watcher;

pub use classify::EventClassifier;
pub use watcher::{spawn_watcher, WatcherHandle};
