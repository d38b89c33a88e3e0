// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The reconciliation engine: one cache, watcher and serialized processor
//! per target kind.

pub mod cache;
pub mod diff;
pub mod handlers;
pub mod manager;
pub mod registry;
pub mod selector;
pub mod watch;

pub use manager::{Message, Source, SyncManager, SyncManagerHandle};
pub use watch::ObjectWatcher;
