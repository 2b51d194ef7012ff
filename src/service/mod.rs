// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Business operations sitting between the HTTP handlers and storage.

pub mod projects;
pub mod sync;

pub use projects::ProjectService;
pub use sync::process_events;
