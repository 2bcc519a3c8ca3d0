// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing, event collection, and JSON export for tessera
//! diagnostics.
//!
//! This crate provides [`TraceSink`](tessera_core::trace::TraceSink)
//! implementations and display list dumps for development and tests:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`collect::CollectingSink`]: keeps events in memory, shareable with the
//!   code that inspects them.
//! - [`json::export`]: writes a built
//!   [`DisplayList`](tessera_core::display_list::DisplayList) as JSON.

pub mod collect;
pub mod json;
pub mod pretty;
