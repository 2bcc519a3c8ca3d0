// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display-list recording.
//!
//! `tessera_core` turns canvas-style drawing calls into a compact, immutable
//! [`DisplayList`](display_list::DisplayList). It is `no_std` compatible
//! (with `alloc`). Recording is single-threaded; finished lists are
//! `Send + Sync` and can be handed to another thread for playback.
//!
//! # Architecture
//!
//! ```text
//!   canvas calls
//!       │
//!       ▼
//!   DisplayListBuilder ──► attribute diff ──► OpBuffer (tagged records)
//!       │        │
//!       │        └──► MatrixClipTracker (transform, device clip)
//!       ▼
//!   layer frames ──► BoundsAccumulator (Rect | SpatialIndex)
//!       │
//!       ▼
//!   build() ──► DisplayList { records, bounds, DlRTree, flags }
//! ```
//!
//! **[`builder`]** — The recording canvas. Elides no-op calls, defers `Save`
//! records until something is drawn inside them, classifies paints, and
//! tracks group-opacity compatibility per save frame.
//!
//! **[`buffer`]** — The op arena: 8-byte aligned, length-prefixed records
//! with page-granular growth and the two in-place backpatches (restore index
//! and opacity distribution).
//!
//! **[`op`]** — Op kinds, the decoded [`DlOp`](op::DlOp) enum, and its
//! record encoding.
//!
//! **[`accumulator`]** — Scoped bounds accumulation, as one running rect or
//! as per-op rects for a spatial index.
//!
//! **[`rtree`]** — Bulk-built R-tree over op bounds.
//!
//! **[`tracker`]** — Transform and conservative device clip stack.
//!
//! **[`flags`]** — Static per-op descriptors of which paint attributes apply.
//!
//! **[`display_list`]** — The built artifact, iteration, and culled
//! iteration.
//!
//! **[`paint`]**, **[`color`]**, **[`effects`]**, **[`resource`]**,
//! **[`path`]**, **[`vertices`]** — What ops draw with and draw.
//!
//! **[`geometry`]**, **[`transform`]** — Rect helpers and the 4×4 matrix.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! builder instrumentation, with a zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-op bounds
//!   events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod accumulator;
pub mod buffer;
pub mod builder;
pub mod color;
pub mod display_list;
pub mod effects;
pub mod error;
pub mod flags;
pub mod geometry;
pub mod op;
pub mod paint;
pub mod path;
pub mod resource;
pub mod rtree;
pub mod trace;
pub mod tracker;
pub mod transform;
pub mod vertices;
