// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event collection.
//!
//! [`CollectingSink`] stores every event it receives as a [`TraceEvent`].
//! The sink hands out [`EventLog`] handles sharing its storage, so events
//! stay readable after the sink was boxed and given to a builder.

use std::sync::{Arc, Mutex, PoisonError};

use kurbo::Rect;
use tessera_core::op::DlOpType;
use tessera_core::trace::{
    BuildSummary, OpRecordedEvent, OpSkippedEvent, RestoreEvent, SaveEvent, SkipReason, TraceSink,
};

/// One collected event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TraceEvent {
    /// A [`SaveEvent`].
    Save(SaveEvent),
    /// A [`RestoreEvent`].
    Restore(RestoreEvent),
    /// An [`OpRecordedEvent`].
    OpRecorded(OpRecordedEvent),
    /// An [`OpSkippedEvent`].
    OpSkipped(OpSkippedEvent),
    /// A [`BuildSummary`].
    Build(BuildSummary),
    /// A device rect handed to the bounds accumulator.
    BoundsAccumulated {
        /// Op the rect was accumulated for.
        op_index: u32,
        /// Device-space rect.
        rect: Rect,
    },
}

/// Shared view of the events collected by a [`CollectingSink`].
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<TraceEvent>>>,
}

impl EventLog {
    fn push(&self, event: TraceEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// A copy of every event collected so far.
    #[must_use]
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes and returns every event collected so far.
    pub fn drain(&self) -> Vec<TraceEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Kinds of the records written, in order.
    #[must_use]
    pub fn recorded_kinds(&self) -> Vec<DlOpType> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                TraceEvent::OpRecorded(e) => Some(e.kind),
                _ => None,
            })
            .collect()
    }

    /// Kinds and reasons of the dropped calls, in order.
    #[must_use]
    pub fn skipped(&self) -> Vec<(DlOpType, SkipReason)> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                TraceEvent::OpSkipped(e) => Some((e.kind, e.reason)),
                _ => None,
            })
            .collect()
    }

    /// The most recent build summary.
    #[must_use]
    pub fn last_build(&self) -> Option<BuildSummary> {
        self.events().iter().rev().find_map(|e| match e {
            TraceEvent::Build(s) => Some(*s),
            _ => None,
        })
    }
}

/// A [`TraceSink`] that collects events into an [`EventLog`].
#[derive(Clone, Debug, Default)]
pub struct CollectingSink {
    log: EventLog,
}

impl CollectingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle to the events this sink collects.
    #[must_use]
    pub fn log(&self) -> EventLog {
        self.log.clone()
    }
}

impl TraceSink for CollectingSink {
    fn on_save(&mut self, e: &SaveEvent) {
        self.log.push(TraceEvent::Save(*e));
    }

    fn on_restore(&mut self, e: &RestoreEvent) {
        self.log.push(TraceEvent::Restore(*e));
    }

    fn on_op_recorded(&mut self, e: &OpRecordedEvent) {
        self.log.push(TraceEvent::OpRecorded(*e));
    }

    fn on_op_skipped(&mut self, e: &OpSkippedEvent) {
        self.log.push(TraceEvent::OpSkipped(*e));
    }

    fn on_build(&mut self, s: &BuildSummary) {
        self.log.push(TraceEvent::Build(*s));
    }

    fn on_bounds_accumulated(&mut self, op_index: u32, rect: &Rect) {
        self.log.push(TraceEvent::BoundsAccumulated {
            op_index,
            rect: *rect,
        });
    }
}
