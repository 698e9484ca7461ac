//! Tooling primitives for spider locomotion.
//!
//! This crate is intentionally lightweight and engine-agnostic: it turns per-tick reports into
//! flat trace records and ships them to sinks (memory, JSON lines). Debug drawing lives in the
//! Bevy adapter.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

#[cfg(feature = "serde")]
pub use trace::JsonLinesSink;
pub use trace::{
    ModeTransition, NullTraceSink, TickTrace, TraceError, TraceLog, TraceSink, VecTraceSink,
};
