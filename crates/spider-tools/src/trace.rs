#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[cfg(feature = "serde")]
use std::io::{BufRead, Write};

use spider_core::glam::{Quat, Vec3};
use spider_core::{LocomotionMode, TickReport};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("trace i/o failed")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("trace record could not be encoded or decoded")]
    Json(#[from] serde_json::Error),

    #[error("line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<TraceError>,
    },
}

/// A flat, serializable record of one controller tick.
///
/// This is intentionally "dumb data" so it can be recorded during simulation and later
/// summarized or replayed by tooling.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TickTrace {
    pub tick: u64,
    pub mode: LocomotionMode,
    pub location: Vec3,
    pub orientation: Quat,
    pub walk_applied: Vec3,
    pub displacement: Vec3,
    pub applied: Vec3,
    pub wall_hits: u32,
    pub grounded: bool,
    pub climbable: bool,
    pub surface_normal: Vec3,
}

impl TickTrace {
    /// Agent up axis after the tick.
    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::Z
    }
}

impl From<&TickReport> for TickTrace {
    fn from(report: &TickReport) -> Self {
        Self {
            tick: report.tick,
            mode: report.mode,
            location: report.location,
            orientation: report.orientation,
            walk_applied: report.walk_applied,
            displacement: report.displacement,
            applied: report.applied,
            wall_hits: u32::try_from(report.wall_hit_count).unwrap_or(u32::MAX),
            grounded: report.ground.is_some(),
            climbable: report.decision.climbable,
            surface_normal: report.decision.normal,
        }
    }
}

pub trait TraceSink {
    fn emit(&mut self, trace: &TickTrace) -> Result<(), TraceError>;

    fn flush(&mut self) -> Result<(), TraceError> {
        Ok(())
    }
}

impl<S: TraceSink + ?Sized> TraceSink for Box<S> {
    fn emit(&mut self, trace: &TickTrace) -> Result<(), TraceError> {
        (**self).emit(trace)
    }

    fn flush(&mut self) -> Result<(), TraceError> {
        (**self).flush()
    }
}

#[derive(Debug, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn emit(&mut self, _trace: &TickTrace) -> Result<(), TraceError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct VecTraceSink {
    pub traces: Vec<TickTrace>,
}

impl TraceSink for VecTraceSink {
    fn emit(&mut self, trace: &TickTrace) -> Result<(), TraceError> {
        self.traces.push(trace.clone());
        Ok(())
    }
}

/// Streams one JSON object per line.
#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

#[cfg(feature = "serde")]
impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(feature = "serde")]
impl<W: Write> TraceSink for JsonLinesSink<W> {
    fn emit(&mut self, trace: &TickTrace) -> Result<(), TraceError> {
        serde_json::to_writer(&mut self.writer, trace)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TraceError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// A change of locomotion mode between consecutive recorded ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModeTransition {
    pub tick: u64,
    pub from: LocomotionMode,
    pub to: LocomotionMode,
}

#[derive(Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceLog {
    pub traces: Vec<TickTrace>,
}

impl TraceLog {
    pub fn push(&mut self, trace: TickTrace) {
        self.traces.push(trace);
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn last(&self) -> Option<&TickTrace> {
        self.traces.last()
    }

    /// Ticks spent in each mode. Modes never entered are absent.
    pub fn mode_counts(&self) -> BTreeMap<LocomotionMode, usize> {
        let mut counts = BTreeMap::new();
        for trace in &self.traces {
            *counts.entry(trace.mode).or_insert(0) += 1;
        }
        counts
    }

    /// Mode changes in recording order. The first record is never a transition.
    pub fn transitions(&self) -> Vec<ModeTransition> {
        self.traces
            .windows(2)
            .filter(|pair| pair[0].mode != pair[1].mode)
            .map(|pair| ModeTransition {
                tick: pair[1].tick,
                from: pair[0].mode,
                to: pair[1].mode,
            })
            .collect()
    }

    /// Parse a JSON-lines stream as written by [`JsonLinesSink`]. Blank lines are skipped.
    #[cfg(feature = "serde")]
    #[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
    pub fn read_json_lines<R: BufRead>(reader: R) -> Result<Self, TraceError> {
        let mut log = Self::default();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let trace = serde_json::from_str(&line).map_err(|err| TraceError::Line {
                line: index + 1,
                source: Box::new(TraceError::Json(err)),
            })?;
            log.push(trace);
        }
        Ok(log)
    }
}

impl TraceSink for TraceLog {
    fn emit(&mut self, trace: &TickTrace) -> Result<(), TraceError> {
        self.push(trace.clone());
        Ok(())
    }
}
