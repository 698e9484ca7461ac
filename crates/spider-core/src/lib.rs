//! Engine-agnostic surface-adaptive locomotion.
//!
//! Each tick the controller probes for walls ahead and ground below, reduces the wall hits to a
//! single averaged surface, picks a locomotion mode (climbing beats grounded beats falling),
//! builds a twist-minimizing frame for the chosen surface, and commits a damped pose update.
//!
//! Hosts supply collision queries through [`WorldQuery`] and own the agent transform through
//! [`Placement`]; [`reference`] provides analytic implementations of both for headless use.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod arbiter;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod frame;
pub mod integrator;
pub mod probe;
pub mod reference;
pub mod sampler;
pub mod tick;

pub use arbiter::{LocomotionMode, ModeArbiter, MovementResult};
pub use classifier::{classify, SurfaceDecision};
pub use config::{ConfigError, LocomotionConfig};
pub use controller::{SpiderLocomotion, TickReport};
pub use frame::{Frame, FrameBuilder};
pub use integrator::{blend_alpha, blend_orientation, integrate, PoseStep};
pub use probe::{
    CapsuleSweep, CategoryMask, Placement, ProbeFilter, ProbeHit, ProbeShape, RaySegment,
    SurfaceId, WorldQuery,
};
pub use reference::{Panel, PanelWorld, SimBody};
pub use sampler::{GroundProbe, SurfaceSampler, WallProbe, WallSample};
pub use tick::{MovementIntent, TickContext};

pub use glam;
