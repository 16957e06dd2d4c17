#![forbid(unsafe_code)]

//! Capability model: control-sequence templates, cost estimation, and
//! terminal flags.
//!
//! This crate defines the *shape* of a terminal's capability table. It does
//! not detect terminals; the owning application populates a
//! [`registry::CapabilitySet`] from whatever quirk database it trusts and
//! hands it to the render kernel. Predefined profiles
//! ([`registry::CapabilitySet::xterm_256color`] and friends) exist for tests
//! and simulation.

pub mod capability;
pub mod registry;
pub mod winch;

pub use capability::{Capability, Cost};
pub use registry::{CapabilitySet, StyleCap, TermFlags, VideoMask};
pub use winch::ResizeFlag;
