//! Joint models for articulated mechanisms.
//!
//! This crate provides the [`joint::JointModel`] trait, one implementation
//! per joint type, and the [`joint::JointWrapper`] tagged wrapper that the
//! mechanism crate dispatches through, once per joint.

pub mod joint;

pub mod fixed;
pub mod planar;
pub mod prismatic;
pub mod quaternion_floating;
pub mod revolute;
pub mod spquat_floating;
