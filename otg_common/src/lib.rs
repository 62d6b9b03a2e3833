//! OTG Common Library
//!
//! Shared constants, motion data types and configuration loading utilities
//! for the online trajectory generator (OTG) block workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Capacity limits, defaults and configuration tokens
//! - [`motion`] - Per-DOF vectors, kinematic state, limits, mode enums, result codes
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use otg_common::prelude::*;
//!
//! let state = KinematicState::zeroed(2).unwrap();
//! assert_eq!(state.dofs(), 2);
//! ```

pub mod config;
pub mod consts;
pub mod motion;
pub mod prelude;
