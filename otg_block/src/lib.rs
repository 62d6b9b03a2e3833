//! # OTG Block Library
//!
//! Per-cycle orchestration for an online trajectory generator embedded in a
//! fixed-step control loop. Each tick reads feedback and a target, hands them
//! with the currently tuned limits to a stateful generator, advances it by one
//! sample period and emits the next commanded position/velocity/acceleration.
//!
//! ## Layers
//!
//! 1. **Configuration**: mode tokens, sample period, DOF count, limits ([`config`])
//! 2. **Engine**: the single-step generator contract and a reference
//!    implementation ([`engine`])
//! 3. **Instance**: engine plus its request/response records ([`instance`])
//! 4. **Tick**: the Bootstrap/Steady state machine ([`tick`])
//! 5. **Lifecycle**: create on start, destroy on stop ([`lifecycle`])
//!
//! [`cycle`] paces ticks in real time; [`export`] describes the block to
//! code-generation hosts.
//!
//! ## Zero-Allocation Tick
//!
//! All per-DOF buffers are fixed-capacity and sized once at start. A tick only
//! copies into them.

#![deny(clippy::disallowed_types)]

pub mod config;
pub mod cycle;
pub mod engine;
pub mod error;
pub mod export;
pub mod instance;
pub mod lifecycle;
pub mod plant;
pub mod tick;
