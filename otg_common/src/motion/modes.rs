//! Generator mode selectors and their configuration tokens.
//!
//! Each selector is a total mapping from token to variant: an unrecognized
//! token resolves to the selector's documented default instead of failing.
//! [`parse_token`](ControlMode::parse_token) is the strict variant for
//! callers that want to know whether a fallback happened.

use serde::{Deserialize, Serialize};

use crate::consts::{control_tokens, duration_tokens, sync_tokens};

/// Which target the generator tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum ControlMode {
    /// Reach a target position (with target velocity/acceleration).
    #[default]
    Position = 0,
    /// Reach a target velocity; position is free.
    Velocity = 1,
}

impl ControlMode {
    pub fn parse_token(token: &str) -> Option<Self> {
        match token {
            control_tokens::POSITION => Some(Self::Position),
            control_tokens::VELOCITY => Some(Self::Velocity),
            _ => None,
        }
    }

    /// Resolve a token; unrecognized → [`ControlMode::Position`].
    pub fn from_token(token: &str) -> Self {
        Self::parse_token(token).unwrap_or(Self::Position)
    }

    pub const fn as_token(&self) -> &'static str {
        match self {
            Self::Position => control_tokens::POSITION,
            Self::Velocity => control_tokens::VELOCITY,
        }
    }
}

/// How the per-DOF profiles are aligned in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum Synchronization {
    /// Every DOF moves as fast as its own limits allow.
    None = 0,
    /// Synchronize only when a non-zero target velocity/acceleration demands it.
    TimeIfNecessary = 1,
    /// All DOFs arrive at the same time.
    #[default]
    Time = 2,
    /// Same arrival time and proportional (straight-line) profiles.
    Phase = 3,
}

impl Synchronization {
    pub fn parse_token(token: &str) -> Option<Self> {
        match token {
            sync_tokens::NONE => Some(Self::None),
            sync_tokens::TIME_IF_NECESSARY => Some(Self::TimeIfNecessary),
            sync_tokens::TIME => Some(Self::Time),
            sync_tokens::PHASE => Some(Self::Phase),
            _ => None,
        }
    }

    /// Resolve a token; unrecognized → [`Synchronization::Time`].
    pub fn from_token(token: &str) -> Self {
        Self::parse_token(token).unwrap_or(Self::Time)
    }

    pub const fn as_token(&self) -> &'static str {
        match self {
            Self::None => sync_tokens::NONE,
            Self::TimeIfNecessary => sync_tokens::TIME_IF_NECESSARY,
            Self::Time => sync_tokens::TIME,
            Self::Phase => sync_tokens::PHASE,
        }
    }
}

/// Whether trajectory durations are quantized to the sample period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum DurationDiscretization {
    #[default]
    Continuous = 0,
    Discrete = 1,
}

impl DurationDiscretization {
    pub fn parse_token(token: &str) -> Option<Self> {
        match token {
            duration_tokens::CONTINUOUS => Some(Self::Continuous),
            duration_tokens::DISCRETE => Some(Self::Discrete),
            _ => None,
        }
    }

    /// Resolve a token; unrecognized → [`DurationDiscretization::Continuous`].
    pub fn from_token(token: &str) -> Self {
        Self::parse_token(token).unwrap_or(Self::Continuous)
    }

    pub const fn as_token(&self) -> &'static str {
        match self {
            Self::Continuous => duration_tokens::CONTINUOUS,
            Self::Discrete => duration_tokens::DISCRETE,
        }
    }
}
