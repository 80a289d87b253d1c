//! # Guard Core Library
//!
//! Engine-agnostic perception-and-pursuit AI for security guards in a
//! stealth/detective game.
//!
//! Every guard is a single parametrised [`Guard`] driven once per simulation
//! tick. Its behaviour is assembled from small, independently testable parts:
//!
//! - [`perception`]: periodic field-of-view and line-of-sight scan
//! - [`trust`]: bounded, stepwise relationship scores that escalate
//! - [`memory`]: time-bounded recall of hostile targets
//! - [`investigation`]: spiral search around a suspicious point
//! - [`guard`]: the patrol / follow / chase / dialogue / investigate state machine
//! - [`movement`]: resolves the active state into a destination and speed
//! - [`escalation`]: how conversations turn into pursuit
//!
//! The core never touches engine state directly. Pathfinding, spatial
//! queries, UI gauges and game-over handling are reached through the traits
//! in [`services`], so the whole subsystem runs headlessly in tests.
//!
//! ## Scheduling
//!
//! Single-threaded and cooperative: every wait (dwell, give-up, trust step,
//! reaction delay) is an explicit [`clock::Countdown`] advanced by the scaled
//! frame delta, so a global pause freezes progress without losing it.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub mod config;
pub mod error;
pub mod escalation;
pub mod guard;
pub mod investigation;
pub mod memory;
pub mod metrics;
pub mod movement;
pub mod patrol;
pub mod perception;
pub mod sandbox;
pub mod services;
pub mod trust;
pub mod types;

pub use config::GuardConfig;
pub use error::GuardError;
pub use escalation::DialogueVerdict;
pub use guard::{Guard, GuardCapabilities, GuardEvent, GuardSnapshot, GuardState};
pub use investigation::InvestigationOutcome;
pub use patrol::PatrolRoute;
pub use services::{CatchHandler, Navigator, SceneHost, SpatialQuery, TrustGauge, UiFocus, World};
pub use trust::TrustLedger;
pub use types::*;
