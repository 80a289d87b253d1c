//! # guard-scene: restaurant scene integration for the guard AI
//!
//! This crate connects the engine-agnostic `guard-core` library to a
//! scene: engine callbacks become [`events::SceneEvent`]s, the
//! [`systems::SceneDirector`] schedules every guard and trust ledger, and
//! guard conversations run through [`dialogue`].
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Game engine                │
//! │  ┌───────────────────────────────────┐  │
//! │  │       guard-scene                 │  │
//! │  │  ┌─────────────┐ ┌─────────────┐  │  │
//! │  │  │ Hooks/Bridge│ │  Director   │  │  │
//! │  │  └──────┬──────┘ └──────┬──────┘  │  │
//! │  │         │ SceneEvent    │         │  │
//! │  │         ▼               ▼         │  │
//! │  │    ┌─────────────────────────┐    │  │
//! │  │    │      guard-core         │    │  │
//! │  │    └─────────────────────────┘    │  │
//! │  └───────────────────────────────────┘  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `bridge`: engine instance ids, positions and trust bands
//! - `components`: guard and trust-bearing NPC components
//! - `config`: scene TOML, difficulty presets, tracing setup
//! - `dialogue`: layered guard conversations and reply flavour
//! - `events`: scene events in, notices out
//! - `hooks`: engine callbacks to scene events
//! - `systems`: the per-frame director

#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bridge;
pub mod components;
pub mod config;
pub mod dialogue;
pub mod events;
pub mod hooks;
pub mod systems;

pub use bridge::EntityRegistry;
pub use config::{Difficulty, SceneConfig};
pub use events::{SceneEvent, SceneNotice};
pub use systems::SceneDirector;
