//! Catan rules - a deterministic engine for a hex-grid settlement game
//!
//! This crate provides the complete rules, including:
//! - A seeded board builder over an integer-handle hex graph
//! - Placement, production, robber, trading and development card rules
//! - A Cities & Knights style expansion (commodities, knights, barbarians,
//!   city improvements, metropolises and progress cards)
//! - A reducer that maps `(state, action)` to a new state, plus validation,
//!   middleware, replay and persistence
//!
//! # Architecture
//!
//! Every transition is a pure function: [`dispatch::dispatch`] clones the state,
//! applies the action and returns the result, or the untouched input when the action
//! is illegal. The host keeps whichever snapshots it wants. Randomness comes from a
//! [`rng::Mulberry32`] stream keyed by the game seed, so replaying a log reproduces
//! live play exactly.
//!
//! # Modules
//!
//! - [`graph`]: board topology built from a seed
//! - [`board`]: pieces on the board
//! - [`game`]: game state, configuration and errors
//! - [`turn`]: the central reducer
//! - [`dispatch`]: host entry point, middleware and replay
//! - [`expansion`]: Cities & Knights rules

pub mod actions;
pub mod board;
pub mod bot;
pub mod dev_cards;
pub mod dispatch;
pub mod distribution;
pub mod expansion;
pub mod game;
pub mod graph;
pub mod hex;
pub mod persist;
pub mod placement;
pub mod player;
pub mod rng;
pub mod robber;
pub mod trade;
pub mod turn;
pub mod validation;
pub mod victory;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{ActionKind, GameAction, GameEvent};
pub use board::{Board, Building, BuildingKind};
pub use bot::{Bot, BotDifficulty};
pub use dispatch::{dispatch, replay, try_dispatch, Dispatcher, LoggingMiddleware, Middleware, ValidationMiddleware};
pub use game::{ConfigError, GameConfig, GameError, GameState, Phase, PlayerConfig, Ruleset, TurnPhase};
pub use graph::{BoardGraph, EdgeId, HexId, Resource, VertexId};
pub use hex::HexCoord;
pub use persist::PersistError;
pub use player::{DevelopmentCard, PlayerState, ResourceHand, Seat};
pub use validation::{validate, Validation};
