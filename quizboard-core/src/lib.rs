//! Turn-based quiz board game engine.
//!
//! This crate provides:
//! - Dice with a validated, animated roll
//! - Question and event content per difficulty tier
//! - A reducer-style game state store with named transitions
//! - A turn state machine with a processing latch and cancellable timers
//! - Save and load of the canonical game state
//!
//! # Quick Start
//!
//! ```ignore
//! use quizboard_core::{GameConfig, GameSession, Tier};
//! use quizboard_core::testing::sample_roster;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = GameSession::open(GameConfig::new(Tier::Beginner)).await?;
//!     session.start_game(sample_roster(2), Tier::Beginner).await?;
//!
//!     session.roll().await?;
//!     session.settle().await;
//!
//!     let position = session.state().current_player().map(|p| p.position);
//!     println!("Landed on {position:?}");
//!     Ok(())
//! }
//! ```

pub mod bank;
pub mod board;
pub mod config;
pub mod content;
pub mod dice;
pub mod persist;
pub mod session;
pub mod state;
pub mod store;
pub mod testing;
pub mod timers;
pub mod turn;

// Primary public API
pub use bank::{BankError, DefaultBank, EventCard, EventEffect, JsonBank, Question, QuestionBank};
pub use board::{Space, SpaceKind, Tier, Track};
pub use config::{ConfigError, GameConfig};
pub use dice::{Dice, DieFace, FaceSource, Roll, RngFaces};
pub use persist::{JsonFileStorage, MemoryStorage, PersistError, Persistence, SavedGame, StateStorage};
pub use session::{GameSession, SessionError};
pub use state::{GameState, Player, PlayerId};
pub use store::{reduce, Change, GameStore, StoreError, Transition};
pub use testing::{ScriptedFaces, TestHarness};
pub use turn::{Feedback, Notice, Rejection, TurnController, TurnPhase, TurnUpdate};
