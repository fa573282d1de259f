//! GameSession - the primary public API for playing a quiz board game.
//!
//! A session owns the store, the turn controller, the dice, the question
//! bank, persistence and the timer scheduler. Every accepted operation:
//! 1. Runs through the [`TurnController`]
//! 2. Hands the returned timer requests to the [`Scheduler`]
//! 3. Saves each new state snapshot
//!
//! Timers are driven by awaiting [`GameSession::tick`]. Dropping the session
//! cancels every pending timer.

use crate::bank::{BankError, DefaultBank, JsonBank, QuestionBank};
use crate::board::{Tier, Track};
use crate::config::GameConfig;
use crate::dice::{Dice, FaceSource, RngFaces};
use crate::persist::{JsonFileStorage, Persistence, StateStorage};
use crate::state::{GameState, Player};
use crate::store::{GameStore, Snapshot};
use crate::timers::Scheduler;
use crate::turn::{Rejection, TurnController, TurnFlags, TurnPhase, TurnUpdate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Errors from GameSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("Question bank error: {0}")]
    Bank(#[from] BankError),
}

impl SessionError {
    /// The rejection, if the request was refused by the turn rules.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            SessionError::Rejected(rejection) => Some(rejection),
            SessionError::Bank(_) => None,
        }
    }
}

/// A quiz board game session.
pub struct GameSession {
    config: GameConfig,
    store: GameStore,
    controller: TurnController,
    dice: Dice<Box<dyn FaceSource + Send>>,
    rng: StdRng,
    bank: Arc<dyn QuestionBank>,
    persistence: Persistence,
    scheduler: Scheduler,
    /// Snapshots not yet written, oldest first.
    unsaved: VecDeque<Snapshot>,
    /// An accepted update whose caller went away before it was returned.
    undelivered: Option<TurnUpdate>,
}

impl GameSession {
    /// Create a session with built-in content and nothing loaded.
    ///
    /// Saves go to `config.save_path` when set, otherwise to memory.
    pub fn new(config: GameConfig) -> Self {
        let (faces, rng) = match config.seed {
            Some(seed) => (
                RngFaces::seeded(seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (RngFaces::from_entropy(), StdRng::from_entropy()),
        };
        let persistence = match &config.save_path {
            Some(path) => Persistence::new(JsonFileStorage::new(path)),
            None => Persistence::in_memory(),
        };
        let fresh = GameState::new(config.tier).with_winning_score(config.winning_score);
        let dice = build_dice(Box::new(faces), config.seed);

        Self {
            controller: TurnController::new(config.turn_settings()),
            store: GameStore::new(fresh),
            dice,
            rng,
            bank: Arc::new(DefaultBank),
            persistence,
            scheduler: Scheduler::new(),
            unsaved: VecDeque::new(),
            undelivered: None,
            config,
        }
    }

    /// Create a session from configuration and resume any saved game.
    ///
    /// A custom bank that fails to load is an error; a missing or corrupt
    /// save is not.
    pub async fn open(config: GameConfig) -> Result<Self, SessionError> {
        let mut session = Self::new(config);
        if let Some(path) = session.config.bank_path.clone() {
            info!(path = %path.display(), "Loading question bank");
            session.bank = Arc::new(JsonBank::load(&path).await?);
        }
        session.restore().await;
        Ok(session)
    }

    pub fn with_bank(mut self, bank: impl QuestionBank + 'static) -> Self {
        self.bank = Arc::new(bank);
        self
    }

    pub fn with_shared_bank(mut self, bank: Arc<dyn QuestionBank>) -> Self {
        self.bank = bank;
        self
    }

    /// Replace the dice's face source.
    pub fn with_faces(mut self, faces: impl FaceSource + Send + 'static) -> Self {
        self.dice = build_dice(Box::new(faces), self.config.seed);
        self
    }

    pub fn with_storage(mut self, storage: impl StateStorage + 'static) -> Self {
        self.persistence = Persistence::new(storage);
        self
    }

    /// Replace the current game with the saved one, or a fresh state if
    /// nothing usable was saved.
    #[instrument(skip(self))]
    pub async fn restore(&mut self) -> TurnUpdate {
        let fallback = GameState::new(self.config.tier).with_winning_score(self.config.winning_score);
        let state = self.persistence.load_or_default(fallback).await;
        self.store = GameStore::new(state);
        self.scheduler.cancel_all();
        self.unsaved.clear();
        self.undelivered = None;

        let result = self.controller.resume(&mut self.store);
        self.commit("restore", result).await.unwrap_or_default()
    }

    /// Start a new game with this roster, abandoning the current one.
    #[instrument(skip(self, roster), fields(players = roster.len()))]
    pub async fn start_game(
        &mut self,
        roster: Vec<Player>,
        tier: Tier,
    ) -> Result<TurnUpdate, SessionError> {
        let result = self
            .controller
            .reset(&mut self.store, roster, tier, self.config.winning_score);
        if result.is_ok() {
            info!(%tier, "New game started");
        }
        self.commit("start_game", result).await
    }

    #[instrument(skip(self))]
    pub async fn roll(&mut self) -> Result<TurnUpdate, SessionError> {
        let result = self.controller.request_roll(&self.store, &mut self.dice);
        self.commit("roll", result).await
    }

    #[instrument(skip(self))]
    pub async fn click_space(&mut self, index: usize) -> Result<TurnUpdate, SessionError> {
        let result =
            self.controller
                .click_space(&mut self.store, self.bank.as_ref(), &mut self.rng, index);
        self.commit("click_space", result).await
    }

    #[instrument(skip(self))]
    pub async fn answer(&mut self, answer: &str) -> Result<TurnUpdate, SessionError> {
        let result = self.controller.submit_answer(&mut self.store, answer);
        self.commit("answer", result).await
    }

    #[instrument(skip(self))]
    pub async fn draw_event(&mut self) -> Result<TurnUpdate, SessionError> {
        let result = self
            .controller
            .draw_event(&mut self.store, self.bank.as_ref(), &mut self.rng);
        self.commit("draw_event", result).await
    }

    #[instrument(skip(self))]
    pub async fn resolve_event(&mut self) -> Result<TurnUpdate, SessionError> {
        let result = self.controller.resolve_event(&mut self.store);
        self.commit("resolve_event", result).await
    }

    #[instrument(skip(self))]
    pub async fn dismiss_feedback(&mut self) -> Result<TurnUpdate, SessionError> {
        let result = self.controller.dismiss_feedback(&mut self.store);
        self.commit("dismiss_feedback", result).await
    }

    /// Wait for the next timer and run it. `None` when nothing is pending.
    ///
    /// Cancel safe: if the future is dropped after the timer ran, the update
    /// is kept and returned by the next call, and unwritten snapshots are
    /// saved then.
    pub async fn tick(&mut self) -> Option<TurnUpdate> {
        if self.undelivered.is_some() {
            self.persist().await;
            return self.undelivered.take();
        }

        loop {
            let fired = self.scheduler.next_fired().await?;
            debug!(action = ?fired.action, generation = fired.generation, "Timer fired");
            let result = self
                .controller
                .fire(&mut self.store, fired.action, fired.generation);
            // Rejections are logged by commit; keep waiting for the rest.
            if let Ok(update) = self.commit("timer", result).await {
                return Some(update);
            }
        }
    }

    /// Run timers until none are pending.
    pub async fn settle(&mut self) -> TurnUpdate {
        let mut merged = TurnUpdate::default();
        while let Some(update) = self.tick().await {
            merged.merge(update);
        }
        merged
    }

    /// Cancel every pending timer.
    pub fn cancel_timers(&mut self) {
        self.scheduler.cancel_all();
    }

    /// Whether [`GameSession::tick`] has anything to return.
    pub fn has_pending_timers(&self) -> bool {
        !self.scheduler.is_idle() || self.undelivered.is_some()
    }

    pub fn state(&self) -> &GameState {
        self.store.state()
    }

    pub fn phase(&self) -> TurnPhase {
        self.controller.phase()
    }

    pub fn flags(&self) -> TurnFlags {
        self.controller.flags()
    }

    pub fn track(&self) -> Track {
        self.store.state().track()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Number of transitions the store has accepted.
    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    async fn commit(
        &mut self,
        operation: &'static str,
        result: Result<TurnUpdate, Rejection>,
    ) -> Result<TurnUpdate, SessionError> {
        self.unsaved.extend(self.store.take_snapshots());
        match result {
            Ok(update) => {
                self.scheduler.apply(&update);
                // Held on the session until the saves finish, so a dropped
                // caller loses nothing.
                let update = match self.undelivered.take() {
                    Some(mut earlier) => {
                        earlier.merge(update);
                        earlier
                    }
                    None => update,
                };
                self.undelivered = Some(update);
                self.persist().await;
                Ok(self.undelivered.take().unwrap_or_default())
            }
            Err(rejection) => {
                warn!(operation, %rejection, "Request rejected");
                // A failed dispatch may still have recorded earlier snapshots.
                self.persist().await;
                Err(rejection.into())
            }
        }
    }

    /// Write unsaved snapshots. A snapshot leaves the queue only once its
    /// save has finished.
    async fn persist(&mut self) {
        while let Some(snapshot) = self.unsaved.front() {
            debug!(
                revision = snapshot.revision,
                transition = snapshot.transition,
                "Saving snapshot"
            );
            self.persistence.save(&snapshot.state).await;
            self.unsaved.pop_front();
        }
    }
}

fn build_dice(
    faces: Box<dyn FaceSource + Send>,
    seed: Option<u64>,
) -> Dice<Box<dyn FaceSource + Send>> {
    let dice = Dice::new(faces);
    match seed {
        Some(seed) => dice.with_frame_seed(seed.wrapping_add(2)),
        None => dice,
    }
}
