//! Turn Controller: sequences roll, interact, resolve and advance for the
//! active player.
//!
//! The controller never touches [`GameState`] directly. Every change goes
//! through [`GameStore::dispatch`], and the controller only keeps the
//! transient per-turn flags that are never persisted.
//!
//! Timed steps (the roll animation, the feedback window and the latch
//! release) are not run here. Each operation returns a [`TurnUpdate`] that
//! asks the caller to schedule or cancel [`TimerAction`]s, and the caller
//! feeds expired timers back through [`TurnController::fire`]. Timers carry
//! the generation they were scheduled in; anything older than the current
//! generation is ignored.

use crate::bank::{EventCard, EventEffect, EventId, Question, QuestionBank};
use crate::board::Tier;
use crate::dice::{Dice, DieFace, FaceSource, Roll};
use crate::state::{GameState, Player, PlayerId};
use crate::store::{Change, GameStore, StoreError, Transition};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Where the current turn stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    /// No turn in progress.
    Idle,
    AwaitingRoll,
    /// A roll is committed and its animation is playing.
    Rolling,
    Rolled(DieFace),
    SpaceInteractionAllowed,
    ResolvingQuestion,
    ResolvingEvent,
    /// Answer feedback is on screen.
    ShowingFeedback,
    TurnComplete,
    GameOver,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnPhase::Idle => write!(f, "idle"),
            TurnPhase::AwaitingRoll => write!(f, "awaiting roll"),
            TurnPhase::Rolling => write!(f, "rolling"),
            TurnPhase::Rolled(face) => write!(f, "rolled {face}"),
            TurnPhase::SpaceInteractionAllowed => write!(f, "choose your space"),
            TurnPhase::ResolvingQuestion => write!(f, "answering a question"),
            TurnPhase::ResolvingEvent => write!(f, "resolving an event"),
            TurnPhase::ShowingFeedback => write!(f, "showing feedback"),
            TurnPhase::TurnComplete => write!(f, "turn complete"),
            TurnPhase::GameOver => write!(f, "game over"),
        }
    }
}

/// Transient per-turn flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnFlags {
    pub has_rolled: bool,
    pub can_interact_with_space: bool,
    /// The processing latch. Requests arriving while it is held are
    /// rejected, not queued.
    pub is_processing_turn: bool,
}

/// Pacing and rule options for the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSettings {
    pub roll_animation: Duration,
    /// Faces shown during the roll animation, the committed face included.
    pub roll_frames: usize,
    pub feedback: Duration,
    pub latch_release: Duration,
    /// Longest chain of extra rolls from sixes; `None` is uncapped.
    pub max_extra_rolls: Option<u32>,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            roll_animation: Duration::from_millis(1000),
            roll_frames: 10,
            feedback: Duration::from_millis(2500),
            latch_release: Duration::from_millis(300),
            max_extra_rolls: None,
        }
    }
}

/// A delayed step of the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerAction {
    /// The roll animation ended; apply the committed face.
    FinishRoll,
    /// Release the processing latch.
    ReleaseLatch,
    /// The feedback window closed; end the turn.
    CompleteTurn,
}

/// A request to run `action` after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerRequest {
    pub action: TimerAction,
    pub delay: Duration,
    pub generation: u64,
}

/// Result of answering a question, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub player_id: PlayerId,
    pub correct: bool,
    pub points: u32,
    pub correct_answer: String,
    pub explanation: Option<String>,
    /// Where a wrong answer sent the player.
    pub returned_to: Option<usize>,
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.correct {
            write!(f, "Correct! +{} points", self.points)?;
        } else {
            write!(f, "Incorrect. The correct answer was {}", self.correct_answer)?;
            if let Some(position) = self.returned_to {
                write!(f, "; back to space {position}")?;
            }
        }
        if let Some(explanation) = &self.explanation {
            write!(f, ". {explanation}")?;
        }
        Ok(())
    }
}

/// Something the player should be told about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    NewGame { players: usize, difficulty: Tier },
    TurnStarted { player_id: PlayerId },
    TurnSkipped { player_id: PlayerId },
    RollStarted { frames: Vec<DieFace> },
    /// The dice source misbehaved and the fallback face was used.
    DiceFallback { attempts: usize },
    Rolled { player_id: PlayerId, face: DieFace, position: usize },
    ExtraRoll { player_id: PlayerId },
    QuestionPoolReset,
    QuestionDrawn { question: Question },
    EventDrawn { event: EventCard },
    EventResolved { event_id: EventId, effect: EventEffect },
    Feedback(Feedback),
    TurnCompleted { player_id: PlayerId },
    GameWon { player_id: PlayerId, score: u32 },
}

/// Everything an operation did and what the caller must schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnUpdate {
    pub notices: Vec<Notice>,
    pub changes: Vec<Change>,
    pub schedule: Vec<TimerRequest>,
    pub cancel: Vec<TimerAction>,
    /// Drop every pending timer before applying `schedule`.
    pub cancel_all: bool,
}

impl TurnUpdate {
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
            && self.changes.is_empty()
            && self.schedule.is_empty()
            && self.cancel.is_empty()
            && !self.cancel_all
    }

    fn record(&mut self, changes: Vec<Change>) {
        self.changes.extend(changes);
    }

    /// Append a later update to this one.
    pub fn merge(&mut self, other: TurnUpdate) {
        if other.cancel_all {
            self.schedule.clear();
            self.cancel.clear();
            self.cancel_all = true;
        }
        self.notices.extend(other.notices);
        self.changes.extend(other.changes);
        self.cancel.extend(other.cancel);
        self.schedule.extend(other.schedule);
    }
}

/// Why a request was refused. The controller stays where it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Please wait, the last action is still being processed")]
    Busy,

    #[error("The dice are already rolling")]
    RollInProgress,

    #[error("You have already rolled this turn")]
    AlreadyRolled,

    #[error("Roll the dice first")]
    NotRolled,

    #[error("The turn has not started yet")]
    TurnNotStarted,

    #[error("You can't interact with the board right now")]
    InteractionClosed,

    #[error("You can only choose your own space ({position}), not space {clicked}")]
    WrongSpace { clicked: usize, position: usize },

    #[error("Space {0} has no question")]
    NotQuestionSpace(usize),

    #[error("There is no question waiting for an answer")]
    NoPendingQuestion,

    #[error("There is no event card to resolve")]
    NoPendingEvent,

    #[error("There is no feedback to dismiss")]
    NoFeedback,

    #[error("The game is over; start a new game to keep playing")]
    GameOver,

    #[error("The game hasn't started")]
    GameNotStarted,

    #[error("No content available for {0} difficulty")]
    EmptyBank(Tier),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Orchestrates one player's turn at a time.
#[derive(Debug, Clone)]
pub struct TurnController {
    settings: TurnSettings,
    phase: TurnPhase,
    flags: TurnFlags,
    pending_roll: Option<Roll>,
    /// Face that produced the current position.
    last_face: Option<DieFace>,
    extra_rolls: u32,
    generation: u64,
}

impl Default for TurnController {
    fn default() -> Self {
        Self::new(TurnSettings::default())
    }
}

impl TurnController {
    pub fn new(settings: TurnSettings) -> Self {
        Self {
            settings,
            phase: TurnPhase::Idle,
            flags: TurnFlags::default(),
            pending_roll: None,
            last_face: None,
            extra_rolls: 0,
            generation: 0,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn flags(&self) -> TurnFlags {
        self.flags
    }

    pub fn settings(&self) -> &TurnSettings {
        &self.settings
    }

    /// Timers scheduled with an older generation are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_face(&self) -> Option<DieFace> {
        self.last_face
    }

    /// Start a new game, cancelling anything still pending.
    pub fn reset(
        &mut self,
        store: &mut GameStore,
        roster: Vec<Player>,
        difficulty: Tier,
        winning_score: u32,
    ) -> Result<TurnUpdate, Rejection> {
        let changes = store.dispatch(Transition::StartGame {
            roster,
            difficulty,
            winning_score,
        })?;

        let mut update = TurnUpdate {
            cancel_all: true,
            ..TurnUpdate::default()
        };
        update.record(changes);
        update.notices.push(Notice::NewGame {
            players: store.state().players.len(),
            difficulty,
        });
        self.start_turn(store, &mut update)?;
        Ok(update)
    }

    /// Start the current player's turn: `Idle -> AwaitingRoll`.
    pub fn begin_turn(&mut self, store: &mut GameStore) -> Result<TurnUpdate, Rejection> {
        let mut update = TurnUpdate::default();
        self.start_turn(store, &mut update)?;
        Ok(update)
    }

    /// Pick up a state that was loaded from storage.
    ///
    /// Turn flags are never saved, so a half-finished turn restarts from
    /// the roll and any open prompt is discarded.
    pub fn resume(&mut self, store: &mut GameStore) -> Result<TurnUpdate, Rejection> {
        let mut update = TurnUpdate::default();
        let state = store.state();
        if state.is_active() && (state.current_question.is_some() || state.current_event.is_some())
        {
            debug!("Discarding prompt left over from the saved turn");
            update.record(store.dispatch(Transition::ClearPrompt)?);
        }
        self.start_turn(store, &mut update)?;
        Ok(update)
    }

    /// `AwaitingRoll -> Rolling`: commit a face and start the animation.
    pub fn request_roll<S: FaceSource>(
        &mut self,
        store: &GameStore,
        dice: &mut Dice<S>,
    ) -> Result<TurnUpdate, Rejection> {
        ensure_active(store.state())?;
        if self.phase == TurnPhase::Rolling {
            return Err(Rejection::RollInProgress);
        }
        if self.flags.is_processing_turn {
            return Err(Rejection::Busy);
        }
        if self.flags.has_rolled {
            return Err(Rejection::AlreadyRolled);
        }
        if self.phase != TurnPhase::AwaitingRoll {
            return Err(Rejection::TurnNotStarted);
        }

        let animation = dice.roll_animated(self.settings.roll_frames);
        let mut update = TurnUpdate::default();
        if animation.roll.fell_back {
            update.notices.push(Notice::DiceFallback {
                attempts: animation.roll.attempts,
            });
        }

        debug!(face = %animation.roll.face, "Roll committed");
        self.flags.is_processing_turn = true;
        self.phase = TurnPhase::Rolling;
        self.pending_roll = Some(animation.roll);
        update.notices.push(Notice::RollStarted {
            frames: animation.frames,
        });
        update
            .schedule
            .push(self.timer(TimerAction::FinishRoll, self.settings.roll_animation));

        Ok(update)
    }

    /// Run an expired timer.
    pub fn fire(
        &mut self,
        store: &mut GameStore,
        action: TimerAction,
        generation: u64,
    ) -> Result<TurnUpdate, Rejection> {
        let mut update = TurnUpdate::default();
        if generation != self.generation {
            debug!(?action, generation, current = self.generation, "Ignoring stale timer");
            return Ok(update);
        }

        match action {
            TimerAction::FinishRoll => self.finish_roll(store, &mut update)?,
            TimerAction::ReleaseLatch => {
                if self.phase != TurnPhase::Rolling {
                    self.flags.is_processing_turn = false;
                }
            }
            TimerAction::CompleteTurn => {
                if self.phase == TurnPhase::ShowingFeedback {
                    self.complete_turn(store, &mut update)?;
                } else {
                    debug!(phase = %self.phase, "Turn already completed");
                }
            }
        }

        Ok(update)
    }

    /// `SpaceInteractionAllowed -> ResolvingQuestion`: draw an unused
    /// question for the player's own space.
    pub fn click_space<R: Rng + ?Sized>(
        &mut self,
        store: &mut GameStore,
        bank: &dyn QuestionBank,
        rng: &mut R,
        index: usize,
    ) -> Result<TurnUpdate, Rejection> {
        self.ensure_interaction(store.state())?;

        let state = store.state();
        let position = current_player(state)?.position;
        if index != position {
            return Err(Rejection::WrongSpace {
                clicked: index,
                position,
            });
        }
        if !state.track().is_question(index) {
            return Err(Rejection::NotQuestionSpace(index));
        }

        let tier = state.difficulty;
        let pool = bank.questions_for(tier);
        if pool.is_empty() {
            return Err(Rejection::EmptyBank(tier));
        }

        let mut update = TurnUpdate::default();
        let used = &state.used_question_ids;
        let mut unused: Vec<&Question> = pool.iter().filter(|q| !used.contains(&q.id)).collect();
        if unused.is_empty() {
            info!(%tier, questions = pool.len(), "Question pool exhausted, starting over");
            update.record(store.dispatch(Transition::ResetUsedQuestions)?);
            update.notices.push(Notice::QuestionPoolReset);
            unused = pool.iter().collect();
        }

        let question = unused
            .choose(rng)
            .map(|q| (*q).clone())
            .ok_or(Rejection::EmptyBank(tier))?;

        debug!(question_id = question.id, "Question drawn");
        update.record(store.dispatch(Transition::SetCurrentQuestion {
            question: question.clone(),
        })?);
        update.notices.push(Notice::QuestionDrawn { question });

        self.flags.can_interact_with_space = false;
        self.phase = TurnPhase::ResolvingQuestion;
        self.hold_latch(&mut update);
        Ok(update)
    }

    /// Draw an event card instead of a question.
    pub fn draw_event<R: Rng + ?Sized>(
        &mut self,
        store: &mut GameStore,
        bank: &dyn QuestionBank,
        rng: &mut R,
    ) -> Result<TurnUpdate, Rejection> {
        self.ensure_interaction(store.state())?;

        let tier = store.state().difficulty;
        let event = bank
            .events_for(tier)
            .choose(rng)
            .cloned()
            .ok_or(Rejection::EmptyBank(tier))?;

        let mut update = TurnUpdate::default();
        debug!(event_id = event.id, effect = %event.effect, "Event drawn");
        update.record(store.dispatch(Transition::SetCurrentEvent {
            event: event.clone(),
        })?);
        update.notices.push(Notice::EventDrawn { event });

        self.flags.can_interact_with_space = false;
        self.phase = TurnPhase::ResolvingEvent;
        self.hold_latch(&mut update);
        Ok(update)
    }

    /// Answer the open question.
    ///
    /// A correct answer keeps the position and scores the face just rolled.
    /// A wrong one sends the player back to their last checkpoint, or to
    /// their starting space if they have none.
    pub fn submit_answer(
        &mut self,
        store: &mut GameStore,
        answer: &str,
    ) -> Result<TurnUpdate, Rejection> {
        ensure_active(store.state())?;
        if self.flags.is_processing_turn {
            return Err(Rejection::Busy);
        }
        if self.phase != TurnPhase::ResolvingQuestion {
            return Err(Rejection::NoPendingQuestion);
        }

        let state = store.state();
        let question = state
            .current_question
            .clone()
            .ok_or(Rejection::NoPendingQuestion)?;
        let player = current_player(state)?.clone();
        let correct = question.is_correct(answer);

        let mut update = TurnUpdate::default();
        let feedback = if correct {
            let points = self.last_face.map(|f| u32::from(f.value())).unwrap_or(0);
            update.record(store.dispatch(Transition::CommitPosition {
                player_id: player.id,
            })?);
            update.record(store.dispatch(Transition::ClearPrompt)?);
            update.record(store.dispatch(Transition::UpdateScore {
                player_id: player.id,
                points,
            })?);
            info!(player_id = player.id, points, "Correct answer");

            Feedback {
                player_id: player.id,
                correct: true,
                points,
                correct_answer: question.correct_answer,
                explanation: question.explanation,
                returned_to: None,
            }
        } else {
            let target = player.penalty_position();
            let delta = target as i64 - player.position as i64;
            update.record(store.dispatch(Transition::MovePlayer { delta })?);
            update.record(store.dispatch(Transition::ClearPrompt)?);
            info!(player_id = player.id, returned_to = target, "Wrong answer");

            Feedback {
                player_id: player.id,
                correct: false,
                points: 0,
                correct_answer: question.correct_answer,
                explanation: question.explanation,
                returned_to: Some(target),
            }
        };
        update.notices.push(Notice::Feedback(feedback));

        if store.state().game_ended {
            self.finish_game(store.state(), &mut update);
            return Ok(update);
        }

        self.phase = TurnPhase::ShowingFeedback;
        self.hold_latch(&mut update);
        update
            .schedule
            .push(self.timer(TimerAction::CompleteTurn, self.settings.feedback));
        Ok(update)
    }

    /// Apply the drawn event card.
    ///
    /// `move` and `skip` end the turn; `reroll` hands the dice back to the
    /// same player.
    pub fn resolve_event(&mut self, store: &mut GameStore) -> Result<TurnUpdate, Rejection> {
        ensure_active(store.state())?;
        if self.flags.is_processing_turn {
            return Err(Rejection::Busy);
        }
        if self.phase != TurnPhase::ResolvingEvent {
            return Err(Rejection::NoPendingEvent);
        }

        let state = store.state();
        let event = state
            .current_event
            .clone()
            .ok_or(Rejection::NoPendingEvent)?;
        let player_id = current_player(state)?.id;

        let mut update = TurnUpdate::default();
        if event.effect == EventEffect::Move {
            update.record(store.dispatch(Transition::MovePlayer {
                delta: i64::from(event.value),
            })?);
        }
        update.record(store.dispatch(Transition::CommitPosition { player_id })?);
        if event.effect == EventEffect::Skip {
            update.record(store.dispatch(Transition::SkipTurn { player_id })?);
        }
        update.record(store.dispatch(Transition::ClearPrompt)?);
        update.notices.push(Notice::EventResolved {
            event_id: event.id,
            effect: event.effect,
        });
        info!(player_id, effect = %event.effect, value = event.value, "Event resolved");

        match event.effect {
            EventEffect::Reroll => {
                self.flags.has_rolled = false;
                self.flags.can_interact_with_space = false;
                self.phase = TurnPhase::AwaitingRoll;
                update.notices.push(Notice::ExtraRoll { player_id });
                self.hold_latch(&mut update);
            }
            EventEffect::Move | EventEffect::Skip => self.complete_turn(store, &mut update)?,
        }

        Ok(update)
    }

    /// Close the feedback window early.
    ///
    /// Not subject to the latch: closing the dialog always completes the
    /// turn and cancels the pending completion timer.
    pub fn dismiss_feedback(&mut self, store: &mut GameStore) -> Result<TurnUpdate, Rejection> {
        if self.phase != TurnPhase::ShowingFeedback {
            return Err(Rejection::NoFeedback);
        }

        let mut update = TurnUpdate::default();
        self.complete_turn(store, &mut update)?;
        Ok(update)
    }

    fn start_turn(&mut self, store: &mut GameStore, update: &mut TurnUpdate) -> Result<(), Rejection> {
        self.generation += 1;
        self.flags = TurnFlags::default();
        self.pending_roll = None;
        self.last_face = None;
        self.extra_rolls = 0;
        self.phase = TurnPhase::Idle;
        update.cancel_all = true;
        update.schedule.clear();
        update.cancel.clear();

        let state = store.state();
        if state.game_ended {
            self.phase = TurnPhase::GameOver;
            return Ok(());
        }
        if !state.is_active() {
            return Ok(());
        }

        // At most one player carries the flag, so this settles in one pass.
        for _ in 0..store.state().players.len() {
            let Some(player) = store.state().current_player() else {
                break;
            };
            if !player.is_skipping_turn {
                break;
            }
            let player_id = player.id;
            info!(player_id, "Player loses this turn");
            update.record(store.dispatch(Transition::ClearSkip { player_id })?);
            update.record(store.dispatch(Transition::NextPlayer)?);
            update.notices.push(Notice::TurnSkipped { player_id });
        }

        let player_id = current_player(store.state())?.id;
        debug!(player_id, generation = self.generation, "Turn started");
        update.notices.push(Notice::TurnStarted { player_id });
        self.phase = TurnPhase::AwaitingRoll;
        Ok(())
    }

    /// `Rolling -> Rolled(face)`, then on to an extra roll, the board, or
    /// straight to the next turn.
    fn finish_roll(&mut self, store: &mut GameStore, update: &mut TurnUpdate) -> Result<(), Rejection> {
        if self.phase != TurnPhase::Rolling {
            debug!(phase = %self.phase, "No roll in progress");
            return Ok(());
        }
        let Some(roll) = self.pending_roll.take() else {
            debug!("Roll timer fired without a committed roll");
            return Ok(());
        };

        let face = roll.face;
        let player_id = current_player(store.state())?.id;
        self.phase = TurnPhase::Rolled(face);
        self.flags.has_rolled = true;
        self.last_face = Some(face);

        update.record(store.dispatch(Transition::MovePlayer {
            delta: i64::from(face.value()),
        })?);
        let position = current_player(store.state())?.position;
        update.notices.push(Notice::Rolled {
            player_id,
            face,
            position,
        });
        info!(player_id, face = face.value(), position, "Rolled");

        if face.grants_extra_roll() {
            if self.extra_roll_available() {
                self.extra_rolls += 1;
                self.flags.has_rolled = false;
                self.flags.can_interact_with_space = false;
                self.phase = TurnPhase::AwaitingRoll;
                update.notices.push(Notice::ExtraRoll { player_id });
                self.hold_latch(update);
                return Ok(());
            }
            info!(player_id, extra_rolls = self.extra_rolls, "Extra roll limit reached");
        }

        if store.state().track().is_question(position) {
            self.flags.can_interact_with_space = true;
            self.phase = TurnPhase::SpaceInteractionAllowed;
            self.hold_latch(update);
        } else {
            debug!(position, "Nothing to resolve on this space");
            update.record(store.dispatch(Transition::CommitPosition { player_id })?);
            self.complete_turn(store, update)?;
        }

        Ok(())
    }

    /// `TurnComplete -> NextPlayer -> Idle -> AwaitingRoll`.
    fn complete_turn(&mut self, store: &mut GameStore, update: &mut TurnUpdate) -> Result<(), Rejection> {
        let player_id = current_player(store.state())?.id;
        self.phase = TurnPhase::TurnComplete;
        update.notices.push(Notice::TurnCompleted { player_id });
        update.cancel.push(TimerAction::CompleteTurn);
        update.record(store.dispatch(Transition::NextPlayer)?);
        self.start_turn(store, update)
    }

    fn finish_game(&mut self, state: &GameState, update: &mut TurnUpdate) {
        self.generation += 1;
        self.flags = TurnFlags::default();
        self.phase = TurnPhase::GameOver;
        update.cancel_all = true;
        update.schedule.clear();

        if let Some(winner) = &state.winner {
            update.notices.push(Notice::GameWon {
                player_id: winner.id,
                score: winner.score,
            });
        }
    }

    fn ensure_interaction(&self, state: &GameState) -> Result<(), Rejection> {
        ensure_active(state)?;
        if self.phase == TurnPhase::Rolling {
            return Err(Rejection::RollInProgress);
        }
        if self.flags.is_processing_turn {
            return Err(Rejection::Busy);
        }
        if !self.flags.has_rolled {
            return Err(Rejection::NotRolled);
        }
        if !self.flags.can_interact_with_space || self.phase != TurnPhase::SpaceInteractionAllowed {
            return Err(Rejection::InteractionClosed);
        }
        Ok(())
    }

    fn extra_roll_available(&self) -> bool {
        self.settings
            .max_extra_rolls
            .map_or(true, |cap| self.extra_rolls < cap)
    }

    fn hold_latch(&mut self, update: &mut TurnUpdate) {
        self.flags.is_processing_turn = true;
        update
            .schedule
            .push(self.timer(TimerAction::ReleaseLatch, self.settings.latch_release));
    }

    fn timer(&self, action: TimerAction, delay: Duration) -> TimerRequest {
        TimerRequest {
            action,
            delay,
            generation: self.generation,
        }
    }
}

fn ensure_active(state: &GameState) -> Result<(), Rejection> {
    if state.game_ended {
        return Err(Rejection::GameOver);
    }
    if !state.game_started || state.players.is_empty() {
        return Err(Rejection::GameNotStarted);
    }
    Ok(())
}

fn current_player(state: &GameState) -> Result<&Player, Rejection> {
    state
        .current_player()
        .ok_or(Rejection::Store(StoreError::NoPlayers))
}
