//! Testing utilities for the quiz board.
//!
//! This module provides tools for integration testing:
//! - `ScriptedFaces` for deterministic dice
//! - `TestBank` for small, predictable content
//! - `TestHarness` for scripted turns with timers fired immediately

use crate::bank::{EventCard, EventEffect, Question, QuestionBank};
use crate::board::Tier;
use crate::dice::{Dice, FaceSource};
use crate::state::{GameState, Player, PlayerId};
use crate::store::GameStore;
use crate::turn::{Rejection, TimerRequest, TurnController, TurnPhase, TurnSettings, TurnUpdate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;

/// Dice faces played back from a script.
///
/// When the script runs out it starts over from the beginning. An empty
/// script always yields 1.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFaces {
    script: Vec<i64>,
    queue: VecDeque<i64>,
}

impl ScriptedFaces {
    pub fn new(faces: impl IntoIterator<Item = i64>) -> Self {
        let script: Vec<i64> = faces.into_iter().collect();
        Self {
            queue: script.iter().copied().collect(),
            script,
        }
    }

    /// Queue more faces after the ones still pending.
    pub fn push(&mut self, faces: impl IntoIterator<Item = i64>) {
        for face in faces {
            self.script.push(face);
            self.queue.push_back(face);
        }
    }

    /// Replace whatever is pending with these faces.
    pub fn replace(&mut self, faces: impl IntoIterator<Item = i64>) {
        *self = Self::new(faces);
    }
}

impl FaceSource for ScriptedFaces {
    fn next_face(&mut self) -> i64 {
        if self.queue.is_empty() {
            self.queue.extend(self.script.iter().copied());
        }
        self.queue.pop_front().unwrap_or(1)
    }
}

/// A roster of `count` players with ids starting at 1.
pub fn sample_roster(count: u32) -> Vec<Player> {
    const TOKENS: [&str; 6] = ["🚀", "🎩", "🐢", "🦊", "🌵", "⚓"];
    (1..=count)
        .map(|id| {
            let token = TOKENS
                .get(id as usize - 1)
                .map(|t| t.to_string())
                .unwrap_or_else(|| format!("P{id}"));
            Player::new(id, format!("Player {id}"), token)
        })
        .collect()
}

/// A bank whose correct answer is always "right".
#[derive(Debug, Clone, Default)]
pub struct TestBank {
    pub questions: Vec<Question>,
    pub events: Vec<EventCard>,
}

impl TestBank {
    /// `count` questions with ids 1..=count.
    pub fn with_questions(count: u32) -> Self {
        Self {
            questions: (1..=count)
                .map(|id| {
                    Question::new(id, format!("Question {id}"), ["right", "wrong", "nope", "no"], "right")
                })
                .collect(),
            events: Vec::new(),
        }
    }

    /// Replace the events with a single card.
    pub fn only_event(mut self, effect: EventEffect, value: i32) -> Self {
        self.events = vec![EventCard::new(1, format!("Test {effect}"), effect, value)];
        self
    }
}

impl QuestionBank for TestBank {
    fn questions_for(&self, _tier: Tier) -> &[Question] {
        &self.questions
    }

    fn events_for(&self, _tier: Tier) -> &[EventCard] {
        &self.events
    }
}

/// Test harness for running turn scenarios.
///
/// Every timer an operation schedules is fired straight away, so each call
/// returns with the turn settled.
pub struct TestHarness {
    pub store: GameStore,
    pub controller: TurnController,
    pub dice: Dice<ScriptedFaces>,
    pub bank: TestBank,
    pub rng: StdRng,
    pending: Vec<TimerRequest>,
}

impl TestHarness {
    /// Two players on the beginner track with ten test questions.
    pub fn new() -> Self {
        Self::with_players(2)
    }

    pub fn with_players(count: u32) -> Self {
        let mut harness = Self::unstarted(TestBank::with_questions(10), TurnSettings::default());
        harness
            .new_game(sample_roster(count), Tier::Beginner, 100)
            .unwrap_or_default();
        harness
    }

    /// A harness with no game started.
    pub fn unstarted(bank: TestBank, settings: TurnSettings) -> Self {
        Self {
            store: GameStore::default(),
            controller: TurnController::new(settings),
            dice: Dice::new(ScriptedFaces::default()),
            bank,
            rng: StdRng::seed_from_u64(0),
            pending: Vec::new(),
        }
    }

    pub fn with_bank(mut self, bank: TestBank) -> Self {
        self.bank = bank;
        self
    }

    pub fn new_game(
        &mut self,
        roster: Vec<Player>,
        tier: Tier,
        winning_score: u32,
    ) -> Result<TurnUpdate, Rejection> {
        let update = self
            .controller
            .reset(&mut self.store, roster, tier, winning_score)?;
        self.settle(update)
    }

    /// Start from an arbitrary state, as if it had been loaded.
    pub fn load(&mut self, state: GameState) -> Result<TurnUpdate, Rejection> {
        self.store = GameStore::new(state);
        let update = self.controller.resume(&mut self.store)?;
        self.settle(update)
    }

    /// Queue dice faces for the next rolls.
    pub fn faces(&mut self, faces: impl IntoIterator<Item = i64>) -> &mut Self {
        self.dice.source_mut().replace(faces);
        self
    }

    pub fn roll(&mut self) -> Result<TurnUpdate, Rejection> {
        let update = self.controller.request_roll(&self.store, &mut self.dice)?;
        self.settle(update)
    }

    /// Roll `face` and then click the space the player lands on.
    pub fn roll_and_click(&mut self, face: i64) -> Result<TurnUpdate, Rejection> {
        self.faces([face]);
        let mut update = self.roll()?;
        let position = self.current_player().map(|p| p.position).unwrap_or(0);
        update.merge(self.click(position)?);
        Ok(update)
    }

    pub fn click(&mut self, index: usize) -> Result<TurnUpdate, Rejection> {
        let update = self
            .controller
            .click_space(&mut self.store, &self.bank, &mut self.rng, index)?;
        self.settle(update)
    }

    pub fn answer(&mut self, answer: &str) -> Result<TurnUpdate, Rejection> {
        let update = self.controller.submit_answer(&mut self.store, answer)?;
        self.settle(update)
    }

    /// Answer the open question correctly.
    pub fn answer_correctly(&mut self) -> Result<TurnUpdate, Rejection> {
        let answer = self
            .store
            .state()
            .current_question
            .as_ref()
            .map(|q| q.correct_answer.clone())
            .ok_or(Rejection::NoPendingQuestion)?;
        self.answer(&answer)
    }

    pub fn draw_event(&mut self) -> Result<TurnUpdate, Rejection> {
        let update = self
            .controller
            .draw_event(&mut self.store, &self.bank, &mut self.rng)?;
        self.settle(update)
    }

    pub fn resolve_event(&mut self) -> Result<TurnUpdate, Rejection> {
        let update = self.controller.resolve_event(&mut self.store)?;
        self.settle(update)
    }

    pub fn dismiss(&mut self) -> Result<TurnUpdate, Rejection> {
        let update = self.controller.dismiss_feedback(&mut self.store)?;
        self.settle(update)
    }

    /// Run an operation without firing its timers.
    pub fn hold<F>(&mut self, op: F) -> Result<TurnUpdate, Rejection>
    where
        F: FnOnce(&mut TurnController, &mut GameStore, &mut Dice<ScriptedFaces>) -> Result<TurnUpdate, Rejection>,
    {
        let update = op(&mut self.controller, &mut self.store, &mut self.dice)?;
        self.track(&update);
        Ok(update)
    }

    /// Fire every pending timer until none remain.
    pub fn flush(&mut self) -> Result<TurnUpdate, Rejection> {
        self.settle(TurnUpdate::default())
    }

    fn settle(&mut self, update: TurnUpdate) -> Result<TurnUpdate, Rejection> {
        self.track(&update);
        let mut merged = update;
        while !self.pending.is_empty() {
            let request = self.pending.remove(0);
            let fired = self
                .controller
                .fire(&mut self.store, request.action, request.generation)?;
            self.track(&fired);
            merged.merge(fired);
        }
        Ok(merged)
    }

    fn track(&mut self, update: &TurnUpdate) {
        // Nothing here persists, so snapshots are dropped as they come.
        self.store.take_snapshots();
        if update.cancel_all {
            self.pending.clear();
        }
        self.pending.retain(|p| !update.cancel.contains(&p.action));
        for request in &update.schedule {
            self.pending.retain(|p| p.action != request.action);
            self.pending.push(*request);
        }
    }

    pub fn state(&self) -> &GameState {
        self.store.state()
    }

    pub fn phase(&self) -> TurnPhase {
        self.controller.phase()
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.store.state().current_player()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.store.state().player(id)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
