//! Canonical game data.
//!
//! [`GameState`] is only ever replaced through [`crate::store`]
//! transitions. Turn-phase flags are deliberately absent: they belong to
//! the turn controller and are never persisted.

use crate::bank::{EventCard, Question, QuestionId};
use crate::board::{Tier, Track};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Identifier of a player; always positive.
pub type PlayerId = u32;

/// Score needed to win when nothing else is configured.
pub const DEFAULT_WINNING_SCORE: u32 = 100;

/// A participant and their token on the track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Display symbol, unique within a game.
    pub token: String,
    pub position: usize,
    /// Position before the most recent move.
    pub previous_position: usize,
    pub starting_position: usize,
    pub score: u32,
    pub is_skipping_turn: bool,
    /// Confirmed positions, oldest first. Starts with `starting_position`.
    pub move_history: Vec<usize>,
}

impl Player {
    /// A new player standing on the start space.
    pub fn new(id: PlayerId, name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            token: token.into(),
            position: 0,
            previous_position: 0,
            starting_position: 0,
            score: 0,
            is_skipping_turn: false,
            move_history: vec![0],
        }
    }

    /// Place the player somewhere other than the start space.
    pub fn starting_at(mut self, position: usize) -> Self {
        self.position = position;
        self.previous_position = position;
        self.starting_position = position;
        self.move_history = vec![position];
        self
    }

    /// Whether any move has been confirmed since the start.
    pub fn has_checkpoint(&self) -> bool {
        self.move_history.len() > 1
    }

    /// Where a wrong answer sends this player.
    pub fn penalty_position(&self) -> usize {
        if self.has_checkpoint() {
            self.previous_position
        } else {
            self.starting_position
        }
    }
}

/// The authoritative state of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub players: Vec<Player>,
    pub current_player_index: usize,
    /// Stored as an ascending array; see [`sorted_ids`].
    #[serde(with = "sorted_ids")]
    pub used_question_ids: HashSet<QuestionId>,
    pub game_started: bool,
    pub game_ended: bool,
    pub winner: Option<Player>,
    pub current_question: Option<Question>,
    pub current_event: Option<EventCard>,
    pub difficulty: Tier,
    #[serde(default = "default_winning_score")]
    pub winning_score: u32,
}

fn default_winning_score() -> u32 {
    DEFAULT_WINNING_SCORE
}

impl GameState {
    /// An empty, not-yet-started game.
    pub fn new(difficulty: Tier) -> Self {
        Self {
            players: Vec::new(),
            current_player_index: 0,
            used_question_ids: HashSet::new(),
            game_started: false,
            game_ended: false,
            winner: None,
            current_question: None,
            current_event: None,
            difficulty,
            winning_score: DEFAULT_WINNING_SCORE,
        }
    }

    pub fn with_winning_score(mut self, winning_score: u32) -> Self {
        self.winning_score = winning_score;
        self
    }

    pub fn track(&self) -> Track {
        Track::for_tier(self.difficulty)
    }

    pub fn track_length(&self) -> usize {
        self.difficulty.track_length()
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub(crate) fn current_player_mut(&mut self) -> Option<&mut Player> {
        self.players.get_mut(self.current_player_index)
    }

    /// Whether the game is running and accepting moves.
    pub fn is_active(&self) -> bool {
        self.game_started && !self.game_ended && !self.players.is_empty()
    }

    /// Highest score among all players.
    pub fn top_score(&self) -> Option<u32> {
        self.players.iter().map(|p| p.score).max()
    }

    /// All players sharing the highest score.
    pub fn leaders(&self) -> Vec<&Player> {
        match self.top_score() {
            Some(top) => self.players.iter().filter(|p| p.score == top).collect(),
            None => Vec::new(),
        }
    }

    /// Players ordered by score, highest first. Ties keep roster order.
    pub fn standings(&self) -> Vec<&Player> {
        let mut standings: Vec<&Player> = self.players.iter().collect();
        standings.sort_by(|a, b| b.score.cmp(&a.score));
        standings
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(Tier::default())
    }
}

/// Serialize a set of ids as an ascending sequence.
///
/// JSON has no set type; sorting keeps saves stable across runs.
pub(crate) mod sorted_ids {
    use crate::bank::QuestionId;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashSet;

    pub fn serialize<S>(ids: &HashSet<QuestionId>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut sorted: Vec<QuestionId> = ids.iter().copied().collect();
        sorted.sort_unstable();
        sorted.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<HashSet<QuestionId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ids: Vec<QuestionId> = Vec::deserialize(deserializer)?;
        Ok(ids.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_history() {
        let player = Player::new(1, "Ada", "🚀");
        assert_eq!(player.move_history, vec![0]);
        assert!(!player.has_checkpoint());

        let placed = Player::new(2, "Alan", "🎩").starting_at(4);
        assert_eq!(placed.position, 4);
        assert_eq!(placed.move_history, vec![4]);
    }

    #[test]
    fn test_penalty_position() {
        let mut player = Player::new(1, "Ada", "🚀").starting_at(2);
        player.previous_position = 5;
        player.position = 9;
        assert_eq!(player.penalty_position(), 2);

        player.move_history.push(5);
        assert_eq!(player.penalty_position(), 5);
    }

    #[test]
    fn test_used_ids_serialize_sorted() {
        let mut state = GameState::new(Tier::Beginner);
        state.used_question_ids.extend([108, 101, 105]);

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["used_question_ids"], serde_json::json!([101, 105, 108]));

        let restored: GameState = serde_json::from_value(json).unwrap();
        assert_eq!(restored.used_question_ids, state.used_question_ids);
    }

    #[test]
    fn test_missing_winning_score_defaults() {
        let mut json = serde_json::to_value(GameState::new(Tier::Expert)).unwrap();
        json.as_object_mut().unwrap().remove("winning_score");
        let restored: GameState = serde_json::from_value(json).unwrap();
        assert_eq!(restored.winning_score, DEFAULT_WINNING_SCORE);
    }

    #[test]
    fn test_leaders_and_standings() {
        let mut state = GameState::new(Tier::Beginner);
        state.players = vec![
            Player::new(1, "Ada", "A"),
            Player::new(2, "Alan", "B"),
            Player::new(3, "Grace", "C"),
        ];
        state.players[1].score = 7;
        state.players[2].score = 7;

        let leaders: Vec<_> = state.leaders().iter().map(|p| p.id).collect();
        assert_eq!(leaders, vec![2, 3]);

        let standings: Vec<_> = state.standings().iter().map(|p| p.id).collect();
        assert_eq!(standings, vec![2, 3, 1]);
    }
}
