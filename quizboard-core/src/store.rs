//! Game State Store: the only writer of [`GameState`].
//!
//! The pipeline mirrors a classic reducer:
//! 1. A caller builds a [`Transition`] describing what should happen
//! 2. [`reduce`] checks the guard and produces a new state plus [`Change`]s
//! 3. [`GameStore`] swaps the new state in and records a [`Snapshot`]
//!
//! `reduce` never mutates its input. A win check runs after every accepted
//! transition.

use crate::bank::{EventCard, EventId, Question, QuestionId};
use crate::board::Tier;
use crate::state::{GameState, Player, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from applying a transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Cannot start a game without players")]
    EmptyRoster,

    #[error("Player id must be positive")]
    InvalidPlayerId,

    #[error("Player id {0} appears more than once")]
    DuplicatePlayerId(PlayerId),

    #[error("Token {0:?} is used by more than one player")]
    DuplicateToken(String),

    #[error("No player with id {0}")]
    UnknownPlayer(PlayerId),

    #[error("The game has no players")]
    NoPlayers,

    #[error("The game has ended; start a new game to continue")]
    GameEnded,
}

/// A named state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// Replace everything with a fresh game for this roster.
    StartGame {
        roster: Vec<Player>,
        difficulty: Tier,
        winning_score: u32,
    },

    /// Move the current player; the result is clamped to the track.
    MovePlayer { delta: i64 },

    UpdateScore { player_id: PlayerId, points: u32 },

    SetCurrentQuestion { question: Question },

    SetCurrentEvent { event: EventCard },

    /// Flag one player to lose their next turn; clears everyone else.
    SkipTurn { player_id: PlayerId },

    /// Consume a player's pending skip.
    ClearSkip { player_id: PlayerId },

    /// Forget every drawn question so the pool can be reused.
    ResetUsedQuestions,

    NextPlayer,

    /// Append the player's current position to their move history.
    CommitPosition { player_id: PlayerId },

    /// Drop the resolved question or event card.
    ClearPrompt,
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::StartGame { .. } => "StartGame",
            Transition::MovePlayer { .. } => "MovePlayer",
            Transition::UpdateScore { .. } => "UpdateScore",
            Transition::SetCurrentQuestion { .. } => "SetCurrentQuestion",
            Transition::SetCurrentEvent { .. } => "SetCurrentEvent",
            Transition::SkipTurn { .. } => "SkipTurn",
            Transition::ClearSkip { .. } => "ClearSkip",
            Transition::ResetUsedQuestions => "ResetUsedQuestions",
            Transition::NextPlayer => "NextPlayer",
            Transition::CommitPosition { .. } => "CommitPosition",
            Transition::ClearPrompt => "ClearPrompt",
        }
    }

    /// Transitions still accepted once the game has ended.
    fn allowed_after_end(&self) -> bool {
        matches!(
            self,
            Transition::StartGame { .. } | Transition::ResetUsedQuestions
        )
    }
}

/// A concrete consequence of a transition, for observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Change {
    GameStarted {
        players: usize,
        difficulty: Tier,
    },
    PlayerMoved {
        player_id: PlayerId,
        from: usize,
        to: usize,
        /// The requested move ran past either end of the track.
        clamped: bool,
    },
    ScoreChanged {
        player_id: PlayerId,
        points: u32,
        new_score: u32,
    },
    QuestionPresented {
        question_id: QuestionId,
    },
    EventPresented {
        event_id: EventId,
    },
    SkipFlagged {
        player_id: PlayerId,
    },
    SkipCleared {
        player_id: PlayerId,
    },
    UsedQuestionsReset {
        cleared: usize,
    },
    TurnPassed {
        from_index: usize,
        to_index: usize,
    },
    CheckpointRecorded {
        player_id: PlayerId,
        position: usize,
    },
    PromptCleared,
    WinnerDeclared {
        player_id: PlayerId,
        score: u32,
    },
}

/// The result of reducing one transition.
#[derive(Debug, Clone)]
pub struct Reduction {
    pub state: GameState,
    pub changes: Vec<Change>,
}

/// Apply a transition to a state, producing a new state.
pub fn reduce(state: &GameState, transition: &Transition) -> Result<Reduction, StoreError> {
    if state.game_ended && !transition.allowed_after_end() {
        return Err(StoreError::GameEnded);
    }

    let mut next = state.clone();
    let mut changes = Vec::new();

    match transition {
        Transition::StartGame {
            roster,
            difficulty,
            winning_score,
        } => {
            next = start_game(roster, *difficulty, *winning_score)?;
            changes.push(Change::GameStarted {
                players: next.players.len(),
                difficulty: *difficulty,
            });
        }

        Transition::MovePlayer { delta } => {
            let track = next.track();
            let player = next.current_player_mut().ok_or(StoreError::NoPlayers)?;
            let from = player.position;
            let requested = (from as i64).saturating_add(*delta);
            let to = track.clamp(requested);

            player.previous_position = from;
            player.position = to;
            changes.push(Change::PlayerMoved {
                player_id: player.id,
                from,
                to,
                clamped: requested != to as i64,
            });
        }

        Transition::UpdateScore { player_id, points } => {
            let player = next
                .player_mut(*player_id)
                .ok_or(StoreError::UnknownPlayer(*player_id))?;
            player.score = player.score.saturating_add(*points);
            changes.push(Change::ScoreChanged {
                player_id: *player_id,
                points: *points,
                new_score: player.score,
            });
        }

        Transition::SetCurrentQuestion { question } => {
            next.used_question_ids.insert(question.id);
            next.current_question = Some(question.clone());
            changes.push(Change::QuestionPresented {
                question_id: question.id,
            });
        }

        Transition::SetCurrentEvent { event } => {
            next.current_event = Some(event.clone());
            changes.push(Change::EventPresented { event_id: event.id });
        }

        Transition::SkipTurn { player_id } => {
            if next.player(*player_id).is_none() {
                return Err(StoreError::UnknownPlayer(*player_id));
            }
            for player in &mut next.players {
                player.is_skipping_turn = player.id == *player_id;
            }
            changes.push(Change::SkipFlagged {
                player_id: *player_id,
            });
        }

        Transition::ClearSkip { player_id } => {
            let player = next
                .player_mut(*player_id)
                .ok_or(StoreError::UnknownPlayer(*player_id))?;
            player.is_skipping_turn = false;
            changes.push(Change::SkipCleared {
                player_id: *player_id,
            });
        }

        Transition::ResetUsedQuestions => {
            let cleared = next.used_question_ids.len();
            next.used_question_ids.clear();
            changes.push(Change::UsedQuestionsReset { cleared });
        }

        Transition::NextPlayer => {
            if next.players.is_empty() {
                return Err(StoreError::NoPlayers);
            }
            let from_index = next.current_player_index;
            next.current_player_index = (from_index + 1) % next.players.len();
            changes.push(Change::TurnPassed {
                from_index,
                to_index: next.current_player_index,
            });
        }

        Transition::CommitPosition { player_id } => {
            let player = next
                .player_mut(*player_id)
                .ok_or(StoreError::UnknownPlayer(*player_id))?;
            player.move_history.push(player.position);
            changes.push(Change::CheckpointRecorded {
                player_id: *player_id,
                position: player.position,
            });
        }

        Transition::ClearPrompt => {
            next.current_question = None;
            next.current_event = None;
            changes.push(Change::PromptCleared);
        }
    }

    if let Some(change) = check_winner(&mut next) {
        changes.push(change);
    }

    Ok(Reduction {
        state: next,
        changes,
    })
}

fn start_game(
    roster: &[Player],
    difficulty: Tier,
    winning_score: u32,
) -> Result<GameState, StoreError> {
    if roster.is_empty() {
        return Err(StoreError::EmptyRoster);
    }

    let mut ids = HashSet::new();
    let mut tokens = HashSet::new();
    for player in roster {
        if player.id == 0 {
            return Err(StoreError::InvalidPlayerId);
        }
        if !ids.insert(player.id) {
            return Err(StoreError::DuplicatePlayerId(player.id));
        }
        if !tokens.insert(player.token.as_str()) {
            return Err(StoreError::DuplicateToken(player.token.clone()));
        }
    }

    let mut state = GameState::new(difficulty).with_winning_score(winning_score);
    let track = state.track();
    state.players = roster
        .iter()
        .map(|p| {
            let start = track.clamp(p.starting_position as i64);
            Player::new(p.id, p.name.clone(), p.token.clone()).starting_at(start)
        })
        .collect();
    state.game_started = true;

    Ok(state)
}

/// Declare a winner if exactly one player holds a winning top score.
///
/// Players tied at the top score never win, even past the threshold.
fn check_winner(state: &mut GameState) -> Option<Change> {
    if state.game_ended || !state.game_started {
        return None;
    }

    let leaders = state.leaders();
    let [leader] = leaders.as_slice() else {
        return None;
    };
    if leader.score < state.winning_score {
        return None;
    }

    let winner = (*leader).clone();
    let change = Change::WinnerDeclared {
        player_id: winner.id,
        score: winner.score,
    };
    state.game_ended = true;
    state.winner = Some(winner);
    Some(change)
}

/// One accepted transition and the state it produced.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub revision: u64,
    pub transition: &'static str,
    pub state: GameState,
    pub changes: Vec<Change>,
}

/// Owner of the canonical state.
///
/// Every accepted transition produces a [`Snapshot`] that observers collect
/// with [`GameStore::take_snapshots`].
#[derive(Debug, Clone, Default)]
pub struct GameStore {
    state: GameState,
    revision: u64,
    snapshots: Vec<Snapshot>,
}

impl GameStore {
    pub fn new(state: GameState) -> Self {
        Self {
            state,
            revision: 0,
            snapshots: Vec::new(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Number of transitions accepted so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Apply a transition. A rejected transition leaves the state untouched.
    pub fn dispatch(&mut self, transition: Transition) -> Result<Vec<Change>, StoreError> {
        let name = transition.name();
        let Reduction { state, changes } = reduce(&self.state, &transition).map_err(|err| {
            debug!(transition = name, %err, "Transition rejected");
            err
        })?;

        self.state = state;
        self.revision += 1;
        debug!(transition = name, revision = self.revision, "Transition applied");

        for change in &changes {
            if let Change::WinnerDeclared { player_id, score } = change {
                info!(player_id, score, "Winner declared");
            }
        }

        self.snapshots.push(Snapshot {
            revision: self.revision,
            transition: name,
            state: self.state.clone(),
            changes: changes.clone(),
        });

        Ok(changes)
    }

    /// Drain snapshots recorded since the last call, oldest first.
    pub fn take_snapshots(&mut self) -> Vec<Snapshot> {
        std::mem::take(&mut self.snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(n: u32) -> Vec<Player> {
        (1..=n)
            .map(|id| Player::new(id, format!("Player {id}"), format!("T{id}")))
            .collect()
    }

    fn started(n: u32) -> GameStore {
        let mut store = GameStore::default();
        store
            .dispatch(Transition::StartGame {
                roster: roster(n),
                difficulty: Tier::Beginner,
                winning_score: 100,
            })
            .unwrap();
        store
    }

    #[test]
    fn test_start_game_requires_players() {
        let mut store = GameStore::default();
        let result = store.dispatch(Transition::StartGame {
            roster: vec![],
            difficulty: Tier::Beginner,
            winning_score: 100,
        });
        assert_eq!(result, Err(StoreError::EmptyRoster));
        assert!(!store.state().game_started);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_start_game_rejects_duplicates() {
        let mut players = roster(2);
        players[1].id = 1;
        assert_eq!(
            reduce(
                &GameState::default(),
                &Transition::StartGame {
                    roster: players,
                    difficulty: Tier::Beginner,
                    winning_score: 100,
                }
            )
            .unwrap_err(),
            StoreError::DuplicatePlayerId(1)
        );

        let mut players = roster(2);
        players[1].token = "T1".to_string();
        assert!(matches!(
            reduce(
                &GameState::default(),
                &Transition::StartGame {
                    roster: players,
                    difficulty: Tier::Beginner,
                    winning_score: 100,
                }
            ),
            Err(StoreError::DuplicateToken(_))
        ));
    }

    #[test]
    fn test_start_game_resets_progress() {
        let mut players = roster(1);
        players[0].score = 55;
        players[0].position = 9;
        players[0].move_history = vec![0, 4, 9];

        let store = {
            let mut store = GameStore::default();
            store
                .dispatch(Transition::StartGame {
                    roster: players,
                    difficulty: Tier::Intermediate,
                    winning_score: 100,
                })
                .unwrap();
            store
        };

        let player = &store.state().players[0];
        assert_eq!(player.score, 0);
        assert_eq!(player.position, 0);
        assert_eq!(player.move_history, vec![0]);
        assert_eq!(store.state().difficulty, Tier::Intermediate);
    }

    #[test]
    fn test_reduce_does_not_mutate_input() {
        let store = started(2);
        let before = store.state().clone();
        let reduction = reduce(&before, &Transition::MovePlayer { delta: 4 }).unwrap();
        assert_eq!(store.state(), &before);
        assert_eq!(reduction.state.players[0].position, 4);
    }

    #[test]
    fn test_move_player_clamps() {
        let mut store = started(1);
        store.dispatch(Transition::MovePlayer { delta: 500 }).unwrap();
        assert_eq!(store.state().players[0].position, 19);
        assert_eq!(store.state().players[0].previous_position, 0);

        let changes = store.dispatch(Transition::MovePlayer { delta: -500 }).unwrap();
        assert_eq!(store.state().players[0].position, 0);
        assert_eq!(store.state().players[0].previous_position, 19);
        assert!(matches!(
            changes[0],
            Change::PlayerMoved {
                from: 19,
                to: 0,
                clamped: true,
                ..
            }
        ));
    }

    #[test]
    fn test_move_player_extreme_deltas() {
        let mut store = started(1);
        store.dispatch(Transition::MovePlayer { delta: 5 }).unwrap();

        let changes = store
            .dispatch(Transition::MovePlayer { delta: i64::MAX })
            .unwrap();
        assert_eq!(store.state().players[0].position, 19);
        assert!(matches!(
            changes[0],
            Change::PlayerMoved {
                from: 5,
                to: 19,
                clamped: true,
                ..
            }
        ));

        store.dispatch(Transition::MovePlayer { delta: -7 }).unwrap();
        store
            .dispatch(Transition::MovePlayer { delta: i64::MIN })
            .unwrap();
        assert_eq!(store.state().players[0].position, 0);
        assert_eq!(store.state().players[0].previous_position, 12);
    }

    #[test]
    fn test_move_does_not_touch_history() {
        let mut store = started(1);
        store.dispatch(Transition::MovePlayer { delta: 3 }).unwrap();
        assert_eq!(store.state().players[0].move_history, vec![0]);

        store
            .dispatch(Transition::CommitPosition { player_id: 1 })
            .unwrap();
        assert_eq!(store.state().players[0].move_history, vec![0, 3]);
    }

    #[test]
    fn test_skip_turn_is_exclusive() {
        let mut store = started(3);
        store.dispatch(Transition::SkipTurn { player_id: 1 }).unwrap();
        store.dispatch(Transition::SkipTurn { player_id: 3 }).unwrap();

        let flags: Vec<_> = store
            .state()
            .players
            .iter()
            .map(|p| p.is_skipping_turn)
            .collect();
        assert_eq!(flags, vec![false, false, true]);

        store.dispatch(Transition::ClearSkip { player_id: 3 }).unwrap();
        assert!(store.state().players.iter().all(|p| !p.is_skipping_turn));
    }

    #[test]
    fn test_next_player_wraps() {
        let mut store = started(3);
        for expected in [1, 2, 0, 1] {
            store.dispatch(Transition::NextPlayer).unwrap();
            assert_eq!(store.state().current_player_index, expected);
        }
    }

    #[test]
    fn test_question_tracking() {
        let mut store = started(1);
        let question = Question::new(42, "?", ["a", "b", "c", "d"], "a");
        store
            .dispatch(Transition::SetCurrentQuestion {
                question: question.clone(),
            })
            .unwrap();
        assert!(store.state().used_question_ids.contains(&42));
        assert_eq!(store.state().current_question, Some(question));

        store.dispatch(Transition::ClearPrompt).unwrap();
        assert!(store.state().current_question.is_none());
        assert!(store.state().used_question_ids.contains(&42));

        store.dispatch(Transition::ResetUsedQuestions).unwrap();
        assert!(store.state().used_question_ids.is_empty());
    }

    #[test]
    fn test_unknown_player() {
        let mut store = started(2);
        assert_eq!(
            store.dispatch(Transition::UpdateScore {
                player_id: 9,
                points: 1
            }),
            Err(StoreError::UnknownPlayer(9))
        );
    }

    #[test]
    fn test_winner_at_threshold() {
        let mut store = started(2);
        store
            .dispatch(Transition::UpdateScore {
                player_id: 2,
                points: 99,
            })
            .unwrap();
        assert!(!store.state().game_ended);

        let changes = store
            .dispatch(Transition::UpdateScore {
                player_id: 2,
                points: 1,
            })
            .unwrap();
        assert!(store.state().game_ended);
        assert_eq!(store.state().winner.as_ref().map(|w| w.id), Some(2));
        assert!(changes
            .iter()
            .any(|c| matches!(c, Change::WinnerDeclared { player_id: 2, score: 100 })));
    }

    #[test]
    fn test_tie_at_top_declares_no_winner() {
        let mut state = started(2).state().clone();
        state.players[0].score = 120;
        state.players[1].score = 110;
        let mut store = GameStore::new(state);
        store
            .dispatch(Transition::UpdateScore {
                player_id: 2,
                points: 10,
            })
            .unwrap();
        assert!(!store.state().game_ended);
        assert!(store.state().winner.is_none());
    }

    #[test]
    fn test_ended_game_rejects_moves() {
        let mut store = started(1);
        store
            .dispatch(Transition::UpdateScore {
                player_id: 1,
                points: 100,
            })
            .unwrap();
        assert!(store.state().game_ended);

        let before = store.revision();
        assert_eq!(
            store.dispatch(Transition::MovePlayer { delta: 1 }),
            Err(StoreError::GameEnded)
        );
        assert_eq!(store.dispatch(Transition::NextPlayer), Err(StoreError::GameEnded));
        assert_eq!(store.revision(), before);

        assert!(store.dispatch(Transition::ResetUsedQuestions).is_ok());
        assert!(store
            .dispatch(Transition::StartGame {
                roster: roster(2),
                difficulty: Tier::Beginner,
                winning_score: 100,
            })
            .is_ok());
        assert!(!store.state().game_ended);
        assert!(store.state().winner.is_none());
    }

    #[test]
    fn test_snapshots_follow_transitions() {
        let mut store = started(2);
        store.dispatch(Transition::MovePlayer { delta: 2 }).unwrap();
        let _ = store.dispatch(Transition::UpdateScore {
            player_id: 7,
            points: 1,
        });

        let snapshots = store.take_snapshots();
        let names: Vec<_> = snapshots.iter().map(|s| s.transition).collect();
        assert_eq!(names, vec!["StartGame", "MovePlayer"]);
        assert_eq!(snapshots[1].revision, 2);
        assert!(store.take_snapshots().is_empty());
    }
}
