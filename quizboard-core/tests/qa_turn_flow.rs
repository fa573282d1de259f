//! QA tests for the turn state machine using the test harness.
//!
//! The harness fires every timer immediately, so each call returns with the
//! turn settled:
//! - Correct and incorrect answers
//! - Extra rolls on a six
//! - Question pool exhaustion
//! - Event cards
//! - Duplicate-request guards

use quizboard_core::bank::EventEffect;
use quizboard_core::state::GameState;
use quizboard_core::store::Change;
use quizboard_core::testing::{sample_roster, TestBank, TestHarness};
use quizboard_core::turn::{Notice, Rejection, TimerAction, TurnPhase, TurnSettings};
use quizboard_core::Tier;

fn harness_with(bank: TestBank, players: u32) -> TestHarness {
    let mut harness = TestHarness::unstarted(bank, TurnSettings::default());
    harness
        .new_game(sample_roster(players), Tier::Beginner, 100)
        .expect("game should start");
    harness
}

// =============================================================================
// ANSWERS
// =============================================================================

#[test]
fn test_correct_answer_scores_face_and_keeps_position() {
    let mut harness = TestHarness::new();

    harness.roll_and_click(3).unwrap();
    assert_eq!(harness.phase(), TurnPhase::ResolvingQuestion);

    let update = harness.answer_correctly().unwrap();
    let player = harness.player(1).unwrap();
    assert_eq!(player.position, 3);
    assert_eq!(player.score, 3);
    assert_eq!(player.move_history, vec![0, 3]);
    assert!(harness.state().current_question.is_none());

    assert!(update
        .notices
        .iter()
        .any(|n| matches!(n, Notice::Feedback(f) if f.correct && f.points == 3)));
    assert_eq!(harness.state().current_player_index, 1);
    assert_eq!(harness.phase(), TurnPhase::AwaitingRoll);
}

#[test]
fn test_wrong_first_answer_returns_to_start() {
    let mut harness = TestHarness::new();

    harness.roll_and_click(4).unwrap();
    let update = harness.answer("wrong").unwrap();

    let player = harness.player(1).unwrap();
    assert_eq!(player.position, player.starting_position);
    assert_eq!(player.score, 0);
    assert_eq!(player.move_history, vec![0]);
    assert!(update.notices.iter().any(|n| matches!(
        n,
        Notice::Feedback(f) if !f.correct && f.correct_answer == "right" && f.returned_to == Some(0)
    )));
}

#[test]
fn test_wrong_answer_after_checkpoint_returns_to_previous() {
    let mut harness = TestHarness::new();

    // Player 1 banks space 3, player 2 plays a turn.
    harness.roll_and_click(3).unwrap();
    harness.answer_correctly().unwrap();
    harness.roll_and_click(2).unwrap();
    harness.answer_correctly().unwrap();

    harness.roll_and_click(5).unwrap();
    assert_eq!(harness.player(1).unwrap().position, 8);
    harness.answer("nope").unwrap();

    let player = harness.player(1).unwrap();
    assert_eq!(player.position, 3);
    assert_eq!(player.score, 3);
}

#[test]
fn test_answer_without_question_rejected() {
    let mut harness = TestHarness::new();
    assert_eq!(harness.answer("right"), Err(Rejection::NoPendingQuestion));
}

// =============================================================================
// DICE
// =============================================================================

#[test]
fn test_six_keeps_the_turn() {
    let mut harness = TestHarness::new();
    harness.faces([6, 2]);

    harness.roll().unwrap();
    assert_eq!(harness.phase(), TurnPhase::AwaitingRoll);
    assert_eq!(harness.player(1).unwrap().position, 6);
    assert_eq!(harness.state().current_player_index, 0);
    assert_eq!(harness.click(6), Err(Rejection::NotRolled));

    harness.roll().unwrap();
    assert_eq!(harness.phase(), TurnPhase::SpaceInteractionAllowed);
    assert_eq!(harness.player(1).unwrap().position, 8);
    assert_eq!(harness.state().current_player_index, 0);

    harness.click(8).unwrap();
    harness.answer_correctly().unwrap();
    assert_eq!(harness.player(1).unwrap().score, 2);
    assert_eq!(harness.state().current_player_index, 1);
}

#[test]
fn test_capped_six_plays_as_normal_roll() {
    let settings = TurnSettings {
        max_extra_rolls: Some(0),
        ..TurnSettings::default()
    };
    let mut harness = TestHarness::unstarted(TestBank::with_questions(5), settings);
    harness
        .new_game(sample_roster(2), Tier::Beginner, 100)
        .unwrap();

    harness.faces([6]).roll().unwrap();
    assert_eq!(harness.phase(), TurnPhase::SpaceInteractionAllowed);
    assert_eq!(harness.player(1).unwrap().position, 6);
}

#[test]
fn test_out_of_range_faces_fall_back() {
    let mut harness = TestHarness::new();
    let update = harness.faces([0, 9, 12]).roll().unwrap();

    assert!(update
        .notices
        .iter()
        .any(|n| matches!(n, Notice::DiceFallback { attempts: 3 })));
    assert_eq!(harness.player(1).unwrap().position, 1);
}

#[test]
fn test_roll_to_finish_completes_turn() {
    let mut harness = TestHarness::new();
    let mut state: GameState = harness.state().clone();
    state.players[0].position = 16;
    state.players[0].previous_position = 16;
    state.players[0].move_history = vec![0, 16];
    harness.load(state).unwrap();

    harness.faces([5]).roll().unwrap();

    let player = harness.player(1).unwrap();
    assert_eq!(player.position, 19);
    assert_eq!(player.move_history, vec![0, 16, 19]);
    assert_eq!(harness.state().current_player_index, 1);
    assert_eq!(harness.phase(), TurnPhase::AwaitingRoll);
}

// =============================================================================
// QUESTION POOL
// =============================================================================

#[test]
fn test_pool_exhaustion_resets_once() {
    let mut harness = harness_with(TestBank::with_questions(2), 1);
    let mut resets = 0;
    let mut drawn = Vec::new();

    for _ in 0..3 {
        let update = harness.roll_and_click(1).unwrap();
        resets += update
            .changes
            .iter()
            .filter(|c| matches!(c, Change::UsedQuestionsReset { .. }))
            .count();
        drawn.push(harness.state().current_question.as_ref().unwrap().id);

        for id in &harness.state().used_question_ids {
            assert!(drawn.contains(id), "{id} was never drawn");
        }
        harness.answer_correctly().unwrap();
    }

    assert_eq!(resets, 1);
    assert_eq!(harness.state().used_question_ids.len(), 1);

    let mut first_two = drawn[..2].to_vec();
    first_two.sort_unstable();
    assert_eq!(first_two, vec![1, 2]);
}

// =============================================================================
// EVENTS
// =============================================================================

#[test]
fn test_skip_event_costs_next_turn() {
    let bank = TestBank::with_questions(5).only_event(EventEffect::Skip, 0);
    let mut harness = harness_with(bank, 2);

    harness.faces([2]).roll().unwrap();
    harness.draw_event().unwrap();
    assert_eq!(harness.phase(), TurnPhase::ResolvingEvent);
    harness.resolve_event().unwrap();

    assert!(harness.player(1).unwrap().is_skipping_turn);
    assert_eq!(harness.state().current_player_index, 1);

    harness.roll_and_click(3).unwrap();
    let update = harness.answer_correctly().unwrap();

    assert!(update.notices.contains(&Notice::TurnSkipped { player_id: 1 }));
    assert!(!harness.player(1).unwrap().is_skipping_turn);
    assert_eq!(harness.state().current_player_index, 1);
}

#[test]
fn test_move_event_clamps_and_checkpoints() {
    let bank = TestBank::with_questions(5).only_event(EventEffect::Move, -5);
    let mut harness = harness_with(bank, 2);

    harness.faces([3]).roll().unwrap();
    harness.draw_event().unwrap();
    harness.resolve_event().unwrap();

    let player = harness.player(1).unwrap();
    assert_eq!(player.position, 0);
    assert_eq!(player.move_history, vec![0, 0]);
    assert!(harness.state().current_event.is_none());
    assert_eq!(harness.state().current_player_index, 1);
}

#[test]
fn test_reroll_event_keeps_the_turn() {
    let bank = TestBank::with_questions(5).only_event(EventEffect::Reroll, 0);
    let mut harness = harness_with(bank, 2);

    harness.faces([2]).roll().unwrap();
    harness.draw_event().unwrap();
    harness.resolve_event().unwrap();
    assert_eq!(harness.phase(), TurnPhase::AwaitingRoll);
    assert_eq!(harness.state().current_player_index, 0);

    harness.faces([1]).roll().unwrap();
    assert_eq!(harness.player(1).unwrap().position, 3);
}

#[test]
fn test_empty_event_pool_rejected() {
    let mut harness = TestHarness::new();
    harness.faces([2]).roll().unwrap();
    assert_eq!(
        harness.draw_event(),
        Err(Rejection::EmptyBank(Tier::Beginner))
    );
    assert_eq!(harness.phase(), TurnPhase::SpaceInteractionAllowed);
}

// =============================================================================
// GUARDS
// =============================================================================

#[test]
fn test_click_on_other_space_rejected() {
    let mut harness = TestHarness::new();
    harness.faces([3]).roll().unwrap();

    assert_eq!(
        harness.click(5),
        Err(Rejection::WrongSpace {
            clicked: 5,
            position: 3
        })
    );
    assert_eq!(harness.phase(), TurnPhase::SpaceInteractionAllowed);
    assert!(harness.state().current_question.is_none());
}

#[test]
fn test_roll_during_animation_rejected() {
    let mut harness = TestHarness::new();
    harness.faces([4]);

    harness.hold(|c, s, d| c.request_roll(s, d)).unwrap();
    assert_eq!(harness.phase(), TurnPhase::Rolling);
    assert_eq!(harness.roll(), Err(Rejection::RollInProgress));

    harness.flush().unwrap();
    assert_eq!(harness.player(1).unwrap().position, 4);
    assert_eq!(harness.roll(), Err(Rejection::AlreadyRolled));
}

#[test]
fn test_latch_rejects_click_until_released() {
    let mut harness = TestHarness::new();
    harness.faces([4]);

    harness.hold(|c, s, d| c.request_roll(s, d)).unwrap();
    harness
        .hold(|c, s, _| {
            let generation = c.generation();
            c.fire(s, TimerAction::FinishRoll, generation)
        })
        .unwrap();
    assert!(harness.controller.flags().is_processing_turn);
    assert_eq!(harness.click(4), Err(Rejection::Busy));

    harness.flush().unwrap();
    assert!(harness.click(4).is_ok());
}

#[test]
fn test_game_over_blocks_turns() {
    let mut harness = TestHarness::unstarted(TestBank::with_questions(5), TurnSettings::default());
    harness
        .new_game(sample_roster(2), Tier::Beginner, 5)
        .unwrap();

    harness.roll_and_click(5).unwrap();
    let update = harness.answer_correctly().unwrap();

    assert!(update.notices.contains(&Notice::GameWon {
        player_id: 1,
        score: 5
    }));
    assert!(update.cancel_all);
    assert_eq!(harness.phase(), TurnPhase::GameOver);
    assert!(harness.state().game_ended);
    assert_eq!(harness.roll(), Err(Rejection::GameOver));

    harness
        .new_game(sample_roster(2), Tier::Beginner, 5)
        .unwrap();
    assert_eq!(harness.phase(), TurnPhase::AwaitingRoll);
    assert!(harness.state().winner.is_none());
}

#[test]
fn test_resume_discards_open_prompt() {
    let mut harness = TestHarness::new();
    harness.roll_and_click(3).unwrap();
    let saved = harness.state().clone();
    assert!(saved.current_question.is_some());

    let mut resumed = TestHarness::new();
    resumed.load(saved).unwrap();
    assert!(resumed.state().current_question.is_none());
    assert_eq!(resumed.phase(), TurnPhase::AwaitingRoll);
    assert_eq!(resumed.player(1).unwrap().position, 3);
}
