//! Headless mode for QuizBoard.
//!
//! A simple line protocol on stdin/stdout:
//! - Each input line is one command (`roll`, `click 4`, `answer Mars`, ...)
//! - Output lines are tagged: `[TURN]`, `[ROLL]`, `[QUESTION]`, `[FEEDBACK]`,
//!   `[EVENT]`, `[WIN]`, `[REJECTED]`, `[STATUS]`
//!
//! Timers run while waiting for input, so the dice animation and feedback
//! window play out in real time unless `--fast` is given.

use anyhow::Result;
use quizboard_core::{
    GameConfig, GameSession, GameState, Notice, Player, SessionError, Tier, TurnUpdate,
};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::debug;

const TOKENS: [&str; 6] = ["🚀", "🎩", "🐢", "🦊", "🌵", "⚓"];

enum Input {
    Line(Option<String>),
    Timer(Option<TurnUpdate>),
}

/// Build a roster from player names.
pub fn roster(names: &[String]) -> Vec<Player> {
    names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .enumerate()
        .map(|(i, name)| {
            let token = TOKENS
                .get(i)
                .map(|t| t.to_string())
                .unwrap_or_else(|| format!("P{}", i + 1));
            Player::new(i as u32 + 1, name, token)
        })
        .collect()
}

/// Run the console loop until `quit` or end of input.
pub async fn run(config: GameConfig, names: &[String], fresh: bool) -> Result<()> {
    let tier = config.tier;
    let mut session = GameSession::open(config).await?;

    println!("=== QuizBoard ===");
    if fresh || !session.state().is_active() {
        let update = session.start_game(roster(names), tier).await;
        report(&session, update);
    } else {
        println!("[RESUMED] Continuing the saved game");
        print_status(session.state());
    }
    print_help();

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        // Both branches are cancel safe; a dropped tick keeps its update.
        let input = tokio::select! {
            line = lines.next_line() => Input::Line(line?),
            update = session.tick(), if session.has_pending_timers() => Input::Timer(update),
        };

        match input {
            Input::Timer(Some(update)) => print_update(session.state(), &update),
            Input::Timer(None) => {}
            Input::Line(None) => break,
            Input::Line(Some(line)) => {
                if !handle_line(&mut session, line.trim(), tier).await {
                    break;
                }
            }
        }
    }

    session.cancel_timers();
    println!("Goodbye!");
    Ok(())
}

/// Returns false when the player asked to quit.
async fn handle_line(session: &mut GameSession, line: &str, default_tier: Tier) -> bool {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    debug!(command, rest, "Command");

    match command.to_lowercase().as_str() {
        "" => {}
        "quit" | "exit" => return false,
        "help" => print_help(),
        "status" => print_status(session.state()),
        "board" => print_board(session),
        "roll" | "r" => {
            let update = session.roll().await;
            report(session, update);
        }
        "click" | "c" => match rest.parse::<usize>() {
            Ok(index) => {
                let update = session.click_space(index).await;
                report(session, update);
            }
            Err(_) => println!("[ERROR] Usage: click <space>"),
        },
        "answer" | "a" => {
            let answer = resolve_answer(session.state(), rest);
            let update = session.answer(&answer).await;
            report(session, update);
        }
        "event" | "e" => {
            let update = session.draw_event().await;
            report(session, update);
        }
        "resolve" => {
            let update = session.resolve_event().await;
            report(session, update);
        }
        "dismiss" | "ok" => {
            let update = session.dismiss_feedback().await;
            report(session, update);
        }
        "new" => {
            let tier = if rest.is_empty() {
                Ok(default_tier)
            } else {
                rest.parse::<Tier>()
            };
            match tier {
                Ok(tier) => {
                    let names: Vec<String> =
                        session.state().players.iter().map(|p| p.name.clone()).collect();
                    let update = session.start_game(roster(&names), tier).await;
                    report(session, update);
                }
                Err(e) => println!("[ERROR] {e}"),
            }
        }
        other => println!("[ERROR] Unknown command: {other} (try 'help')"),
    }
    true
}

/// Accept an option number (1-4) as well as the option text.
fn resolve_answer(state: &GameState, input: &str) -> String {
    let by_number = input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| state.current_question.as_ref()?.option(i).map(str::to_string));
    by_number.unwrap_or_else(|| input.to_string())
}

fn report(session: &GameSession, update: Result<TurnUpdate, SessionError>) {
    match update {
        Ok(update) => print_update(session.state(), &update),
        Err(SessionError::Rejected(rejection)) => println!("[REJECTED] {rejection}"),
        Err(e) => println!("[ERROR] {e}"),
    }
}

fn print_update(state: &GameState, update: &TurnUpdate) {
    for notice in &update.notices {
        if let Some(line) = describe(state, notice) {
            println!("{line}");
        }
    }
}

fn player_name(state: &GameState, id: u32) -> String {
    state
        .player(id)
        .map(|p| format!("{} {}", p.token, p.name))
        .unwrap_or_else(|| format!("Player {id}"))
}

fn describe(state: &GameState, notice: &Notice) -> Option<String> {
    let line = match notice {
        Notice::NewGame {
            players,
            difficulty,
        } => format!(
            "[GAME] New {difficulty} game for {players} players, first to {} points wins",
            state.winning_score
        ),
        Notice::TurnStarted { player_id } => {
            format!("[TURN] {}'s turn. Type 'roll'", player_name(state, *player_id))
        }
        Notice::TurnSkipped { player_id } => {
            format!("[TURN] {} misses this turn", player_name(state, *player_id))
        }
        Notice::RollStarted { frames } => {
            let shown: Vec<String> = frames.iter().map(|f| f.to_string()).collect();
            format!("[ROLL] Rolling... {}", shown.join(" "))
        }
        Notice::DiceFallback { attempts } => {
            format!("[WARN] Dice misbehaved after {attempts} tries; counting a 1")
        }
        Notice::Rolled {
            player_id,
            face,
            position,
        } => {
            let space = if state.track().is_question(*position) {
                format!(", 'click {position}' for a question or 'event' for a card")
            } else {
                String::new()
            };
            format!(
                "[ROLL] {} rolled {face} and moved to space {position}{space}",
                player_name(state, *player_id)
            )
        }
        Notice::ExtraRoll { player_id } => {
            format!("[ROLL] {} rolls again!", player_name(state, *player_id))
        }
        Notice::QuestionPoolReset => "[QUESTION] All questions used; reshuffling".to_string(),
        Notice::QuestionDrawn { question } => {
            let mut text = format!("[QUESTION] {}", question.text);
            for (i, option) in question.options.iter().enumerate() {
                text.push_str(&format!("\n  {}. {option}", i + 1));
            }
            text
        }
        Notice::EventDrawn { event } => {
            format!("[EVENT] {} Type 'resolve'", event.description)
        }
        Notice::EventResolved { effect, .. } => format!("[EVENT] Applied: {effect}"),
        Notice::Feedback(feedback) => format!("[FEEDBACK] {feedback}"),
        Notice::TurnCompleted { .. } => return None,
        Notice::GameWon { player_id, score } => format!(
            "[WIN] {} wins with {score} points! Type 'new' to play again",
            player_name(state, *player_id)
        ),
    };
    Some(line)
}

fn print_status(state: &GameState) {
    let current = state.current_player().map(|p| p.id);
    println!(
        "[STATUS] {} track, {} spaces, first to {}",
        state.difficulty,
        state.track_length(),
        state.winning_score
    );
    for player in state.standings() {
        let marker = if Some(player.id) == current { "*" } else { " " };
        let skipping = if player.is_skipping_turn {
            " (skips next turn)"
        } else {
            ""
        };
        println!(
            "[STATUS] {marker} {} {}: {} points, space {}{skipping}",
            player.token, player.name, player.score, player.position
        );
    }
    if let Some(winner) = &state.winner {
        println!("[STATUS] Winner: {}", winner.name);
    }
}

fn print_board(session: &GameSession) {
    let state = session.state();
    let mut row = String::new();
    for space in session.track().spaces() {
        let occupants: String = state
            .players
            .iter()
            .filter(|p| p.position == space.id)
            .map(|p| p.token.as_str())
            .collect();
        let cell = match (occupants.is_empty(), space.points) {
            (false, _) => occupants,
            (true, Some(points)) => points.to_string(),
            (true, None) => "·".to_string(),
        };
        row.push_str(&format!("[{cell}]"));
    }
    println!("{row}");
    println!("Phase: {}", session.phase());
}

fn print_help() {
    println!("Commands:");
    println!("  roll          - Roll the dice");
    println!("  click <n>     - Open the question on space n (your own space)");
    println!("  answer <x>    - Answer by option number or text");
    println!("  event         - Draw an event card instead of a question");
    println!("  resolve       - Apply the drawn event card");
    println!("  dismiss       - Close the feedback and end the turn");
    println!("  status        - Show scores and positions");
    println!("  board         - Show the track");
    println!("  new [tier]    - Start a new game with the same players");
    println!("  quit          - Exit");
    println!();
}
