use std::time::Instant;

use clap::Parser;
use quizcaro::board::{Board, Cell, Position};
use quizcaro::cli::GameStats;
use quizcaro::game::{GameConfig, GameSession, Phase, SEAT_SYMBOLS};
use quizcaro::questions::{Question, QuestionSource};
use quizcaro::types::Symbol;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Hard stop for runaway games.
const STEP_LIMIT: u32 = 5000;

#[derive(Debug, Parser, Clone)]
#[command(name = "quizcaro-sim")]
#[command(about = "Simulate quiz matches between teams with fixed answer accuracies")]
struct Args {
    /// Number of games to play
    #[arg(short = 'n', long, default_value_t = 20)]
    num: u32,

    /// Comma-separated answer accuracy per team (e.g. 0.8,0.6); one team per entry
    #[arg(long, default_value = "0.7,0.7")]
    accuracy: String,

    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Board side length
    #[arg(long, default_value_t = 10)]
    board_size: usize,

    /// Cells in a row needed to win
    #[arg(long, default_value_t = 5)]
    win_length: usize,

    /// Number of event cells scattered on the board
    #[arg(long, default_value_t = 20)]
    event_cells: usize,

    /// Lay every pooled event on its own cell
    #[arg(long)]
    exhaustive: bool,

    /// Silence console output
    #[arg(long)]
    quiet: bool,
}

/// Never-ending synthetic source. The driver only needs ids and a correct
/// index, the text is filler.
struct EndlessSource {
    rng: StdRng,
    counter: u32,
}

impl EndlessSource {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            counter: 0,
        }
    }
}

impl QuestionSource for EndlessSource {
    fn next_question(&mut self) -> Option<Question> {
        self.counter += 1;
        Some(Question {
            id: self.counter,
            prompt: format!("Filler question #{}", self.counter),
            options: (1..=4).map(|n| format!("Option {n}")).collect(),
            correct_index: self.rng.gen_range(0..4),
        })
    }

    fn is_exhausted(&self) -> bool {
        false
    }
}

fn main() {
    let args = Args::parse();

    let accuracy = match parse_accuracies(&args.accuracy) {
        Ok(list) => list,
        Err(msg) => {
            eprintln!("Error: {msg}");
            std::process::exit(1);
        }
    };
    if !(2..=SEAT_SYMBOLS.len()).contains(&accuracy.len()) {
        eprintln!(
            "Error: need between 2 and {} accuracies, got {}",
            SEAT_SYMBOLS.len(),
            accuracy.len()
        );
        std::process::exit(1);
    }

    let mut stats = GameStats::new();
    let mut driver_rng = StdRng::seed_from_u64(args.seed);

    for game_idx in 0..args.num {
        let config = GameConfig {
            num_players: accuracy.len(),
            board_size: args.board_size,
            win_length: args.win_length,
            event_cells: args.event_cells,
            exhaustive_events: args.exhaustive,
            seed: args.seed + game_idx as u64,
        };

        let source = EndlessSource::new(args.seed + game_idx as u64);
        let mut session = GameSession::new(config, Box::new(source));

        let start = Instant::now();
        let steps = drive_game(&mut session, &accuracy, &mut driver_rng);
        let duration = start.elapsed();

        stats.record_game(&session, duration);

        if !args.quiet {
            let last_n = 10;
            if game_idx < last_n || game_idx >= args.num.saturating_sub(last_n) {
                let winner_str = session
                    .winner()
                    .map(|symbol| symbol.to_string())
                    .unwrap_or_else(|| "None".to_string());
                println!(
                    "Game {:>4}: Winner={:>4}, Rounds={:>4}, Steps={:>5}, Duration={:?}",
                    game_idx + 1,
                    winner_str,
                    session.turns().match_log().len(),
                    steps,
                    duration
                );
            } else if (game_idx + 1) % 100 == 0 {
                print!(".");
                use std::io::Write;
                std::io::stdout().flush().unwrap();
            }
        }
    }

    if !args.quiet {
        print_summary(&stats, &accuracy);
    }
}

fn parse_accuracies(raw: &str) -> Result<Vec<f64>, String> {
    raw.split(',')
        .map(|part| {
            let p: f64 = part
                .trim()
                .parse()
                .map_err(|_| format!("'{part}' is not a number"))?;
            if (0.0..=1.0).contains(&p) {
                Ok(p)
            } else {
                Err(format!("accuracy {p} is outside 0..=1"))
            }
        })
        .collect()
}

/// Phase-driven random walk: activate a random free cell, confirm intros,
/// pick random targets, answer with the seat's configured accuracy.
fn drive_game(session: &mut GameSession, accuracy: &[f64], rng: &mut StdRng) -> u32 {
    let mut steps = 0;
    while !session.finished() && steps < STEP_LIMIT {
        steps += 1;
        let result = match session.phase() {
            Phase::AwaitingActivation => {
                let Some(pos) = random_free_cell(session.board(), rng) else {
                    break;
                };
                session.activate(pos)
            }
            Phase::EventIntro | Phase::ConfirmTarget => session.confirm(),
            Phase::TargetSelection => {
                let pick = session.candidates().choose(rng).copied();
                match pick {
                    Some(pos) => session.select_target(pos),
                    None => session.cancel(),
                }
            }
            Phase::QuestionOpen => {
                let answering = session.pending_question().map(|pending| pending.symbol);
                let seat = answering
                    .and_then(|symbol| {
                        session
                            .turns()
                            .players()
                            .iter()
                            .position(|player| player.symbol == symbol)
                    })
                    .unwrap_or(0);
                let was_correct = rng.gen_bool(accuracy[seat.min(accuracy.len() - 1)]);
                session.submit_answer(was_correct)
            }
            Phase::Finished { .. } => break,
        };
        if result.is_err() {
            break;
        }
    }
    steps
}

fn random_free_cell(board: &Board, rng: &mut StdRng) -> Option<Position> {
    let free: Vec<Position> = board
        .positions()
        .filter(|pos| board.cell(*pos).is_some_and(Cell::is_free))
        .collect();
    free.choose(rng).copied()
}

fn print_summary(stats: &GameStats, accuracy: &[f64]) {
    println!("\n{}", "=".repeat(80));
    println!("SIMULATION SUMMARY");
    println!("{}", "=".repeat(80));

    println!("\nTeam Summary:");
    println!(
        "{:<15} {:<10} {:<12} {:<12}",
        "Team", "Wins", "Win Rate", "Avg Cells"
    );
    println!("{}", "-".repeat(50));

    for (idx, acc) in accuracy.iter().enumerate() {
        let symbol = Symbol::new(SEAT_SYMBOLS[idx]);
        let wins = stats.wins.get(&symbol).copied().unwrap_or(0);
        let win_rate = if stats.games > 0 {
            (wins as f64 / stats.games as f64) * 100.0
        } else {
            0.0
        };

        println!(
            "{:<15} {:<10} {:<11.1}% {:<12.2}",
            format!("{symbol} (p={acc})"),
            wins,
            win_rate,
            stats.get_avg_cells(symbol)
        );
    }

    println!("\nGame Summary:");
    println!("  Total Games: {}", stats.games);
    println!("  Draws: {}", stats.draws);
    println!("  Avg Rounds: {:.2}", stats.get_avg_rounds());
    println!("  Avg Events: {:.2}", stats.get_avg_events());
    println!("  Avg Duration: {:.2?}", stats.get_avg_duration());
}
