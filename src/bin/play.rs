use std::path::PathBuf;
use std::process;

use clap::Parser;
use quizcaro::cli::{TuiApp, render_board};
use quizcaro::game::{GameConfig, GameSession};
use quizcaro::questions::{BankConfig, QuestionBank};

#[derive(Debug, Parser, Clone)]
#[command(name = "quizcaro-play")]
#[command(about = "Play a capture-the-cell quiz match in the terminal")]
struct Args {
    /// Path to the question bank JSON
    #[arg(short = 'q', long)]
    questions: PathBuf,

    /// Number of teams (2-6)
    #[arg(long, default_value_t = 2)]
    players: usize,

    /// Cells in a row needed to win
    #[arg(long, default_value_t = 5)]
    win_length: usize,

    /// Board side length; derived from the bank size when omitted
    #[arg(long)]
    board_size: Option<usize>,

    /// Lay every pooled event on its own cell instead of drawing categories
    #[arg(long)]
    exhaustive: bool,

    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() {
    let args = Args::parse();

    let bank_config = BankConfig {
        seed: args.seed,
        ..BankConfig::default()
    };
    let bank = match QuestionBank::load(&args.questions, bank_config) {
        Ok(bank) => bank,
        Err(err) => {
            eprintln!("Error loading {}: {}", args.questions.display(), err);
            process::exit(1);
        }
    };

    let config = GameConfig {
        num_players: args.players,
        board_size: args.board_size.unwrap_or_else(|| bank.board_size()),
        win_length: args.win_length,
        event_cells: bank.event_cell_count(),
        exhaustive_events: args.exhaustive,
        seed: args.seed,
    };

    println!(
        "Starting a {size}x{size} match, {players} teams, {win} in a row to win",
        size = config.board_size,
        players = config.num_players,
        win = config.win_length
    );
    println!(
        "Questions loaded: {} main, {} spare",
        bank.remaining_used(),
        bank.remaining_spare()
    );
    println!("{}", "=".repeat(80));

    let session = GameSession::new(config, Box::new(bank));
    let mut app = TuiApp::new(session);
    if let Err(err) = app.run() {
        eprintln!("Terminal error: {err}");
        process::exit(1);
    }

    let session = app.session();
    println!("{}", "=".repeat(80));
    println!("FINAL STATS:");
    println!("{}", "=".repeat(80));
    match session.winner() {
        Some(symbol) => println!("Winner: {symbol}"),
        None if session.finished() => println!("Board full, no winner."),
        None => println!("Match left unfinished."),
    }
    for player in session.turns().players() {
        println!(
            "  {} ({}): {} cells",
            player.name, player.symbol, player.score
        );
    }
    println!("Rounds played: {}", session.turns().match_log().len());
    println!("\n{}", render_board(session.board()));
}
