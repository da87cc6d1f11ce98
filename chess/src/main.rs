use anyhow::{bail, Context, Result};
use chess9::{EngineConfig, Worker};
use chess9_agents::{
    evaluate_absolute, search_with_callback, Agent, Difficulty, Evaluatable, MinimaxAgent,
    OpeningBook, SearchLimits, SearchProgress,
};
use chess9_core::notation::parse_move;
use chess9_core::{
    find_legal_move, game_status, move_notation, perft_detailed, perft_divide, BoardShape, Color,
    GameState, GameStatus, Square, BOARD_SIZE,
};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chess9", about = "9x9 chess variant engine")]
struct Cli {
    /// JSON engine config; command-line flags take precedence
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `chess9_agents=trace` (defaults to RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer JSON requests on stdin, one per line
    Serve {
        #[arg(long)]
        shape: Option<BoardShape>,
        /// Opening book loaded before the first request
        #[arg(long)]
        book: Option<PathBuf>,
    },
    /// Count move-tree leaves
    Perft {
        depth: u8,
        /// Position in layout notation
        #[arg(long)]
        layout: Option<String>,
        #[arg(long)]
        shape: Option<BoardShape>,
    },
    /// Print the static evaluation
    Eval {
        #[arg(long)]
        layout: Option<String>,
        #[arg(long)]
        shape: Option<BoardShape>,
    },
    /// Search a position and print the best move
    Search {
        #[arg(long)]
        layout: Option<String>,
        #[arg(long)]
        shape: Option<BoardShape>,
        #[arg(long)]
        depth: Option<u8>,
        /// Time limit in milliseconds
        #[arg(long)]
        movetime: Option<u64>,
    },
    /// Play against the engine
    Play {
        #[arg(long)]
        shape: Option<BoardShape>,
        #[arg(long)]
        depth: Option<u8>,
        #[arg(long)]
        difficulty: Option<Difficulty>,
        /// Side you play
        #[arg(long, default_value = "white")]
        color: String,
        #[arg(long)]
        book: Option<PathBuf>,
    },
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    // stdout carries protocol traffic, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_position(layout: Option<&str>, shape: BoardShape) -> Result<GameState> {
    match layout {
        Some(layout) => GameState::from_layout(layout).with_context(|| format!("bad layout '{layout}'")),
        None => Ok(GameState::with_shape(shape)),
    }
}

fn display_board(state: &GameState) {
    let files: String = (0..BOARD_SIZE).map(|c| format!("{} ", (b'a' + c) as char)).collect();
    println!("\n  {files}");
    for row in 0..BOARD_SIZE {
        let rank = BOARD_SIZE - row;
        print!("{rank} ");
        for col in 0..BOARD_SIZE {
            let Some(square) = Square::new(row, col) else {
                continue;
            };
            let symbol = if state.board.is_blocked(square) {
                '#'
            } else {
                state.board.piece_at(square).map_or('.', |p| p.to_char())
            };
            print!("{symbol} ");
        }
        println!("| {rank}");
    }
    println!("  {files}\n");
    println!("{} to move, move {}", state.turn, state.fullmove_number);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Serve { shape, book } => {
            if let Some(shape) = shape {
                config.shape = shape;
            }
            let book = match book {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    Some(serde_json::from_str::<Value>(&text).context("opening book is not JSON")?)
                }
                None => None,
            };
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(serve(config, book))
        }
        Command::Perft { depth, layout, shape } => {
            let state = load_position(layout.as_deref(), shape.unwrap_or(config.shape))?;
            println!("Position: {}", state.to_layout());

            let start = Instant::now();
            if depth <= 3 {
                let mut total = 0;
                for (mv, count) in perft_divide(&state, depth) {
                    println!("{}: {}", move_notation(&mv), count);
                    total += count;
                }
                println!("\nTotal: {total}");
            } else {
                let results = perft_detailed(&state, depth);
                println!("Nodes: {}", results.nodes);
                println!("Captures: {}", results.captures);
                println!("En passant: {}", results.en_passants);
                println!("Castles: {}", results.castles);
                println!("Promotions: {}", results.promotions);
                println!("Checks: {}", results.checks);
                println!("Checkmates: {}", results.checkmates);
            }
            println!("Time: {:.2}s", start.elapsed().as_secs_f64());
            Ok(())
        }
        Command::Eval { layout, shape } => {
            let state = load_position(layout.as_deref(), shape.unwrap_or(config.shape))?;
            display_board(&state);
            println!("Evaluation: {} cp (side to move)", state.evaluate());
            println!("Absolute eval: {} cp (+ = White, - = Black)", evaluate_absolute(&state));
            Ok(())
        }
        Command::Search {
            layout,
            shape,
            depth,
            movetime,
        } => {
            let state = load_position(layout.as_deref(), shape.unwrap_or(config.shape))?;
            let mut limits = SearchLimits::depth(depth.unwrap_or(config.depth));
            if let Some(millis) = movetime.or(config.time_limit_ms) {
                limits = limits.with_move_time(millis);
            }

            let start = Instant::now();
            let result = search_with_callback(
                &state,
                limits,
                config.tt_size_mb,
                Box::new(|progress: &SearchProgress| {
                    let pv: Vec<String> = progress.pv.iter().map(move_notation).collect();
                    println!(
                        "depth {} score {} nodes {} time {}ms pv {}",
                        progress.depth,
                        progress.score,
                        progress.nodes,
                        progress.time_ms,
                        pv.join(" ")
                    );
                }),
            );
            let elapsed = start.elapsed();

            match result.best_move {
                Some(best_move) => {
                    println!("\nBest move: {}", move_notation(&best_move));
                    println!("Score: {} cp", result.score);
                    println!("Depth: {}", result.depth);
                    println!("Nodes: {}", result.nodes);
                    println!("Time: {:.2}s", elapsed.as_secs_f64());
                    if result.stopped {
                        println!("(search stopped by its limit)");
                    }
                }
                None => println!("No legal moves available"),
            }
            Ok(())
        }
        Command::Play {
            shape,
            depth,
            difficulty,
            color,
            book,
        } => {
            let human = match color.as_str() {
                "white" => Color::White,
                "black" => Color::Black,
                other => bail!("unknown color '{other}'"),
            };
            let agent = match (depth, config.time_limit_ms) {
                (None, Some(millis)) => MinimaxAgent::with_time_limit(millis),
                _ => MinimaxAgent::new(depth.unwrap_or(config.depth)),
            };
            let mut agent = agent
                .difficulty(difficulty.unwrap_or(config.difficulty))
                .tt_size_mb(config.tt_size_mb);
            if let Some(path) = book {
                agent = agent.book(OpeningBook::load(&path)?.with_move_limit(config.book_move_limit));
            }
            let state = GameState::with_shape(shape.unwrap_or(config.shape)).with_promotion(config.promotion);
            play_interactive(state, human, &mut agent)
        }
    }
}

async fn serve(config: EngineConfig, book: Option<Value>) -> Result<()> {
    let (sender, mut responses) = Worker::spawn(config);
    if let Some(book) = book {
        sender.post(serde_json::json!({"type": "loadBook", "data": {"book": book}}))?;
    }

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(response) = responses.recv().await {
            match response.to_json() {
                Ok(line) => {
                    stdout.write_all(line.as_bytes()).await?;
                    stdout.write_all(b"\n").await?;
                    stdout.flush().await?;
                }
                Err(err) => warn!(%err, "failed to encode response"),
            }
        }
        Ok::<_, io::Error>(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(&line) {
            Ok(message) => sender.post(message)?,
            Err(err) => warn!(%err, "ignoring line that is not JSON"),
        }
    }

    // Closing the inbox lets in-flight searches finish before the writer stops.
    drop(sender);
    writer.await??;
    Ok(())
}

fn play_interactive(mut state: GameState, human: Color, agent: &mut MinimaxAgent) -> Result<()> {
    let mut history = vec![state.clone()];
    let stdin = io::stdin();

    println!("9x9 chess - you play {human}");
    println!("Enter moves like e2-e4 (add =C to pick a promotion piece)");
    println!("Commands: quit, undo, new, help");

    loop {
        display_board(&state);

        match game_status(&state) {
            GameStatus::Checkmate => {
                println!("Checkmate! {} wins!", state.turn.opponent());
                return Ok(());
            }
            GameStatus::Stalemate => {
                println!("Stalemate!");
                return Ok(());
            }
            GameStatus::Ongoing if state.is_fifty_move_draw() || state.is_insufficient_material() => {
                println!("Draw!");
                return Ok(());
            }
            GameStatus::Ongoing => {}
        }
        if state.is_in_check() {
            println!("Check!");
        }

        if state.turn != human {
            println!("Engine thinking...");
            let Some(mv) = agent.best_move(&state) else {
                bail!("engine found no move in an ongoing game");
            };
            println!("Engine plays: {}", move_notation(&mv));
            state = state.apply_move(mv);
            history.push(state.clone());
            continue;
        }

        print!("Your move: ");
        io::stdout().flush()?;
        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            return Ok(());
        }

        match input.trim() {
            "quit" => return Ok(()),
            "help" => println!("Enter moves like e2-e4 or e8-e9=A; commands: quit, undo, new, help"),
            "new" => {
                history.truncate(1);
                state = history[0].clone();
            }
            "undo" => {
                // Back to the previous position with the human to move.
                if history.len() > 2 {
                    history.truncate(history.len() - 2);
                    if let Some(previous) = history.last() {
                        state = previous.clone();
                    }
                } else {
                    println!("Nothing to undo");
                }
            }
            text => match parse_move(text) {
                Ok((from, to, promotion)) => match find_legal_move(&state, from, to, promotion) {
                    Some(mv) => {
                        state = state.apply_move(mv);
                        history.push(state.clone());
                    }
                    None => println!("Illegal move."),
                },
                Err(err) => println!("{err}"),
            },
        }
    }
}
