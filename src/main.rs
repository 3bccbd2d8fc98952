use chain_keeper::chain::RecordView;
use chain_keeper::config::GameConfig;
use chain_keeper::game::{FixedTarget, Game, RandomTarget, TamperTarget};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "chain-keeper",
    version,
    about = "Repair a tampered hash-linked chain, one block at a time"
)]
struct Cli {
    /// JSON game config (payloads, tamper payload and marker, seed)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for choosing the tampered block
    #[arg(long)]
    seed: Option<u64>,

    /// Tamper this block instead of a random one
    #[arg(long)]
    tamper: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play interactively (default)
    Play {
        /// Pause before each repair, in milliseconds
        #[arg(long, default_value = "0")]
        delay_ms: u64,
    },
    /// Print the freshly tampered board
    Show {
        /// Emit record views as JSON
        #[arg(long)]
        json: bool,
    },
    /// Repair the board left to right and print each step
    Solve,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match setup(&cli) {
        Ok((game, target)) => match cli.command {
            None => cmd_play(game, target, 0),
            Some(Commands::Play { delay_ms }) => cmd_play(game, target, delay_ms),
            Some(Commands::Show { json }) => cmd_show(&game, json),
            Some(Commands::Solve) => cmd_solve(game),
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

type Target = Box<dyn TamperTarget>;

fn setup(cli: &Cli) -> Result<(Game, Target), Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    let mut target: Target = match cli.tamper {
        Some(index) => Box::new(FixedTarget(index)),
        None => Box::new(RandomTarget::from_seed(config.seed)),
    };
    let game = Game::new(config, target.as_mut())?;
    Ok((game, target))
}

fn cmd_play(
    mut game: Game,
    mut target: Target,
    delay_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    print_board(&game);
    print_help();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let mut words = line.split_whitespace();
        let (cmd, arg) = (words.next(), words.next());

        match (cmd, arg) {
            (None, _) => continue,
            (Some("quit" | "q" | "exit"), _) => break,
            (Some("show" | "s"), _) => print_board(&game),
            (Some("help" | "?"), _) => print_help(),
            (Some("hint" | "h"), _) => match game.hint() {
                Some(index) => println!("Block {} is the first broken link.", index),
                None => println!("Nothing to fix."),
            },
            (Some("reset"), _) => {
                game.reset(target.as_mut())?;
                print_board(&game);
            }
            (Some("repair" | "r"), Some(n)) | (Some(n), None) => {
                let Some(index) = parse_index(n, game.len()) else {
                    println!("Enter a block number between 1 and {}.", game.len());
                    continue;
                };
                if delay_ms > 0 {
                    println!("Fixing Block {}...", index);
                    thread::sleep(Duration::from_millis(delay_ms));
                }
                match game.repair(index) {
                    Ok(solved) => {
                        println!("Block {} repaired!", index);
                        print_board(&game);
                        if solved {
                            println!("Chain integrity restored!");
                            break;
                        }
                    }
                    Err(e) => eprintln!("error: {}", e),
                }
            }
            _ => println!("Unknown command: {}", line.trim()),
        }
    }
    Ok(())
}

fn cmd_show(game: &Game, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(&game.views())?);
    } else {
        print_board(game);
    }
    Ok(())
}

fn cmd_solve(mut game: Game) -> Result<(), Box<dyn std::error::Error>> {
    print_board(&game);
    while let Some(index) = game.hint() {
        game.repair(index)?;
        println!("Repaired block {}  {}", index, game.progress());
    }
    println!("Chain integrity restored!");
    Ok(())
}

/// Accepts 1..=len only; the core never sees anything else from here.
fn parse_index(s: &str, len: usize) -> Option<usize> {
    s.parse::<usize>()
        .ok()
        .filter(|index| (1..=len).contains(index))
}

fn print_board(game: &Game) {
    for view in game.views() {
        print_record(&view);
    }
    println!("{}", game.progress());
}

fn print_record(view: &RecordView) {
    let status = if view.valid { "valid" } else { "TAMPERED" };
    println!("Block {} [{}]", view.index, status);
    println!("  Data: {}", view.payload);
    if view.stored_hash == view.computed_hash {
        println!("  Hash: {}", view.stored_hash);
    } else {
        println!(
            "  Hash: {} (recomputed {})",
            view.stored_hash, view.computed_hash
        );
    }
    println!("  Prev: {}", view.predecessor_hash);
}

fn print_help() {
    println!("Commands: repair N | N | show | hint | reset | quit");
}
