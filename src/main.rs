//! textplayer - play a Z-machine game through a dumb-terminal interpreter
//!
//! Starts the interpreter as a subprocess, gets past the opening banner and
//! hands the game to you line by line with the status-line noise removed.
//!
//! # Quick Start
//!
//! ```text
//! textplayer                      # Play the default game (zork1.z5)
//! textplayer lost.z5              # Play games/lost.z5
//! textplayer -s walkthrough.txt   # Run a command script and exit
//! textplayer -l                   # List installed games
//! ```
//!
//! # In-game commands
//!
//! | Input | Action |
//! |-------|--------|
//! | :score | Show the current score |
//! | :quit | Leave the game |
//! | anything else | Sent to the game as-is |

mod ui;

use std::env;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use textplayer::config::Config as PlayerConfig;
use textplayer::games;
use textplayer::transcript::{self, Transcript};
use textplayer::{GameSession, Turn};

use crate::ui::Printer;

/// Command line options
#[derive(Debug, Default, PartialEq)]
struct Options {
    /// Game name or path
    game: Option<String>,
    interpreter: Option<PathBuf>,
    games_dir: Option<PathBuf>,
    /// Command file to run instead of reading stdin
    script: Option<PathBuf>,
    /// Transcript whose commands are replayed
    replay: Option<PathBuf>,
    /// List games and exit
    list: bool,
    no_transcript: bool,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    eprintln!("textplayer {}", VERSION);
}

fn print_help() {
    eprintln!("textplayer {} - play Z-machine games through an interpreter", VERSION);
    eprintln!();
    eprintln!("Usage: textplayer [OPTIONS] [GAME]");
    eprintln!();
    eprintln!("GAME is a file name in the games directory or a path to a story file.");
    eprintln!("Without GAME the default_game from config.toml is played.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -i, --interpreter <PATH>  Interpreter binary (default ./frotz/dfrotz)");
    eprintln!("  -d, --games-dir <DIR>     Games directory (default games)");
    eprintln!("  -s, --script <FILE>       Run commands from FILE, one per line, then exit");
    eprintln!("  -r, --replay <LOG>        Replay the commands of a transcript, then exit");
    eprintln!("  -l, --list                List installed games");
    eprintln!("      --no-transcript       Do not write <game>_log.txt");
    eprintln!("  -v, --version             Show version");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("In-game commands:");
    eprintln!("  :score                    Show the current score");
    eprintln!("  :quit                     Leave the game");
    eprintln!();
    eprintln!("Configuration: ~/.textplayer/config.toml");
    eprintln!("Log file:      ~/.textplayer/textplayer.log (level from RUST_LOG)");
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options::default();
    let mut i = 1;

    // Fetch the value following a flag
    fn value(args: &[String], i: &mut usize, flag: &str) -> Result<String, String> {
        *i += 1;
        args.get(*i)
            .cloned()
            .ok_or_else(|| format!("Missing argument for {}", flag))
    }

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-i" | "--interpreter" => {
                options.interpreter = Some(PathBuf::from(value(args, &mut i, "--interpreter")?));
            }
            "-d" | "--games-dir" => {
                options.games_dir = Some(PathBuf::from(value(args, &mut i, "--games-dir")?));
            }
            "-s" | "--script" => {
                options.script = Some(PathBuf::from(value(args, &mut i, "--script")?));
            }
            "-r" | "--replay" => {
                options.replay = Some(PathBuf::from(value(args, &mut i, "--replay")?));
            }
            "-l" | "--list" => {
                options.list = true;
            }
            "--no-transcript" => {
                options.no_transcript = true;
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
            game => {
                if options.game.is_some() {
                    return Err(format!("Unexpected argument: {}", game));
                }
                options.game = Some(game.to_string());
            }
        }
        i += 1;
    }

    if options.script.is_some() && options.replay.is_some() {
        return Err("--script and --replay cannot be combined".to_string());
    }

    Ok(options)
}

/// Log to ~/.textplayer/textplayer.log; stdout belongs to the game
fn init_logging() {
    let log_path = PlayerConfig::data_dir()
        .map(|dir| dir.join("textplayer.log"))
        .unwrap_or_else(|| PathBuf::from("textplayer.log"));

    if let Some(parent) = log_path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("textplayer {} starting...", VERSION);

    // Command line overrides config file
    let mut config = PlayerConfig::load();
    if let Some(interpreter) = options.interpreter.clone() {
        config.interpreter = interpreter;
    }
    if let Some(games_dir) = options.games_dir.clone() {
        config.games_dir = games_dir;
    }
    if options.no_transcript {
        config.transcript = false;
    }

    if options.list {
        return list_games(&config.games_dir);
    }

    let game_name = options.game.clone().unwrap_or_else(|| config.default_game.clone());
    let game_path = games::resolve_game(&config.games_dir, &game_name);
    info!("Interpreter: {}", config.interpreter.display());
    info!("Game: {}", game_path.display());

    let session = GameSession::open(&game_path, config.session_options())
        .with_context(|| format!("Cannot load {}", game_path.display()))?;

    let result = play(&session, &options);
    session.quit();

    if let Err(e) = result {
        error!("Session ended with error: {:#}", e);
        let _ = Printer::stdout().error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

fn list_games(games_dir: &Path) -> anyhow::Result<()> {
    let games = games::list_games(games_dir)
        .with_context(|| format!("Cannot read games directory {}", games_dir.display()))?;

    let mut printer = Printer::stdout();
    if games.is_empty() {
        printer.notice(&format!("No games found in {}", games_dir.display()))?;
    }
    for game in games {
        println!("{}", game);
    }
    Ok(())
}

fn play(session: &GameSession, options: &Options) -> anyhow::Result<()> {
    let mut printer = Printer::stdout();
    let mut log = open_transcript(session);

    printer.notice("Starting game...")?;
    let opening = session.run().context("Interpreter failed to start")?;
    printer.narrative(&opening)?;
    if let Some(log) = log.as_mut() {
        if let Err(e) = log.record_opening(&opening) {
            warn!("Failed to write transcript: {}", e);
        }
    }

    if let Some(script) = &options.script {
        let turns = session
            .execute_command_file(script)
            .with_context(|| format!("Cannot run script {}", script.display()))?;
        return show_turns(&mut printer, log.as_mut(), &turns);
    }

    if let Some(replay) = &options.replay {
        let commands = transcript::recorded_commands(replay)
            .with_context(|| format!("Cannot read transcript {}", replay.display()))?;
        let mut turns = Vec::with_capacity(commands.len());
        for command in commands {
            if !session.is_running() {
                break;
            }
            let response = session.execute_command(&command)?;
            turns.push(Turn { command, response });
        }
        return show_turns(&mut printer, log.as_mut(), &turns);
    }

    interactive(session, &mut printer, log.as_mut())
}

fn interactive(
    session: &GameSession,
    printer: &mut Printer<io::Stdout>,
    mut log: Option<&mut Transcript>,
) -> anyhow::Result<()> {
    printer.notice("Type :score for the score, :quit to leave.")?;

    let stdin = io::stdin();
    let mut line = String::new();
    let mut steps = 0;

    loop {
        printer.prompt()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            break;
        }
        let command = line.trim_end_matches(['\r', '\n']);

        match command.trim() {
            ":quit" => break,
            ":score" => match session.get_score()? {
                Some(score) => printer.notice(&format!("Score: {}", score))?,
                None => printer.notice("This game reports no score.")?,
            },
            _ => {
                let response = session.execute_command(command)?;
                steps += 1;
                printer.narrative(&response)?;
                record(log.as_deref_mut(), &Turn {
                    command: command.to_string(),
                    response,
                });
            }
        }

        if !session.is_running() {
            printer.notice("The game has ended.")?;
            break;
        }
    }

    info!("Played {} turns", steps);
    Ok(())
}

fn show_turns(
    printer: &mut Printer<io::Stdout>,
    mut log: Option<&mut Transcript>,
    turns: &[Turn],
) -> anyhow::Result<()> {
    for (step, turn) in turns.iter().enumerate() {
        printer.command(step, &turn.command)?;
        printer.narrative(&turn.response)?;
        record(log.as_deref_mut(), turn);
    }
    Ok(())
}

fn open_transcript(session: &GameSession) -> Option<Transcript> {
    let path = session.log_path()?;
    match Transcript::open(&path) {
        Ok(log) => {
            info!("Transcript: {}", log.path().display());
            Some(log)
        }
        Err(e) => {
            warn!("Cannot open transcript {}: {}", path.display(), e);
            None
        }
    }
}

fn record(log: Option<&mut Transcript>, turn: &Turn) {
    if let Some(log) = log {
        if let Err(e) = log.record_turn(turn) {
            warn!("Failed to write transcript: {}", e);
        }
    }
}
