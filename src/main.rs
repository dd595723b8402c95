use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::Print,
    terminal::{
        disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use itertools::Itertools;
use lockbuster::{
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{self, CrosstermEventSource, FixedTicker, Flow, Runner},
    Category, Difficulty, EngineSettings, Finalized, GesturePicker, Mode, Phase, RecordsDb,
    ScoreStore, SessionEngine, SystemClock,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin, Write},
    path::PathBuf,
};

/// gesture lock-breaking game: race, beat the countdown, or outlast the chess clock
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "Break locks by completing gesture challenges. Speedrun to a target score, score as many as possible before the countdown ends, or keep the chess clock alive as rounds grow longer."
)]
pub struct Cli {
    /// path to the best-records database
    #[clap(long, global = true)]
    db: Option<PathBuf>,

    /// path to the config file
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// play a session in the terminal (space/enter completes the shown gesture, esc quits)
    Play {
        #[clap(subcommand)]
        mode: PlayMode,

        /// fixed RNG seed for a reproducible session
        #[clap(long, global = true)]
        seed: Option<u64>,
    },
    /// list stored best records
    Best,
    /// delete all stored best records
    Clear,
    /// write best records as csv
    Export {
        /// output file (stdout when omitted)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum PlayMode {
    /// break a fixed number of locks as fast as possible
    Speedrun {
        #[clap(short, long, default_value_t = 100)]
        target: u32,
    },
    /// break as many locks as possible before time runs out
    Countdown {
        #[clap(short, long, default_value_t = 60)]
        seconds: u32,
    },
    /// finish each round's sequence to earn time back
    ChessClock {
        #[clap(short, long, value_enum, default_value_t = Difficulty::Standard)]
        difficulty: Difficulty,
    },
}

impl PlayMode {
    fn selection(&self) -> (Mode, Category) {
        match *self {
            PlayMode::Speedrun { target } => (Mode::Speedrun, Category::TargetScore(target)),
            PlayMode::Countdown { seconds } => (Mode::Countdown, Category::TimeLimit(seconds)),
            PlayMode::ChessClock { difficulty } => {
                (Mode::ChessClock, Category::Difficulty(difficulty))
            }
        }
    }
}

impl Cli {
    fn open_db(&self) -> Result<RecordsDb, Box<dyn Error>> {
        let db = match &self.db {
            Some(path) => RecordsDb::open(path)?,
            None => RecordsDb::open_default()?,
        };
        Ok(db)
    }

    fn load_config(&self) -> Config {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path).load(),
            None => FileConfigStore::new().load(),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Play { mode, seed } => play(&cli, *mode, *seed),
        Commands::Best => list_best(&cli),
        Commands::Clear => {
            let removed = cli.open_db()?.clear()?;
            println!("removed {} best record(s)", removed);
            Ok(())
        }
        Commands::Export { output } => {
            let db = cli.open_db()?;
            let written = match output {
                Some(path) => db.export_csv(File::create(path)?)?,
                None => db.export_csv(io::stdout().lock())?,
            };
            log::info!("exported {} record(s)", written);
            Ok(())
        }
    }
}

fn play(cli: &Cli, mode: PlayMode, seed: Option<u64>) -> Result<(), Box<dyn Error>> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let cfg = cli.load_config();
    let picker = match seed.or(cfg.seed) {
        Some(seed) => GesturePicker::seeded(seed),
        None => GesturePicker::from_entropy(),
    }
    .with_catalog_size(cfg.catalog_size);

    let mut engine = SessionEngine::new(
        cli.open_db()?,
        SystemClock::new(),
        picker,
        EngineSettings::from(&cfg),
    );
    let (mode, category) = mode.selection();
    engine.start(mode, category)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;

    let outcome = run_session(&mut engine, cfg.tick_rate_ms);

    execute!(stdout, Show, LeaveAlternateScreen)?;
    disable_raw_mode()?;

    if outcome? {
        print_summary(&engine.finalize()?);
    } else {
        println!("Session abandoned.");
    }
    Ok(())
}

/// Drive the engine until the session ends (true) or the player quits (false)
fn run_session<S: ScoreStore>(
    engine: &mut SessionEngine<S, SystemClock>,
    tick_rate_ms: u64,
) -> Result<bool, Box<dyn Error>> {
    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::from_millis(tick_rate_ms),
        SystemClock::new(),
    );
    let mut stdout = io::stdout();

    draw(&mut stdout, engine)?;
    loop {
        let frame = runner.step();
        match runtime::apply(engine, &frame)? {
            Flow::Finished => return Ok(true),
            Flow::Quit => return Ok(false),
            Flow::Continue => draw(&mut stdout, engine)?,
        }
    }
}

fn draw<S: ScoreStore, W: Write>(
    out: &mut W,
    engine: &SessionEngine<S, SystemClock>,
) -> io::Result<()> {
    let (Some(mode), Some(category)) = (engine.mode(), engine.category()) else {
        return Ok(());
    };

    let progress = match mode {
        Mode::ChessClock => format!("Round: {}", engine.round_number()),
        _ => format!("Score: {}", engine.score()),
    };

    let challenge = if engine.phase() == Phase::Transitioning {
        String::from("...")
    } else if mode == Mode::ChessClock {
        engine
            .challenges()
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if i == engine.position() {
                    format!("[{}]", c)
                } else {
                    c.to_string()
                }
            })
            .join(" > ")
    } else {
        engine
            .current_challenge()
            .map(|c| c.to_string())
            .unwrap_or_default()
    };

    let clock = match engine.remaining_time() {
        Some(remaining) if engine.is_frozen() => {
            format!("{:.2} seconds remaining (frozen)", remaining)
        }
        Some(remaining) => format!("{:.2} seconds remaining", remaining),
        None => format!("{:.2} seconds elapsed", engine.elapsed().unwrap_or_default()),
    };

    let art = engine
        .lock_art()
        .map(|a| a.frame_name(1))
        .unwrap_or_default();

    let lines = [
        format!("Lockbuster: {} ({})", mode, category),
        String::new(),
        challenge,
        format!("lock {}  tier {}", art, engine.tier()),
        String::new(),
        progress,
        clock,
        String::new(),
        String::from("space/enter: complete gesture   esc: quit"),
    ];

    queue!(out, Clear(ClearType::All))?;
    for (row, line) in lines.iter().enumerate() {
        queue!(out, MoveTo(0, row as u16), Print(line))?;
    }
    out.flush()
}

fn print_summary(done: &Finalized) {
    let summary = &done.summary;
    println!("Finished!");

    match summary.mode {
        Mode::Speedrun => {
            println!("Time: {:.3}s", summary.final_metric);
            match (summary.is_new_best, summary.improvement(), summary.previous_best) {
                (true, Some(by), _) => println!("New best time! (Improved by {:.3}s)", by),
                (true, None, _) => println!("New best time!"),
                (false, _, Some(best)) => println!("Best time: {:.3}s", best),
                (false, _, None) => {}
            }
        }
        Mode::Countdown | Mode::ChessClock => {
            let label = if summary.mode == Mode::ChessClock {
                "Round"
            } else {
                "Score"
            };
            println!("{}: {}", label, summary.final_metric);
            match (summary.is_new_best, summary.improvement(), summary.previous_best) {
                (true, Some(by), _) => println!("New highscore! Improved by {}", by),
                (true, None, _) => println!("New highscore!"),
                (false, _, Some(best)) => println!("Highscore: {}", best),
                (false, _, None) => {}
            }
        }
    }

    if let Some(err) = &done.store_error {
        eprintln!("warning: best record not saved: {}", err);
    }
}

fn list_best(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let records = cli.open_db()?.all_records()?;
    if records.is_empty() {
        println!("no best records yet");
        return Ok(());
    }

    for record in records {
        let value = if record.key.starts_with("speedrun:") {
            format!("{:.3}s", record.value)
        } else {
            format!("{}", record.value)
        };
        println!(
            "{:<20} {:>10}  {}",
            record.key,
            value,
            record.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}
