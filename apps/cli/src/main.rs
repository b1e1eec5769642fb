mod render;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use parla_audio::{CpalBackend, StreamConfig};
use parla_domain::{decode_items, Accent, AssessmentDecoder, JsonAssessmentDecoder, ProgressStore};
use parla_services::{Endpoint, HttpAssessmentService, HttpProgressStore, InMemoryProgressStore};
use parla_tutor::{
    ExerciseAction, ExerciseEvent, ExerciseKind, PracticeConfig, PracticeSession, PronunciationFlow,
    ResultInterpreter, SessionStatus,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::render::{
    describe_event, help, parse_command, render_exercise, render_result, render_summary, Command,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Practice vocabulary from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run an interactive practice session over a vocabulary file
    Practice {
        /// JSON vocabulary set: an array of items or {"items": [...]}
        #[arg(long)]
        items: PathBuf,
        /// flashcard, multiple-choice, listening, typing or unscramble
        #[arg(long, default_value = "multiple-choice")]
        kind: ExerciseKind,
        /// YAML or JSON practice configuration
        #[arg(long)]
        config: Option<PathBuf>,
        /// Seed for reproducible shuffles
        #[arg(long)]
        seed: Option<u64>,
        /// Report progress to this HTTP endpoint instead of keeping it in memory
        #[arg(long)]
        progress_url: Option<String>,
        /// Vocabulary set id used for progress snapshots
        #[arg(long, default_value = "local")]
        set_id: String,
    },
    /// Render a pronunciation assessment response
    InspectResult {
        /// JSON body returned by the scoring service
        path: PathBuf,
        /// Word the recording was scored against
        #[arg(long, default_value = "?")]
        word: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Record a word from the default microphone and have it scored
    Pronounce {
        word: String,
        /// Base URL of the assessment service
        #[arg(long)]
        assess_url: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<PracticeConfig> {
    match path {
        Some(path) => PracticeConfig::load(path),
        None => Ok(PracticeConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Practice {
            items,
            kind,
            config,
            seed,
            progress_url,
            set_id,
        } => {
            let config = load_config(config.as_ref())?;
            practice(items, kind, config, seed, progress_url, set_id).await
        }
        Commands::InspectResult { path, word, config } => {
            let config = load_config(config.as_ref())?;
            let bytes =
                std::fs::read(&path).with_context(|| format!("read assessment {:?}", path))?;
            let result = JsonAssessmentDecoder.decode(&bytes)?;
            let view = ResultInterpreter::new(config.tiers).interpret(&word, &result);
            println!("{}", render_result(&view));
            Ok(())
        }
        Commands::Pronounce {
            word,
            assess_url,
            config,
        } => {
            let config = load_config(config.as_ref())?;
            pronounce(&word, &assess_url, &config).await
        }
    }
}

async fn practice(
    items_path: PathBuf,
    kind: ExerciseKind,
    config: PracticeConfig,
    seed: Option<u64>,
    progress_url: Option<String>,
    set_id: String,
) -> Result<()> {
    let bytes = std::fs::read(&items_path)
        .with_context(|| format!("read vocabulary {:?}", items_path))?;
    let pool = decode_items(&bytes)?;
    info!(count = pool.len(), "vocabulary loaded");

    let store: Box<dyn ProgressStore> = match progress_url {
        Some(url) => Box::new(HttpProgressStore::new(Endpoint::new(url)?)),
        None => Box::new(
            InMemoryProgressStore::new().with_set(&set_id, pool.iter().map(|item| item.id.clone())),
        ),
    };
    let accent = config.accent;
    let mut session = match seed {
        Some(seed) => PracticeSession::with_rng(pool, kind, config, StdRng::seed_from_u64(seed))?,
        None => PracticeSession::new(pool, kind, config)?,
    };
    if session.status() == SessionStatus::Empty {
        bail!("{:?} contains no vocabulary items", items_path);
    }
    if let Some(snapshot) = session.preload_snapshot(store.as_ref(), &set_id).await {
        println!("stored progress: {:.0}%", snapshot.completion_percentage);
    }

    println!("{}", help(kind));
    print_events(&session.enter(), accent);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while session.status() == SessionStatus::Active {
        println!("{}", render_exercise(session.exercise()?));
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let now = Instant::now();
        let events = match parse_command(&line, kind) {
            Some(Command::Quit) => break,
            Some(Command::Help) => {
                println!("{}", help(kind));
                continue;
            }
            Some(Command::Done) => {
                if let Some(id) = session
                    .exercise()?
                    .as_exercise()
                    .current_item()
                    .map(|item| item.id.clone())
                {
                    session.on_item_complete(&id);
                }
                Vec::new()
            }
            Some(Command::Answer(text)) => {
                session.apply(ExerciseAction::Input(text), now);
                session.apply(ExerciseAction::Submit, now)
            }
            Some(Command::Action(action)) => session.apply(action, now),
            None => {
                println!("{}", help(kind));
                continue;
            }
        };
        print_events(&events, accent);

        if let Some((_, deadline)) = session.pending_timer() {
            tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
            let events = session.tick(Instant::now());
            print_events(&events, accent);
        }
        let delivered = session.flush_reports(store.as_ref()).await;
        if delivered > 0 {
            info!(delivered, "progress reported");
        }
    }

    println!("{}", render_summary(&session.summary()));
    Ok(())
}

fn print_events(events: &[ExerciseEvent], accent: Accent) {
    for line in events.iter().filter_map(|event| describe_event(event, accent)) {
        println!("{line}");
    }
}

async fn pronounce(word: &str, assess_url: &str, config: &PracticeConfig) -> Result<()> {
    let service = HttpAssessmentService::new(Endpoint::new(assess_url)?);
    let mut flow = PronunciationFlow::new(CpalBackend::new(), StreamConfig::default(), config);
    flow.start(word, Instant::now())?;
    println!(
        "recording \"{word}\" for up to {:.1}s...",
        config.recording_timeout().as_secs_f32()
    );
    loop {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if flow.poll(Instant::now())? {
            break;
        }
        let bars = (flow.level() * 30.0).round() as usize;
        print!("\r[{:<30}]", "#".repeat(bars.min(30)));
        io::stdout().flush()?;
    }
    println!();
    let result = match flow.submit(&service).await {
        Ok(result) => result.clone(),
        Err(err) => {
            warn!(%err, "assessment failed");
            bail!("could not score the recording: {err}");
        }
    };
    let view = ResultInterpreter::new(config.tiers).interpret(word, &result);
    println!("{}", render_result(&view));
    Ok(())
}
