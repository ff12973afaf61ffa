use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use tranquil_breath::{BreathSession, HeartbeatConfig, Phase, Progress, SessionRunner, Status};
use tranquil_core::{
    BreathPattern, Catalog, Clock, PreferenceStore, SelectedEmotion, SessionOutcome, SystemClock,
};
use tranquil_emotion::{analyze, CheckInAnalysis};

mod config;
mod sink;
mod store;

use config::{LogConfig, TranquilConfig};
use sink::JsonlSink;
use store::{JsonFileStore, LAST_PATTERN_KEY};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long, env = "TRANQUIL_CONFIG")]
    config: Option<PathBuf>,

    /// A feeling and how strong it is, e.g. `anxious:4` (intensity 1-5)
    #[arg(short, long = "feel", value_name = "ID:INTENSITY", value_parser = parse_feel)]
    feel: Vec<SelectedEmotion>,

    /// Breathe with this pattern instead of the recommended one
    #[arg(short, long, conflicts_with = "again")]
    pattern: Option<String>,

    /// Repeat the last pattern used
    #[arg(long)]
    again: bool,

    /// Override the number of cycles
    #[arg(long)]
    cycles: Option<u32>,

    /// List emotions and patterns, then exit
    #[arg(long)]
    list: bool,

    /// Show the analysis and chosen pattern without starting a session
    #[arg(long)]
    dry_run: bool,
}

fn parse_feel(raw: &str) -> Result<SelectedEmotion, String> {
    SelectedEmotion::parse(raw).map_err(|e| e.to_string())
}

fn init_logging(log: &LogConfig) {
    let filter = EnvFilter::try_new(&log.filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = fmt().with_env_filter(filter).with_writer(io::stderr);
    if log.json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

fn load_catalog(config: &TranquilConfig) -> Result<Catalog> {
    match &config.catalog.path {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
            let catalog = Catalog::from_toml_str(&source)
                .with_context(|| format!("Invalid catalog: {}", path.display()))?;
            info!("Loaded catalog from {}", path.display());
            Ok(catalog)
        }
        None => Ok(Catalog::builtin()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(TranquilConfig::default_path);
    let config = TranquilConfig::load_or_default(&config_path);
    init_logging(&config.log);

    let catalog = load_catalog(&config)?;
    if args.list {
        print_catalog(&catalog);
        return Ok(());
    }

    for selection in &args.feel {
        if catalog.emotion(&selection.emotion_id).is_none() {
            warn!("Unknown feeling '{}', it won't match anything", selection.emotion_id);
        }
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let preferences = JsonFileStore::new(&config.history.preferences_path, clock.clone());

    let pattern = choose_pattern(&args, &catalog, &preferences)?;
    let pattern = match args.cycles.or(config.session.cycles) {
        Some(cycles) => pattern.with_cycles(cycles),
        None => pattern,
    };

    println!(
        "Pattern: {} ({}) {}, {:.1} breaths/min, {}s total",
        pattern.name,
        pattern.id,
        pattern.rhythm(),
        pattern.breaths_per_minute(),
        pattern.total_ms() / 1000
    );
    if args.dry_run {
        return Ok(());
    }

    let session = BreathSession::start(pattern)?;
    let remember = config.history.remember_for();
    if let Err(e) = preferences.set(
        LAST_PATTERN_KEY,
        serde_json::Value::String(session.pattern().id.clone()),
        Some(remember),
    ) {
        warn!("Could not remember pattern: {:#}", e);
    }

    let runner = SessionRunner::spawn(
        session,
        clock,
        Arc::new(JsonlSink::new(&config.history.path)),
        HeartbeatConfig::from_millis(config.session.tick_ms),
    );
    follow(&runner, config.session.show_progress).await?;

    let summary = runner.join().await?;
    match summary.outcome {
        SessionOutcome::Completed => println!(
            "\nWell done: {} cycles in {}s.",
            summary.cycles_completed,
            summary.duration_ms / 1000
        ),
        SessionOutcome::Cancelled => println!(
            "\nStopped after {} full cycles ({}s).",
            summary.cycles_completed,
            summary.duration_ms / 1000
        ),
    }
    Ok(())
}

/// Pick the pattern: explicit `--pattern`, then `--again`, then the
/// recommendation for the check-in.
fn choose_pattern(
    args: &Args,
    catalog: &Catalog,
    preferences: &dyn PreferenceStore,
) -> Result<BreathPattern> {
    if let Some(id) = &args.pattern {
        return find_pattern(catalog, id);
    }

    if args.again {
        let last = preferences
            .get(LAST_PATTERN_KEY)?
            .and_then(|v| v.as_str().map(str::to_string));
        match last {
            Some(id) => return find_pattern(catalog, &id),
            None => warn!("No recent pattern to repeat, recommending one instead"),
        }
    }

    let analysis = analyze(&args.feel, catalog);
    print_analysis(&analysis, catalog);
    find_pattern(catalog, &analysis.recommendation.pattern_id)
}

fn find_pattern(catalog: &Catalog, id: &str) -> Result<BreathPattern> {
    match catalog.pattern(id) {
        Some(pattern) => Ok(pattern.clone()),
        None => bail!("Unknown pattern '{}' (see --list)", id),
    }
}

/// Print cues as phases change until the session ends. Ctrl-C cancels.
async fn follow(runner: &SessionRunner, show_progress: bool) -> Result<()> {
    let mut rx = runner.subscribe();
    let mut shown: Option<(Phase, u32)> = None;
    let mut interrupted = false;

    loop {
        let progress = *rx.borrow_and_update();
        render(&progress, runner, &mut shown, show_progress)?;
        if progress.status.is_terminal() {
            break;
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                info!("Interrupted, cancelling session {}", runner.session_id());
                if let Err(e) = runner.cancel().await {
                    warn!("Cancel failed: {}", e);
                }
            }
        }
    }
    Ok(())
}

fn render(
    progress: &Progress,
    runner: &SessionRunner,
    shown: &mut Option<(Phase, u32)>,
    show_progress: bool,
) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let key = (progress.phase, progress.cycle_index);
    if *shown != Some(key) {
        *shown = Some(key);
        if progress.status == Status::Completed {
            writeln!(out, "\n{}", progress.phase.cue())?;
        } else if progress.status != Status::Cancelled {
            write!(
                out,
                "\n[{}] cycle {}  {} ({}s)",
                runner.pattern_id(),
                progress.cycle_index + 1,
                progress.phase.cue(),
                progress.phase_duration_ms.div_ceil(1000)
            )?;
            if !show_progress {
                writeln!(out)?;
            }
        }
    }
    if show_progress && progress.status == Status::Running {
        const WIDTH: usize = 20;
        let filled = (progress.fraction_of_phase_elapsed * WIDTH as f32).round() as usize;
        let filled = filled.min(WIDTH);
        write!(
            out,
            "\r    {}{} {:>3}%",
            "#".repeat(filled),
            ".".repeat(WIDTH - filled),
            (progress.fraction_of_session_elapsed * 100.0).round() as u32
        )?;
    }
    out.flush()
}

fn print_analysis(analysis: &CheckInAnalysis, catalog: &Catalog) {
    let name = |id: &tranquil_core::EmotionId| {
        catalog
            .emotion(id)
            .map(|e| e.label.clone())
            .unwrap_or_else(|| id.to_string())
    };

    if !analysis.dyads.is_empty() {
        println!("You may be feeling:");
        for dyad in &analysis.dyads {
            let (a, b) = &dyad.components;
            println!(
                "  {} ({} + {}, strength {}): {}",
                dyad.label,
                name(a),
                name(b),
                dyad.strength,
                dyad.description
            );
        }
    }

    let rec = &analysis.recommendation;
    println!("Recommended: {} ({})", rec.pattern_id, rec.reason);
    if let Some(topic) = &rec.guidance_topic {
        println!("Guidance: {}", topic);
    }
}

fn print_catalog(catalog: &Catalog) {
    println!("Feelings:");
    for emotion in catalog.emotions() {
        let treated = catalog
            .association(&emotion.id)
            .map(|a| format!(" -> {}", a.pattern))
            .unwrap_or_default();
        println!(
            "  {} {:<14} {}{}",
            emotion.icon,
            emotion.id.as_str(),
            emotion.label,
            treated
        );
    }

    println!("\nPatterns:");
    for pattern in catalog.patterns() {
        let default = if pattern.id == catalog.default_pattern().id {
            " (default)"
        } else {
            ""
        };
        println!(
            "  {:<20} {:<24} {}{}",
            pattern.id,
            pattern.name,
            pattern.rhythm(),
            default
        );
    }
}
