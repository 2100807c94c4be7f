use std::fs::File;
use std::io::{self, stdout};
use std::net::SocketAddr;
use std::panic;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, prelude::*};
use tokio::sync::Notify;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use microbiome_studio::api;
use microbiome_studio::runtime::spawn_studio;
use microbiome_studio::simulation::{
    AppendRequest, ObserverSnapshot, PhaseRequest, SPECIES, StudioCommand, StudioConfig,
    StudioWorld,
};
use microbiome_studio::ui::{self, ControlState, factor_for_hotkey};

#[derive(Parser, Debug)]
#[command(author, version, about = "Gut microbiome diet simulator", long_about = None)]
struct Args {
    /// Run the phases given on the command line and print a summary instead of the TUI
    #[arg(long)]
    headless: bool,

    /// Starting baseline index
    #[arg(short, long, default_value_t = 0)]
    baseline: usize,

    /// Dietary factor key (repeatable), e.g. fiber, redmeat, fermented
    #[arg(short, long = "factor")]
    factors: Vec<String>,

    /// Length of the first phase in days
    #[arg(short, long, default_value_t = 180)]
    days: u32,

    /// Append a follow-up phase of this many days (repeatable, headless only)
    #[arg(long = "append")]
    appends: Vec<u32>,

    /// Write the final session and diversity series as JSON
    #[arg(long)]
    export: Option<PathBuf>,

    /// Serve the JSON API on this address, e.g. 127.0.0.1:7878
    #[arg(long)]
    api: Option<SocketAddr>,

    /// Log destination while the TUI owns the terminal
    #[arg(long, default_value = "microbiome_studio.log")]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args)?;

    let config = StudioConfig {
        default_days: args.days,
        ..Default::default()
    };

    if args.headless {
        return run_headless(&args, config);
    }

    let observer = Arc::new(RwLock::new(ObserverSnapshot::default()));
    let shutdown_notify = Arc::new(Notify::new());

    let mut studio = StudioWorld::with_observer(config, observer.clone());
    for command in initial_selection(&args) {
        if let Some(err) = studio.apply(command) {
            bail!("invalid startup selection: {err}");
        }
    }
    let (handle, studio_task) = spawn_studio(studio, shutdown_notify.clone());

    if let Some(addr) = args.api {
        let api_handle = handle.clone();
        tokio::spawn(async move {
            if let Err(err) = api::serve(addr, api_handle).await {
                error!(error = %err, "API server stopped");
            }
        });
    }

    let ctrlc_notify = shutdown_notify.clone();
    let ctrl_c_task = tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        ctrlc_notify.notify_waiters();
    });

    // TUI Setup
    let mut terminal = init_terminal()?;
    let mut term_guard = TerminalGuard::new();
    panic::set_hook(Box::new(|info| {
        let _ = restore_terminal();
        eprintln!("panic: {info}");
    }));
    let mut control = ControlState::default();
    let mut app_should_run = true;

    while app_should_run {
        let snapshot = handle.snapshot();
        terminal.draw(|frame| ui::render(frame, &snapshot, &control))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let samples = snapshot.session.time_axis().len();
                let command = match key.code {
                    KeyCode::Char('q') => {
                        app_should_run = false;
                        None
                    }
                    KeyCode::Char('b') | KeyCode::Char('B') => Some(StudioCommand::CycleBaseline),
                    KeyCode::Char('+') | KeyCode::Char('=') => {
                        Some(StudioCommand::AdjustDays { steps: 1 })
                    }
                    KeyCode::Char('-') => Some(StudioCommand::AdjustDays { steps: -1 }),
                    KeyCode::Char(c) if c.is_ascii_digit() => {
                        factor_for_hotkey(c).map(|factor| StudioCommand::ToggleFactor {
                            key: factor.key.to_string(),
                        })
                    }
                    KeyCode::Enter | KeyCode::Char('r') => {
                        control.clear_cursor();
                        Some(StudioCommand::RunFresh)
                    }
                    KeyCode::Char('c') => {
                        control.clear_cursor();
                        Some(StudioCommand::RunContinued)
                    }
                    KeyCode::Char('a') => {
                        control.clear_cursor();
                        Some(StudioCommand::Append)
                    }
                    KeyCode::Char('x') | KeyCode::Char('X') => {
                        control.clear_cursor();
                        Some(StudioCommand::Reset)
                    }
                    KeyCode::Tab => {
                        control.view = control.view.next();
                        None
                    }
                    KeyCode::BackTab => {
                        control.view = control.view.prev();
                        None
                    }
                    KeyCode::Left => {
                        control.move_cursor(-1, samples);
                        None
                    }
                    KeyCode::Right => {
                        control.move_cursor(1, samples);
                        None
                    }
                    KeyCode::Esc => {
                        control.clear_cursor();
                        None
                    }
                    _ => None,
                };
                if let Some(command) = command {
                    handle.send(command).await?;
                }
            }
        }

        if ctrl_c_task.is_finished() {
            app_should_run = false;
        }
    }

    // Shutdown; notify_one keeps a permit if the studio task is mid-command
    shutdown_notify.notify_one();
    studio_task.await?;
    restore_terminal()?;
    term_guard.disarm();

    Ok(())
}

fn init_tracing(args: &Args) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if args.headless {
        builder.with_writer(io::stderr).init();
    } else {
        let file = File::create(&args.log_file)
            .with_context(|| format!("cannot open log file {}", args.log_file.display()))?;
        colored::control::set_override(false);
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    }
    Ok(())
}

fn initial_selection(args: &Args) -> Vec<StudioCommand> {
    let mut commands = vec![
        StudioCommand::SelectBaseline {
            index: args.baseline,
        },
        StudioCommand::SetDays { days: args.days },
    ];
    commands.extend(args.factors.iter().map(|key| StudioCommand::ToggleFactor {
        key: key.clone(),
    }));
    commands
}

fn run_headless(args: &Args, config: StudioConfig) -> anyhow::Result<()> {
    let mut studio = StudioWorld::new(config);
    let first = StudioCommand::Submit {
        request: PhaseRequest {
            baseline: args.baseline,
            factors: args.factors.clone(),
            days: args.days,
        },
    };
    if let Some(err) = studio.apply(first) {
        bail!("first phase failed: {err}");
    }
    for days in &args.appends {
        let append = StudioCommand::SubmitAppend {
            request: AppendRequest {
                factors: args.factors.clone(),
                days: *days,
            },
        };
        if let Some(err) = studio.apply(append) {
            bail!("appended phase failed: {err}");
        }
    }

    let snapshot = studio.snapshot();
    print_summary(&snapshot);

    if let Some(path) = &args.export {
        let file = File::create(path)
            .with_context(|| format!("cannot create export file {}", path.display()))?;
        serde_json::to_writer_pretty(file, &snapshot)?;
        info!(path = %path.display(), "session exported");
    }
    Ok(())
}

fn print_summary(snapshot: &ObserverSnapshot) {
    let session = &snapshot.session;
    println!(
        "{} | {} samples | baseline {}",
        snapshot.status_line,
        session.time_axis().len(),
        snapshot.selection.baseline_label
    );
    if let Some(current) = session.current_abundances() {
        let mut ranked: Vec<(usize, f64)> = current.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        for (index, value) in ranked {
            println!("  {:<32} {:>6.2}%", SPECIES[index].name, value);
        }
    }
    if let Some(latest) = snapshot.diversity.latest() {
        println!(
            "  Shannon H' {:.3} | Simpson 1-D {:.3}",
            latest.shannon, latest.simpson
        );
    }
}

fn init_terminal() -> io::Result<Terminal<impl Backend>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    Terminal::new(backend)
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Ensures terminal is restored on panic/early-return.
struct TerminalGuard {
    armed: bool,
}

impl TerminalGuard {
    fn new() -> Self {
        Self { armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = restore_terminal();
        }
    }
}
