use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEventKind},
    execute, queue,
    style::Print,
    terminal::{self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use neuro_drive::config::Settings;
use neuro_drive::error::PersistError;
use neuro_drive::persistence::FileStore;
use neuro_drive::simulation::Population;
use neuro_drive::terminal::TerminalSurface;
use neuro_drive::visualizer::{draw_network_with, DiagramStyle};

#[derive(Parser)]
#[command(name = "neuro_drive")]
#[command(about = "Evolve self-driving controllers and watch the best one think", long_about = None)]
struct Cli {
    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of learning cars
    #[arg(long)]
    population: Option<usize>,
    /// How far clones are pulled towards random values (0-1)
    #[arg(long, allow_negative_numbers = true)]
    mutation: Option<f64>,
    /// Directory holding the saved elite
    #[arg(long)]
    store_dir: Option<PathBuf>,
    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
    /// Run this many ticks without a terminal UI, then exit
    #[arg(long)]
    headless_ticks: Option<usize>,
}

impl Cli {
    /// The terminal UI owns the tty, so only headless runs get log output.
    fn logs_to_stderr(&self) -> bool {
        self.headless_ticks.is_some()
    }
}

type Sim = Population<FileStore>;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logs_to_stderr());

    let settings = settings(&cli)?;
    let mut rng = match settings.seed {
        Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
        None => Xoshiro256PlusPlus::from_entropy(),
    };
    let store = FileStore::new(&settings.store_dir);
    let mut population = Population::init(&mut rng, settings, store)?;

    match cli.headless_ticks {
        Some(ticks) => run_headless(&mut population, ticks),
        None => run_terminal(&mut population, &mut rng),
    }
}

fn init_logging(to_stderr: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if to_stderr {
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::sink).init();
    }
}

/// Settings file (or the standard set) with the command line applied on top.
fn settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::standard(),
    };
    if let Some(n) = cli.population {
        settings.population_size = n;
    }
    if let Some(amount) = cli.mutation {
        settings.mutation_amount = amount;
    }
    if let Some(dir) = &cli.store_dir {
        settings.store_dir = dir.clone();
    }
    if cli.seed.is_some() {
        settings.seed = cli.seed;
    }
    settings.validate()?;
    Ok(settings)
}

fn run_headless(population: &mut Sim, ticks: usize) -> Result<()> {
    let mut best = 0;
    for _ in 0..ticks {
        best = population.tick()?.best;
    }
    let car = &population.cars[best];
    let damaged = population.cars.iter().filter(|c| c.damaged).count();
    info!(ticks, best, progress = car.progress(), damaged, "headless run finished");
    println!("best car {best} reached y = {:.1} after {ticks} ticks ({damaged} damaged)", car.progress());
    Ok(())
}

fn run_terminal(population: &mut Sim, rng: &mut Xoshiro256PlusPlus) -> Result<()> {
    let mut stdout = io::stdout();
    enable_raw_mode().context("failed to enable raw mode")?;
    execute!(stdout, EnterAlternateScreen, Hide).context("failed to enter alternate screen")?;

    let result = event_loop(population, rng, &mut stdout);

    if let Err(err) = disable_raw_mode() {
        tracing::error!(?err, "failed to disable raw mode");
    }
    if let Err(err) = execute!(stdout, Show, LeaveAlternateScreen) {
        tracing::error!(?err, "failed to leave alternate screen");
    }
    result
}

fn event_loop<W: Write>(population: &mut Sim, rng: &mut Xoshiro256PlusPlus, out: &mut W) -> Result<()> {
    let style = DiagramStyle {
        margin: population.settings.diagram_margin,
        node_radius: population.settings.node_radius,
        dash_time_divisor: population.settings.dash_time_divisor,
    };
    let frame = Duration::from_millis(population.settings.frame_millis);
    let started = Instant::now();
    let mut status = String::from("s: save  d: discard  r: restart  q: quit");

    loop {
        let (cols, rows) = terminal::size()?;
        let mut surface = TerminalSurface::new(cols, rows.saturating_sub(1), population.settings.diagram_width);

        let generation = population.generation;
        let best = {
            let tick = population.tick()?;
            let car = tick.best_car();
            if let Some(brain) = car.brain.as_ref() {
                let time = started.elapsed().as_secs_f64() * 1000.;
                draw_network_with(&mut surface, brain, time, &style);
            }
            surface.render(out)?;
            let damaged = tick.cars.iter().filter(|c| c.damaged).count();
            let line = format!(
                "gen {generation} | best #{} y={:.0} | {damaged}/{} damaged | {status}",
                tick.best,
                car.progress(),
                tick.cars.len()
            );
            queue!(out, MoveTo(0, rows.saturating_sub(1)), Clear(ClearType::CurrentLine), Print(line))?;
            out.flush()?;
            tick.best
        };

        if !event::poll(frame)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Char('s') => {
                status = store_status(population.save(best), "save", format!("saved car #{best}"));
            }
            KeyCode::Char('d') => {
                status = store_status(population.discard(), "discard", String::from("elite discarded"));
            }
            KeyCode::Char('r') => {
                population.reseed(rng)?;
                status = format!("restarted, generation {}", population.generation);
            }
            _ => {}
        }
    }
    Ok(())
}

/// A failed save or discard is reported on the status line; the run goes on.
fn store_status(result: Result<(), PersistError>, action: &str, done: String) -> String {
    match result {
        Ok(()) => done,
        Err(err) => {
            error!(%err, action, "elite store failed");
            format!("{action} failed: {err}")
        }
    }
}
