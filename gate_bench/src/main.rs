use std::error::Error;
use std::fmt::Display;
use std::io;
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use clap::error::ErrorKind;
use clap::Parser;
use signal_hook::consts::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use gate::{
    ConsoleObserver, GateSettings, RunConfig, RunContext, RunReport, SharedBuffer, SilentObserver,
    Strategy, Workforce,
};

const USAGE: &str = "usage: gate_bench <wr_thread_count> <rd_thread_count> <wr_loops> <rd_loops> \
                     [-c <config>] [--strategy <turnstile|turnstile-strict|native-rw>]";

const EXIT_USAGE: i32 = -1;
const EXIT_FAULT: i32 = 1;
const EXIT_INTERRUPTED: i32 = 130;

#[derive(clap::Parser)]
#[clap(
    about = "Races readers and writers over one buffer without ever waiting for it",
    allow_negative_numbers = true
)]
struct Opts {
    writer_threads: i64,
    reader_threads: i64,
    write_loops: i64,
    read_loops: i64,
    #[clap(short = 'c', long = "config")]
    config: Option<String>,
    #[clap(short = 's', long = "strategy")]
    strategy: Option<Strategy>,
    #[clap(long = "seed")]
    seed: Option<u64>,
    #[clap(long = "capacity")]
    capacity: Option<usize>,
    #[clap(long = "jitter-step-ms")]
    jitter_step_ms: Option<u64>,
    #[clap(long = "jitter-steps")]
    jitter_steps: Option<u32>,
    /// Only print the final report.
    #[clap(short = 'q', long = "quiet")]
    quiet: bool,
}

struct Plan {
    config: RunConfig,
    settings: GateSettings,
    quiet: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => usage_exit(e),
    };
    let plan = match plan(opts) {
        Ok(plan) => plan,
        Err(e) => usage_exit(e),
    };
    let report = run(plan)?;
    println!("\n{}", report);
    if !report.faults.is_empty() {
        for fault in report.faults.iter() {
            error!(%fault, "worker fault");
        }
        process::exit(EXIT_FAULT);
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_thread_names(true)
        .init();
}

fn usage_exit<E: Display>(reason: E) -> ! {
    eprintln!("illegal arguments: {}", reason);
    eprintln!("{}", USAGE);
    process::exit(EXIT_USAGE);
}

fn plan(opts: Opts) -> Result<Plan, Box<dyn Error>> {
    let config = RunConfig::new(
        opts.writer_threads,
        opts.reader_threads,
        opts.write_loops,
        opts.read_loops,
    )?;
    let mut settings: GateSettings = match opts.config {
        Some(ref path) => confy::load_path(path)?,
        None => GateSettings::default(),
    };
    if let Some(strategy) = opts.strategy {
        settings.strategy = strategy;
    }
    if opts.seed.is_some() {
        settings.seed = opts.seed;
    }
    if let Some(capacity) = opts.capacity {
        settings.buffer_capacity = capacity;
    }
    if let Some(step_ms) = opts.jitter_step_ms {
        settings.jitter.step_ms = step_ms;
    }
    if let Some(steps) = opts.jitter_steps {
        settings.jitter.steps = steps;
    }
    settings.validate()?;
    Ok(Plan {
        config,
        settings,
        quiet: opts.quiet,
    })
}

fn run(plan: Plan) -> Result<RunReport, Box<dyn Error>> {
    let settings = &plan.settings;
    let seed = settings.resolve_seed();
    info!(strategy = %settings.strategy, seed, config = ?plan.config, "starting run");

    let mut context = RunContext::new(
        settings.strategy.coordinator(),
        SharedBuffer::with_capacity(settings.buffer_capacity)?,
    );
    context = if plan.quiet {
        context.with_observer(Arc::new(SilentObserver))
    } else {
        context.with_observer(Arc::new(ConsoleObserver))
    };
    let workforce = Arc::new(
        Workforce::new(plan.config, context)
            .seed(seed)
            .jitter(settings.jitter),
    );

    watch_signals(Arc::clone(&workforce), Instant::now())?;
    Ok(workforce.run()?)
}

/// Prints what was counted so far and leaves when the process is told to stop.
fn watch_signals(workforce: Arc<Workforce>, started: Instant) -> Result<(), Box<dyn Error>> {
    let mut signals = Signals::new(&[SIGHUP, SIGINT, SIGQUIT, SIGTERM])?;
    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                warn!(signal, "interrupted, workers abandoned");
                println!(
                    "\nInterrupted.\n{}",
                    workforce.report(started.elapsed(), Vec::new())
                );
                process::exit(EXIT_INTERRUPTED);
            }
        })?;
    Ok(())
}
