use clap::{crate_authors, crate_version, Clap};
use slog::{error, info, Logger};
use std::{
    panic,
    path::PathBuf,
    process::exit,
    sync::atomic::{AtomicUsize, Ordering},
    sync::Arc,
    thread,
    time::Duration,
};
use wpool::{logger, Config, Result, ThreadPool, WorkerPool};

/// Push a batch of jobs through a worker pool and report what happened.
#[derive(Clap)]
#[clap(version = crate_version!(), author = crate_authors!())]
struct Options {
    /// number of worker threads
    #[clap(long, short)]
    workers: Option<usize>,

    /// number of jobs to submit
    #[clap(long, short, default_value = "1000")]
    jobs: usize,

    /// bound the job queue; submitters block while it is full
    #[clap(long, short)]
    capacity: Option<usize>,

    /// JSON config file, command line flags override it
    #[clap(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// make every n-th job panic
    #[clap(long, default_value = "0")]
    panic_every: usize,

    /// how long each job sleeps
    #[clap(long, default_value = "0")]
    sleep_ms: u64,

    /// print pool statistics as JSON
    #[clap(long)]
    json: bool,
}

fn main() {
    let logger = logger::terminal();
    let options = Options::parse();

    let code = match run(&options, &logger) {
        Ok(()) => 0,
        Err(e) => {
            error!(logger, "{}", e);
            1
        }
    };
    // flush the async drain before leaving
    drop(logger);
    exit(code);
}

fn load_config(options: &Options) -> Result<Config> {
    let mut config = match &options.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(workers) = options.workers {
        config.workers = workers;
    }
    if options.capacity.is_some() {
        config.queue_capacity = options.capacity;
    }
    Ok(config)
}

fn run(options: &Options, logger: &Logger) -> Result<()> {
    let config = load_config(options)?;
    info!(logger, "wpool initializing";
        "workers" => config.workers,
        "jobs" => options.jobs
    );

    // the pool logs job panics itself; panics anywhere else still print
    let default_hook = panic::take_hook();
    let prefix = config.thread_name.clone();
    panic::set_hook(Box::new(move |info| {
        if !is_worker_thread(thread::current().name(), &prefix) {
            default_hook(info);
        }
    }));

    let pool = WorkerPool::with_config(&config, logger.clone())?;
    let finished = Arc::new(AtomicUsize::new(0));
    let delay = Duration::from_millis(options.sleep_ms);

    for i in 1..=options.jobs {
        let finished = Arc::clone(&finished);
        let panics = options.panic_every != 0 && i % options.panic_every == 0;
        pool.execute(move || {
            thread::sleep(delay);
            if panics {
                panic!("job {} failed on purpose", i);
            }
            finished.fetch_add(1, Ordering::SeqCst);
        })?;
    }
    pool.shutdown();

    let stats = pool.stats();
    if options.json {
        println!("{}", serde_json::to_string(&stats)?);
    } else {
        println!(
            "completed {} of {} jobs, {} panicked",
            finished.load(Ordering::SeqCst),
            stats.submitted,
            stats.panicked
        );
    }
    Ok(())
}

fn is_worker_thread(name: Option<&str>, prefix: &str) -> bool {
    match name.and_then(|n| n.strip_prefix(prefix)) {
        Some(rest) => rest.starts_with('-') && rest[1..].parse::<usize>().is_ok(),
        None => false,
    }
}
