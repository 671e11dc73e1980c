use slog::{o, Drain, Logger};

/// Terminal logger for binaries: formatted lines on stderr, written from a
/// background thread. Records still queued are flushed when the last clone
/// of the logger is dropped.
pub fn terminal() -> Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
}

/// Logger that drops every record. Used when the caller supplies none.
pub fn discard() -> Logger {
    Logger::root(slog::Discard, o!())
}
