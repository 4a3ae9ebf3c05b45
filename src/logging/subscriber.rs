//! Tracing subscriber setup: console formatter, run-log layer, and
//! initialisation.
use std::fs;
use std::io::Write as _;
use std::sync::Mutex;

use tracing::Level;

use super::utils::{format_utc_datetime, format_utc_time, log_file_path, strip_ansi};

/// Target used for stage headers.
const STAGE_TARGET: &str = "devsetup::stage";
/// Target used for dry-run actions.
const DRY_RUN_TARGET: &str = "devsetup::dry_run";

/// Where console output is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleTarget {
    /// Progress on stdout in colour; warnings and errors on stderr.
    #[default]
    Terminal,
    /// Everything on stderr without colour, leaving stdout to a
    /// machine-readable report such as `verify --json`.
    Stderr,
}

/// Extracts the `message` field from a [`tracing::Event`].
#[derive(Default)]
struct MessageExtractor {
    message: String,
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

fn message_of(event: &tracing::Event<'_>) -> String {
    let mut extractor = MessageExtractor::default();
    event.record(&mut extractor);
    extractor.message
}

/// One run-log line for an event, stamped with `ts`.
fn file_line(level: Level, target: &str, msg: &str, ts: &str) -> String {
    let msg = strip_ansi(msg);
    match (level, target) {
        (Level::INFO, STAGE_TARGET) => format!("[{ts}] ==> {msg}"),
        (Level::INFO, DRY_RUN_TARGET) => format!("[{ts}]     [dry run] {msg}"),
        (Level::ERROR, _) => format!("[{ts}]     [error] {msg}"),
        (Level::WARN, _) => format!("[{ts}]     [warn] {msg}"),
        (Level::DEBUG | Level::TRACE, _) => format!("[{ts}]     [debug] {msg}"),
        _ => format!("[{ts}]     {msg}"),
    }
}

/// One console line for an event.
fn console_line(level: Level, target: &str, msg: &str, colour: bool) -> String {
    let paint = |code: &str, text: &str| {
        if colour {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    };
    match level {
        Level::ERROR => format!("{} {msg}", paint("31", "ERROR")),
        Level::WARN => format!("{}  {msg}", paint("33", "WARN")),
        Level::INFO if target == STAGE_TARGET => {
            format!("{} {}", paint("1;34", "==>"), paint("1", msg))
        }
        Level::INFO if target == DRY_RUN_TARGET => {
            format!("  {} {msg}", paint("33", "[DRY RUN]"))
        }
        Level::INFO => format!("  {msg}"),
        _ => format!("  {}", paint("2", msg)),
    }
}

/// A [`tracing_subscriber::Layer`] that appends every event to
/// `$XDG_CACHE_HOME/devsetup/<command>.log`, without colour.
///
/// Captures `DEBUG` and above regardless of console verbosity.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Create the log file for `command` and write a run header naming the
    /// command and the invoking account.
    ///
    /// Returns `None` if the cache directory cannot be created or the file
    /// cannot be opened.
    pub(super) fn new(command: &str) -> Option<Self> {
        let path = log_file_path(command)?;
        let version =
            option_env!("DEVSETUP_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let invoked_by = std::env::var("SUDO_USER")
            .map_or_else(|_| String::new(), |u| format!(" (sudo from {u})"));
        let header = format!(
            "# devsetup {version} {command}{invoked_by}\n# started {} UTC\n",
            format_utc_datetime(),
        );
        fs::write(&path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(&path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();
        let line = file_line(
            *metadata.level(),
            metadata.target(),
            &message_of(event),
            &format_utc_time(),
        );
        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "{line}").ok();
        }
    }
}

/// A [`tracing_subscriber::fmt::FormatEvent`] producing the console layout.
struct ConsoleFormatter {
    colour: bool,
}

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let line = console_line(
            *metadata.level(),
            metadata.target(),
            &message_of(event),
            self.colour,
        );
        writeln!(writer, "{line}")
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// With [`ConsoleTarget::Terminal`] progress goes to stdout (`INFO`, plus
/// `DEBUG` when `verbose`) and `WARN` and above to stderr.  With
/// [`ConsoleTarget::Stderr`] all console output goes to stderr, uncoloured.
/// Everything down to `DEBUG` is also written to
/// `$XDG_CACHE_HOME/devsetup/<command>.log`. Must be called once at startup.
pub fn init_subscriber(verbose: bool, console: ConsoleTarget, command: &str) {
    use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt as _};
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let make_writer = match console {
        ConsoleTarget::Terminal => BoxMakeWriter::new(
            std::io::stderr
                .with_max_level(Level::WARN)
                .and(std::io::stdout.with_min_level(Level::INFO)),
        ),
        ConsoleTarget::Stderr => BoxMakeWriter::new(std::io::stderr),
    };

    let console_layer = fmt::layer()
        .event_format(ConsoleFormatter {
            colour: console == ConsoleTarget::Terminal,
        })
        .with_writer(make_writer)
        .with_filter(console_level);

    let file_layer = FileLayer::new(command).map(|l| l.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_is_highlighted_in_colour() {
        assert_eq!(
            console_line(Level::INFO, STAGE_TARGET, "Loading manifest", true),
            "\x1b[1;34m==>\x1b[0m \x1b[1mLoading manifest\x1b[0m"
        );
    }

    #[test]
    fn plain_console_has_no_escape_codes() {
        for (level, target) in [
            (Level::ERROR, "devsetup"),
            (Level::WARN, "devsetup"),
            (Level::INFO, STAGE_TARGET),
            (Level::INFO, DRY_RUN_TARGET),
            (Level::INFO, "devsetup"),
            (Level::DEBUG, "devsetup"),
        ] {
            let line = console_line(level, target, "msg", false);
            assert!(!line.contains('\x1b'), "{line:?}");
            assert!(line.ends_with("msg"), "{line:?}");
        }
        assert_eq!(
            console_line(Level::INFO, STAGE_TARGET, "Checking dependencies", false),
            "==> Checking dependencies"
        );
        assert_eq!(
            console_line(Level::INFO, DRY_RUN_TARGET, "would run chsh", false),
            "  [DRY RUN] would run chsh"
        );
    }

    #[test]
    fn file_lines_are_tagged_and_uncoloured() {
        assert_eq!(
            file_line(Level::INFO, STAGE_TARGET, "\x1b[1mstage\x1b[0m", "12:00:00"),
            "[12:00:00] ==> stage"
        );
        assert_eq!(
            file_line(Level::WARN, "devsetup", "eza: skipped", "12:00:00"),
            "[12:00:00]     [warn] eza: skipped"
        );
        assert_eq!(
            file_line(Level::DEBUG, "devsetup", "git clone", "12:00:00"),
            "[12:00:00]     [debug] git clone"
        );
    }
}
