//! Leveled logging for the `bytedom` workspace.
//!
//! A single global [`Logger`] holds the minimum level in an atomic, so the
//! macros can be called from anywhere without setup. Messages are written to
//! stderr, tagged with the calling module path, which keeps stdout free for
//! program output (the CLI prints rendered HTML there).
//!
//! The level can be set programmatically or read from the `BYTEDOM_LOG`
//! environment variable with [`init_from_env`].
//!
//! # Example
//!
//! ```
//! use bytedom_log::{debug, info, trace, Level};
//!
//! bytedom_log::set_level(Level::Debug);
//!
//! let pc = 12;
//! debug!("halted at pc={pc}");
//! info!("rendered {} nodes", 3);
//! trace!("this one is filtered out");
//! ```

use std::fmt::{self, Arguments};
use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Environment variable read by [`init_from_env`].
pub const ENV_VAR: &str = "BYTEDOM_LOG";

/// Severity of a log record, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Failures surfaced to the user.
    Error = 0,
    /// Recoverable anomalies, such as an exhausted run budget.
    Warn = 1,
    /// High-level progress.
    Info = 2,
    /// Per-run details.
    Debug = 3,
    /// Per-instruction details.
    Trace = 4,
}

impl Level {
    const ALL: [Level; 5] = [
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Debug,
        Level::Trace,
    ];

    const fn color(self) -> &'static str {
        match self {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[32m",
            Level::Debug => "\x1b[36m",
            Level::Trace => "\x1b[90m",
        }
    }

    /// Upper-case name used in the record prefix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Level::Error,
            1 => Level::Warn,
            2 => Level::Info,
            3 => Level::Debug,
            _ => Level::Trace,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a level name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError {
    /// The rejected input.
    pub input: String,
}

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid log level '{}' (expected error, warn, info, debug or trace)",
            self.input
        )
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Parses a level name, ignoring case and surrounding whitespace.
    ///
    /// ```
    /// use bytedom_log::Level;
    ///
    /// assert_eq!("Debug".parse::<Level>(), Ok(Level::Debug));
    /// assert!("loud".parse::<Level>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseLevelError {
                input: s.to_string(),
            })
    }
}

/// Global logger state.
pub struct Logger {
    level: AtomicU8,
    color: AtomicBool,
}

impl Logger {
    const fn new(level: Level) -> Self {
        Logger {
            level: AtomicU8::new(level as u8),
            color: AtomicBool::new(true),
        }
    }

    /// Sets the minimum level that will be written.
    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::SeqCst);
    }

    /// Returns the minimum level that will be written.
    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Enables or disables ANSI colors in the record prefix.
    pub fn set_color(&self, enabled: bool) {
        self.color.store(enabled, Ordering::Relaxed);
    }

    /// Returns true if a record at `level` would be written.
    pub fn enabled(&self, level: Level) -> bool {
        level as u8 <= self.level.load(Ordering::Relaxed)
    }

    fn format(&self, level: Level, target: &str, args: Arguments) -> String {
        if self.color.load(Ordering::Relaxed) {
            format!("{}[{level}]\x1b[0m {target}: {args}", level.color())
        } else {
            format!("[{level}] {target}: {args}")
        }
    }
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Returns the global logger, creating it at `Level::Warn` on first use.
pub fn get_logger() -> &'static Logger {
    LOGGER.get_or_init(|| {
        let logger = Logger::new(Level::Warn);
        logger.set_color(std::env::var_os("NO_COLOR").is_none());
        logger
    })
}

/// Sets the minimum level of the global logger.
pub fn set_level(level: Level) {
    get_logger().set_level(level);
}

/// Reads [`ENV_VAR`] and applies it to the global logger.
///
/// Returns the level in effect afterwards. An unset variable keeps the
/// current level; an unparsable value keeps it too and is returned as an
/// error so the caller can report it.
pub fn init_from_env() -> Result<Level, ParseLevelError> {
    let logger = get_logger();
    if let Ok(raw) = std::env::var(ENV_VAR) {
        logger.set_level(raw.parse()?);
    }
    Ok(logger.level())
}

#[doc(hidden)]
pub fn __write(level: Level, target: &str, args: Arguments) {
    let logger = get_logger();
    if !logger.enabled(level) {
        return;
    }

    let line = logger.format(level, target, args);
    // A closed stderr is not worth failing the caller over.
    let _ = writeln!(std::io::stderr().lock(), "{line}");
}

/// Writes a record at an explicit level.
///
/// ```
/// use bytedom_log::{log, Level};
///
/// log!(level: Level::Info, "program is {} bytes", 42);
/// ```
#[macro_export]
macro_rules! log {
    (level: $level:expr, $($arg:tt)*) => {{
        let level = $level;
        if $crate::get_logger().enabled(level) {
            $crate::__write(level, module_path!(), format_args!($($arg)*));
        }
    }};
}

/// Writes a record at `Level::Error`.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { $crate::log!(level: $crate::Level::Error, $($arg)*) };
}

/// Writes a record at `Level::Warn`.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::log!(level: $crate::Level::Warn, $($arg)*) };
}

/// Writes a record at `Level::Info`.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { $crate::log!(level: $crate::Level::Info, $($arg)*) };
}

/// Writes a record at `Level::Debug`.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => { $crate::log!(level: $crate::Level::Debug, $($arg)*) };
}

/// Writes a record at `Level::Trace`.
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => { $crate::log!(level: $crate::Level::Trace, $($arg)*) };
}
