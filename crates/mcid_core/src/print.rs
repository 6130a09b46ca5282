//! Logging for the provider crates.
//!
//! Use the [`info!`](crate::info), [`pt!`](crate::pt) and [`err!`](crate::err)
//! macros instead of calling these functions directly.
//!
//! Every message is passed through [`auto_redact`] first,
//! so access tokens, identity tokens and RPS tickets
//! never end up on the terminal or in the log file.

use std::{
    collections::VecDeque,
    fmt::Display,
    fs::OpenOptions,
    io::Write,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        LazyLock, Mutex, PoisonError,
    },
};

use chrono::{DateTime, Local};
use owo_colors::OwoColorize;
use regex::Regex;

mod macros;

const MAX_MEMORY_ENTRIES: usize = 1000;
const REDACTED: &str = "[REDACTED]";

static PRINT: AtomicBool = AtomicBool::new(true);

/// In-memory log of everything printed through the macros.
pub static LOGGER: LazyLock<Mutex<Logger>> = LazyLock::new(|| Mutex::new(Logger::default()));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogType {
    Info,
    Error,
    Point,
}

impl Display for LogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                LogType::Info => "[info]",
                LogType::Error => "[error]",
                LogType::Point => "-",
            }
        )
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub time: DateTime<Local>,
    pub kind: LogType,
    pub message: String,
}

impl Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} {}",
            self.time.format("%Y-%m-%d %H:%M:%S"),
            self.kind,
            self.message
        )
    }
}

#[derive(Debug, Default)]
pub struct Logger {
    entries: VecDeque<LogEntry>,
    file: Option<PathBuf>,
}

impl Logger {
    fn push(&mut self, message: &str, kind: LogType) -> &LogEntry {
        if self.entries.len() >= MAX_MEMORY_ENTRIES {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            time: Local::now(),
            kind,
            message: message.to_owned(),
        });
        // Just pushed, can't be empty.
        &self.entries[self.entries.len() - 1]
    }

    #[must_use]
    pub fn entries(&self) -> &VecDeque<LogEntry> {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Whether the macros should print to the terminal.
#[must_use]
pub fn is_print() -> bool {
    PRINT.load(Ordering::Relaxed)
}

/// Turn terminal output of the macros on or off.
/// Messages are still recorded in [`LOGGER`].
pub fn set_print(enabled: bool) {
    PRINT.store(enabled, Ordering::Relaxed);
}

/// Also append logged messages (not `no_log` ones) to this file.
/// `None` stops writing to a file.
pub fn set_log_file(path: Option<PathBuf>) {
    LOGGER.lock().unwrap_or_else(PoisonError::into_inner).file = path;
}

/// A snapshot of the in-memory log.
#[must_use]
pub fn get_logs() -> Vec<LogEntry> {
    LOGGER
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .entries
        .iter()
        .cloned()
        .collect()
}

pub fn print_to_terminal(msg: &str, kind: LogType) {
    match kind {
        LogType::Info => println!("{} {msg}", kind.yellow()),
        LogType::Point => println!("{} {msg}", kind.bold()),
        LogType::Error => eprintln!("{} {msg}", kind.red()),
    }
}

pub fn print_to_memory(msg: &str, kind: LogType) {
    LOGGER
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(msg, kind);
}

pub fn print_to_file(msg: &str, kind: LogType) {
    let mut logger = LOGGER.lock().unwrap_or_else(PoisonError::into_inner);
    let file = logger.file.clone();
    let line = logger.push(msg, kind).to_string();

    let Some(path) = file else {
        return;
    };
    // A broken log file must never take the caller down with it.
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&path) {
        _ = writeln!(file, "{line}");
    }
}

static REDACTIONS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (
            r#"("(?:access_token|refresh_token|Token|identityToken|RpsTicket)"\s*:\s*")[^"]*(")"#,
            "${1}[REDACTED]${2}",
        ),
        (r"(?i)(bearer\s+)[A-Za-z0-9\-._~+/=]+", "${1}[REDACTED]"),
        (r#"(XBL3\.0 x=)[^\s"]+"#, "${1}[REDACTED]"),
        (r"\b([dt]=)[A-Za-z0-9\-._~+/=!*$]{16,}", "${1}[REDACTED]"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Some((Regex::new(pattern).ok()?, replacement)))
    .collect()
});

/// Mask bearer tokens, Xbox identity tokens, RPS tickets
/// and token fields of JSON bodies.
#[must_use]
pub fn auto_redact(msg: &str) -> String {
    let mut out = msg.to_owned();
    for (regex, replacement) in REDACTIONS.iter() {
        if regex.is_match(&out) {
            out = regex.replace_all(&out, *replacement).into_owned();
        }
    }
    out
}

/// Replace a whole secret with a fixed marker, keeping
/// only its length visible. For `Debug` impls.
#[must_use]
pub fn redact_secret(secret: &str) -> String {
    format!("{REDACTED} (len {})", secret.len())
}
