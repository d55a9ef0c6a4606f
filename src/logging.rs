use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::sync::Mutex;

const MAX_LOG_LINES: usize = 50;

macro_rules! debug_eprintln {
    ($($arg:tt)*) => {
        if std::env::var("TREND_RADAR_DEBUG").is_ok() {
            eprintln!($($arg)*);
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Info,
    Scan,
    Article,
    History,
    Export,
}

impl Kind {
    fn tag(&self) -> &'static str {
        match self {
            Kind::Info => "Info",
            Kind::Scan => "Scan",
            Kind::Article => "Article",
            Kind::History => "History",
            Kind::Export => "Export",
        }
    }
}

/// One status line, stamped when it was recorded.
#[derive(Debug, Clone)]
pub struct Entry {
    pub kind: Kind,
    pub text: String,
    pub at: DateTime<Local>,
}

impl Entry {
    /// `HH:MM:SS [Tag] text`, as shown in the status bar.
    pub fn status_line(&self) -> String {
        format!("{} [{}] {}", self.at.format("%H:%M:%S"), self.kind.tag(), self.text)
    }
}

static ACTIVITY: Lazy<Mutex<VecDeque<Entry>>> =
    Lazy::new(|| Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES)));

/// Record a line in the activity log shown in the status bar.
/// Also echoed to stderr when `TREND_RADAR_DEBUG` is set.
pub fn log_with<T: Into<String>>(kind: Kind, line: T) {
    let entry = Entry { kind, text: line.into(), at: Local::now() };
    debug_eprintln!("{}", entry.status_line());
    let Ok(mut activity) = ACTIVITY.lock() else {
        return;
    };
    while activity.len() >= MAX_LOG_LINES {
        activity.pop_front();
    }
    activity.push_back(entry);
}

/// The last `n` entries, newest first.
pub fn recent(n: usize) -> Vec<Entry> {
    match ACTIVITY.lock() {
        Ok(activity) => activity.iter().rev().take(n).cloned().collect(),
        Err(_) => Vec::new(),
    }
}
