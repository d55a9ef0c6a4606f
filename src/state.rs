//! View state and its transitions, independent of the widget tree.

use crate::error::{ErrorKind, RadarError, SharedError};
use crate::history::HistoryStore;
use crate::layout::{LayoutMode, LAYOUT_MODE_KEY};
use crate::logging::{self, Kind};
use crate::model::{AnalysisReport, DrivingForce, Market};
use crate::storage::LocalStorage;

pub const SCAN_FAILED: &str = "掃描目前受阻。請調整輸入信號後重試。";
pub const ARTICLE_FAILED: &str = "文章生成失敗。";

/// Identifies one in-flight analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTicket(u64);

/// Identifies one in-flight article request for a given report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleTicket {
    seq: u64,
    report_id: String,
}

#[derive(Debug)]
pub enum ArticleRequest {
    NoReport,
    /// Article already generated for this report; only the view reopens.
    Cached,
    /// Generation for this report is already running.
    InFlight,
    Issue(ArticleTicket, AnalysisReport),
}

#[derive(Debug, Default)]
pub struct ArticleState {
    pub generating: bool,
    pub content: Option<String>,
}

pub struct RadarState {
    pub query: String,
    pub scanning: bool,
    pub result: Option<AnalysisReport>,
    pub error: Option<String>,
    pub selected_force: Option<DrivingForce>,
    pub show_thought: bool,
    pub show_article: bool,
    pub market: Market,
    pub article: ArticleState,
    pub layout_mode: LayoutMode,
    history: HistoryStore,
    storage: LocalStorage,
    scan_seq: u64,
    article_seq: u64,
}

impl RadarState {
    pub fn new(storage: LocalStorage) -> Self {
        let history = HistoryStore::load(&storage);
        let layout_mode = match storage.get_item(LAYOUT_MODE_KEY) {
            Ok(Some(value)) => LayoutMode::parse(&value).unwrap_or_default(),
            _ => LayoutMode::default(),
        };

        RadarState {
            query: String::new(),
            scanning: false,
            result: None,
            error: None,
            selected_force: None,
            show_thought: false,
            show_article: false,
            market: Market::default(),
            article: ArticleState::default(),
            layout_mode,
            history,
            storage,
            scan_seq: 0,
            article_seq: 0,
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Start a scan for `query`. Blank input leaves the state untouched.
    pub fn begin_scan(&mut self, query: &str) -> Option<ScanTicket> {
        if query.trim().is_empty() {
            return None;
        }

        self.scan_seq += 1;
        self.scanning = true;
        self.error = None;
        self.result = None;
        self.selected_force = None;
        self.show_thought = false;
        self.show_article = false;
        self.article = ArticleState::default();

        logging::log_with(Kind::Scan, format!("Scanning: {}", query.trim()));
        Some(ScanTicket(self.scan_seq))
    }

    /// Apply a finished scan. Returns false when a newer scan superseded it.
    pub fn finish_scan(
        &mut self,
        ticket: ScanTicket,
        outcome: Result<AnalysisReport, SharedError>,
    ) -> bool {
        if ticket.0 != self.scan_seq {
            debug_eprintln!("[Scan] Dropping stale result for ticket {}", ticket.0);
            return false;
        }

        self.scanning = false;
        match outcome {
            Ok(report) => {
                logging::log_with(Kind::Scan, format!("Report ready: {}", report.title));
                if let Err(e) = self.history.record(report.clone(), &self.storage) {
                    eprintln!("[History] Failed to persist history: {}", e);
                }
                self.error = None;
                self.result = Some(report);
            }
            Err(e) => {
                eprintln!("[Scan] Analysis failed: {}", e);
                logging::log_with(Kind::Scan, describe_failure(&e));
                self.result = None;
                self.error = Some(SCAN_FAILED.to_string());
            }
        }
        true
    }

    pub fn request_article(&mut self) -> ArticleRequest {
        let Some(report) = self.result.as_ref() else {
            return ArticleRequest::NoReport;
        };

        self.show_article = true;
        if self.article.content.is_some() {
            return ArticleRequest::Cached;
        }
        if self.article.generating {
            return ArticleRequest::InFlight;
        }

        self.article_seq += 1;
        self.article.generating = true;
        self.error = None;
        logging::log_with(Kind::Article, format!("Writing article for: {}", report.title));
        ArticleRequest::Issue(
            ArticleTicket {
                seq: self.article_seq,
                report_id: report.id.clone(),
            },
            report.clone(),
        )
    }

    /// Apply a finished article. Ignored if the report changed meanwhile.
    pub fn finish_article(&mut self, ticket: ArticleTicket, outcome: Result<String, SharedError>) -> bool {
        let current = self.result.as_ref().map(|r| r.id.as_str());
        if ticket.seq != self.article_seq || current != Some(ticket.report_id.as_str()) {
            debug_eprintln!("[Article] Dropping stale article for report {}", ticket.report_id);
            return false;
        }

        self.article.generating = false;
        match outcome {
            Ok(text) => {
                logging::log_with(Kind::Article, format!("Article ready ({} chars)", text.chars().count()));
                self.error = None;
                self.article.content = Some(text);
            }
            Err(e) => {
                eprintln!("[Article] Generation failed: {}", e);
                logging::log_with(Kind::Article, describe_failure(&e));
                self.error = Some(ARTICLE_FAILED.to_string());
            }
        }
        true
    }

    /// Failure message for the article page: set only when nothing is
    /// running and no article exists for the current report.
    pub fn article_failure(&self) -> Option<&str> {
        if self.article.generating || self.article.content.is_some() {
            return None;
        }
        self.error.as_deref()
    }

    /// Re-display a stored report.
    pub fn select_history(&mut self, id: &str) -> bool {
        let Some(report) = self.history.select(id).cloned() else {
            return false;
        };
        // Any scan still running no longer owns the view.
        self.scan_seq += 1;
        self.scanning = false;
        self.error = None;
        self.selected_force = None;
        self.show_thought = false;
        self.show_article = false;
        self.article = ArticleState::default();
        self.result = Some(report);
        true
    }

    pub fn remove_history(&mut self, id: &str) {
        match self.history.remove(id, &self.storage) {
            Ok(true) => logging::log_with(Kind::History, "Removed a past report"),
            Ok(false) => {}
            Err(e) => eprintln!("[History] Failed to persist history: {}", e),
        }
    }

    pub fn clear_history(&mut self) {
        if let Err(e) = self.history.clear(&self.storage) {
            eprintln!("[History] Failed to clear history: {}", e);
        }
        logging::log_with(Kind::History, "History cleared");
    }

    pub fn select_force(&mut self, force: DrivingForce) {
        if self.result.is_some() {
            self.selected_force = Some(force);
        }
    }

    pub fn close_modals(&mut self) {
        self.selected_force = None;
        self.show_article = false;
    }

    pub fn toggle_thought(&mut self) {
        self.show_thought = !self.show_thought;
    }

    pub fn set_market(&mut self, market: Market) {
        self.market = market;
    }

    pub fn set_layout_mode(&mut self, mode: LayoutMode) {
        self.layout_mode = mode;
        if let Err(e) = self.storage.set_item(LAYOUT_MODE_KEY, mode.as_str()) {
            eprintln!("[Layout] Failed to persist layout mode: {}", e);
        }
    }
}

fn describe_failure(e: &RadarError) -> String {
    match e.kind() {
        ErrorKind::Request => format!("Request failed: {}", e),
        ErrorKind::Parse => format!("Unreadable reply: {}", e),
        ErrorKind::Persistence => format!("Storage problem: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HISTORY_LIMIT;
    use crate::model::fixtures;

    fn state() -> RadarState {
        RadarState::new(LocalStorage::open_in_memory().unwrap())
    }

    #[test]
    fn test_blank_query_is_a_no_op() {
        let mut state = state();
        for query in ["", "   ", "\n\t"] {
            assert!(state.begin_scan(query).is_none());
        }
        assert!(!state.scanning);
        assert!(state.error.is_none());
        assert!(state.result.is_none());
    }

    #[test]
    fn test_scan_success_sets_result_not_error() {
        let mut state = state();
        let ticket = state.begin_scan("AI 晶片供應鏈").unwrap();
        assert!(state.scanning);
        assert!(state.error.is_none());

        assert!(state.finish_scan(ticket, Ok(fixtures::report("a"))));
        assert!(!state.scanning);
        assert!(state.result.is_some());
        assert!(state.error.is_none());
        assert_eq!(state.history().entries()[0].id, "a");
    }

    #[test]
    fn test_scan_failure_sets_error_not_result() {
        let mut state = state();
        let ticket = state.begin_scan("AI").unwrap();
        assert!(state.finish_scan(ticket, Err(RadarError::EmptyReply.into())));
        assert!(!state.scanning);
        assert!(state.result.is_none());
        assert_eq!(state.error.as_deref(), Some(SCAN_FAILED));
        assert!(state.history().is_empty());
    }

    #[test]
    fn test_new_scan_clears_previous_error_and_article() {
        let mut state = state();
        let ticket = state.begin_scan("first").unwrap();
        state.finish_scan(ticket, Ok(fixtures::report("a")));
        if let ArticleRequest::Issue(t, _) = state.request_article() {
            state.finish_article(t, Ok("文章".to_string()));
        }
        state.error = Some("old".to_string());

        state.begin_scan("second").unwrap();
        assert!(state.error.is_none());
        assert!(state.result.is_none());
        assert!(state.article.content.is_none());
        assert!(!state.show_article);
    }

    #[test]
    fn test_latest_scan_wins() {
        let mut state = state();
        let first = state.begin_scan("first").unwrap();
        let second = state.begin_scan("second").unwrap();

        assert!(state.finish_scan(second, Ok(fixtures::report("new"))));
        assert!(!state.finish_scan(first, Ok(fixtures::report("old"))));
        assert_eq!(state.result.as_ref().unwrap().id, "new");
        assert_eq!(state.history().len(), 1);
    }

    #[test]
    fn test_stale_failure_does_not_clobber_scanning() {
        let mut state = state();
        let first = state.begin_scan("first").unwrap();
        let _second = state.begin_scan("second").unwrap();
        assert!(!state.finish_scan(first, Err(RadarError::EmptyReply.into())));
        assert!(state.scanning);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_article_is_cached_per_report() {
        let mut state = state();
        assert!(matches!(state.request_article(), ArticleRequest::NoReport));

        let ticket = state.begin_scan("AI").unwrap();
        state.finish_scan(ticket, Ok(fixtures::report("a")));

        let ArticleRequest::Issue(article_ticket, report) = state.request_article() else {
            panic!("expected a network request");
        };
        assert_eq!(report.id, "a");
        assert!(matches!(state.request_article(), ArticleRequest::InFlight));

        assert!(state.finish_article(article_ticket, Ok("深度專題".to_string())));
        state.close_modals();
        assert!(matches!(state.request_article(), ArticleRequest::Cached));
        assert!(state.show_article);
        assert_eq!(state.article.content.as_deref(), Some("深度專題"));
    }

    #[test]
    fn test_article_failure_allows_retry() {
        let mut state = state();
        let ticket = state.begin_scan("AI").unwrap();
        state.finish_scan(ticket, Ok(fixtures::report("a")));

        let ArticleRequest::Issue(t, _) = state.request_article() else {
            panic!("expected a network request");
        };
        state.finish_article(t, Err(RadarError::EmptyReply.into()));
        assert_eq!(state.error.as_deref(), Some(ARTICLE_FAILED));
        assert!(!state.article.generating);
        assert!(matches!(state.request_article(), ArticleRequest::Issue(..)));
    }

    #[test]
    fn test_successful_retry_clears_article_failure() {
        let mut state = state();
        let ticket = state.begin_scan("AI").unwrap();
        state.finish_scan(ticket, Ok(fixtures::report("a")));

        let ArticleRequest::Issue(t, _) = state.request_article() else {
            panic!("expected a network request");
        };
        state.finish_article(t, Err(RadarError::EmptyReply.into()));
        assert_eq!(state.error.as_deref(), Some(ARTICLE_FAILED));
        assert!(state.show_article);
        assert_eq!(state.article_failure(), Some(ARTICLE_FAILED));

        let ArticleRequest::Issue(t, _) = state.request_article() else {
            panic!("expected a retry request");
        };
        assert!(state.error.is_none());
        assert!(state.article_failure().is_none());
        assert!(state.finish_article(t, Ok("article".to_string())));
        assert_eq!(state.article.content.as_deref(), Some("article"));
        assert!(state.error.is_none());
    }

    #[test]
    fn test_article_for_replaced_report_is_dropped() {
        let mut state = state();
        let ticket = state.begin_scan("AI").unwrap();
        state.finish_scan(ticket, Ok(fixtures::report("a")));
        let ArticleRequest::Issue(t, _) = state.request_article() else {
            panic!("expected a network request");
        };

        let ticket = state.begin_scan("other").unwrap();
        state.finish_scan(ticket, Ok(fixtures::report("b")));
        assert!(!state.finish_article(t, Ok("stale".to_string())));
        assert!(state.article.content.is_none());
    }

    #[test]
    fn test_history_selection_and_cap() {
        let mut state = state();
        for i in 0..(HISTORY_LIMIT + 1) {
            let ticket = state.begin_scan("q").unwrap();
            state.finish_scan(ticket, Ok(fixtures::report(&i.to_string())));
        }
        assert_eq!(state.history().len(), HISTORY_LIMIT);

        assert!(state.select_history("3"));
        assert_eq!(state.result.as_ref().unwrap().id, "3");
        assert!(!state.select_history("0"));

        state.remove_history("3");
        assert_eq!(state.history().len(), HISTORY_LIMIT - 1);
        state.clear_history();
        assert!(state.history().is_empty());
    }

    #[test]
    fn test_selecting_history_supersedes_running_scan() {
        let mut state = state();
        let ticket = state.begin_scan("q").unwrap();
        state.finish_scan(ticket, Ok(fixtures::report("a")));

        let running = state.begin_scan("q2").unwrap();
        assert!(state.select_history("a"));
        assert!(!state.scanning);
        assert!(!state.finish_scan(running, Ok(fixtures::report("late"))));
        assert_eq!(state.result.as_ref().unwrap().id, "a");
    }

    #[test]
    fn test_escape_closes_modals() {
        let mut state = state();
        let ticket = state.begin_scan("q").unwrap();
        state.finish_scan(ticket, Ok(fixtures::report("a")));
        state.select_force(DrivingForce::Energy);
        state.request_article();
        state.close_modals();
        assert!(state.selected_force.is_none());
        assert!(!state.show_article);
    }

    #[test]
    fn test_layout_mode_persists() {
        let storage = LocalStorage::open_in_memory().unwrap();
        storage.set_item(LAYOUT_MODE_KEY, "mobile").unwrap();
        let mut state = RadarState::new(storage);
        assert_eq!(state.layout_mode, LayoutMode::Mobile);

        state.set_layout_mode(LayoutMode::Desktop);
        assert_eq!(
            state.storage.get_item(LAYOUT_MODE_KEY).unwrap().as_deref(),
            Some("desktop")
        );
    }

    #[test]
    fn test_unknown_layout_mode_falls_back_to_auto() {
        let storage = LocalStorage::open_in_memory().unwrap();
        storage.set_item(LAYOUT_MODE_KEY, "tablet").unwrap();
        assert_eq!(RadarState::new(storage).layout_mode, LayoutMode::Auto);
    }
}
