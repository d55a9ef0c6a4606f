use crate::error::RadarResult;
use crate::logging::{self, Kind};
use crate::model::AnalysisReport;
use crate::storage::LocalStorage;

pub const HISTORY_KEY: &str = "trend_radar_history";
pub const HISTORY_LIMIT: usize = 10;

/// Past reports, newest first, never more than [`HISTORY_LIMIT`].
#[derive(Debug, Default)]
pub struct HistoryStore {
    entries: Vec<AnalysisReport>,
}

impl HistoryStore {
    /// Restore the persisted list. Anything unreadable yields an empty history;
    /// individual reports with out-of-range values are dropped.
    pub fn load(storage: &LocalStorage) -> Self {
        let entries = match storage.get_item(HISTORY_KEY) {
            Ok(Some(text)) => Self::decode(&text),
            Ok(None) => Vec::new(),
            Err(e) => {
                eprintln!("[History] Could not read stored history: {}", e);
                Vec::new()
            }
        };
        logging::log_with(Kind::History, format!("Loaded {} past reports", entries.len()));
        HistoryStore { entries }
    }

    fn decode(text: &str) -> Vec<AnalysisReport> {
        match serde_json::from_str::<Vec<AnalysisReport>>(text) {
            Ok(entries) => entries
                .into_iter()
                .filter(|report| match report.validate() {
                    Ok(()) => true,
                    Err(e) => {
                        debug_eprintln!("[History] Dropping stored report {}: {}", report.id, e);
                        false
                    }
                })
                .take(HISTORY_LIMIT)
                .collect(),
            Err(e) => {
                debug_eprintln!("[History] Discarding unparseable history: {}", e);
                Vec::new()
            }
        }
    }

    fn persist(&self, storage: &LocalStorage) -> RadarResult<()> {
        let text = serde_json::to_string(&self.entries)?;
        storage.set_item(HISTORY_KEY, &text)
    }

    /// Prepend, evict beyond the limit, then write the whole list back.
    pub fn record(&mut self, report: AnalysisReport, storage: &LocalStorage) -> RadarResult<()> {
        self.entries.insert(0, report);
        self.entries.truncate(HISTORY_LIMIT);
        self.persist(storage)
    }

    pub fn select(&self, id: &str) -> Option<&AnalysisReport> {
        self.entries.iter().find(|r| r.id == id)
    }

    pub fn remove(&mut self, id: &str, storage: &LocalStorage) -> RadarResult<bool> {
        let before = self.entries.len();
        self.entries.retain(|r| r.id != id);
        if self.entries.len() == before {
            return Ok(false);
        }
        self.persist(storage)?;
        Ok(true)
    }

    pub fn clear(&mut self, storage: &LocalStorage) -> RadarResult<()> {
        self.entries.clear();
        storage.remove_item(HISTORY_KEY)
    }

    pub fn entries(&self) -> &[AnalysisReport] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures;

    fn storage() -> LocalStorage {
        LocalStorage::open_in_memory().unwrap()
    }

    #[test]
    fn test_empty_storage_loads_empty() {
        let history = HistoryStore::load(&storage());
        assert!(history.is_empty());
    }

    #[test]
    fn test_record_is_newest_first_and_persisted() {
        let storage = storage();
        let mut history = HistoryStore::load(&storage);
        history.record(fixtures::report("a"), &storage).unwrap();
        history.record(fixtures::report("b"), &storage).unwrap();

        let ids: Vec<&str> = history.entries().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        let reloaded = HistoryStore::load(&storage);
        assert_eq!(reloaded.entries(), history.entries());
    }

    #[test]
    fn test_eleventh_record_evicts_oldest() {
        let storage = storage();
        let mut history = HistoryStore::default();
        for i in 0..=HISTORY_LIMIT {
            history.record(fixtures::report(&i.to_string()), &storage).unwrap();
        }

        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.entries()[0].id, HISTORY_LIMIT.to_string());
        assert!(history.select("0").is_none());
        assert!(history.select("1").is_some());

        let reloaded = HistoryStore::load(&storage);
        assert_eq!(reloaded.len(), HISTORY_LIMIT);
        assert_eq!(reloaded.entries()[HISTORY_LIMIT - 1].id, "1");
    }

    #[test]
    fn test_invalid_persisted_data_is_discarded() {
        let storage = storage();
        storage.set_item(HISTORY_KEY, "{not json").unwrap();
        assert!(HistoryStore::load(&storage).is_empty());

        storage.set_item(HISTORY_KEY, "[{\"id\":\"partial\"}]").unwrap();
        assert!(HistoryStore::load(&storage).is_empty());
    }

    #[test]
    fn test_out_of_range_stored_reports_are_dropped() {
        let storage = storage();
        let mut bad = fixtures::report("bad");
        bad.data_freshness.score = 42;
        let mut risky = fixtures::report("risky");
        risky.investments.taiwan_stocks[0].risk_level = 9;
        let reports = vec![bad, fixtures::report("good"), risky];
        storage
            .set_item(HISTORY_KEY, &serde_json::to_string(&reports).unwrap())
            .unwrap();

        let history = HistoryStore::load(&storage);
        assert_eq!(history.len(), 1);
        assert_eq!(history.entries()[0].id, "good");
        assert!(history.select("bad").is_none());
    }

    #[test]
    fn test_oversized_persisted_list_is_truncated() {
        let storage = storage();
        let reports: Vec<_> = (0..15).map(|i| fixtures::report(&i.to_string())).collect();
        storage
            .set_item(HISTORY_KEY, &serde_json::to_string(&reports).unwrap())
            .unwrap();
        let history = HistoryStore::load(&storage);
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.entries()[0].id, "0");
    }

    #[test]
    fn test_select_remove_and_clear() {
        let storage = storage();
        let mut history = HistoryStore::default();
        history.record(fixtures::report("a"), &storage).unwrap();
        history.record(fixtures::report("b"), &storage).unwrap();

        assert_eq!(history.select("a").map(|r| r.title.as_str()), Some("報告 a"));
        assert!(history.remove("a", &storage).unwrap());
        assert!(!history.remove("a", &storage).unwrap());
        assert_eq!(HistoryStore::load(&storage).len(), 1);

        history.clear(&storage).unwrap();
        assert!(history.is_empty());
        assert!(HistoryStore::load(&storage).is_empty());
    }
}
