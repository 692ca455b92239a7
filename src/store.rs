//! Holder for the current index
//!
//! Loads complete out of band. Each load takes a ticket when it starts; when
//! it finishes, its index is installed only if no later load has started in
//! the meantime. The installed index is swapped as a whole and never edited,
//! so a reader holding an `Arc` keeps a consistent snapshot.

use crate::index::GroupedIndex;
use crate::loader::LoadStats;
use std::sync::{Arc, Mutex, MutexGuard};

/// Marks a started load; redeemed with `complete` or `fail`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What happened to a finished load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The index is now current
    Installed,
    /// The load failed; the previous index stays current
    Failed,
    /// A newer load was started; the result was discarded
    Superseded,
}

#[derive(Debug, Default)]
struct StoreState {
    latest_started: u64,
    settled_generation: u64,
    installed_generation: u64,
    index: Arc<GroupedIndex>,
    stats: Option<LoadStats>,
    last_error: Option<String>,
}

/// The current index plus bookkeeping for in-flight loads.
#[derive(Debug, Default)]
pub struct IndexStore {
    state: Mutex<StoreState>,
}

impl IndexStore {
    /// An empty store; queries against it return nothing until a load lands.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // State is only ever replaced field-by-field under the lock, so a
        // poisoned guard still holds consistent data.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register the start of a load. Supersedes every earlier ticket.
    pub fn begin_load(&self) -> LoadTicket {
        let mut state = self.lock();
        state.latest_started += 1;
        LoadTicket {
            generation: state.latest_started,
        }
    }

    /// Install the result of a finished load unless it has been superseded.
    pub fn complete(&self, ticket: LoadTicket, index: GroupedIndex, stats: LoadStats) -> LoadOutcome {
        let mut state = self.lock();
        if ticket.generation != state.latest_started {
            log::info!(
                "Discarding load #{}; load #{} was started after it",
                ticket.generation,
                state.latest_started
            );
            return LoadOutcome::Superseded;
        }
        state.index = Arc::new(index);
        state.settled_generation = ticket.generation;
        state.installed_generation = ticket.generation;
        state.stats = Some(stats);
        state.last_error = None;
        LoadOutcome::Installed
    }

    /// Record a failed load. The current index stays in place.
    pub fn fail(&self, ticket: LoadTicket, error: &anyhow::Error) -> LoadOutcome {
        let mut state = self.lock();
        if ticket.generation != state.latest_started {
            log::info!(
                "Ignoring failure of superseded load #{}: {:#}",
                ticket.generation,
                error
            );
            return LoadOutcome::Superseded;
        }
        log::error!("Load #{} failed: {:#}", ticket.generation, error);
        state.settled_generation = ticket.generation;
        state.last_error = Some(format!("{:#}", error));
        LoadOutcome::Failed
    }

    /// Snapshot of the installed index
    pub fn current(&self) -> Arc<GroupedIndex> {
        Arc::clone(&self.lock().index)
    }

    /// Statistics of the installed index, if any load has succeeded
    pub fn stats(&self) -> Option<LoadStats> {
        self.lock().stats
    }

    /// Error message of the most recent load, if it failed
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    /// Generation of the installed index; 0 before the first successful load
    pub fn installed_generation(&self) -> u64 {
        self.lock().installed_generation
    }

    pub fn is_loading(&self) -> bool {
        let state = self.lock();
        state.latest_started > state.settled_generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Record, ResultValue};

    fn index_of(discipline: &str) -> GroupedIndex {
        GroupedIndex::build(vec![Record {
            score: 100,
            discipline: discipline.to_string(),
            result: ResultValue::default(),
            gender_code: "M".to_string(),
            environment: String::new(),
        }])
    }

    #[test]
    fn test_starts_empty() {
        let store = IndexStore::new();
        assert!(store.current().is_empty());
        assert_eq!(store.stats(), None);
        assert_eq!(store.installed_generation(), 0);
        assert!(!store.is_loading());
    }

    #[test]
    fn test_complete_installs() {
        let store = IndexStore::new();
        let ticket = store.begin_load();
        assert!(store.is_loading());
        let outcome = store.complete(ticket, index_of("100m"), LoadStats::default());
        assert_eq!(outcome, LoadOutcome::Installed);
        assert!(store.current().contains("100m"));
        assert_eq!(store.installed_generation(), 1);
        assert!(!store.is_loading());
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let store = IndexStore::new();
        let first = store.begin_load();
        let second = store.begin_load();

        assert_eq!(
            store.complete(second, index_of("new"), LoadStats::default()),
            LoadOutcome::Installed
        );
        assert_eq!(
            store.complete(first, index_of("old"), LoadStats::default()),
            LoadOutcome::Superseded
        );
        let current = store.current();
        assert!(current.contains("new"));
        assert!(!current.contains("old"));
    }

    #[test]
    fn test_failure_keeps_previous_index() {
        let store = IndexStore::new();
        let t = store.begin_load();
        store.complete(t, index_of("100m"), LoadStats::default());

        let t = store.begin_load();
        assert_eq!(
            store.fail(t, &anyhow::anyhow!("connection refused")),
            LoadOutcome::Failed
        );
        assert!(store.current().contains("100m"));
        assert_eq!(store.last_error().as_deref(), Some("connection refused"));
        assert!(!store.is_loading());
    }

    #[test]
    fn test_snapshot_survives_swap() {
        let store = IndexStore::new();
        let t = store.begin_load();
        store.complete(t, index_of("first"), LoadStats::default());
        let snapshot = store.current();

        let t = store.begin_load();
        store.complete(t, index_of("second"), LoadStats::default());
        assert!(snapshot.contains("first"));
        assert!(store.current().contains("second"));
    }
}
