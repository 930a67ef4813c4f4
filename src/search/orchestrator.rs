//! Search orchestrator: debounce → cache → match engine.
//!
//! One orchestrator owns one gate, one cache and one candidate snapshot.
//! Consumers push raw text with [`SearchOrchestrator::update_query`] and
//! drive the pipeline by awaiting [`SearchOrchestrator::settle`], typically
//! inside a `tokio::select!` loop next to their input source:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         line = lines.next_line() => match line? {
//!             Some(text) => orchestrator.update_query(&text),
//!             None => break,
//!         },
//!         Some(result) = orchestrator.settle() => render(result),
//!     }
//! }
//! ```
//!
//! Matcher failures never reach the consumer: they are logged and surface
//! as an empty result.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::cache::{CacheStats, Fingerprint, ResultCache, cache_key};
use super::clock::{Clock, SystemClock};
use super::debounce::{DebounceGate, GateSignal};
use super::matcher::{MatchEngine, Matcher};
use crate::config::SearchConfig;
use crate::model::types::{Candidate, MatchResult, RankedMatch, Suggestion, normalize_label};

/// Shared, read-only candidate snapshot.
pub type CandidateSet = Arc<[Candidate]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// No query; results are empty.
    Idle,
    /// Waiting for input to settle.
    Debouncing,
    /// Settled query is being looked up in the cache.
    Checking,
    /// Cache miss; the matcher is running.
    Loading,
    /// Results for the last settled query are available.
    Ready,
}

impl std::fmt::Display for SearchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Debouncing => "debouncing",
            Self::Checking => "checking",
            Self::Loading => "loading",
            Self::Ready => "ready",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub cache: CacheStats,
    /// Times the matcher was invoked.
    pub computations: u64,
    /// Matcher invocations that returned an error.
    pub failures: u64,
    /// Times the cache was dropped because the snapshot changed.
    pub invalidations: u64,
}

pub struct SearchOrchestrator<M: Matcher = MatchEngine, C: Clock = SystemClock> {
    gate: DebounceGate,
    cache: ResultCache<Arc<MatchResult>, C>,
    matcher: M,
    candidates: CandidateSet,
    fingerprint: Fingerprint,
    state: SearchState,
    current: Arc<MatchResult>,
    computations: u64,
    failures: u64,
    invalidations: u64,
}

impl SearchOrchestrator<MatchEngine, SystemClock> {
    pub fn new(config: &SearchConfig, candidates: impl Into<CandidateSet>) -> Self {
        Self::with_parts(
            DebounceGate::from_config(&config.debounce),
            ResultCache::new(config.cache.ttl(), config.cache.max_size),
            MatchEngine::from_config(&config.matching),
            candidates.into(),
        )
    }
}

impl<M: Matcher, C: Clock> SearchOrchestrator<M, C> {
    pub fn with_parts(
        gate: DebounceGate,
        cache: ResultCache<Arc<MatchResult>, C>,
        matcher: M,
        candidates: CandidateSet,
    ) -> Self {
        let fingerprint = Fingerprint::of(&candidates);
        Self {
            gate,
            cache,
            matcher,
            candidates,
            fingerprint,
            state: SearchState::Idle,
            current: Arc::new(MatchResult::default()),
            computations: 0,
            failures: 0,
            invalidations: 0,
        }
    }

    /// Feed the current contents of the search box.
    ///
    /// Input below the minimum length clears results and cancels any pending
    /// emission immediately; anything else (re)starts the debounce.
    pub fn update_query(&mut self, raw: &str) {
        match self.gate.push(raw) {
            GateSignal::Cleared => self.go_idle(),
            GateSignal::Armed { .. } => self.state = SearchState::Debouncing,
        }
    }

    /// Wait for the pending query to settle and run it.
    ///
    /// Pends while nothing is debouncing; returns `None` once the orchestrator
    /// has been closed or its shutdown token cancelled, leaving a debouncing
    /// query cleared. Cancel-safe.
    pub async fn settle(&mut self) -> Option<&MatchResult> {
        match self.gate.settled().await {
            Some(raw) => {
                self.run(&raw);
                Some(self.current.as_ref())
            }
            None => {
                if self.state == SearchState::Debouncing {
                    self.go_idle();
                }
                None
            }
        }
    }

    /// Run a query immediately, skipping the debounce.
    pub fn search_now(&mut self, raw: &str) -> &MatchResult {
        self.gate.reset();
        if self.gate.accepts(raw) {
            self.run(raw);
        } else {
            self.go_idle();
        }
        self.current.as_ref()
    }

    /// Replace the candidate snapshot. A different allocation drops every
    /// cached result; the same `Arc` is a no-op.
    pub fn set_candidates(&mut self, candidates: impl Into<CandidateSet>) {
        let candidates = candidates.into();
        if Arc::ptr_eq(&self.candidates, &candidates) {
            return;
        }

        self.fingerprint = Fingerprint::of(&candidates);
        self.candidates = candidates;
        self.cache.clear();
        self.invalidations += 1;
        tracing::debug!(
            count = self.candidates.len(),
            fingerprint = %self.fingerprint,
            "candidates_replaced"
        );
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Cancel any pending emission and stop accepting new ones.
    pub fn close(&mut self) {
        self.gate.shutdown();
        if self.state != SearchState::Ready {
            self.go_idle();
        }
    }

    /// Cancelling this token stops any pending or future emission. The next
    /// [`Self::settle`] then clears a debouncing query, as [`Self::close`]
    /// does.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.gate.shutdown_token()
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self.state,
            SearchState::Debouncing | SearchState::Checking | SearchState::Loading
        )
    }

    pub fn result(&self) -> &MatchResult {
        self.current.as_ref()
    }

    pub fn results(&self) -> &[RankedMatch] {
        &self.current.matches
    }

    pub fn suggestion(&self) -> Option<&Suggestion> {
        self.current.suggestion.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.gate.is_pending()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn stats(&self) -> SearchStats {
        SearchStats {
            cache: self.cache.stats(),
            computations: self.computations,
            failures: self.failures,
            invalidations: self.invalidations,
        }
    }

    fn go_idle(&mut self) {
        self.gate.reset();
        self.state = SearchState::Idle;
        self.current = Arc::new(MatchResult::default());
    }

    fn run(&mut self, raw: &str) {
        let query = normalize_label(raw);
        if query.is_empty() {
            self.go_idle();
            return;
        }

        self.state = SearchState::Checking;
        let key = cache_key(&query, &self.fingerprint);
        tracing::info!(
            query = query.as_str(),
            candidates = self.candidates.len(),
            "search_start"
        );

        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(query = query.as_str(), matches = hit.matches.len(), "cache_hit");
            self.current = hit;
            self.state = SearchState::Ready;
            return;
        }

        tracing::debug!(query = query.as_str(), "cache_miss");
        self.state = SearchState::Loading;
        self.computations += 1;
        match self.matcher.search(&self.candidates, raw) {
            Ok(result) => {
                let result = Arc::new(result);
                self.cache.set(key, Arc::clone(&result));
                self.current = result;
            }
            Err(err) => {
                self.failures += 1;
                tracing::warn!(query = query.as_str(), error = %err, "search_failed");
                self.current = Arc::new(MatchResult::empty(query));
            }
        }
        self.state = SearchState::Ready;
    }
}

impl<M: Matcher, C: Clock> Drop for SearchOrchestrator<M, C> {
    fn drop(&mut self) {
        self.gate.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::clock::ManualClock;
    use crate::search::matcher::{SearchError, SearchResult};
    use std::cell::Cell;
    use std::time::Duration;

    struct Counting<'a> {
        inner: MatchEngine,
        calls: &'a Cell<u32>,
    }

    impl Matcher for Counting<'_> {
        fn search(&self, candidates: &[Candidate], raw: &str) -> SearchResult<MatchResult> {
            self.calls.set(self.calls.get() + 1);
            self.inner.search(candidates, raw)
        }
    }

    struct Failing;

    impl Matcher for Failing {
        fn search(&self, _: &[Candidate], _: &str) -> SearchResult<MatchResult> {
            Err(SearchError::Computation("bad candidate row".into()))
        }
    }

    fn candidates() -> CandidateSet {
        vec![
            Candidate::new(1u64, ["Guitar"]),
            Candidate::new(2u64, ["guitar basics"]),
        ]
        .into()
    }

    fn orchestrator<'a>(
        calls: &'a Cell<u32>,
        clock: ManualClock,
    ) -> SearchOrchestrator<Counting<'a>, ManualClock> {
        SearchOrchestrator::with_parts(
            DebounceGate::new(Duration::from_millis(300), 2),
            ResultCache::with_clock(Duration::from_secs(60), 8, clock),
            Counting {
                inner: MatchEngine::default(),
                calls,
            },
            candidates(),
        )
    }

    #[test]
    fn test_search_now_populates_and_caches() {
        let calls = Cell::new(0);
        let mut orch = orchestrator(&calls, ManualClock::new());

        assert_eq!(orch.search_now("guitar").matches.len(), 2);
        assert_eq!(orch.state(), SearchState::Ready);
        assert!(!orch.is_loading());

        orch.search_now("  GUITAR ");
        assert_eq!(calls.get(), 1);
        assert_eq!(orch.stats().cache.hits, 1);
    }

    #[test]
    fn test_expired_entry_recomputes() {
        let calls = Cell::new(0);
        let clock = ManualClock::new();
        let mut orch = orchestrator(&calls, clock.clone());

        orch.search_now("guitar");
        clock.advance(Duration::from_secs(61));
        orch.search_now("guitar");
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_short_query_goes_idle() {
        let calls = Cell::new(0);
        let mut orch = orchestrator(&calls, ManualClock::new());
        orch.search_now("guitar");

        orch.update_query("g");
        assert_eq!(orch.state(), SearchState::Idle);
        assert!(orch.results().is_empty());
        assert!(!orch.is_pending());
        assert!(!orch.is_loading());
    }

    #[test]
    fn test_update_enters_debouncing() {
        let calls = Cell::new(0);
        let mut orch = orchestrator(&calls, ManualClock::new());
        orch.search_now("guitar");

        orch.update_query("piano");
        assert_eq!(orch.state(), SearchState::Debouncing);
        assert!(orch.is_loading());
        assert!(orch.is_pending());
    }

    #[test]
    fn test_failure_surfaces_empty_result() {
        let mut orch = SearchOrchestrator::with_parts(
            DebounceGate::new(Duration::from_millis(10), 1),
            ResultCache::with_clock(Duration::from_secs(60), 8, ManualClock::new()),
            Failing,
            candidates(),
        );

        let result = orch.search_now("guitar");
        assert!(result.matches.is_empty());
        assert!(result.suggestion.is_none());
        assert_eq!(orch.state(), SearchState::Ready);
        assert!(!orch.is_loading());
        assert_eq!(orch.stats().failures, 1);
        // failures are not cached
        assert_eq!(orch.cache_len(), 0);
    }

    #[test]
    fn test_same_snapshot_keeps_cache() {
        let calls = Cell::new(0);
        let mut orch = orchestrator(&calls, ManualClock::new());
        orch.search_now("guitar");

        let same = Arc::clone(orch.candidates());
        orch.set_candidates(same);
        assert_eq!(orch.cache_len(), 1);
        assert_eq!(orch.stats().invalidations, 0);
    }

    #[test]
    fn test_clear_cache_twice() {
        let calls = Cell::new(0);
        let mut orch = orchestrator(&calls, ManualClock::new());
        orch.search_now("guitar");
        orch.clear_cache();
        orch.clear_cache();
        assert_eq!(orch.cache_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_stops_settling() {
        let calls = Cell::new(0);
        let mut orch = orchestrator(&calls, ManualClock::new());
        orch.update_query("guitar");
        orch.close();

        assert!(orch.settle().await.is_none());
        assert_eq!(calls.get(), 0);
        assert_eq!(orch.state(), SearchState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_token_clears_debouncing_query() {
        let calls = Cell::new(0);
        let mut orch = orchestrator(&calls, ManualClock::new());
        orch.update_query("guitar");
        assert!(orch.is_loading());

        orch.shutdown_token().cancel();
        assert!(orch.settle().await.is_none());
        assert_eq!(orch.state(), SearchState::Idle);
        assert!(!orch.is_loading());
        assert!(!orch.is_pending());
        assert!(orch.results().is_empty());
        assert_eq!(calls.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_token_keeps_ready_results() {
        let calls = Cell::new(0);
        let mut orch = orchestrator(&calls, ManualClock::new());
        orch.search_now("guitar");

        orch.shutdown_token().cancel();
        assert!(orch.settle().await.is_none());
        assert_eq!(orch.state(), SearchState::Ready);
        assert_eq!(orch.results().len(), 2);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SearchState::Debouncing.to_string(), "debouncing");
        assert_eq!(SearchState::Ready.to_string(), "ready");
    }
}
