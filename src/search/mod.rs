//! Search layer facade.
//!
//! - **[`debounce`]**: trailing-edge debounce with token-based cancellation.
//! - **[`cache`]**: TTL + capacity-bounded result cache and snapshot fingerprints.
//! - **[`clock`]**: injectable time sources for the cache.
//! - **[`matcher`]**: exact/substring ranking and "did you mean" suggestions.
//! - **[`orchestrator`]**: wires the above into one owned search session.

pub mod cache;
pub mod clock;
pub mod debounce;
pub mod matcher;
pub mod orchestrator;

pub use cache::{CacheStats, ResultCache};
pub use debounce::{DebounceGate, GateSignal};
pub use matcher::{MatchEngine, Matcher, SearchError};
pub use orchestrator::{CandidateSet, SearchOrchestrator, SearchState, SearchStats};
