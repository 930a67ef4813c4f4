//! Line-driven live search.
//!
//! Each input line is the current contents of the search box. Lines are
//! debounced through the orchestrator and every settled result is rendered
//! to the output. At end of input the last pending query is still allowed to
//! settle before the session closes.

use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::export::{ExportFormat, ExportOptions, export_results};
use crate::search::clock::Clock;
use crate::search::matcher::Matcher;
use crate::search::orchestrator::{SearchOrchestrator, SearchState};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveSummary {
    pub lines_read: usize,
    pub results_emitted: usize,
}

pub async fn run_live<M, C, R, W>(
    orchestrator: &mut SearchOrchestrator<M, C>,
    input: R,
    out: &mut W,
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<LiveSummary>
where
    M: Matcher,
    C: Clock,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let shutdown = orchestrator.shutdown_token();
    let mut lines = input.lines();
    let mut summary = LiveSummary::default();
    let mut interrupted = false;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                interrupted = true;
                break;
            }
            line = lines.next_line() => match line? {
                Some(text) => {
                    summary.lines_read += 1;
                    orchestrator.update_query(&text);
                    tracing::trace!(state = %orchestrator.state(), "live_input");
                }
                None => break,
            },
            Some(result) = orchestrator.settle() => {
                writeln!(out, "{}", export_results(result, format, options))?;
                out.flush()?;
                summary.results_emitted += 1;
            }
        }
    }

    if !interrupted
        && orchestrator.state() == SearchState::Debouncing
        && let Some(result) = orchestrator.settle().await
    {
        writeln!(out, "{}", export_results(result, format, options))?;
        summary.results_emitted += 1;
    }
    orchestrator.close();
    out.flush()?;

    tracing::info!(
        lines = summary.lines_read,
        results = summary.results_emitted,
        interrupted,
        "live_session_end"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::model::types::Candidate;

    fn orchestrator() -> SearchOrchestrator {
        let candidates = vec![
            Candidate::new(1u64, ["Guitar"]),
            Candidate::new(2u64, ["guitar basics"]),
        ];
        SearchOrchestrator::new(&SearchConfig::default(), candidates)
    }

    fn text_options() -> ExportOptions {
        ExportOptions {
            include_timestamp: false,
            ..ExportOptions::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_settles_once_at_eof() {
        let mut orch = orchestrator();
        let input: &[u8] = b"g\ngu\nguit\nguitar\n";
        let mut out = Vec::new();

        let summary = run_live(&mut orch, input, &mut out, ExportFormat::PlainText, &text_options())
            .await
            .unwrap();

        assert_eq!(summary.lines_read, 4);
        assert_eq!(summary.results_emitted, 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Query: guitar"));
        assert_eq!(text.matches("SEARCH RESULTS").count(), 1);
        assert_eq!(orch.stats().computations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleared_input_emits_nothing() {
        let mut orch = orchestrator();
        let input: &[u8] = b"guitar\n\n";
        let mut out = Vec::new();

        let summary = run_live(&mut orch, input, &mut out, ExportFormat::Json, &text_options())
            .await
            .unwrap();

        assert_eq!(summary.results_emitted, 0);
        assert!(out.is_empty());
        assert_eq!(orch.state(), SearchState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_session_skips_pending() {
        let mut orch = orchestrator();
        orch.shutdown_token().cancel();
        let input: &[u8] = b"guitar\n";
        let mut out = Vec::new();

        let summary = run_live(&mut orch, input, &mut out, ExportFormat::Json, &text_options())
            .await
            .unwrap();

        assert_eq!(summary.results_emitted, 0);
        assert_eq!(orch.stats().computations, 0);
    }
}
