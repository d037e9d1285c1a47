//! Logging around tool calls
//!
//! Every tool runs inside a span named after it, with its input logged on
//! entry and a truncated rendering of its result on exit.

use std::fmt::Debug;
use std::future::Future;

use tracing::{info, info_span, Instrument};

/// Longest result rendering written to the log
const MAX_LOGGED_OUTPUT: usize = 200;

/// Run a tool body, logging its arguments and result.
pub async fn logged<A, T, F>(tool: &'static str, args: &A, call: F) -> T
where
    A: Debug,
    T: Debug,
    F: Future<Output = T>,
{
    let span = info_span!("tool", name = tool);
    async move {
        info!("INPUT: {:?}", args);
        let result = call.await;
        info!("OUTPUT: {}", truncate_for_log(&format!("{:?}", result)));
        result
    }
    .instrument(span)
    .await
}

/// Cut `text` to at most `MAX_LOGGED_OUTPUT` characters, marking the cut with "...".
pub fn truncate_for_log(text: &str) -> String {
    if text.chars().count() <= MAX_LOGGED_OUTPUT {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(MAX_LOGGED_OUTPUT - 3).collect();
    cut.push_str("...");
    cut
}
