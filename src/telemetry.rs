//! Telemetry metric name constants.
//!
//! Centralised metric names for mimir operations. Consumers install their
//! own `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `mimir_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `operation`: backend operation (e.g. "summarize", "list_documents")
//! - `cache`: result cache name (e.g. "documents", "search")
//! - `status`: outcome: "ok" or "error"

/// Total requests sent to the backend (each attempt counts once).
///
/// Labels: `operation`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "mimir_requests_total";

/// Total automatic retries after a rate limit (not counting the first attempt).
///
/// Labels: `operation`.
pub const RETRIES_TOTAL: &str = "mimir_retries_total";

/// Total result cache hits.
///
/// Labels: `cache`.
pub const CACHE_HITS_TOTAL: &str = "mimir_cache_hits_total";

/// Total result cache misses (absent or expired).
///
/// Labels: `cache`.
pub const CACHE_MISSES_TOTAL: &str = "mimir_cache_misses_total";

/// Callers that joined an already in-flight request instead of issuing one.
///
/// Labels: `operation`.
pub const DEDUP_JOINS_TOTAL: &str = "mimir_dedup_joins_total";

/// Calls rejected because the same operation settled too recently.
///
/// Labels: `operation`.
pub const THROTTLED_TOTAL: &str = "mimir_throttled_total";

/// Requests abandoned because their view session was cancelled.
///
/// Labels: `operation`.
pub const CANCELLED_TOTAL: &str = "mimir_cancelled_total";

/// Responses answered in server fallback mode.
///
/// Labels: `operation`.
pub const FALLBACKS_TOTAL: &str = "mimir_fallbacks_total";
