//! Correlation identifier shared by logs, error envelopes, and RPC hops.
//!
//! The inbound middleware installs one identifier per request, reusing the
//! caller's [`TRACE_ID_HEADER`] when it holds a UUID. Outbound RPC clients
//! read [`TraceId::current`] and forward it, so a backfill run and every
//! resolve call it triggers log under the same id. Background jobs without a
//! caller open their own scope with [`TraceId::in_new_scope`].
//!
//! The value lives in a Tokio task-local and is not inherited by spawned
//! tasks.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task_local;
use uuid::Uuid;

/// Header carrying the trace identifier on requests and responses.
pub const TRACE_ID_HEADER: &str = "trace-id";

task_local! {
    static CURRENT: TraceId;
}

/// UUID identifying one request or one scheduled run.
///
/// # Examples
/// ```
/// use city_service::domain::TraceId;
///
/// # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
/// let id = TraceId::generate();
/// let seen = TraceId::scope(id, async { TraceId::current() }).await;
/// assert_eq!(seen, Some(id));
/// assert!(TraceId::current().is_none());
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Identifier installed on the running task, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT.try_with(|id| *id).ok()
    }

    /// Parse a header value, tolerating surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns the UUID parse error when `raw` is not a UUID.
    pub fn from_header(raw: &str) -> Result<Self, uuid::Error> {
        raw.trim().parse()
    }

    /// Run `fut` with `trace_id` installed.
    pub async fn scope<Fut>(trace_id: TraceId, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        CURRENT.scope(trace_id, fut).await
    }

    /// Run `fut` under a freshly generated identifier.
    pub async fn in_new_scope<Fut>(fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        Self::scope(Self::generate(), fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
