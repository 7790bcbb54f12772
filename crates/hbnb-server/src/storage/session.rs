//! Request-scoped storage sessions
//!
//! Every request runs inside [`scope`], so engines that stage writes can keep
//! one unit of work per request. Code outside any scope (startup, tests)
//! shares [`SessionId::DEFAULT`].

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

tokio::task_local! {
    static SESSION: SessionId;
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub const DEFAULT: SessionId = SessionId(0);

    /// Session of the running task
    pub fn current() -> Self {
        SESSION.try_with(|id| *id).unwrap_or(Self::DEFAULT)
    }
}

/// Run `fut` in a fresh session.
pub async fn scope<F: Future>(fut: F) -> F::Output {
    let id = SessionId(NEXT_ID.fetch_add(1, Ordering::Relaxed));
    SESSION.scope(id, fut).await
}
