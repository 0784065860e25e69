//! Cancellation source/token pair owned by a context.

use tokio_util::sync::CancellationToken;

/// Owns a context's cancellation state. Downstream handlers observe the
/// token; only the owning side (pool disposal, hosting layer) cancels.
#[derive(Debug, Clone, Default)]
pub struct CancellationSource {
    token: CancellationToken,
}

impl CancellationSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token handed to downstream handlers. Clones share the same state.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
