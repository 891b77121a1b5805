use tokio_util::sync::CancellationToken;

/// Owner scope for sessions.
///
/// Every [`Session`](crate::session::Session) is opened against a lifecycle and is
/// cancelled when it ends, either through [`Lifecycle::end`] or by dropping it.
/// Background work started by a session never outlives its lifecycle.
#[derive(Debug, Default)]
pub struct Lifecycle {
    token: CancellationToken,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ends the lifecycle, cancelling every session opened in it.
    pub fn end(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!("lifecycle ended");
        }
        self.token.cancel();
    }

    pub fn is_ended(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        self.end();
    }
}
