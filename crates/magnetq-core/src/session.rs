//! Deadline-bounded authentication against the daemon.

use std::time::Duration;

use tracing::{debug, warn};

use crate::daemon::{DaemonClient, DaemonError};
use crate::error::{CoreError, CoreResult};

/// Default bound on the login call.
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Proof of an authenticated daemon session, passed to every later call.
#[derive(Debug)]
pub struct Session<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C: DaemonClient + ?Sized> Session<'a, C> {
    /// Daemon client behind this session.
    #[must_use]
    pub const fn client(&self) -> &'a C {
        self.client
    }
}

impl<C: ?Sized> Clone for Session<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: ?Sized> Copy for Session<'_, C> {}

/// Authenticate, giving up once `timeout` elapses.
///
/// The login future is dropped when the timer wins, so an unreachable daemon
/// never holds the caller.
///
/// # Errors
///
/// - [`CoreError::LoginTimeout`] when the daemon does not answer in time.
/// - [`CoreError::LoginFailed`] when the daemon rejects the credentials.
/// - [`CoreError::Daemon`] for any other failure of the login call.
pub async fn authenticate<C: DaemonClient + ?Sized>(
    client: &C,
    timeout: Duration,
) -> CoreResult<Session<'_, C>> {
    match tokio::time::timeout(timeout, client.login()).await {
        Ok(Ok(())) => {
            debug!("daemon session established");
            Ok(Session { client })
        }
        Ok(Err(DaemonError::Unauthorized)) => {
            warn!("daemon rejected credentials");
            Err(CoreError::LoginFailed)
        }
        Ok(Err(err)) => Err(CoreError::daemon("auth.login", err)),
        Err(_) => {
            warn!(timeout_secs = timeout.as_secs(), "daemon login timed out");
            Err(CoreError::LoginTimeout { timeout })
        }
    }
}
