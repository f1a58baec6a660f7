//! Disposable grouping labels used to recover the handles of a fresh batch.

use std::collections::HashSet;

use rand::Rng;
use tracing::debug;

use crate::daemon::{DaemonClient, DaemonError};
use crate::error::{CoreError, CoreResult};
use crate::session::Session;

/// Length of a generated tag.
pub const TAG_LENGTH: usize = 5;

/// Upper bound on generate-and-claim attempts before giving up.
pub const MAX_TAG_ATTEMPTS: usize = 64;

const TAG_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Random string of lowercase ASCII letters and digits.
#[must_use]
pub fn generate_tag<R: Rng + ?Sized>(len: usize, rng: &mut R) -> String {
    std::iter::repeat_with(|| char::from(TAG_CHARSET[rng.random_range(0..TAG_CHARSET.len())]))
        .take(len)
        .collect()
}

/// Generate tags until one is absent from `existing`.
///
/// # Errors
///
/// Returns [`CoreError::TagUnavailable`] after [`MAX_TAG_ATTEMPTS`] collisions.
pub fn generate_unique_tag<R: Rng + ?Sized>(
    existing: &HashSet<String>,
    len: usize,
    rng: &mut R,
) -> CoreResult<String> {
    for _ in 0..MAX_TAG_ATTEMPTS {
        let candidate = generate_tag(len, rng);
        if !existing.contains(&candidate) {
            return Ok(candidate);
        }
        debug!(tag = %candidate, "tag collides with existing label; regenerating");
    }
    Err(CoreError::TagUnavailable {
        attempts: MAX_TAG_ATTEMPTS,
    })
}

/// Pick a tag unused on the daemon and create it there.
///
/// The listing check and the creation are separate calls, so a conflict on
/// creation means another client claimed the same name in between; that
/// candidate is dropped and generation starts over.
///
/// # Errors
///
/// Returns [`CoreError::TagUnavailable`] when every attempt collides, or
/// [`CoreError::Daemon`] when a daemon call fails outright.
pub async fn claim_tag<C, R>(
    session: Session<'_, C>,
    len: usize,
    save_path: &str,
    rng: &mut R,
) -> CoreResult<String>
where
    C: DaemonClient + ?Sized,
    R: Rng + Send + ?Sized,
{
    let client = session.client();
    let mut taken = client
        .labels()
        .await
        .map_err(|err| CoreError::daemon("categories.list", err))?;

    for _ in 0..MAX_TAG_ATTEMPTS {
        let candidate = generate_unique_tag(&taken, len, rng)?;
        match client.create_label(&candidate, save_path).await {
            Ok(()) => return Ok(candidate),
            Err(DaemonError::Conflict { .. }) => {
                debug!(tag = %candidate, "tag claimed concurrently; regenerating");
                taken.insert(candidate);
            }
            Err(err) => return Err(CoreError::daemon("categories.create", err)),
        }
    }
    Err(CoreError::TagUnavailable {
        attempts: MAX_TAG_ATTEMPTS,
    })
}
