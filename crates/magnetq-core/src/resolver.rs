//! Submit a batch and recover the handles the daemon assigned to it.
//!
//! The daemon's add call does not return identifiers, so the batch is added
//! under a freshly claimed tag, queried back by that tag, and the tag is
//! removed again. Callers only see `add_and_resolve`.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, instrument, warn};

use crate::daemon::{DaemonClient, DaemonError};
use crate::error::{CoreError, CoreResult};
use crate::model::{AddBatch, JobFilter, TorrentHandle};
use crate::session::Session;
use crate::tag::{TAG_LENGTH, claim_tag};

/// Resolves add-time identifiers through a disposable tag.
#[derive(Debug, Clone, Copy)]
pub struct BatchResolver {
    tag_length: usize,
    rng_seed: Option<u64>,
}

impl Default for BatchResolver {
    fn default() -> Self {
        Self {
            tag_length: TAG_LENGTH,
            rng_seed: None,
        }
    }
}

impl BatchResolver {
    /// Resolver generating tags of `tag_length` characters.
    #[must_use]
    pub const fn with_tag_length(tag_length: usize) -> Self {
        Self {
            tag_length,
            rng_seed: None,
        }
    }

    /// Draw tags from a generator seeded with `seed` instead of OS entropy.
    #[must_use]
    pub const fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Add every distinct link in `batch` paused and return their handles.
    ///
    /// Handles come back in the daemon's listing order, which need not match
    /// the order the links were submitted in.
    ///
    /// # Errors
    ///
    /// - [`CoreError::PartialResolution`] when the tag query does not return
    ///   exactly one handle per distinct link.
    /// - [`CoreError::TagUnavailable`] when no tag could be claimed.
    /// - [`CoreError::Daemon`] when any daemon call fails.
    #[instrument(name = "resolver.add_and_resolve", skip_all, fields(links = batch.links.len()))]
    pub async fn add_and_resolve<C: DaemonClient + ?Sized>(
        &self,
        session: Session<'_, C>,
        batch: &AddBatch,
    ) -> CoreResult<Vec<TorrentHandle>> {
        let links = batch.distinct_links();
        if links.is_empty() {
            debug!("empty batch; skipping daemon round trip");
            return Ok(Vec::new());
        }
        if links.len() != batch.links.len() {
            info!(
                submitted = batch.links.len(),
                distinct = links.len(),
                "dropping duplicate magnet links"
            );
        }

        let client = session.client();
        let mut rng = self
            .rng_seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let tag = claim_tag(session, self.tag_length, &batch.save_path, &mut rng).await?;
        debug!(tag = %tag, "claimed batch tag");

        let submission = AddBatch {
            links,
            save_path: batch.save_path.clone(),
            category: batch.category.clone(),
        };

        let resolved = async {
            client
                .add_batch(&submission, &tag)
                .await
                .map_err(|err| CoreError::daemon("torrents.add", err))?;
            client
                .list_jobs(&JobFilter::Label(tag.clone()))
                .await
                .map_err(|err| CoreError::daemon("torrents.info", err))
        }
        .await;

        // The tag is bookkeeping only; drop it whether or not the add worked.
        let removed = client
            .remove_labels(std::slice::from_ref(&tag))
            .await
            .map_err(|err| CoreError::daemon("categories.remove", err));

        let handles: Vec<TorrentHandle> = resolved?.into_iter().map(|job| job.handle).collect();
        removed?;

        if handles.len() != submission.links.len() {
            warn!(
                expected = submission.links.len(),
                resolved = handles.len(),
                "batch resolution mismatch"
            );
            return Err(CoreError::PartialResolution {
                expected: submission.links.len(),
                resolved: handles.len(),
            });
        }

        if let Some(category) = &batch.category {
            assign_category(session, &handles, category, &batch.save_path).await?;
        }

        info!(tag = %tag, count = handles.len(), "batch added paused");
        Ok(handles)
    }
}

async fn assign_category<C: DaemonClient + ?Sized>(
    session: Session<'_, C>,
    handles: &[TorrentHandle],
    category: &str,
    save_path: &str,
) -> CoreResult<()> {
    let client = session.client();
    match client.create_label(category, save_path).await {
        Ok(()) | Err(DaemonError::Conflict { .. }) => {}
        Err(err) => return Err(CoreError::daemon("categories.create", err)),
    }
    client
        .set_label(handles, category)
        .await
        .map_err(|err| CoreError::daemon("torrents.set_category", err))?;
    debug!(category, count = handles.len(), "destination category applied");
    Ok(())
}
