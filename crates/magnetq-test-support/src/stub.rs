//! Scripted in-memory daemon.
//!
//! Every call is appended to an ordered log so tests can assert on call
//! sequencing. Resumed jobs report an active state for a configurable number
//! of observations before flipping to `pausedUP`.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use magnetq_core::{
    AddBatch, DaemonClient, DaemonError, DaemonResult, JobEntry, JobFilter, MagnetLink,
    TorrentHandle, TorrentState,
};

/// How the stub answers `login`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginBehavior {
    /// Accept the credentials.
    #[default]
    Accept,
    /// Reject the credentials.
    Reject,
    /// Never answer.
    Hang,
}

/// One recorded interaction with the stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonCall {
    /// `login` was called.
    Login,
    /// `labels` was called.
    Labels,
    /// `create_label` was called.
    CreateLabel(String),
    /// `add_batch` was called.
    AddBatch {
        /// Label the batch was tagged with.
        label: String,
        /// Destination directory.
        save_path: String,
        /// Links submitted.
        links: Vec<MagnetLink>,
    },
    /// `list_jobs` was called.
    ListJobs(JobFilter),
    /// A job state was reported back from `list_jobs`.
    Observed {
        /// Job reported.
        handle: TorrentHandle,
        /// State reported.
        state: TorrentState,
    },
    /// `set_label` was called.
    SetLabel {
        /// Jobs relabelled.
        handles: Vec<TorrentHandle>,
        /// New label.
        label: String,
    },
    /// `remove_labels` was called.
    RemoveLabels(Vec<String>),
    /// `resume` was called.
    Resume(Vec<TorrentHandle>),
    /// `delete` was called.
    Delete {
        /// Jobs removed.
        handles: Vec<TorrentHandle>,
        /// Whether data deletion was requested.
        delete_files: bool,
    },
}

#[derive(Debug, Clone)]
struct StubJob {
    handle: TorrentHandle,
    link: Option<MagnetLink>,
    label: Option<String>,
    state: TorrentState,
    polls_remaining: usize,
}

#[derive(Debug, Default)]
struct Inner {
    labels: BTreeSet<String>,
    hidden_labels: HashSet<String>,
    jobs: Vec<StubJob>,
    calls: Vec<DaemonCall>,
    next_id: usize,
    completion_polls: usize,
    dropped_adds: usize,
    forced_conflicts: usize,
}

/// In-memory test double for the daemon.
#[derive(Debug, Default)]
pub struct StubDaemon {
    login: LoginBehavior,
    inner: Mutex<Inner>,
}

impl StubDaemon {
    /// Stub that accepts logins and completes jobs on the first observation after resume.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `login` according to `behavior`.
    #[must_use]
    pub fn with_login(mut self, behavior: LoginBehavior) -> Self {
        self.login = behavior;
        self
    }

    /// Report an active state for `polls` observations after resume before completing.
    #[must_use]
    pub fn with_completion_after(self, polls: usize) -> Self {
        self.lock().completion_polls = polls;
        self
    }

    /// Labels already present and visible in the listing.
    #[must_use]
    pub fn with_labels<I, S>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock().labels.extend(labels.into_iter().map(Into::into));
        self
    }

    /// Labels that conflict on creation but are missing from the listing,
    /// as if another client created them after the listing was taken.
    #[must_use]
    pub fn with_hidden_labels<I, S>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock()
            .hidden_labels
            .extend(labels.into_iter().map(Into::into));
        self
    }

    /// Answer the next `count` label creations with a conflict, as if another
    /// client created each name just before this one.
    #[must_use]
    pub fn with_create_conflicts(self, count: usize) -> Self {
        self.lock().forced_conflicts = count;
        self
    }

    /// Silently skip registering the last `count` links of every add.
    #[must_use]
    pub fn with_dropped_adds(self, count: usize) -> Self {
        self.lock().dropped_adds = count;
        self
    }

    /// Seed a pre-existing job.
    #[must_use]
    pub fn with_job(self, handle: &str, state: TorrentState, label: Option<&str>) -> Self {
        self.lock().jobs.push(StubJob {
            handle: TorrentHandle::new(handle),
            link: None,
            label: label.map(str::to_string),
            state,
            polls_remaining: 0,
        });
        self
    }

    /// Ordered log of every call made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<DaemonCall> {
        self.lock().calls.clone()
    }

    /// Arguments of every `resume` call, in order.
    #[must_use]
    pub fn resume_calls(&self) -> Vec<Vec<TorrentHandle>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DaemonCall::Resume(handles) => Some(handles),
                _ => None,
            })
            .collect()
    }

    /// Arguments of every `delete` call, in order.
    #[must_use]
    pub fn delete_calls(&self) -> Vec<(Vec<TorrentHandle>, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DaemonCall::Delete {
                    handles,
                    delete_files,
                } => Some((handles, delete_files)),
                _ => None,
            })
            .collect()
    }

    /// Labels currently visible on the stub.
    #[must_use]
    pub fn labels_snapshot(&self) -> BTreeSet<String> {
        self.lock().labels.clone()
    }

    /// Handles of every job still registered.
    #[must_use]
    pub fn job_handles(&self) -> Vec<TorrentHandle> {
        self.lock()
            .jobs
            .iter()
            .map(|job| job.handle.clone())
            .collect()
    }

    /// Label currently attached to `handle`.
    #[must_use]
    pub fn label_of(&self, handle: &TorrentHandle) -> Option<String> {
        self.lock()
            .jobs
            .iter()
            .find(|job| &job.handle == handle)
            .and_then(|job| job.label.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn observe(&mut self, index: usize) -> JobEntry {
        let job = &mut self.jobs[index];
        if matches!(job.state, TorrentState::Downloading) {
            if job.polls_remaining == 0 {
                job.state = TorrentState::PausedUpload;
            } else {
                job.polls_remaining -= 1;
            }
        }
        let entry = JobEntry {
            handle: job.handle.clone(),
            state: job.state.clone(),
        };
        self.calls.push(DaemonCall::Observed {
            handle: entry.handle.clone(),
            state: entry.state.clone(),
        });
        entry
    }
}

#[async_trait]
impl DaemonClient for StubDaemon {
    async fn login(&self) -> DaemonResult<()> {
        self.lock().calls.push(DaemonCall::Login);
        match self.login {
            LoginBehavior::Accept => Ok(()),
            LoginBehavior::Reject => Err(DaemonError::Unauthorized),
            LoginBehavior::Hang => std::future::pending().await,
        }
    }

    async fn labels(&self) -> DaemonResult<HashSet<String>> {
        let mut inner = self.lock();
        inner.calls.push(DaemonCall::Labels);
        Ok(inner.labels.iter().cloned().collect())
    }

    async fn create_label(&self, label: &str, _save_path: &str) -> DaemonResult<()> {
        let mut inner = self.lock();
        inner.calls.push(DaemonCall::CreateLabel(label.to_string()));
        let raced = inner.forced_conflicts > 0;
        if raced {
            inner.forced_conflicts -= 1;
        }
        if raced || inner.labels.contains(label) || inner.hidden_labels.remove(label) {
            inner.labels.insert(label.to_string());
            return Err(DaemonError::Conflict {
                operation: "categories.create",
                detail: format!("label '{label}' already exists"),
            });
        }
        inner.labels.insert(label.to_string());
        Ok(())
    }

    async fn add_batch(&self, batch: &AddBatch, label: &str) -> DaemonResult<()> {
        let mut inner = self.lock();
        inner.calls.push(DaemonCall::AddBatch {
            label: label.to_string(),
            save_path: batch.save_path.clone(),
            links: batch.links.clone(),
        });
        inner.labels.insert(label.to_string());
        let keep = batch.links.len().saturating_sub(inner.dropped_adds);
        for link in batch.links.iter().take(keep) {
            if inner.jobs.iter().any(|job| job.link.as_ref() == Some(link)) {
                continue;
            }
            inner.next_id += 1;
            let handle = TorrentHandle::new(format!("{:040x}", inner.next_id));
            inner.jobs.push(StubJob {
                handle,
                link: Some(link.clone()),
                label: Some(label.to_string()),
                state: TorrentState::PausedDownload,
                polls_remaining: 0,
            });
        }
        Ok(())
    }

    async fn list_jobs(&self, filter: &JobFilter) -> DaemonResult<Vec<JobEntry>> {
        let mut inner = self.lock();
        inner.calls.push(DaemonCall::ListJobs(filter.clone()));
        let indices: Vec<usize> = inner
            .jobs
            .iter()
            .enumerate()
            .filter(|(_, job)| match filter {
                JobFilter::Label(label) => job.label.as_deref() == Some(label.as_str()),
                JobFilter::Handles(handles) => handles.contains(&job.handle),
            })
            .map(|(index, _)| index)
            .collect();
        Ok(indices
            .into_iter()
            .map(|index| inner.observe(index))
            .collect())
    }

    async fn set_label(&self, handles: &[TorrentHandle], label: &str) -> DaemonResult<()> {
        let mut inner = self.lock();
        inner.calls.push(DaemonCall::SetLabel {
            handles: handles.to_vec(),
            label: label.to_string(),
        });
        if !inner.labels.contains(label) {
            return Err(DaemonError::Conflict {
                operation: "torrents.set_category",
                detail: format!("label '{label}' does not exist"),
            });
        }
        for job in inner
            .jobs
            .iter_mut()
            .filter(|job| handles.contains(&job.handle))
        {
            job.label = Some(label.to_string());
        }
        Ok(())
    }

    async fn remove_labels(&self, labels: &[String]) -> DaemonResult<()> {
        let mut inner = self.lock();
        inner.calls.push(DaemonCall::RemoveLabels(labels.to_vec()));
        for label in labels {
            inner.labels.remove(label);
        }
        for job in &mut inner.jobs {
            if job.label.as_ref().is_some_and(|label| labels.contains(label)) {
                job.label = None;
            }
        }
        Ok(())
    }

    async fn resume(&self, handles: &[TorrentHandle]) -> DaemonResult<()> {
        let mut inner = self.lock();
        inner.calls.push(DaemonCall::Resume(handles.to_vec()));
        let polls = inner.completion_polls;
        for job in inner
            .jobs
            .iter_mut()
            .filter(|job| handles.contains(&job.handle))
        {
            if !job.state.is_complete() {
                job.state = TorrentState::Downloading;
                job.polls_remaining = polls;
            }
        }
        Ok(())
    }

    async fn delete(&self, handles: &[TorrentHandle], delete_files: bool) -> DaemonResult<()> {
        let mut inner = self.lock();
        inner.calls.push(DaemonCall::Delete {
            handles: handles.to_vec(),
            delete_files,
        });
        inner.jobs.retain(|job| !handles.contains(&job.handle));
        Ok(())
    }
}
