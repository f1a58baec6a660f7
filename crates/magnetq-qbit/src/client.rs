//! Cookie-session client for the qBittorrent Web API.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use magnetq_core::{
    AddBatch, DaemonClient, DaemonError, DaemonResult, JobEntry, JobFilter, TorrentHandle,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{QbError, QbResult};
use crate::wire::{FAILS_BODY, QbCategories, QbTorrentInfo};

const SESSION_COOKIE: &str = "SID";
const HASH_SEPARATOR: &str = "|";
const LIST_SEPARATOR: &str = "\n";

/// Web UI credentials.
#[derive(Clone)]
pub struct Credentials {
    /// Web UI user.
    pub username: String,
    /// Web UI password.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// qBittorrent Web API client implementing [`DaemonClient`].
#[derive(Debug)]
pub struct QbClient {
    http: Client,
    base_url: Url,
    credentials: Credentials,
    use_start_endpoint: AtomicBool,
}

impl QbClient {
    /// Build a client for the Web UI at `base_url`. The session cookie issued
    /// at login is kept in the HTTP client's cookie store.
    ///
    /// # Errors
    ///
    /// Returns [`QbError::InvalidBaseUrl`] for URLs that cannot carry paths and
    /// [`QbError::ClientBuild`] when the HTTP client cannot be constructed.
    pub fn new(base_url: Url, credentials: Credentials, timeout: Duration) -> QbResult<Self> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|source| QbError::ClientBuild { source })?;
        Self::with_http_client(http, base_url, credentials)
    }

    /// Build a client around an existing `reqwest` client, which needs its
    /// cookie store enabled to carry the session between calls.
    ///
    /// # Errors
    ///
    /// Returns [`QbError::InvalidBaseUrl`] for URLs that cannot carry paths.
    pub fn with_http_client(
        http: Client,
        mut base_url: Url,
        credentials: Credentials,
    ) -> QbResult<Self> {
        if base_url.cannot_be_a_base() {
            return Err(QbError::InvalidBaseUrl {
                url: base_url.to_string(),
            });
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http,
            base_url,
            credentials,
            use_start_endpoint: AtomicBool::new(false),
        })
    }

    /// Web UI root the client talks to.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, operation: &'static str, path: &str) -> DaemonResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| DaemonError::Protocol {
                operation,
                detail: format!("invalid endpoint '{path}': {err}"),
            })
    }

    async fn send_once(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> DaemonResult<(StatusCode, String)> {
        let response = request
            .send()
            .await
            .map_err(|err| DaemonError::Transport {
                operation,
                source: Box::new(err),
            })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| DaemonError::Transport {
                operation,
                source: Box::new(err),
            })?;
        trace!(operation, %status, "daemon responded");
        Ok((status, body))
    }

    /// Send a request, logging in again once if the session has expired.
    async fn send<F>(&self, operation: &'static str, build: F) -> DaemonResult<(StatusCode, String)>
    where
        F: Fn(&Client) -> DaemonResult<RequestBuilder> + Send + Sync,
    {
        let (status, body) = self.send_once(operation, build(&self.http)?).await?;
        if status != StatusCode::FORBIDDEN {
            return Ok((status, body));
        }
        debug!(operation, "session rejected; logging in again");
        self.login().await?;
        self.send_once(operation, build(&self.http)?).await
    }

    async fn post_form(
        &self,
        operation: &'static str,
        path: &str,
        form: &[(&str, String)],
    ) -> DaemonResult<String> {
        let url = self.endpoint(operation, path)?;
        let (status, body) = self
            .send(operation, |http| Ok(http.post(url.clone()).form(form)))
            .await?;
        check_status(operation, status, body)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> DaemonResult<T> {
        let url = self.endpoint(operation, path)?;
        let (status, body) = self
            .send(operation, |http| Ok(http.get(url.clone()).query(query)))
            .await?;
        let body = check_status(operation, status, body)?;
        serde_json::from_str(&body).map_err(|err| DaemonError::Protocol {
            operation,
            detail: format!("malformed JSON payload: {err}"),
        })
    }

    async fn post_resume(&self, hashes: String) -> DaemonResult<()> {
        if !self.use_start_endpoint.load(Ordering::Relaxed) {
            let url = self.endpoint("torrents.resume", "api/v2/torrents/resume")?;
            let form = [("hashes", hashes.clone())];
            let (status, body) = self
                .send("torrents.resume", |http| {
                    Ok(http.post(url.clone()).form(&form))
                })
                .await?;
            if status != StatusCode::NOT_FOUND {
                check_status("torrents.resume", status, body)?;
                return Ok(());
            }
            debug!("resume endpoint missing; switching to start");
            self.use_start_endpoint.store(true, Ordering::Relaxed);
        }
        self.post_form("torrents.start", "api/v2/torrents/start", &[("hashes", hashes)])
            .await?;
        Ok(())
    }
}

fn check_status(operation: &'static str, status: StatusCode, body: String) -> DaemonResult<String> {
    match status {
        status if status.is_success() => Ok(body),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(DaemonError::Unauthorized),
        StatusCode::CONFLICT => Err(DaemonError::Conflict {
            operation,
            detail: body,
        }),
        status => Err(DaemonError::Protocol {
            operation,
            detail: format!("status {status}: {}", body.trim()),
        }),
    }
}

fn join_handles(handles: &[TorrentHandle]) -> String {
    handles
        .iter()
        .map(TorrentHandle::as_str)
        .collect::<Vec<_>>()
        .join(HASH_SEPARATOR)
}

#[async_trait]
impl DaemonClient for QbClient {
    async fn login(&self) -> DaemonResult<()> {
        const OPERATION: &str = "auth.login";
        let url = self.endpoint(OPERATION, "api/v2/auth/login")?;
        let response = self
            .http
            .post(url)
            .form(&[
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.as_str()),
            ])
            .send()
            .await
            .map_err(|err| DaemonError::Transport {
                operation: OPERATION,
                source: Box::new(err),
            })?;

        let status = response.status();
        let has_session = response
            .cookies()
            .any(|cookie| cookie.name() == SESSION_COOKIE);
        let body = response.text().await.unwrap_or_default();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
            || body.trim() == FAILS_BODY
        {
            warn!(%status, "Web UI login rejected");
            return Err(DaemonError::Unauthorized);
        }
        let body = check_status(OPERATION, status, body)?;
        if !has_session {
            debug!(body = body.trim(), "login answered without a session cookie");
        }
        Ok(())
    }

    async fn labels(&self) -> DaemonResult<HashSet<String>> {
        let categories: QbCategories = self
            .get_json("categories.list", "api/v2/torrents/categories", &[])
            .await?;
        Ok(categories.into_keys().collect())
    }

    async fn create_label(&self, label: &str, save_path: &str) -> DaemonResult<()> {
        self.post_form(
            "categories.create",
            "api/v2/torrents/createCategory",
            &[
                ("category", label.to_string()),
                ("savePath", save_path.to_string()),
            ],
        )
        .await?;
        Ok(())
    }

    async fn add_batch(&self, batch: &AddBatch, label: &str) -> DaemonResult<()> {
        let urls = batch
            .links
            .iter()
            .map(magnetq_core::MagnetLink::as_str)
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR);
        let body = self
            .post_form(
                "torrents.add",
                "api/v2/torrents/add",
                &[
                    ("urls", urls),
                    ("savepath", batch.save_path.clone()),
                    ("category", label.to_string()),
                    // `stopped` is the qBittorrent 5 name for `paused`.
                    ("paused", "true".to_string()),
                    ("stopped", "true".to_string()),
                ],
            )
            .await?;
        if body.trim() == FAILS_BODY {
            return Err(DaemonError::Protocol {
                operation: "torrents.add",
                detail: "daemon refused every link in the batch".to_string(),
            });
        }
        Ok(())
    }

    async fn list_jobs(&self, filter: &JobFilter) -> DaemonResult<Vec<JobEntry>> {
        let query = match filter {
            JobFilter::Label(label) => [("category", label.clone())],
            JobFilter::Handles(handles) => [("hashes", join_handles(handles))],
        };
        let infos: Vec<QbTorrentInfo> = self
            .get_json("torrents.info", "api/v2/torrents/info", &query)
            .await?;
        Ok(infos.into_iter().map(JobEntry::from).collect())
    }

    async fn set_label(&self, handles: &[TorrentHandle], label: &str) -> DaemonResult<()> {
        self.post_form(
            "torrents.set_category",
            "api/v2/torrents/setCategory",
            &[
                ("hashes", join_handles(handles)),
                ("category", label.to_string()),
            ],
        )
        .await?;
        Ok(())
    }

    async fn remove_labels(&self, labels: &[String]) -> DaemonResult<()> {
        self.post_form(
            "categories.remove",
            "api/v2/torrents/removeCategories",
            &[("categories", labels.join(LIST_SEPARATOR))],
        )
        .await?;
        Ok(())
    }

    async fn resume(&self, handles: &[TorrentHandle]) -> DaemonResult<()> {
        self.post_resume(join_handles(handles)).await
    }

    async fn delete(&self, handles: &[TorrentHandle], delete_files: bool) -> DaemonResult<()> {
        self.post_form(
            "torrents.delete",
            "api/v2/torrents/delete",
            &[
                ("hashes", join_handles(handles)),
                ("deleteFiles", delete_files.to_string()),
            ],
        )
        .await?;
        Ok(())
    }
}
