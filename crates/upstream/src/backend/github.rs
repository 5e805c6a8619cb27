//! GitHub REST API backend.
//!
//! Talks to `{api_url}/repos/{owner}/{repo}` with a shared token. Release
//! metadata is fetched whole and decoded; asset binaries are requested with
//! `Accept: application/octet-stream` and handed back as a stream as soon as
//! the response headers arrive.

use crate::{
    AssetStream, Credential, RawRelease, UpstreamBackend,
    error::{ErrorKind, Result},
};
use async_trait::async_trait;
use exn::{OptionExt, ResultExt};
use futures::TryStreamExt;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url, header};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::instrument;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const API_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const BINARY_MEDIA_TYPE: &str = "application/octet-stream";
const USER_AGENT: &str = concat!("vitrine/", env!("CARGO_PKG_VERSION"));

/// Whole-request deadline for metadata calls.
const API_TIMEOUT: Duration = Duration::from_secs(10);
/// Deadline for the asset response headers only; the body may take as long
/// as it takes.
const ASSET_TIMEOUT: Duration = Duration::from_secs(30);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Backend for a single GitHub repository.
///
/// # Examples
///
/// ```no_run
/// use vitrine_upstream::{Credential, UpstreamBackend, backend::GithubBackend};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = GithubBackend::new(
///     "https://api.github.com",
///     "gino-vi",
///     "Wangfang-Suite",
///     Some(Credential::new("ghp_...")),
/// ).map_err(|e| e.to_string())?;
/// let releases = backend.list_releases().await.map_err(|e| e.to_string())?;
/// println!("{} releases", releases.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GithubBackend {
    name: String,
    client: Client,
    /// `{api_url}/repos/{owner}/{repo}`
    base: Url,
    credential: Option<Credential>,
}

impl GithubBackend {
    /// Create a backend for `owner/repo` on the API at `api_url`.
    ///
    /// A missing credential is accepted here and only reported when a request
    /// is attempted, so that the service can still describe itself.
    pub fn new(
        api_url: impl AsRef<str>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        credential: Option<Credential>,
    ) -> Result<Self> {
        let owner = owner.into();
        let repo = repo.into();
        let api_url = api_url.as_ref();
        let mut base =
            Url::parse(api_url).or_raise(|| ErrorKind::InvalidConfig(format!("invalid API URL: {api_url}")))?;
        {
            let Ok(mut segments) = base.path_segments_mut() else {
                exn::bail!(ErrorKind::InvalidConfig(format!("API URL cannot be a base: {api_url}")));
            };
            segments.pop_if_empty().extend(["repos", owner.as_str(), repo.as_str()]);
        }
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .or_raise(|| ErrorKind::InvalidConfig("could not build HTTP client".to_string()))?;
        Ok(Self {
            name: format!("{owner}/{repo}"),
            client,
            base,
            credential,
        })
    }

    fn credential(&self) -> Result<&Credential> {
        self.credential.as_ref().filter(|c| !c.is_blank()).ok_or_raise(|| ErrorKind::MissingCredential)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // `new()` has already proven the base can take path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    fn request(&self, url: Url, accept: &'static str) -> Result<RequestBuilder> {
        let credential = self.credential()?;
        Ok(self
            .client
            .get(url)
            .header(header::AUTHORIZATION, format!("token {}", credential.expose()))
            .header(header::ACCEPT, accept))
    }

    async fn send_api(&self, url: Url) -> Result<Response> {
        let described = url.path().to_string();
        self.request(url, API_MEDIA_TYPE)?
            .timeout(API_TIMEOUT)
            .send()
            .await
            .or_raise(|| ErrorKind::Unavailable(format!("GET {described}")))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let path = response.url().path().to_string();
    let body = response.bytes().await.or_raise(|| ErrorKind::Unavailable(format!("reading body of {path}")))?;
    serde_json::from_slice(&body).or_raise(|| ErrorKind::InvalidResponse(path))
}

fn unexpected_status(response: &Response) -> ErrorKind {
    ErrorKind::Unavailable(format!("{} returned {}", response.url().path(), response.status()))
}

#[async_trait]
impl UpstreamBackend for GithubBackend {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(repository = %self.name))]
    async fn list_releases(&self) -> Result<Vec<RawRelease>> {
        let response = self.send_api(self.endpoint(&["releases"])).await?;
        if !response.status().is_success() {
            let kind = unexpected_status(&response);
            tracing::warn!(status = %response.status(), "Upstream refused release listing");
            exn::bail!(kind);
        }
        let releases: Vec<RawRelease> = decode(response).await?;
        tracing::debug!(count = releases.len(), "Fetched releases from upstream");
        Ok(releases)
    }

    #[instrument(skip(self), fields(repository = %self.name))]
    async fn release_by_tag(&self, tag: &str) -> Result<RawRelease> {
        let response = self.send_api(self.endpoint(&["releases", "tags", tag])).await?;
        match response.status() {
            status if status.is_success() => decode(response).await,
            StatusCode::NOT_FOUND => exn::bail!(ErrorKind::ReleaseNotFound(tag.to_string())),
            _ => exn::bail!(unexpected_status(&response)),
        }
    }

    #[instrument(skip(self), fields(repository = %self.name))]
    async fn open_asset_stream(&self, asset_id: u64) -> Result<AssetStream> {
        let id = asset_id.to_string();
        let request = self.request(self.endpoint(&["releases", "assets", &id]), BINARY_MEDIA_TYPE)?;
        let response = tokio::time::timeout(ASSET_TIMEOUT, request.send())
            .await
            .or_raise(|| ErrorKind::Unavailable(format!("asset {asset_id} did not respond in time")))?
            .or_raise(|| ErrorKind::Unavailable(format!("GET asset {asset_id}")))?;
        match response.status() {
            status if status.is_success() => {},
            StatusCode::NOT_FOUND => exn::bail!(ErrorKind::AssetNotFound(asset_id)),
            _ => exn::bail!(unexpected_status(&response)),
        }
        let content_length = response.content_length();
        tracing::debug!(?content_length, "Opened asset transfer");
        let body = response.bytes_stream().map_err(|err| exn::Exn::from(err).raise(ErrorKind::Interrupted));
        Ok(AssetStream::new(body, content_length))
    }

    #[instrument(skip(self), fields(repository = %self.name))]
    async fn check_connectivity(&self) -> bool {
        let request = match self.request(self.base.clone(), API_MEDIA_TYPE) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(error = ?err, "Connectivity check skipped");
                return false;
            },
        };
        match request.timeout(PROBE_TIMEOUT).send().await {
            Ok(response) if response.status() == StatusCode::OK => true,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "Connectivity check rejected");
                false
            },
            Err(err) => {
                tracing::warn!(error = %err, "Connectivity check failed");
                false
            },
        }
    }
}
