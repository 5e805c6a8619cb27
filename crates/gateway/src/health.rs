use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Whether the upstream host answered the connectivity probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    Connected,
    Error,
}
impl From<bool> for ApiStatus {
    fn from(connected: bool) -> Self {
        if connected { Self::Connected } else { Self::Error }
    }
}

/// Service health snapshot. Producing one never fails; upstream trouble is
/// reported inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub github_api: ApiStatus,
    pub cache_valid: bool,
    pub repository: String,
}

impl HealthReport {
    pub(crate) fn new(repository: impl Into<String>, github_api: ApiStatus, cache_valid: bool) -> Self {
        Self {
            status: "healthy",
            timestamp: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
            github_api,
            cache_valid,
            repository: repository.into(),
        }
    }
}
