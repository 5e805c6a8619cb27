use serde::{Deserialize, Serialize};

/// A release as shown to the public.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicRelease {
    pub tag_name: String,
    pub name: String,
    pub prerelease: bool,
    pub body: String,
    pub html_url: String,
    /// Serialized as `null` when upstream didn't say.
    pub published_at: Option<String>,
    /// Never empty.
    pub assets: Vec<PublicAsset>,
}

/// An installer attached to a [`PublicRelease`]. The name always ends with
/// [`ALLOWED_EXTENSION`](crate::ALLOWED_EXTENSION).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicAsset {
    pub name: String,
    pub browser_download_url: String,
    pub size: u64,
    pub created_at: Option<String>,
}
