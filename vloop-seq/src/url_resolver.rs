//! Media URL resolution
//!
//! Turns a user-entered URL into the video id and/or playlist id a player
//! needs. Accepts the long watch form (`?v=<id>`), playlist links
//! (`?list=<id>`) and the short-link form (`https://youtu.be/<id>`).

use thiserror::Error;
use url::Url;

/// Host of the short-link form, whose first path segment is the video id
pub const SHORT_LINK_HOST: &str = "youtu.be";

/// Why a URL could not be resolved
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Input was empty or whitespace
    #[error("URL is empty")]
    Empty,

    /// Input is not a well-formed absolute URL
    #[error("malformed URL '{url}': {reason}")]
    Malformed { url: String, reason: String },
}

/// Identifiers extracted from a media URL
///
/// Both fields may be `None` for a well-formed URL that points at nothing
/// playable; see [`MediaIds::is_playable`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaIds {
    pub video_id: Option<String>,
    pub playlist_id: Option<String>,
}

impl MediaIds {
    /// True if at least one of the ids is present
    pub fn is_playable(&self) -> bool {
        self.video_id.is_some() || self.playlist_id.is_some()
    }
}

/// Resolve a media URL into its video and playlist ids
pub fn resolve(url: &str) -> Result<MediaIds, ResolveError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ResolveError::Empty);
    }

    let parsed = Url::parse(trimmed).map_err(|e| ResolveError::Malformed {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;

    let playlist_id = query_value(&parsed, "list");

    let video_id = if is_short_link(&parsed) {
        // Path segments never include the query string
        parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
    } else {
        query_value(&parsed, "v")
    };

    Ok(MediaIds {
        video_id,
        playlist_id,
    })
}

fn is_short_link(url: &Url) -> bool {
    match url.host_str() {
        Some(host) => {
            host.eq_ignore_ascii_case(SHORT_LINK_HOST)
                || host.to_ascii_lowercase().ends_with(".youtu.be")
        }
        None => false,
    }
}

/// First non-empty value of query parameter `key`
fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}
