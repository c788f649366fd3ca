//! Webhook payload normalization
//!
//! Upstream push and tag events arrive in GitHub's wire shape; downstream
//! workers consume one canonical record. Extraction is done through typed
//! structs so a missing required field surfaces as a malformed-payload
//! failure instead of a silent default.

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};

/// Ref prefix marking a tag push, e.g. `refs/tags/v1.0.0`
const TAG_REF_PREFIX: &str = "refs/tags/";

/// Canonical deployment request published to the queue and audited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPayload {
    pub repository: String,
    pub commit: String,
    pub environment: String,
    pub author: String,
    pub tag: Option<String>,
}

/// The subset of a GitHub push/tag event the relay consumes.
#[derive(Debug, Deserialize)]
struct PushEvent {
    #[serde(rename = "ref")]
    git_ref: String,
    repository: RepositoryInfo,
    head_commit: HeadCommit,
}

#[derive(Debug, Deserialize)]
struct RepositoryInfo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct HeadCommit {
    id: String,
    author: CommitAuthor,
}

#[derive(Debug, Deserialize)]
struct CommitAuthor {
    username: String,
}

/// Normalize a raw webhook body into a [`CanonicalPayload`].
///
/// `tag` is the ref name with the tag prefix stripped for tag pushes and
/// `None` for branch pushes. Tag events may carry an empty commits list;
/// `head_commit.id` is the traceable commit either way. The environment is
/// always the configured default.
pub fn normalize(body: &[u8], default_environment: &str) -> Result<CanonicalPayload> {
    let event: PushEvent =
        serde_json::from_slice(body).map_err(|e| RelayError::MalformedPayload(e.to_string()))?;

    let tag = event.git_ref.strip_prefix(TAG_REF_PREFIX).map(str::to_string);

    Ok(CanonicalPayload {
        repository: event.repository.name,
        commit: event.head_commit.id,
        environment: default_environment.to_string(),
        author: event.head_commit.author.username,
        tag,
    })
}

/// Reject payloads for repositories outside the watch-list.
///
/// Runs after normalization so the error can name the offending repository.
pub fn screen_repository(payload: &CanonicalPayload, watched: &[String]) -> Result<()> {
    if watched.iter().any(|r| r == &payload.repository) {
        Ok(())
    } else {
        Err(RelayError::UnknownRepo(payload.repository.clone()))
    }
}
