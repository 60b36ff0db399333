use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::auth::AuthenticatedSession;
use crate::config::Config;
use crate::portal::http::body_preview;
use crate::portal::retry::{RetryPolicy, Retryable};
use crate::portal::{PortalTransport, RequestKind, TransportError};
use crate::records::RawCourse;

/// Completion marker the major-statistics query uses for courses not yet taken.
pub const NOT_YET_TAKEN: &str = "未修";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("GET {url} returned {status}: {preview}")]
    Status {
        url: String,
        status: u16,
        preview: String,
    },
    #[error("invalid JSON response from {url}: {message}")]
    InvalidJson { url: String, message: String },
}

impl Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { .. })
    }
}

#[derive(Debug, Deserialize)]
struct ItemsEnvelope {
    #[serde(default)]
    items: Vec<Value>,
}

pub struct RecordFetcher<'a, T> {
    session: &'a AuthenticatedSession<T>,
    transcript_url: String,
    major_stats_url: String,
    retry: RetryPolicy,
}

impl<'a, T: PortalTransport> RecordFetcher<'a, T> {
    pub fn new(session: &'a AuthenticatedSession<T>, config: &Config) -> Self {
        Self {
            session,
            transcript_url: config.portal.transcript_url.clone(),
            major_stats_url: config.portal.major_stats_url.clone(),
            retry: RetryPolicy::from_config(&config.http),
        }
    }

    /// Every graded course on the general transcript.
    pub async fn fetch_transcript(&self) -> Result<Vec<RawCourse>, FetchError> {
        let items = self.fetch_items("transcript", &self.transcript_url).await?;
        Ok(items.iter().filter_map(RawCourse::from_value).collect())
    }

    /// Courses counted by the major program, minus the ones not yet taken.
    pub async fn fetch_major_stats(&self) -> Result<Vec<RawCourse>, FetchError> {
        let items = self
            .fetch_items("major statistics", &self.major_stats_url)
            .await?;
        Ok(items
            .iter()
            .filter_map(RawCourse::from_value)
            .filter(|course| course.completion.as_deref() != Some(NOT_YET_TAKEN))
            .collect())
    }

    async fn fetch_items(&self, label: &str, url: &str) -> Result<Vec<Value>, FetchError> {
        let transport = self.session.transport();
        let body = self
            .retry
            .run(label, || async {
                let response = transport.get(url, RequestKind::Data).await?;
                if response.status != 200 {
                    return Err(FetchError::Status {
                        url: url.to_string(),
                        status: response.status,
                        preview: body_preview(&response.body),
                    });
                }
                Ok::<_, FetchError>(response.body)
            })
            .await?;
        let envelope: ItemsEnvelope =
            serde_json::from_str(&body).map_err(|err| FetchError::InvalidJson {
                url: url.to_string(),
                message: err.to_string(),
            })?;
        debug!(label, items = envelope.items.len(), "fetched record items");
        Ok(envelope.items)
    }
}
