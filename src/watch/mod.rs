//! Grade polling: one fresh portal session per cycle, diffed against the last
//! accepted record set.

pub mod history;
pub mod poller;
pub mod source;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::SessionError;
use crate::portal::TransportError;
use crate::records::fetcher::FetchError;
use crate::records::CourseRecord;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    #[error("portal client could not be created: {0}")]
    Transport(#[from] TransportError),
    #[error("login failed: {0}")]
    Session(#[from] SessionError),
    #[error("fetching grades failed: {0}")]
    Fetch(#[from] FetchError),
}

/// Produces the reconciled record set for one poll cycle.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_records(&self) -> Result<Vec<CourseRecord>, CycleError>;
}
