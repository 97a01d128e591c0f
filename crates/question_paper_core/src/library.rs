//! crates/question_paper_core/src/library.rs
//!
//! Re-issues download links for previously generated papers, for their owners only.

use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::{DownloadLink, Paper};
use crate::ports::{DownloadLinkIssuer, PaperRegistry, PortError, PortResult};

pub struct PaperLibrary {
    registry: Arc<dyn PaperRegistry>,
    links: Arc<dyn DownloadLinkIssuer>,
    bucket: String,
    link_ttl: Duration,
}

impl PaperLibrary {
    pub fn new(
        registry: Arc<dyn PaperRegistry>,
        links: Arc<dyn DownloadLinkIssuer>,
        bucket: impl Into<String>,
        link_ttl: Duration,
    ) -> Self {
        Self {
            registry,
            links,
            bucket: bucket.into(),
            link_ttl,
        }
    }

    /// Looks up a paper and issues a fresh link if `caller_id` owns it.
    ///
    /// Fails with `NotFound` for unknown ids and `Forbidden` for anyone but the owner.
    pub async fn download(&self, paper_id: Uuid, caller_id: &str) -> PortResult<(Paper, DownloadLink)> {
        let paper = self.registry.get(paper_id).await?;
        if paper.user_id != caller_id {
            return Err(PortError::Forbidden);
        }

        let url = self
            .links
            .issue_link(&self.bucket, &paper.storage_key, self.link_ttl)
            .await?;

        Ok((
            paper,
            DownloadLink {
                url,
                expires_in: self.link_ttl,
            },
        ))
    }
}
