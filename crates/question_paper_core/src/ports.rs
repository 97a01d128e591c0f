//! crates/question_paper_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the object store, the identity provider and the metadata store.

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::{
    AuthTokens, CombinedDocument, NewObject, ObjectListing, Paper, SourceDocument,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., storage, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Access denied")]
    Forbidden,
    /// Credential exchange failed. The message comes from the identity provider.
    #[error("{0}")]
    AuthenticationFailed(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lists one page of objects under `prefix`.
    ///
    /// With a delimiter, keys containing it after the prefix are rolled up into
    /// `common_prefixes`; without one every matching key is returned.
    async fn list(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> PortResult<ObjectListing>;

    async fn get_object(&self, bucket: &str, key: &str) -> PortResult<Vec<u8>>;

    async fn put_object(&self, bucket: &str, key: &str, object: NewObject) -> PortResult<()>;
}

#[async_trait]
pub trait DownloadLinkIssuer: Send + Sync {
    /// Produces a read-only link to exactly one object, valid for `ttl`.
    /// Every call yields an independent link.
    async fn issue_link(&self, bucket: &str, key: &str, ttl: Duration) -> PortResult<String>;
}

#[async_trait]
pub trait PaperRegistry: Send + Sync {
    /// Upserts the record keyed by `paper.id`.
    async fn save(&self, paper: &Paper) -> PortResult<()>;

    async fn get(&self, paper_id: Uuid) -> PortResult<Paper>;
}

#[async_trait]
pub trait CredentialExchange: Send + Sync {
    /// Exchanges a username and password for tokens.
    /// Fails with `PortError::AuthenticationFailed` carrying the provider's message.
    async fn authenticate(&self, username: &str, password: &str) -> PortResult<AuthTokens>;
}

#[async_trait]
pub trait SigningKeySource: Send + Sync {
    /// Fetches the provider's current public signing keys.
    async fn signing_keys(&self) -> PortResult<JwkSet>;
}

/// Concatenates the pages of several documents into one.
pub trait DocumentCombiner: Send + Sync {
    /// Sources that cannot be parsed are reported in `CombinedDocument::skipped`
    /// instead of failing the whole combination.
    fn combine(&self, sources: Vec<SourceDocument>) -> PortResult<CombinedDocument>;
}
