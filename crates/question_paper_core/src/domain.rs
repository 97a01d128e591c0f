//! crates/question_paper_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any storage backend or serialization format.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

/// A subject in the question bank, derived from a top-level storage prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: String,
    pub name: String,
}

/// A topic within a subject, derived from a second-level storage prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub subject_id: String,
}

/// A topic picked for a paper together with how many questions to take from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSelection {
    pub topic_id: String,
    pub question_count: u32,
}

/// Everything needed to assemble a paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub title: String,
    pub subject: String,
    pub topics: Vec<TopicSelection>,
    pub duration_minutes: u32,
}

/// A generated paper. Created once at generation time and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paper {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub subject: String,
    pub duration_minutes: u32,
    pub topics: Vec<TopicSelection>,
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
}

/// A time-limited, read-only link to one stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub url: String,
    pub expires_in: Duration,
}

/// The result of a successful generation.
#[derive(Debug, Clone)]
pub struct GeneratedPaper {
    pub paper: Paper,
    pub link: DownloadLink,
    /// Question documents that could not be fetched or parsed and were left out.
    pub skipped: Vec<SkippedDocument>,
}

/// Tokens handed out by the identity provider after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTokens {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// The verified claims of a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct TokenClaims {
    /// The user id.
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub aud: Option<String>,
}

//=========================================================================================
// Object Storage Values
//=========================================================================================

/// One page of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListing {
    /// Full common-prefix strings (e.g. `math/algebra/`) when a delimiter was given.
    pub common_prefixes: Vec<String>,
    /// Full object keys directly matched by the listing.
    pub keys: Vec<String>,
    /// Set when the store had more results than it returned in this page.
    pub truncated: bool,
}

/// An object about to be written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub metadata: BTreeMap<String, String>,
}

/// A question document fetched from the store, ready to be combined.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub key: String,
    pub bytes: Vec<u8>,
}

/// The output of combining several source documents.
#[derive(Debug, Clone)]
pub struct CombinedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub skipped: Vec<SkippedDocument>,
}

/// A source document left out of a paper, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub key: String,
    pub reason: String,
}

/// Where question documents live and where generated papers go.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub question_bucket: String,
    pub generated_bucket: String,
    /// Only keys ending with this suffix are treated as questions. Empty accepts all.
    pub question_suffix: String,
    pub link_ttl: Duration,
}

impl StorageLayout {
    pub const DEFAULT_LINK_TTL: Duration = Duration::from_secs(3600);
}
