//! crates/question_paper_core/src/memory.rs
//!
//! In-memory implementations of every port. They stand in for the object store,
//! identity provider and metadata store in tests.

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uuid::Uuid;

use crate::domain::{
    AuthTokens, CombinedDocument, NewObject, ObjectListing, Paper, SkippedDocument,
    SourceDocument,
};
use crate::ports::{
    CredentialExchange, DocumentCombiner, DownloadLinkIssuer, ObjectStore, PaperRegistry,
    PortError, PortResult, SigningKeySource,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

//=========================================================================================
// Object Store
//=========================================================================================

/// Keys are kept sorted, so listings come back in lexical order like S3.
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), NewObject>>,
    unreadable: Mutex<HashSet<String>>,
    page_size: usize,
}

impl MemoryObjectStore {
    pub const DEFAULT_PAGE_SIZE: usize = 1000;

    pub fn new() -> Self {
        Self::with_page_size(Self::DEFAULT_PAGE_SIZE)
    }

    /// A store whose listings return at most `page_size` entries.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            unreadable: Mutex::new(HashSet::new()),
            page_size,
        }
    }

    pub fn insert(&self, bucket: &str, key: &str, bytes: Vec<u8>) {
        let object = NewObject {
            bytes,
            content_type: "application/octet-stream".to_string(),
            metadata: BTreeMap::new(),
        };
        lock(&self.objects).insert((bucket.to_string(), key.to_string()), object);
    }

    /// Makes `get_object` fail for this key while it stays listed.
    pub fn make_unreadable(&self, key: &str) {
        lock(&self.unreadable).insert(key.to_string());
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<NewObject> {
        lock(&self.objects)
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        lock(&self.objects)
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> PortResult<ObjectListing> {
        let objects = lock(&self.objects);
        let mut listing = ObjectListing::default();
        let mut seen_prefixes = BTreeSet::new();
        let mut returned = 0;

        for (_, key) in objects.keys().filter(|(b, k)| b == bucket && k.starts_with(prefix)) {
            let rest = &key[prefix.len()..];
            let common = delimiter
                .and_then(|d| rest.find(d).map(|idx| format!("{prefix}{}", &rest[..idx + d.len()])));

            if let Some(common) = &common {
                if seen_prefixes.contains(common) {
                    continue;
                }
            }
            if returned == self.page_size {
                listing.truncated = true;
                break;
            }
            returned += 1;

            match common {
                Some(common) => {
                    seen_prefixes.insert(common.clone());
                    listing.common_prefixes.push(common);
                }
                None => listing.keys.push(key.clone()),
            }
        }

        Ok(listing)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> PortResult<Vec<u8>> {
        if lock(&self.unreadable).contains(key) {
            return Err(PortError::Unexpected(format!("read of {key} failed")));
        }

        self.object(bucket, key)
            .map(|object| object.bytes)
            .ok_or_else(|| PortError::NotFound(format!("Object {bucket}/{key} not found")))
    }

    async fn put_object(&self, bucket: &str, key: &str, object: NewObject) -> PortResult<()> {
        lock(&self.objects).insert((bucket.to_string(), key.to_string()), object);
        Ok(())
    }
}

//=========================================================================================
// Download Links
//=========================================================================================

/// Issues fake signed URLs. Every link carries its own sequence number.
#[derive(Default)]
pub struct MemoryLinkIssuer {
    issued: AtomicU64,
}

impl MemoryLinkIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DownloadLinkIssuer for MemoryLinkIssuer {
    async fn issue_link(&self, bucket: &str, key: &str, ttl: Duration) -> PortResult<String> {
        let sequence = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!(
            "https://downloads.test/{bucket}/{key}?expires-in={}&signature={sequence}",
            ttl.as_secs()
        ))
    }
}

//=========================================================================================
// Paper Registry
//=========================================================================================

#[derive(Default)]
pub struct MemoryPaperRegistry {
    papers: Mutex<HashMap<Uuid, Paper>>,
    failing: AtomicBool,
}

impl MemoryPaperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following `save` fail.
    pub fn fail_saves(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        lock(&self.papers).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PaperRegistry for MemoryPaperRegistry {
    async fn save(&self, paper: &Paper) -> PortResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("registry unavailable".to_string()));
        }
        lock(&self.papers).insert(paper.id, paper.clone());
        Ok(())
    }

    async fn get(&self, paper_id: Uuid) -> PortResult<Paper> {
        lock(&self.papers)
            .get(&paper_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Paper {paper_id} not found")))
    }
}

//=========================================================================================
// Identity Provider
//=========================================================================================

/// A fixed key set. `None` behaves like an unreachable key endpoint.
pub struct StaticKeySet {
    keys: Option<JwkSet>,
}

impl StaticKeySet {
    pub fn new(keys: JwkSet) -> Self {
        Self { keys: Some(keys) }
    }

    pub fn unavailable() -> Self {
        Self { keys: None }
    }
}

#[async_trait]
impl SigningKeySource for StaticKeySet {
    async fn signing_keys(&self) -> PortResult<JwkSet> {
        self.keys
            .clone()
            .ok_or_else(|| PortError::Unexpected("key set endpoint unreachable".to_string()))
    }
}

/// Accepts a fixed set of username/password pairs.
#[derive(Default)]
pub struct StaticCredentials {
    users: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, username: &str, password: &str) -> Self {
        self.users.insert(username.to_string(), password.to_string());
        self
    }
}

#[async_trait]
impl CredentialExchange for StaticCredentials {
    async fn authenticate(&self, username: &str, password: &str) -> PortResult<AuthTokens> {
        match self.users.get(username) {
            None => Err(PortError::AuthenticationFailed(
                "User does not exist".to_string(),
            )),
            Some(expected) if expected != password => Err(PortError::AuthenticationFailed(
                "Incorrect username or password".to_string(),
            )),
            Some(_) => Ok(AuthTokens {
                access_token: format!("access-{username}"),
                id_token: format!("id-{username}"),
                refresh_token: format!("refresh-{username}"),
                expires_in: 3600,
            }),
        }
    }
}

//=========================================================================================
// Document Combiner
//=========================================================================================

/// Treats every non-empty source as a single page and joins them with newlines.
/// Empty sources count as unparseable.
#[derive(Default)]
pub struct LineCombiner;

impl DocumentCombiner for LineCombiner {
    fn combine(&self, sources: Vec<SourceDocument>) -> PortResult<CombinedDocument> {
        let mut pages = Vec::new();
        let mut skipped = Vec::new();

        for source in sources {
            if source.bytes.is_empty() {
                skipped.push(SkippedDocument {
                    key: source.key,
                    reason: "empty document".to_string(),
                });
            } else {
                pages.push(source.bytes);
            }
        }

        Ok(CombinedDocument {
            page_count: pages.len(),
            bytes: pages.join(&b'\n'),
            skipped,
        })
    }
}
