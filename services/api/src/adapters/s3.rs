//! services/api/src/adapters/s3.rs
//!
//! This module contains the S3 adapter, the concrete implementation of the
//! `ObjectStore` and `DownloadLinkIssuer` ports from the core crate.

use async_trait::async_trait;
use aws_sdk_s3::{
    error::DisplayErrorContext, presigning::PresigningConfig, primitives::ByteStream, Client,
};
use question_paper_core::domain::{NewObject, ObjectListing};
use question_paper_core::ports::{DownloadLinkIssuer, ObjectStore, PortError, PortResult};
use std::collections::HashMap;
use std::time::Duration;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the storage ports on top of Amazon S3.
#[derive(Clone)]
pub struct S3Adapter {
    client: Client,
}

impl S3Adapter {
    /// Creates a new `S3Adapter`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn unexpected<E: std::error::Error>(err: E) -> PortError {
    PortError::Unexpected(DisplayErrorContext(err).to_string())
}

//=========================================================================================
// `ObjectStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ObjectStore for S3Adapter {
    /// Issues a single `ListObjectsV2` call; continuation tokens are not followed.
    async fn list(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> PortResult<ObjectListing> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .set_delimiter(delimiter.map(str::to_string))
            .send()
            .await
            .map_err(unexpected)?;

        Ok(ObjectListing {
            common_prefixes: output
                .common_prefixes()
                .iter()
                .filter_map(|p| p.prefix().map(str::to_string))
                .collect(),
            keys: output
                .contents()
                .iter()
                .filter_map(|o| o.key().map(str::to_string))
                .collect(),
            truncated: output.is_truncated().unwrap_or(false),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> PortResult<Vec<u8>> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    PortError::NotFound(format!("Object {bucket}/{key} not found"))
                } else {
                    unexpected(e)
                }
            })?;

        let body = output.body.collect().await.map_err(unexpected)?;
        Ok(body.into_bytes().to_vec())
    }

    async fn put_object(&self, bucket: &str, key: &str, object: NewObject) -> PortResult<()> {
        let metadata: HashMap<String, String> = object.metadata.into_iter().collect();

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(object.content_type)
            .set_metadata(Some(metadata))
            .body(ByteStream::from(object.bytes))
            .send()
            .await
            .map_err(unexpected)?;

        Ok(())
    }
}

//=========================================================================================
// `DownloadLinkIssuer` Trait Implementation
//=========================================================================================

#[async_trait]
impl DownloadLinkIssuer for S3Adapter {
    /// Presigns a `GetObject` request locally; no network call is made.
    async fn issue_link(&self, bucket: &str, key: &str, ttl: Duration) -> PortResult<String> {
        let presigning = PresigningConfig::expires_in(ttl).map_err(unexpected)?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(unexpected)?;

        Ok(request.uri().to_string())
    }
}
