use std::future::Future;
use std::pin::Pin;

use aws_sdk_s3::Client;

use crate::error::StorageError;
use crate::objects::{self, WriteCondition};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An object body together with its opaque version token (an ETag on S3).
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub version: String,
}

/// Key/value object storage with conditional writes.
///
/// Every write returns the new version token. `put_if_match` fails with
/// [`StorageError::PreconditionFailed`] when the stored version differs and
/// `put_if_absent` fails with [`StorageError::AlreadyExists`] when the key is
/// taken.
pub trait ObjectStore: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<StoredObject, StorageError>>;

    fn put<'a>(
        &'a self,
        key: &'a str,
        body: Vec<u8>,
    ) -> BoxFuture<'a, Result<String, StorageError>>;

    fn put_if_match<'a>(
        &'a self,
        key: &'a str,
        body: Vec<u8>,
        expected_version: &'a str,
    ) -> BoxFuture<'a, Result<String, StorageError>>;

    fn put_if_absent<'a>(
        &'a self,
        key: &'a str,
        body: Vec<u8>,
    ) -> BoxFuture<'a, Result<String, StorageError>>;
}

/// [`ObjectStore`] backed by one S3 bucket.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn write<'a>(
        &'a self,
        key: &'a str,
        body: Vec<u8>,
        condition: WriteCondition<'a>,
    ) -> BoxFuture<'a, Result<String, StorageError>> {
        Box::pin(objects::put_json_object(
            &self.client,
            &self.bucket,
            key,
            body,
            condition,
        ))
    }
}

impl ObjectStore for S3ObjectStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<StoredObject, StorageError>> {
        Box::pin(async move {
            let output = objects::get_object(&self.client, &self.bucket, key).await?;
            Ok(StoredObject {
                body: output.body,
                version: output.etag.unwrap_or_default(),
            })
        })
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        body: Vec<u8>,
    ) -> BoxFuture<'a, Result<String, StorageError>> {
        self.write(key, body, WriteCondition::Unconditional)
    }

    fn put_if_match<'a>(
        &'a self,
        key: &'a str,
        body: Vec<u8>,
        expected_version: &'a str,
    ) -> BoxFuture<'a, Result<String, StorageError>> {
        self.write(key, body, WriteCondition::IfMatch(expected_version))
    }

    fn put_if_absent<'a>(
        &'a self,
        key: &'a str,
        body: Vec<u8>,
    ) -> BoxFuture<'a, Result<String, StorageError>> {
        self.write(key, body, WriteCondition::IfAbsent)
    }
}
