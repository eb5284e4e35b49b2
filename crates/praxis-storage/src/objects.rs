//! Raw S3 object calls. Bodies are always JSON.

use aws_sdk_s3::Client;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_smithy_types::byte_stream::ByteStream;

use crate::error::StorageError;

const JSON_CONTENT_TYPE: &str = "application/json";

/// A fetched object and the ETag it was stored under.
pub struct FetchedObject {
    pub body: Vec<u8>,
    pub etag: Option<String>,
}

/// Precondition attached to a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteCondition<'a> {
    Unconditional,
    /// `If-Match`: the stored ETag must still equal this one.
    IfMatch(&'a str),
    /// `If-None-Match: *`: nothing may exist at the key yet.
    IfAbsent,
}

pub async fn get_object(
    client: &Client,
    bucket: &str,
    key: &str,
) -> Result<FetchedObject, StorageError> {
    let resp = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| {
            let err = e.into_service_error();
            if err.is_no_such_key() {
                StorageError::NotFound {
                    key: key.to_string(),
                }
            } else {
                StorageError::GetObject(err.to_string())
            }
        })?;

    let etag = resp.e_tag().map(str::to_string);
    let bytes = resp
        .body
        .collect()
        .await
        .map_err(|e| StorageError::GetObject(e.to_string()))?;

    Ok(FetchedObject {
        body: bytes.into_bytes().to_vec(),
        etag,
    })
}

/// Write a JSON body under `condition`. Returns the new ETag.
///
/// A failed precondition maps to `PreconditionFailed` for `IfMatch` and to
/// `AlreadyExists` for `IfAbsent`.
pub async fn put_json_object(
    client: &Client,
    bucket: &str,
    key: &str,
    body: Vec<u8>,
    condition: WriteCondition<'_>,
) -> Result<String, StorageError> {
    let mut req = client
        .put_object()
        .bucket(bucket)
        .key(key)
        .content_type(JSON_CONTENT_TYPE)
        .body(ByteStream::from(body));

    req = match condition {
        WriteCondition::Unconditional => req,
        WriteCondition::IfMatch(etag) => req.if_match(etag),
        WriteCondition::IfAbsent => req.if_none_match("*"),
    };

    let resp = req.send().await.map_err(|e| {
        let err = e.into_service_error();
        let code = err.code();
        if code == Some("NoSuchKey") {
            return StorageError::NotFound {
                key: key.to_string(),
            };
        }
        if !is_precondition_failure(code, &err.to_string()) {
            return StorageError::PutObject(err.to_string());
        }
        let key = key.to_string();
        match condition {
            WriteCondition::IfAbsent => StorageError::AlreadyExists { key },
            _ => StorageError::PreconditionFailed { key },
        }
    })?;

    Ok(resp.e_tag().unwrap_or_default().to_string())
}

// 412 for a failed condition, 409 when a concurrent conditional write won.
fn is_precondition_failure(code: Option<&str>, message: &str) -> bool {
    matches!(
        code,
        Some("PreconditionFailed") | Some("ConditionalRequestConflict")
    ) || message.contains("PreconditionFailed")
}
