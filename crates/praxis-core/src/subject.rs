//! Keyed hashing of patient and practice identifiers.
//!
//! Runs and surveys only ever carry these digests. The secret is passed in
//! explicitly by whoever builds the hasher.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::CoreError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct SubjectHasher {
    mac: HmacSha256,
}

impl SubjectHasher {
    pub fn new(key: &[u8]) -> Result<Self, CoreError> {
        if key.is_empty() {
            return Err(CoreError::EmptyHashKey);
        }
        let mac = HmacSha256::new_from_slice(key).map_err(|_| CoreError::EmptyHashKey)?;
        Ok(Self { mac })
    }

    /// HMAC-SHA256 of `id`, hex encoded (64 chars).
    pub fn hash(&self, id: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(id.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl fmt::Debug for SubjectHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SubjectHasher(<redacted>)")
    }
}
