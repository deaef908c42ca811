use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use reqwest::Client;

use super::{ObjectStore, ObjectStoreError};

const STORAGE_API_VERSION: &str = "2021-08-06";

/// Azure Blob Storage backend for the bronze container.
///
/// Requests are signed with the account's SharedKey (HMAC-SHA256 over the
/// canonicalized request). Only HEAD/GET/conditional-PUT are issued; the
/// bronze path is append-only by contract.
pub struct AzureBlobStore {
    account: String,
    container: String,
    client: Client,
    key: ring::hmac::Key,
}

impl AzureBlobStore {
    pub fn new(account: &str, shared_key: &str, container: &str) -> Result<Self, anyhow::Error> {
        let client = Client::builder().build()?;
        let key_bytes = base64::engine::general_purpose::STANDARD.decode(shared_key)?;
        let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA256, &key_bytes);

        Ok(Self {
            account: account.to_string(),
            container: container.to_string(),
            client,
            key,
        })
    }

    fn blob_url(&self, key: &str) -> String {
        format!(
            "https://{}.blob.core.windows.net/{}/{}",
            self.account, self.container, key
        )
    }

    fn rfc1123_now() -> String {
        chrono::Utc::now()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string()
    }

    /// SharedKey authorization header for one request.
    ///
    /// `content_length` is the empty string for bodyless requests (the
    /// 2015-02-21+ signing rules), and `x_ms_headers` must be sorted
    /// lowercase (name, value) pairs.
    fn authorization(
        &self,
        verb: &str,
        key: &str,
        content_length: &str,
        content_type: &str,
        if_none_match: &str,
        x_ms_headers: &[(&str, &str)],
    ) -> String {
        let canonicalized_headers: String = x_ms_headers
            .iter()
            .map(|(name, value)| format!("{name}:{value}\n"))
            .collect();
        let canonicalized_resource = format!("/{}/{}/{}", self.account, self.container, key);

        // VERB, Content-Encoding, Content-Language, Content-Length, Content-MD5,
        // Content-Type, Date, If-Modified-Since, If-Match, If-None-Match,
        // If-Unmodified-Since, Range, then canonicalized headers + resource.
        let string_to_sign = format!(
            "{verb}\n\n\n{content_length}\n\n{content_type}\n\n\n\n{if_none_match}\n\n\n{canonicalized_headers}{canonicalized_resource}"
        );

        let tag = ring::hmac::sign(&self.key, string_to_sign.as_bytes());
        let signature = base64::engine::general_purpose::STANDARD.encode(tag.as_ref());

        format!("SharedKey {}:{}", self.account, signature)
    }
}

#[async_trait]
impl ObjectStore for AzureBlobStore {
    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
        let date = Self::rfc1123_now();
        let auth = self.authorization(
            "HEAD",
            key,
            "",
            "",
            "",
            &[
                ("x-ms-date", date.as_str()),
                ("x-ms-version", STORAGE_API_VERSION),
            ],
        );

        let resp = self
            .client
            .head(self.blob_url(key))
            .header("x-ms-date", &date)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header("Authorization", auth)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }

        if !resp.status().is_success() {
            return Err(ObjectStoreError::Backend(format!(
                "Blob existence check failed ({})",
                resp.status()
            )));
        }

        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        let date = Self::rfc1123_now();
        let auth = self.authorization(
            "GET",
            key,
            "",
            "",
            "",
            &[
                ("x-ms-date", date.as_str()),
                ("x-ms-version", STORAGE_API_VERSION),
            ],
        );

        let resp = self
            .client
            .get(self.blob_url(key))
            .header("x-ms-date", &date)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header("Authorization", auth)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ObjectStoreError::NotFound(key.to_string()));
        }

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ObjectStoreError::Backend(format!(
                "Blob download failed ({status}): {body}"
            )));
        }

        let data = resp
            .bytes()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

        Ok(data)
    }

    async fn put_if_absent(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError> {
        let date = Self::rfc1123_now();
        let content_length = data.len().to_string();
        let content_type = "text/csv";
        let auth = self.authorization(
            "PUT",
            key,
            &content_length,
            content_type,
            "*",
            &[
                ("x-ms-blob-type", "BlockBlob"),
                ("x-ms-date", date.as_str()),
                ("x-ms-version", STORAGE_API_VERSION),
            ],
        );

        // If-None-Match: * makes the create conditional on absence; the
        // service answers 412 when the blob is already there.
        let resp = self
            .client
            .put(self.blob_url(key))
            .header("x-ms-blob-type", "BlockBlob")
            .header("x-ms-date", &date)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header("If-None-Match", "*")
            .header("Content-Type", content_type)
            .header("Authorization", auth)
            .body(data)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::PRECONDITION_FAILED
            || resp.status() == reqwest::StatusCode::CONFLICT
        {
            return Err(ObjectStoreError::AlreadyExists(key.to_string()));
        }

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ObjectStoreError::Backend(format!(
                "Blob upload failed ({status}): {body}"
            )));
        }

        Ok(())
    }
}
