//! S3-compatible bucket access with AWS Signature Version 4.

use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::{Publisher, encode_key};
use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

const EPUB_CONTENT_TYPE: &str = "application/epub+zip";
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credentials {
    /// Read `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and `AWS_SESSION_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| {
            std::env::var(name).map_err(|_| Error::Config(format!("{name} is not set")))
        };
        Ok(Self {
            access_key_id: var("AWS_ACCESS_KEY_ID")?,
            secret_access_key: var("AWS_SECRET_ACCESS_KEY")?,
            session_token: std::env::var("AWS_SESSION_TOKEN").ok(),
        })
    }
}

/// A bucket on S3 or an S3-compatible service.
pub struct S3Bucket {
    client: Client,
    bucket: String,
    region: String,
    /// Custom endpoint (e.g. `http://localhost:9000`); addressed path-style.
    endpoint: Option<String>,
    credentials: Credentials,
    public_base_url: Option<String>,
}

impl S3Bucket {
    pub fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        endpoint: Option<String>,
        credentials: Credentials,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            bucket: bucket.into(),
            region: region.into(),
            endpoint: endpoint.map(|e| e.trim_end_matches('/').to_string()),
            credentials,
            public_base_url: None,
        })
    }

    /// Base URL handed out for published objects instead of the bucket URL.
    pub fn with_public_base_url(mut self, url: Option<String>) -> Self {
        self.public_base_url = url.map(|u| u.trim_end_matches('/').to_string());
        self
    }

    /// Host header and absolute URL for `key`.
    fn locate(&self, key: &str) -> (String, String, String) {
        let encoded = encode_key(key);
        match &self.endpoint {
            Some(endpoint) => {
                let host = endpoint
                    .split_once("://")
                    .map_or(endpoint.as_str(), |(_, h)| h)
                    .to_string();
                let path = format!("/{}/{encoded}", self.bucket);
                (host, format!("{endpoint}{path}"), path)
            }
            None => {
                let host = format!("{}.s3.{}.amazonaws.com", self.bucket, self.region);
                let path = format!("/{encoded}");
                (host.clone(), format!("https://{host}{path}"), path)
            }
        }
    }

    pub fn object_url(&self, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{base}/{}", encode_key(key)),
            None => self.locate(key).1,
        }
    }

    pub fn put_object(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        let (host, url, path) = self.locate(key);
        let headers = self.signed_headers("PUT", &host, &path, bytes, Utc::now());

        let mut request = self.client.put(&url).header("content-type", content_type);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        let response = request.body(bytes.to_vec()).send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Upload(format!(
                "PUT {key}: HTTP {} {}",
                status.as_u16(),
                body.trim()
            )));
        }
        debug!(bucket = %self.bucket, key, size = bytes.len(), "stored object");
        Ok(())
    }

    pub fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let (host, url, path) = self.locate(key);
        let headers = self.signed_headers("GET", &host, &path, b"", Utc::now());

        let mut request = self.client.get(&url);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        let response = request.send()?;

        match response.status() {
            status if status.is_success() => Ok(response.bytes()?.to_vec()),
            StatusCode::NOT_FOUND => Err(Error::NotFound(format!("s3://{}/{key}", self.bucket))),
            status => Err(Error::Api {
                status: status.as_u16(),
                message: format!("GET s3://{}/{key}", self.bucket),
            }),
        }
    }

    /// Headers to send, including `authorization`.
    fn signed_headers(
        &self,
        method: &str,
        host: &str,
        path: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Vec<(String, String)> {
        let mut headers = vec![
            ("host".to_string(), host.to_string()),
            ("x-amz-content-sha256".to_string(), hex::encode(Sha256::digest(payload))),
            ("x-amz-date".to_string(), now.format("%Y%m%dT%H%M%SZ").to_string()),
        ];
        if let Some(token) = &self.credentials.session_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }

        let authorization = sign(&SigningRequest {
            method,
            path,
            headers: &headers,
            credentials: &self.credentials,
            region: &self.region,
            now,
        });
        headers.retain(|(name, _)| name != "host");
        headers.push(("authorization".to_string(), authorization));
        headers
    }
}

impl Publisher for S3Bucket {
    fn publish(&self, key: &str, bytes: &[u8]) -> Result<String> {
        info!(bucket = %self.bucket, key, "uploading to bucket");
        self.put_object(key, bytes, EPUB_CONTENT_TYPE)?;
        Ok(self.object_url(key))
    }
}

struct SigningRequest<'a> {
    method: &'a str,
    /// Already-encoded absolute path.
    path: &'a str,
    /// Lower-case header names with their values. `x-amz-content-sha256`
    /// and `x-amz-date` must be present.
    headers: &'a [(String, String)],
    credentials: &'a Credentials,
    region: &'a str,
    now: DateTime<Utc>,
}

/// Compute the `Authorization` header value for a request without a query string.
fn sign(req: &SigningRequest<'_>) -> String {
    let mut headers: Vec<(&str, &str)> = req
        .headers
        .iter()
        .map(|(n, v)| (n.as_str(), v.trim()))
        .collect();
    headers.sort_by(|a, b| a.0.cmp(b.0));

    let payload_hash = header_value(&headers, "x-amz-content-sha256");
    let amz_date = header_value(&headers, "x-amz-date");

    let canonical_headers: String = headers.iter().map(|(n, v)| format!("{n}:{v}\n")).collect();
    let signed_headers = headers.iter().map(|(n, _)| *n).collect::<Vec<_>>().join(";");
    let canonical_request = format!(
        "{}\n{}\n\n{canonical_headers}\n{signed_headers}\n{payload_hash}",
        req.method, req.path
    );

    let date = req.now.format("%Y%m%d").to_string();
    let scope = format!("{date}/{}/s3/aws4_request", req.region);
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let key = signing_key(&req.credentials.secret_access_key, &date, req.region, "s3");
    let signature = hex::encode(hmac(&key, string_to_sign.as_bytes()));

    format!(
        "AWS4-HMAC-SHA256 Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
        req.credentials.access_key_id
    )
}

fn header_value<'a>(headers: &[(&str, &'a str)], name: &str) -> &'a str {
    headers.iter().find(|(n, _)| *n == name).map_or("", |(_, v)| *v)
}

fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac(format!("AWS4{secret}").as_bytes(), date.as_bytes());
    let k_region = hmac(&k_date, region.as_bytes());
    let k_service = hmac(&k_region, service.as_bytes());
    hmac(&k_service, b"aws4_request")
}

fn hmac(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC key size is always valid");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
