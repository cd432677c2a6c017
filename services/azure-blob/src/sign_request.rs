// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use blobsign_core::hash::{base64_decode, base64_hmac_sha256};
use blobsign_core::time::{now, DateTime};
use blobsign_core::{Error, Result};
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use log::debug;

use crate::canonical::CanonicalRequest;
use crate::constants::BLOB_HOST_SUFFIX;
use crate::{Credential, Operation, ResourcePath};

/// Sign a string with the base64 encoded account key.
///
/// Returns the base64 encoded HMAC-SHA256 of `string_to_sign`. A wrong but
/// well-formed key still yields a signature; the server is the one to reject
/// it.
pub fn sign(account_key: &str, string_to_sign: &str) -> Result<String> {
    let key = decode_account_key(account_key)?;
    Ok(base64_hmac_sha256(&key, string_to_sign.as_bytes()))
}

fn decode_account_key(account_key: &str) -> Result<Vec<u8>> {
    if account_key.is_empty() {
        return Err(Error::invalid_key("account key is empty"));
    }

    let key = base64_decode(account_key)
        .map_err(|e| Error::invalid_key("account key is not valid base64").with_source(e))?;
    if key.is_empty() {
        return Err(Error::invalid_key("account key decodes to zero bytes"));
    }

    Ok(key)
}

/// Value of the `Authorization` header for Shared Key authorization.
pub fn authorization(account_name: &str, signature: &str) -> String {
    format!("SharedKey {account_name}:{signature}")
}

/// SignedRequest is a request descriptor ready for the transport.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// HTTP method.
    pub method: Method,
    /// Target url including the operation's query.
    pub uri: Uri,
    /// Protocol headers including `Authorization`.
    pub headers: HeaderMap,
}

impl SignedRequest {
    /// Attach a body and turn the descriptor into an `http::Request`.
    pub fn into_request(self, body: Bytes) -> Result<http::Request<Bytes>> {
        let mut req = http::Request::builder()
            .method(self.method)
            .uri(self.uri)
            .body(body)?;
        *req.headers_mut() = self.headers;
        Ok(req)
    }
}

/// RequestSigner that implement Azure Storage Shared Key Authorization.
///
/// - [Authorize with Shared Key](https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key)
#[derive(Debug, Clone, Default)]
pub struct RequestSigner {
    endpoint: Option<String>,
    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new request signer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Send requests to `endpoint` instead of `https://{account}.blob.core.windows.net`.
    ///
    /// A path in the endpoint (as used by path style emulators such as
    /// `http://127.0.0.1:10000/devstoreaccount1`) is part of the signed
    /// resource.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Build and sign a request for `operation` on `resource`.
    ///
    /// `content_length` is the exact body length for writes and is ignored
    /// for reads.
    pub fn sign(
        &self,
        cred: &Credential,
        operation: Operation,
        resource: &ResourcePath,
        content_length: u64,
    ) -> Result<SignedRequest> {
        // One timestamp per request, shared by the signature and the header.
        let now_time = self.time.unwrap_or_else(now);

        let endpoint = match &self.endpoint {
            Some(v) => v.clone(),
            None => format!("https://{}.{BLOB_HOST_SUFFIX}", cred.account_name),
        };
        let endpoint: Uri = endpoint.trim_end_matches('/').parse().map_err(|e| {
            Error::config_invalid(format!("endpoint {endpoint} is not a valid uri")).with_source(e)
        })?;
        let (Some(scheme), Some(authority)) = (endpoint.scheme_str(), endpoint.authority()) else {
            return Err(Error::config_invalid(format!(
                "endpoint {endpoint} must carry a scheme and a host"
            )));
        };
        let prefix = endpoint.path().trim_end_matches('/');

        let canonical = CanonicalRequest::new(
            &cred.account_name,
            operation,
            resource,
            content_length,
            now_time,
        )?
        .with_endpoint_path(prefix);
        let string_to_sign = canonical.string_to_sign()?;
        let signature = sign(&cred.account_key, &string_to_sign)?;

        let mut url = format!("{scheme}://{authority}{prefix}{}", resource.encoded_path());
        if !operation.query().is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(operation.query())
                .finish();
            url.push('?');
            url.push_str(&query);
        }
        let uri: Uri = url.parse()?;

        let mut headers = HeaderMap::new();
        for (name, value) in canonical.ms_headers() {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_str(&value)?);
        }
        if operation.is_write() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(canonical.content_type()));
            headers.insert(CONTENT_LENGTH, HeaderValue::from(content_length));
        }
        headers.insert(AUTHORIZATION, {
            let mut value: HeaderValue =
                authorization(&cred.account_name, &signature).parse()?;
            value.set_sensitive(true);
            value
        });

        debug!("signed {} {uri}", operation.method());

        Ok(SignedRequest {
            method: operation.method(),
            uri,
            headers,
        })
    }
}
