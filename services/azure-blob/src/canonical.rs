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

use std::fmt::Write;

use blobsign_core::time::{format_http_date, DateTime};
use blobsign_core::{Error, Result};
use log::debug;

use crate::constants::*;
use crate::{Operation, ResourcePath};

/// CanonicalRequest is everything that takes part in the signature of one
/// request.
///
/// The same value feeds both the string to sign and the headers the request
/// carries, so the two can never drift apart.
#[derive(Debug, Clone)]
pub struct CanonicalRequest<'a> {
    account: &'a str,
    operation: Operation,
    resource: &'a ResourcePath,
    endpoint_path: &'a str,
    content_length: u64,
    date: String,
}

impl<'a> CanonicalRequest<'a> {
    /// Create a canonical request.
    ///
    /// `time` is the single timestamp of this request, it ends up in the
    /// `x-ms-date` header and in the signature.
    pub fn new(
        account: &'a str,
        operation: Operation,
        resource: &'a ResourcePath,
        content_length: u64,
        time: DateTime,
    ) -> Result<Self> {
        if account.is_empty() {
            return Err(Error::invalid_resource(
                "account name is required to build the canonical resource",
            ));
        }
        operation.check(resource)?;

        Ok(Self {
            account,
            operation,
            resource,
            endpoint_path: "",
            content_length,
            date: format_http_date(time),
        })
    }

    /// Path of a path style endpoint, for example `/devstoreaccount1`.
    ///
    /// It precedes the resource path in both the url and the canonical
    /// resource.
    pub fn with_endpoint_path(mut self, endpoint_path: &'a str) -> Self {
        self.endpoint_path = endpoint_path;
        self
    }

    /// Value of the `x-ms-date` header.
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Operation of this request.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Value of `Content-Type`, empty for reads.
    pub fn content_type(&self) -> &'static str {
        if self.operation.is_write() {
            OCTET_STREAM
        } else {
            ""
        }
    }

    /// Value of `Content-Length` as it is signed.
    ///
    /// Since version 2015-02-21 a zero length is signed as the empty string.
    pub fn content_length(&self) -> String {
        if self.operation.is_write() && self.content_length > 0 {
            self.content_length.to_string()
        } else {
            String::new()
        }
    }

    /// `x-ms-*` headers of this request, lowercase and sorted by name.
    pub fn ms_headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::with_capacity(3);
        if self.operation.is_write() {
            headers.push((X_MS_BLOB_TYPE, BLOCK_BLOB.to_string()));
        }
        headers.push((X_MS_DATE, self.date.clone()));
        headers.push((X_MS_VERSION, AZURE_VERSION.to_string()));

        headers.sort();
        headers
    }

    /// Construct string to sign
    ///
    /// ## Format
    ///
    /// ```text
    /// VERB + "\n" +
    /// Content-Encoding + "\n" +
    /// Content-Language + "\n" +
    /// Content-Length + "\n" +
    /// Content-MD5 + "\n" +
    /// Content-Type + "\n" +
    /// Date + "\n" +
    /// If-Modified-Since + "\n" +
    /// If-Match + "\n" +
    /// If-None-Match + "\n" +
    /// If-Unmodified-Since + "\n" +
    /// Range + "\n" +
    /// CanonicalizedHeaders +
    /// CanonicalizedResource;
    /// ```
    ///
    /// `Date` stays empty because `x-ms-date` is always sent.
    ///
    /// ## Reference
    ///
    /// - [Blob, Queue, and File Services (Shared Key authorization)](https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key)
    pub fn string_to_sign(&self) -> Result<String> {
        let mut s = String::with_capacity(256);

        writeln!(&mut s, "{}", self.operation.method().as_str())?;
        // Content-Encoding
        writeln!(&mut s)?;
        // Content-Language
        writeln!(&mut s)?;
        writeln!(&mut s, "{}", self.content_length())?;
        // Content-MD5
        writeln!(&mut s)?;
        writeln!(&mut s, "{}", self.content_type())?;
        // Date, If-Modified-Since, If-Match, If-None-Match, If-Unmodified-Since, Range
        for _ in 0..6 {
            writeln!(&mut s)?;
        }
        for (name, value) in self.ms_headers() {
            writeln!(&mut s, "{name}:{value}")?;
        }
        write!(&mut s, "{}", self.canonicalize_resource())?;

        debug!("string to sign: {:?}", &s);

        Ok(s)
    }

    /// ## Reference
    ///
    /// - [Constructing the canonicalized resource string](https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key#constructing-the-canonicalized-resource-string)
    fn canonicalize_resource(&self) -> String {
        let mut s = format!(
            "/{}{}{}",
            self.account,
            self.endpoint_path,
            self.resource.encoded_path()
        );

        let mut query = self.operation.query().to_vec();
        query.sort();
        for (k, v) in query {
            s.push('\n');
            s.push_str(&k.to_lowercase());
            s.push(':');
            s.push_str(v);
        }

        s
    }
}

/// Build the string to sign for one request.
///
/// Fails with `InvalidResource` when `resource_path` is empty, malformed or
/// does not fit the operation.
pub fn string_to_sign(
    account: &str,
    operation: Operation,
    resource_path: &str,
    content_length: u64,
    time: DateTime,
) -> Result<String> {
    let resource = ResourcePath::parse(resource_path)?;
    CanonicalRequest::new(account, operation, &resource, content_length, time)?.string_to_sign()
}
