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

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use blobsign_core::{Error, Result};
use http::Method;
use percent_encoding::utf8_percent_encode;

use crate::constants::AZURE_PATH_ENCODE_SET;

/// Longest blob name the service accepts.
const MAX_BLOB_NAME_LEN: usize = 1024;

/// ResourcePath addresses a container or a blob inside it, without the
/// account prefix.
///
/// ```
/// use blobsign_azure_blob::ResourcePath;
///
/// let path: ResourcePath = "photos/2024/cat.jpg".parse().unwrap();
/// assert_eq!(path.container(), "photos");
/// assert_eq!(path.blob(), Some("2024/cat.jpg"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourcePath {
    container: String,
    blob: Option<String>,
}

impl ResourcePath {
    /// Parse `container` or `container/blob`.
    ///
    /// The blob part may contain `/` to express virtual directories, but no
    /// segment may be empty.
    pub fn parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::invalid_resource("resource path is empty"));
        }
        if path.starts_with('/') || path.ends_with('/') {
            return Err(Error::invalid_resource(format!(
                "resource path {path:?} must not start or end with '/'"
            )));
        }
        if path.contains(['?', '#']) {
            return Err(Error::invalid_resource(format!(
                "resource path {path:?} must not carry a query or fragment"
            )));
        }
        if path.split('/').any(|seg| seg.is_empty()) {
            return Err(Error::invalid_resource(format!(
                "resource path {path:?} contains an empty segment"
            )));
        }

        let (container, blob) = match path.split_once('/') {
            Some((c, b)) => (c, Some(b)),
            None => (path, None),
        };

        check_container_name(container)?;
        if let Some(blob) = blob {
            if blob.len() > MAX_BLOB_NAME_LEN {
                return Err(Error::invalid_resource(format!(
                    "blob name is longer than {MAX_BLOB_NAME_LEN} bytes"
                )));
            }
        }

        Ok(Self {
            container: container.to_string(),
            blob: blob.map(|b| b.to_string()),
        })
    }

    /// Address a blob by container and blob name.
    pub fn blob_in(container: &str, blob: &str) -> Result<Self> {
        Self::parse(&format!("{container}/{blob}"))
    }

    /// Container part.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Blob part, `None` when the path names a container.
    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }

    /// Percent encoded absolute path as it appears in the request line,
    /// for example `/photos/2024/my%20cat.jpg`.
    pub fn encoded_path(&self) -> String {
        let mut s = String::with_capacity(self.container.len() + 1);
        s.push('/');
        s.push_str(&self.container);

        if let Some(blob) = &self.blob {
            for seg in blob.split('/') {
                s.push('/');
                s.extend(utf8_percent_encode(seg, &AZURE_PATH_ENCODE_SET));
            }
        }

        s
    }
}

impl FromStr for ResourcePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Display for ResourcePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.blob {
            Some(blob) => write!(f, "{}/{}", self.container, blob),
            None => f.write_str(&self.container),
        }
    }
}

/// Container names are 3 to 63 characters of lowercase letters, digits and
/// single hyphens, starting and ending with a letter or digit. The reserved
/// `$root`, `$logs` and `$web` containers are accepted as well.
///
/// ## Reference
///
/// - [Naming and Referencing Containers, Blobs, and Metadata](https://learn.microsoft.com/en-us/rest/api/storageservices/naming-and-referencing-containers--blobs--and-metadata)
fn check_container_name(name: &str) -> Result<()> {
    if matches!(name, "$root" | "$logs" | "$web") {
        return Ok(());
    }

    let valid = (3..=63).contains(&name.len())
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !name.starts_with('-')
        && !name.ends_with('-')
        && !name.contains("--");

    if valid {
        Ok(())
    } else {
        Err(Error::invalid_resource(format!(
            "invalid container name {name:?}"
        )))
    }
}

/// Operation is the kind of request a client issues.
///
/// The operation decides the HTTP method, the query parameters and which
/// protocol headers take part in the signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// List the blobs of a container.
    ListBlobs,
    /// Download a blob.
    GetBlob,
    /// Upload a blob as a single block blob.
    PutBlob,
}

impl Operation {
    /// HTTP method of this operation.
    pub fn method(&self) -> Method {
        match self {
            Operation::ListBlobs | Operation::GetBlob => Method::GET,
            Operation::PutBlob => Method::PUT,
        }
    }

    /// Writes carry a body and the blob type headers.
    pub fn is_write(&self) -> bool {
        matches!(self, Operation::PutBlob)
    }

    /// Query parameters required by this operation, in request order.
    pub fn query(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Operation::ListBlobs => &[("restype", "container"), ("comp", "list")],
            Operation::GetBlob | Operation::PutBlob => &[],
        }
    }

    /// Check that the resource has the shape this operation addresses.
    pub fn check(&self, resource: &ResourcePath) -> Result<()> {
        match (self, resource.blob()) {
            (Operation::ListBlobs, Some(_)) => Err(Error::invalid_resource(format!(
                "listing addresses a container, got {resource}"
            ))),
            (Operation::GetBlob | Operation::PutBlob, None) => Err(Error::invalid_resource(
                format!("{self:?} addresses a blob, got container {resource}"),
            )),
            _ => Ok(()),
        }
    }
}
