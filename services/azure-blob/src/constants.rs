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

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

// Headers used in azure blob services.
pub const X_MS_DATE: &str = "x-ms-date";
pub const X_MS_VERSION: &str = "x-ms-version";
pub const X_MS_BLOB_TYPE: &str = "x-ms-blob-type";

// Header values.
pub const AZURE_VERSION: &str = "2019-12-12";
pub const BLOCK_BLOB: &str = "BlockBlob";
pub const OCTET_STREAM: &str = "application/octet-stream";

// Host template, the account is prepended as the first label.
pub const BLOB_HOST_SUFFIX: &str = "blob.core.windows.net";

// Env values used in azure blob services.
pub const AZBLOB_ACCOUNT_NAME: &str = "AZBLOB_ACCOUNT_NAME";
pub const AZBLOB_ACCOUNT_KEY: &str = "AZBLOB_ACCOUNT_KEY";
pub const AZBLOB_CONTAINER: &str = "AZBLOB_CONTAINER";
pub const AZBLOB_ENDPOINT: &str = "AZBLOB_ENDPOINT";
pub const AZURE_STORAGE_ACCOUNT_NAME: &str = "AZURE_STORAGE_ACCOUNT_NAME";
pub const AZURE_STORAGE_ACCOUNT_KEY: &str = "AZURE_STORAGE_ACCOUNT_KEY";
pub const BLOBSIGN_CONFIG_FILE: &str = "BLOBSIGN_CONFIG_FILE";
pub const BLOBSIGN_ACCOUNT: &str = "BLOBSIGN_ACCOUNT";

pub const BLOBSIGN_CONFIG_PATH: &str = "~/.config/blobsign/config.toml";

/// Path segments keep unreserved characters only, everything else is
/// percent encoded. `/` never reaches this set because paths are encoded
/// segment by segment.
pub static AZURE_PATH_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');
