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

//! Azure Blob Storage Shared Key signing and blob operations.
//!
//! This crate provides:
//!
//! - Shared Key request signing: [`string_to_sign`], [`sign`] and
//!   [`RequestSigner`] turn an operation on a [`ResourcePath`] into a signed
//!   request.
//! - Streaming extraction of blob names and server errors from XML
//!   responses: [`Extractor`].
//! - Credential loading from env and the profile file:
//!   [`DefaultCredentialProvider`] and friends, plus [`Config`].
//! - [`BlobClient`], which lists, uploads and downloads blobs through the
//!   collaborators of a [`blobsign_core::Context`].
//!
//! # Example
//!
//! ```rust,no_run
//! use anyhow::Result;
//! use blobsign_azure_blob::{BlobClient, Config, DefaultCredentialProvider};
//! use blobsign_core::{Context, OsEnv, ProvideCredential};
//! use blobsign_fs_tokio::TokioFs;
//! use blobsign_http_send_reqwest::ReqwestHttpSend;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let ctx = Context::new()
//!         .with_file_read(TokioFs)
//!         .with_file_write(TokioFs)
//!         .with_http_send(ReqwestHttpSend::default())
//!         .with_env(OsEnv);
//!
//!     let cred = DefaultCredentialProvider::new()
//!         .provide_credential(&ctx)
//!         .await?
//!         .ok_or_else(|| anyhow::anyhow!("no azure blob credential found"))?;
//!     let config = Config::default().with_credential(cred).with_container("photos");
//!
//!     let client = BlobClient::new(ctx, config)?;
//!     client.upload_file("photos/cat.jpg", "/tmp/cat.jpg").await?;
//!     for name in client.list_blobs(None).await? {
//!         println!("{name}");
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

mod constants;

mod resource;
pub use resource::{Operation, ResourcePath};

mod canonical;
pub use canonical::{string_to_sign, CanonicalRequest};

mod credential;
pub use credential::Credential;

mod sign_request;
pub use sign_request::{authorization, sign, RequestSigner, SignedRequest};

mod extract;
pub use extract::{extract_names, Element, Extractor, Scanner};

mod config;
pub use config::{AccountProfile, Config};

mod provide_credential;
pub use provide_credential::*;

mod client;
pub use client::BlobClient;
