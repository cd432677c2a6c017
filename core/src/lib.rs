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

//! Core components for signing blob storage requests with a shared key.
//!
//! This crate provides the foundational types and traits shared by the blobsign
//! service crates. It defines the collaborator seams a client needs (file
//! access, HTTP transport, environment lookup) without committing to any
//! runtime.
//!
//! ## Overview
//!
//! - **Context**: A container that holds implementations for file reading, file
//!   writing, HTTP sending and environment access
//! - **Traits**: Abstract interfaces for credential loading (`ProvideCredential`)
//!   and credential validation (`SigningCredential`)
//! - **Error**: A single error type whose [`ErrorKind`] tells callers what went
//!   wrong (bad key, bad resource, server rejection, parse failure, transport)
//!
//! ## Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use blobsign_core::{Context, ProvideCredential, Result, SigningCredential};
//!
//! #[derive(Clone, Debug)]
//! struct MyCredential {
//!     account: String,
//!     key: String,
//! }
//!
//! impl SigningCredential for MyCredential {
//!     fn is_valid(&self) -> bool {
//!         !self.account.is_empty() && !self.key.is_empty()
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct MyLoader;
//!
//! #[async_trait]
//! impl ProvideCredential for MyLoader {
//!     type Credential = MyCredential;
//!
//!     async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
//!         Ok(Some(MyCredential {
//!             account: "myaccount".to_string(),
//!             key: "bXlrZXk=".to_string(),
//!         }))
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let ctx = Context::new();
//! let cred = MyLoader.provide_credential(&ctx).await?;
//! assert!(cred.is_valid());
//! # Ok(())
//! # }
//! ```
//!
//! ## Utilities
//!
//! - [`hash`]: base64 and HMAC-SHA256 helpers
//! - [`time`]: Timestamp capture and HTTP date formatting
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::Context;
pub use context::Env;
pub use context::FileRead;
pub use context::FileWrite;
pub use context::HttpSend;
pub use context::NoopEnv;
pub use context::NoopFileRead;
pub use context::NoopFileWrite;
pub use context::NoopHttpSend;
pub use context::OsEnv;
pub use context::StaticEnv;

mod api;
pub use api::{ProvideCredential, SigningCredential};

mod error;
pub use error::{Error, ErrorKind, Result};
