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

//! Reqwest-based transport for blobsign.
//!
//! `ReqwestHttpSend` executes signed requests built by the service crates and
//! hands back the full response, whatever its status. Connection level
//! failures surface as `ErrorKind::TransportFailure`.
//!
//! The default `rustls-tls` feature enables HTTPS in the underlying client.
//! Disable default features only when supplying a `Client` built with
//! another TLS backend.
//!
//! ## Example
//!
//! ```no_run
//! use blobsign_core::Context;
//! use blobsign_http_send_reqwest::ReqwestHttpSend;
//! use reqwest::Client;
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), reqwest::Error> {
//! let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
//! let ctx = Context::new().with_http_send(ReqwestHttpSend::new(client));
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use blobsign_core::{Error, HttpSend, Result};
use bytes::Bytes;
use http_body_util::BodyExt;
use log::debug;
use reqwest::{Client, Request};

/// HttpSend implementation backed by a `reqwest::Client`.
#[derive(Debug, Default)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let req = Request::try_from(req)
            .map_err(|e| Error::unexpected("failed to convert request").with_source(e))?;

        debug!("sending {} {}", req.method(), req.url());

        let resp: http::Response<_> = self
            .client
            .execute(req)
            .await
            .map_err(|e| Error::transport_failure("failed to send request").with_source(e))?
            .into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| Error::transport_failure("failed to read response body").with_source(e))?;

        debug!("got response {} with {} bytes", parts.status, bs.len());

        Ok(http::Response::from_parts(parts, bs))
    }
}
