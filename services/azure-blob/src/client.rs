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

use blobsign_core::{Context, Error, ErrorKind, Result};
use bytes::Bytes;
use log::debug;

use crate::extract::{extract_names, Extractor};
use crate::{Config, Credential, Operation, RequestSigner, ResourcePath};

/// BlobClient runs signed blob operations through the collaborators of a
/// [`Context`].
///
/// Every call captures a fresh timestamp and signs its own request, so one
/// client can be shared by concurrent tasks.
///
/// ```no_run
/// # async fn run() -> blobsign_core::Result<()> {
/// use blobsign_azure_blob::{BlobClient, Config};
/// use blobsign_core::{Context, OsEnv};
/// use blobsign_http_send_reqwest::ReqwestHttpSend;
///
/// let ctx = Context::new()
///     .with_http_send(ReqwestHttpSend::default())
///     .with_env(OsEnv);
/// let config = Config::default().from_env(&ctx);
/// let client = BlobClient::new(ctx, config)?;
///
/// for name in client.list_blobs(Some("photos")).await? {
///     println!("{name}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BlobClient {
    ctx: Context,
    credential: Credential,
    container: Option<String>,
    signer: RequestSigner,
}

impl BlobClient {
    /// Create a client.
    ///
    /// Fails with `ConfigInvalid` when the config lacks the account name or
    /// key.
    pub fn new(ctx: Context, config: Config) -> Result<Self> {
        let credential = config.credential()?;

        let mut signer = RequestSigner::new();
        if let Some(endpoint) = config.endpoint {
            signer = signer.with_endpoint(endpoint);
        }

        Ok(Self {
            ctx,
            credential,
            container: config.container,
            signer,
        })
    }

    /// Replace the request signer, for example to pin the signing time.
    pub fn with_signer(mut self, signer: RequestSigner) -> Self {
        self.signer = signer;
        self
    }

    /// List the names of the blobs in `container`, in server order.
    ///
    /// `None` lists the configured default container. An error element in
    /// the response fails the call even when names were found before it.
    pub async fn list_blobs(&self, container: Option<&str>) -> Result<Vec<String>> {
        let container = match container.or(self.container.as_deref()) {
            Some(v) => v,
            None => {
                return Err(Error::config_invalid(
                    "no container given and no default container configured",
                ))
            }
        };
        let resource = ResourcePath::parse(container)?;

        let resp = self
            .send(Operation::ListBlobs, &resource, Bytes::new())
            .await?;
        let names = extract_names(resp.body())?;

        debug!("listed {} blobs in {container}", names.len());
        Ok(names)
    }

    /// Upload `body` as a block blob at `path` (`container/blob`).
    pub async fn put_blob(&self, path: &str, body: Bytes) -> Result<()> {
        let resource = ResourcePath::parse(path)?;
        self.send(Operation::PutBlob, &resource, body).await?;
        Ok(())
    }

    /// Upload the local file at `local_path` to `path`.
    pub async fn upload_file(&self, path: &str, local_path: &str) -> Result<()> {
        let content = self.ctx.file_read(local_path).await?;
        debug!("uploading {} bytes from {local_path} to {path}", content.len());

        self.put_blob(path, Bytes::from(content)).await
    }

    /// Download the blob at `path` (`container/blob`).
    pub async fn get_blob(&self, path: &str) -> Result<Bytes> {
        let resource = ResourcePath::parse(path)?;
        let resp = self
            .send(Operation::GetBlob, &resource, Bytes::new())
            .await?;
        Ok(resp.into_body())
    }

    /// Download the blob at `path` into the local file at `local_path`.
    pub async fn download_file(&self, path: &str, local_path: &str) -> Result<()> {
        let content = self.get_blob(path).await?;
        debug!("downloaded {} bytes from {path} to {local_path}", content.len());

        self.ctx.file_write(local_path, content).await
    }

    async fn send(
        &self,
        operation: Operation,
        resource: &ResourcePath,
        body: Bytes,
    ) -> Result<http::Response<Bytes>> {
        let signed = self
            .signer
            .sign(&self.credential, operation, resource, body.len() as u64)?;
        let req = signed.into_request(body)?;

        let resp = self.ctx.http_send(req).await?;
        check_response(resp)
    }
}

/// Turn a non-success response into `ServerRejected`.
///
/// The message is taken from the XML error body when there is one, and is
/// the status line otherwise.
fn check_response(resp: http::Response<Bytes>) -> Result<http::Response<Bytes>> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let rejected = Extractor::new(resp.body().as_ref()).find_map(|v| match v {
        Err(err) if err.kind() == ErrorKind::ServerRejected => Some(err),
        _ => None,
    });
    debug!("request failed with {status}");

    Err(rejected.unwrap_or_else(|| Error::server_rejected(status.to_string())))
}
