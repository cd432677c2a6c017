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

use anyhow::Result;
use blobsign_azure_blob::{BlobClient, Config, DefaultCredentialProvider};
use blobsign_core::{Context, OsEnv, ProvideCredential};
use blobsign_fs_tokio::TokioFs;
use blobsign_http_send_reqwest::ReqwestHttpSend;
use bytes::Bytes;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = env_logger::builder().try_init();

    let ctx = Context::new()
        .with_file_read(TokioFs)
        .with_file_write(TokioFs)
        .with_http_send(ReqwestHttpSend::default())
        .with_env(OsEnv);

    // Credentials come from AZBLOB_ACCOUNT_NAME / AZBLOB_ACCOUNT_KEY or from
    // ~/.config/blobsign/config.toml.
    let Some(cred) = DefaultCredentialProvider::new().provide_credential(&ctx).await? else {
        println!("No azure blob credential found.");
        println!("Set AZBLOB_ACCOUNT_NAME and AZBLOB_ACCOUNT_KEY, or add an [[account]] to ~/.config/blobsign/config.toml");
        return Ok(());
    };
    let config = Config::default()
        .with_credential(cred)
        .from_env(&ctx)
        .from_profile(&ctx)
        .await?;
    let Some(container) = config.container.clone() else {
        println!("Set AZBLOB_CONTAINER to the container to use");
        return Ok(());
    };
    println!("Using {config:?}");

    let client = BlobClient::new(ctx, config)?;

    let path = format!("{container}/blobsign-example/hello.txt");
    client
        .put_blob(&path, Bytes::from_static(b"Hello from blobsign"))
        .await?;
    println!("Uploaded {path}");

    println!("Blobs in {container}:");
    for name in client.list_blobs(None).await? {
        println!("  {name}");
    }

    let content = client.get_blob(&path).await?;
    println!("Downloaded {path}: {}", String::from_utf8_lossy(&content));

    Ok(())
}
