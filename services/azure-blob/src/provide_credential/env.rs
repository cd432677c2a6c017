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

use async_trait::async_trait;
use blobsign_core::{Context, ProvideCredential, Result};
use log::debug;

use crate::constants::*;
use crate::Credential;

/// EnvCredentialProvider loads the account from environment variables.
///
/// - account name: `AZBLOB_ACCOUNT_NAME`, then `AZURE_STORAGE_ACCOUNT_NAME`
/// - account key: `AZBLOB_ACCOUNT_KEY`, then `AZURE_STORAGE_ACCOUNT_KEY`
///
/// Both must be present, otherwise no credential is returned.
#[derive(Clone, Debug, Default)]
pub struct EnvCredentialProvider {}

impl EnvCredentialProvider {
    /// Create a new provider.
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl ProvideCredential for EnvCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let envs = ctx.env_vars();

        let account_name = envs
            .get(AZBLOB_ACCOUNT_NAME)
            .or_else(|| envs.get(AZURE_STORAGE_ACCOUNT_NAME));
        let account_key = envs
            .get(AZBLOB_ACCOUNT_KEY)
            .or_else(|| envs.get(AZURE_STORAGE_ACCOUNT_KEY));

        match (account_name, account_key) {
            (Some(name), Some(key)) => Ok(Some(Credential::with_shared_key(name, key))),
            _ => {
                debug!("account name or key not found in env");
                Ok(None)
            }
        }
    }
}
