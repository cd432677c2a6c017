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

use crate::config::load_profile;
use crate::constants::BLOBSIGN_ACCOUNT;
use crate::Credential;

/// ConfigFileCredentialProvider loads the account from the profile file.
///
/// The file lives at `~/.config/blobsign/config.toml` unless
/// `BLOBSIGN_CONFIG_FILE` points elsewhere:
///
/// ```toml
/// [[account]]
/// name = "myaccount"
/// container = "photos"
/// key = "..."
/// ```
///
/// The account named by [`with_account`](Self::with_account) or
/// `BLOBSIGN_ACCOUNT` is used, otherwise the first one in the file.
#[derive(Clone, Debug, Default)]
pub struct ConfigFileCredentialProvider {
    path: Option<String>,
    account: Option<String>,
}

impl ConfigFileCredentialProvider {
    /// Create a new provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read this file instead of the default location.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Load this account instead of the first configured one.
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }
}

#[async_trait]
impl ProvideCredential for ConfigFileCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let account = self
            .account
            .clone()
            .or_else(|| ctx.env_var(BLOBSIGN_ACCOUNT));

        let profile = load_profile(ctx, self.path.as_deref(), account.as_deref()).await?;
        Ok(profile.map(|v| Credential::with_shared_key(&v.name, &v.key)))
    }
}
