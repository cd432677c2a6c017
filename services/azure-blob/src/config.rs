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

use std::fmt::{Debug, Formatter};

use blobsign_core::utils::Redact;
use blobsign_core::{Context, Error, Result};
use log::debug;
use serde::Deserialize;

use crate::constants::*;
use crate::Credential;

/// Config carries everything a [`BlobClient`](crate::BlobClient) needs.
///
/// Fields that are `Some` are never overwritten, so values set in code win
/// over the environment, which wins over the profile file:
///
/// ```no_run
/// # async fn load() -> blobsign_core::Result<()> {
/// use blobsign_azure_blob::Config;
/// use blobsign_core::{Context, OsEnv};
/// use blobsign_fs_tokio::TokioFs;
///
/// let ctx = Context::new().with_file_read(TokioFs).with_env(OsEnv);
/// let config = Config::default().from_env(&ctx).from_profile(&ctx).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// `account_name` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: `AZBLOB_ACCOUNT_NAME` or `AZURE_STORAGE_ACCOUNT_NAME`
    /// - profile config: `name`
    pub account_name: Option<String>,
    /// `account_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: `AZBLOB_ACCOUNT_KEY` or `AZURE_STORAGE_ACCOUNT_KEY`
    /// - profile config: `key`
    pub account_key: Option<String>,
    /// Container used when an operation does not name one.
    ///
    /// - this field if it's `is_some`
    /// - env value: `AZBLOB_CONTAINER`
    /// - profile config: `container`
    pub container: Option<String>,
    /// Endpoint used instead of `https://{account}.blob.core.windows.net`.
    ///
    /// - this field if it's `is_some`
    /// - env value: `AZBLOB_ENDPOINT`
    /// - profile config: `endpoint`
    pub endpoint: Option<String>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("account_name", &self.account_name)
            .field("account_key", &Redact::from(&self.account_key))
            .field("container", &self.container)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl Config {
    /// Fill unset fields from the environment.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if self.account_name.is_none() {
            self.account_name = ctx
                .env_var(AZBLOB_ACCOUNT_NAME)
                .or_else(|| ctx.env_var(AZURE_STORAGE_ACCOUNT_NAME));
        }
        if self.account_key.is_none() {
            self.account_key = ctx
                .env_var(AZBLOB_ACCOUNT_KEY)
                .or_else(|| ctx.env_var(AZURE_STORAGE_ACCOUNT_KEY));
        }
        if self.container.is_none() {
            self.container = ctx.env_var(AZBLOB_CONTAINER);
        }
        if self.endpoint.is_none() {
            self.endpoint = ctx.env_var(AZBLOB_ENDPOINT);
        }

        self
    }

    /// Fill unset fields from the profile file.
    ///
    /// The account is picked by `account_name` when it is already set, then
    /// by `BLOBSIGN_ACCOUNT`, then the first configured account is used.
    /// A missing profile file leaves the config untouched.
    pub async fn from_profile(mut self, ctx: &Context) -> Result<Self> {
        let account = self
            .account_name
            .clone()
            .or_else(|| ctx.env_var(BLOBSIGN_ACCOUNT));
        let Some(profile) = load_profile(ctx, None, account.as_deref()).await? else {
            return Ok(self);
        };

        if self.account_name.is_none() {
            self.account_name = Some(profile.name);
        }
        if self.account_key.is_none() {
            self.account_key = Some(profile.key);
        }
        if self.container.is_none() {
            self.container = profile.container;
        }
        if self.endpoint.is_none() {
            self.endpoint = profile.endpoint;
        }

        Ok(self)
    }

    /// Set account name and key from a credential.
    pub fn with_credential(mut self, cred: Credential) -> Self {
        self.account_name = Some(cred.account_name);
        self.account_key = Some(cred.account_key);
        self
    }

    /// Set the default container.
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Credential of the configured account.
    ///
    /// Fails with `ConfigInvalid` when name or key is missing.
    pub fn credential(&self) -> Result<Credential> {
        match (self.account_name.as_deref(), self.account_key.as_deref()) {
            (Some(name), Some(key)) if !name.is_empty() && !key.is_empty() => {
                Ok(Credential::with_shared_key(name, key))
            }
            (None, _) | (Some(""), _) => {
                Err(Error::config_invalid("account name is not configured"))
            }
            _ => Err(Error::config_invalid("account key is not configured")),
        }
    }
}

/// One `[[account]]` table of the profile file.
///
/// ```toml
/// [[account]]
/// name = "myaccount"
/// container = "photos"
/// key = "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw=="
/// ```
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct AccountProfile {
    /// Account name.
    pub name: String,
    /// Account key, base64 encoded.
    pub key: String,
    /// Default container.
    #[serde(default)]
    pub container: Option<String>,
    /// Endpoint override.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Debug for AccountProfile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountProfile")
            .field("name", &self.name)
            .field("key", &Redact::from(&self.key))
            .field("container", &self.container)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    account: Vec<AccountProfile>,
}

/// Parse a profile file and pick an account.
///
/// With `account` set only that account matches, otherwise the first one.
pub(crate) fn parse_profile(
    content: &str,
    account: Option<&str>,
) -> Result<Option<AccountProfile>> {
    let file: ProfileFile = toml::from_str(content)
        .map_err(|e| Error::config_invalid("profile file is not valid").with_source(e))?;

    let found = match account {
        Some(name) => file.account.into_iter().find(|v| v.name == name),
        None => file.account.into_iter().next(),
    };
    Ok(found)
}

/// Load an account from the profile file.
///
/// `path` falls back to `BLOBSIGN_CONFIG_FILE` and then to
/// `BLOBSIGN_CONFIG_PATH`. An unreadable file yields `Ok(None)`.
pub(crate) async fn load_profile(
    ctx: &Context,
    path: Option<&str>,
    account: Option<&str>,
) -> Result<Option<AccountProfile>> {
    let path = match path {
        Some(v) => v.to_string(),
        None => ctx
            .env_var(BLOBSIGN_CONFIG_FILE)
            .unwrap_or_else(|| BLOBSIGN_CONFIG_PATH.to_string()),
    };
    let Some(path) = ctx.expand_home_dir(&path) else {
        debug!("home dir not found, skip profile file {path}");
        return Ok(None);
    };

    let content = match ctx.file_read_as_string(&path).await {
        Ok(v) => v,
        Err(err) => {
            debug!("load profile file {path} failed: {err:?}");
            return Ok(None);
        }
    };

    let profile = parse_profile(&content, account)?;
    if profile.is_none() {
        debug!("no account {account:?} configured in {path}");
    }
    Ok(profile)
}
