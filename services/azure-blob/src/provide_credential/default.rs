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
use blobsign_core::{Context, ProvideCredential, Result, SigningCredential};
use log::debug;

use crate::provide_credential::{ConfigFileCredentialProvider, EnvCredentialProvider};
use crate::Credential;

/// DefaultCredentialProvider tries the usual sources in order:
///
/// 1. Environment variables, see [`EnvCredentialProvider`].
/// 2. The profile file, see [`ConfigFileCredentialProvider`].
///
/// A source whose credential has an empty name or key is skipped.
#[derive(Clone, Debug, Default)]
pub struct DefaultCredentialProvider {
    env: EnvCredentialProvider,
    config_file: ConfigFileCredentialProvider,
}

impl DefaultCredentialProvider {
    /// Create a new default provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the profile file provider.
    pub fn with_config_file(mut self, provider: ConfigFileCredentialProvider) -> Self {
        self.config_file = provider;
        self
    }
}

#[async_trait]
impl ProvideCredential for DefaultCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        match self.env.provide_credential(ctx).await? {
            Some(cred) if cred.is_valid() => {
                debug!("loaded credential of {} from env", cred.account_name);
                return Ok(Some(cred));
            }
            Some(_) => debug!("ignoring incomplete credential from env"),
            None => {}
        }

        match self.config_file.provide_credential(ctx).await? {
            Some(cred) if cred.is_valid() => {
                debug!("loaded credential of {} from profile file", cred.account_name);
                return Ok(Some(cred));
            }
            Some(_) => debug!("ignoring incomplete credential from profile file"),
            None => {}
        }

        Ok(None)
    }
}
