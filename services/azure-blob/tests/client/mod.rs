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

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use blobsign_azure_blob::{
    authorization, sign, string_to_sign, BlobClient, Config, Credential, Operation, RequestSigner,
};
use chrono::TimeZone;
use blobsign_core::{Context, ErrorKind, HttpSend, Result, StaticEnv};
use blobsign_fs_tokio::TokioFs;
use bytes::Bytes;
use http::{Method, StatusCode};
use pretty_assertions::assert_eq;

const ACCOUNT: &str = "myaccount";
const KEY: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=";

/// In-memory blob service that verifies Shared Key signatures.
#[derive(Debug, Clone, Default)]
struct FakeBlobService {
    containers: Arc<Mutex<BTreeMap<String, BTreeMap<String, Bytes>>>>,
}

impl FakeBlobService {
    fn with_container(self, name: &str) -> Self {
        self.containers
            .lock()
            .unwrap()
            .insert(name.to_string(), BTreeMap::new());
        self
    }

    fn error(status: StatusCode, code: &str, message: &str) -> http::Response<Bytes> {
        let body = format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?><Error><Code>{code}</Code><Message>{message}</Message></Error>"
        );
        http::Response::builder()
            .status(status)
            .body(Bytes::from(body))
            .unwrap()
    }

    fn verify(&self, req: &http::Request<Bytes>, op: Operation, path: &str) -> bool {
        let Some(date) = req.headers().get("x-ms-date") else {
            return false;
        };
        let Ok(time) = chrono::DateTime::parse_from_rfc2822(date.to_str().unwrap_or_default())
        else {
            return false;
        };
        let sts = string_to_sign(
            ACCOUNT,
            op,
            path,
            req.body().len() as u64,
            time.with_timezone(&chrono::Utc),
        )
        .unwrap();
        let expected = authorization(ACCOUNT, &sign(KEY, &sts).unwrap());
        req.headers().get("authorization").map(|v| v.as_bytes()) == Some(expected.as_bytes())
    }
}

#[async_trait]
impl HttpSend for FakeBlobService {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let path = percent_encoding::percent_decode_str(req.uri().path().trim_start_matches('/'))
            .decode_utf8_lossy()
            .to_string();
        let op = match (req.method(), req.uri().query()) {
            (&Method::GET, Some("restype=container&comp=list")) => Operation::ListBlobs,
            (&Method::GET, None) => Operation::GetBlob,
            (&Method::PUT, None) => Operation::PutBlob,
            _ => {
                return Ok(Self::error(
                    StatusCode::BAD_REQUEST,
                    "UnsupportedQueryParameter",
                    "unsupported request",
                ))
            }
        };

        if !self.verify(&req, op, &path) {
            return Ok(Self::error(
                StatusCode::FORBIDDEN,
                "AuthenticationFailed",
                "Server failed to authenticate the request.",
            ));
        }

        let (container, blob) = match path.split_once('/') {
            Some((c, b)) => (c.to_string(), Some(b.to_string())),
            None => (path.clone(), None),
        };
        let mut containers = self.containers.lock().unwrap();
        let Some(blobs) = containers.get_mut(&container) else {
            return Ok(Self::error(
                StatusCode::NOT_FOUND,
                "ContainerNotFound",
                "The specified container does not exist.",
            ));
        };

        let resp = http::Response::builder();
        let resp = match (op, blob) {
            (Operation::ListBlobs, _) => {
                let mut body = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?><EnumerationResults><Blobs>");
                for name in blobs.keys() {
                    let name = name.replace('&', "&amp;").replace('<', "&lt;");
                    body.push_str(&format!(
                        "<Blob><Name>{name}</Name><Properties><BlobType>BlockBlob</BlobType></Properties></Blob>"
                    ));
                }
                body.push_str("</Blobs><NextMarker /></EnumerationResults>");
                resp.status(StatusCode::OK).body(Bytes::from(body))
            }
            (Operation::PutBlob, Some(blob)) => {
                blobs.insert(blob, req.body().clone());
                resp.status(StatusCode::CREATED).body(Bytes::new())
            }
            (Operation::GetBlob, Some(blob)) => match blobs.get(&blob) {
                Some(content) => resp.status(StatusCode::OK).body(content.clone()),
                None => resp.status(StatusCode::NOT_FOUND).body(Bytes::new()),
            },
            _ => resp.status(StatusCode::BAD_REQUEST).body(Bytes::new()),
        };
        Ok(resp.unwrap())
    }
}

fn client(service: FakeBlobService, key: &str) -> BlobClient {
    let ctx = Context::new()
        .with_http_send(service)
        .with_file_read(TokioFs)
        .with_file_write(TokioFs);
    let config = Config::default()
        .with_credential(Credential::with_shared_key(ACCOUNT, key))
        .with_container("photos");
    BlobClient::new(ctx, config).unwrap()
}

#[tokio::test]
async fn test_round_trip_through_signed_service() {
    let client = client(FakeBlobService::default().with_container("photos"), KEY);

    client
        .put_blob("photos/b & c.txt", Bytes::from_static(b"second"))
        .await
        .unwrap();
    client
        .put_blob("photos/2024/a.txt", Bytes::from_static(b"first"))
        .await
        .unwrap();
    client
        .put_blob("photos/empty", Bytes::new())
        .await
        .unwrap();

    assert_eq!(
        client.list_blobs(None).await.unwrap(),
        vec!["2024/a.txt", "b & c.txt", "empty"]
    );
    assert_eq!(
        client.get_blob("photos/b & c.txt").await.unwrap().as_ref(),
        b"second"
    );
    assert!(client.get_blob("photos/empty").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_wrong_key_is_rejected_by_service() {
    let client = client(
        FakeBlobService::default().with_container("photos"),
        "d3Jvbmcga2V5LXdyb25nLWtleQ==",
    );

    let err = client.list_blobs(None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServerRejected);
    assert_eq!(err.message(), "Server failed to authenticate the request.");
}

#[tokio::test]
async fn test_missing_container() {
    let client = client(FakeBlobService::default(), KEY);

    let err = client.list_blobs(Some("other")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServerRejected);
    assert_eq!(err.message(), "The specified container does not exist.");

    let err = client.get_blob("other/cat.jpg").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServerRejected);
}

#[tokio::test]
async fn test_missing_blob_reports_status_line() {
    let client = client(FakeBlobService::default().with_container("photos"), KEY);

    let err = client.get_blob("photos/nope").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServerRejected);
    assert_eq!(err.message(), "404 Not Found");
}

#[tokio::test]
async fn test_upload_and_download_local_files() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src.bin");
    let dst = dir.path().join("dst.bin");
    let content: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();
    std::fs::write(&src, &content).unwrap();

    let client = client(FakeBlobService::default().with_container("photos"), KEY);
    client
        .upload_file("photos/blob.bin", src.to_str().unwrap())
        .await
        .unwrap();
    client
        .download_file("photos/blob.bin", dst.to_str().unwrap())
        .await
        .unwrap();

    assert_eq!(std::fs::read(&dst).unwrap(), content);
}

#[tokio::test]
async fn test_client_from_env_config() {
    let service = FakeBlobService::default().with_container("logs");
    let ctx = Context::new()
        .with_http_send(service)
        .with_env(StaticEnv {
            home_dir: None,
            envs: [
                ("AZBLOB_ACCOUNT_NAME", ACCOUNT),
                ("AZBLOB_ACCOUNT_KEY", KEY),
                ("AZBLOB_CONTAINER", "logs"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        });

    let config = Config::default().from_env(&ctx);
    let client = BlobClient::new(ctx, config).unwrap();
    client
        .put_blob("logs/today", Bytes::from_static(b"ok"))
        .await
        .unwrap();
    assert_eq!(client.list_blobs(None).await.unwrap(), vec!["today"]);
}

/// Records the last request and answers `201 Created`.
#[derive(Debug, Clone, Default)]
struct RecordingHttpSend {
    last: Arc<Mutex<Option<http::Request<Bytes>>>>,
}

#[async_trait]
impl HttpSend for RecordingHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        *self.last.lock().unwrap() = Some(req);
        Ok(http::Response::builder()
            .status(StatusCode::CREATED)
            .body(Bytes::new())
            .unwrap())
    }
}

#[tokio::test]
async fn test_put_blob_authorization_known_answer() {
    let sender = RecordingHttpSend::default();
    let ctx = Context::new().with_http_send(sender.clone());
    let config = Config::default().with_credential(Credential::with_shared_key(ACCOUNT, KEY));
    let signer =
        RequestSigner::new().with_time(chrono::Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 9).unwrap());
    let client = BlobClient::new(ctx, config).unwrap().with_signer(signer);

    client
        .put_blob("photos/2024/my cat.jpg", Bytes::from_static(b"hello world"))
        .await
        .unwrap();

    let req = sender.last.lock().unwrap().take().unwrap();
    assert_eq!(req.method(), Method::PUT);
    assert_eq!(
        req.uri().to_string(),
        "https://myaccount.blob.core.windows.net/photos/2024/my%20cat.jpg"
    );
    assert_eq!(req.headers()["x-ms-date"], "Thu, 01 Feb 2024 00:00:09 GMT");
    // HMAC-SHA256 over the PUT string to sign, computed outside this crate.
    assert_eq!(
        req.headers()["authorization"],
        "SharedKey myaccount:m0Bo2O6zx9rNv4kKISPVnUnTx9GQ2X8W0oZGrd9XnRk="
    );
}
