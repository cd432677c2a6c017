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

use std::sync::Arc;
use std::thread;

use blobsign_azure_blob::{
    authorization, sign, string_to_sign, Credential, Operation, RequestSigner, ResourcePath,
};
use blobsign_core::hash::base64_decode;
use blobsign_core::ErrorKind;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use test_case::test_case;

// Well known development storage account.
const DEV_ACCOUNT: &str = "devstoreaccount1";
const DEV_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

fn time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 9).unwrap()
}

#[test_case(Operation::ListBlobs, "photos", 0 ; "list")]
#[test_case(Operation::GetBlob, "photos/cat.jpg", 0 ; "get")]
#[test_case(Operation::PutBlob, "photos/cat.jpg", 1024 ; "put")]
#[test_case(Operation::PutBlob, "photos/empty", 0 ; "put empty")]
fn test_signer_matches_manual_signature(op: Operation, path: &str, len: u64) {
    let cred = Credential::with_shared_key(DEV_ACCOUNT, DEV_KEY);
    let resource = ResourcePath::parse(path).unwrap();

    let req = RequestSigner::new()
        .with_time(time())
        .sign(&cred, op, &resource, len)
        .unwrap();

    let sts = string_to_sign(DEV_ACCOUNT, op, path, len, time()).unwrap();
    let signature = sign(DEV_KEY, &sts).unwrap();
    assert_eq!(base64_decode(&signature).unwrap().len(), 32);
    assert_eq!(
        req.headers["authorization"],
        authorization(DEV_ACCOUNT, &signature).as_str()
    );
}

#[test]
fn test_signing_time_changes_signature() {
    let cred = Credential::with_shared_key(DEV_ACCOUNT, DEV_KEY);
    let resource = ResourcePath::parse("photos/cat.jpg").unwrap();

    let a = RequestSigner::new()
        .with_time(time())
        .sign(&cred, Operation::GetBlob, &resource, 0)
        .unwrap();
    let b = RequestSigner::new()
        .with_time(time() + chrono::Duration::seconds(1))
        .sign(&cred, Operation::GetBlob, &resource, 0)
        .unwrap();

    assert_ne!(a.headers["authorization"], b.headers["authorization"]);
    assert_ne!(a.headers["x-ms-date"], b.headers["x-ms-date"]);
}

#[test]
fn test_current_time_header_is_signed() {
    let cred = Credential::with_shared_key(DEV_ACCOUNT, DEV_KEY);
    let resource = ResourcePath::parse("photos").unwrap();

    let req = RequestSigner::new()
        .sign(&cred, Operation::ListBlobs, &resource, 0)
        .unwrap();

    // Recompute with the date the request carries.
    let date = req.headers["x-ms-date"].to_str().unwrap();
    let time = chrono::DateTime::parse_from_rfc2822(date)
        .unwrap()
        .with_timezone(&Utc);
    let sts = string_to_sign(DEV_ACCOUNT, Operation::ListBlobs, "photos", 0, time).unwrap();
    assert_eq!(
        req.headers["authorization"],
        authorization(DEV_ACCOUNT, &sign(DEV_KEY, &sts).unwrap()).as_str()
    );
}

#[test]
fn test_signer_is_shared_across_threads() {
    let signer = Arc::new(RequestSigner::new().with_time(time()));
    let cred = Arc::new(Credential::with_shared_key(DEV_ACCOUNT, DEV_KEY));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let signer = signer.clone();
            let cred = cred.clone();
            thread::spawn(move || {
                let resource = ResourcePath::parse("photos/cat.jpg").unwrap();
                signer
                    .sign(&cred, Operation::GetBlob, &resource, 0)
                    .unwrap()
                    .headers["authorization"]
                    .clone()
            })
        })
        .collect();

    let values: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(values.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_wrong_key_still_signs() {
    // Valid base64 of the wrong secret is only caught by the server.
    let cred = Credential::with_shared_key(DEV_ACCOUNT, "d3Jvbmcga2V5");
    let resource = ResourcePath::parse("photos/cat.jpg").unwrap();

    assert!(RequestSigner::new()
        .sign(&cred, Operation::GetBlob, &resource, 0)
        .is_ok());

    let cred = Credential::with_shared_key(DEV_ACCOUNT, "");
    let err = RequestSigner::new()
        .sign(&cred, Operation::GetBlob, &resource, 0)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidKey);
}
