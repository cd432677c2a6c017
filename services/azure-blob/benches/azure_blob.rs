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

use std::hint::black_box;

use blobsign_azure_blob::{
    extract_names, string_to_sign, Credential, Operation, RequestSigner, ResourcePath,
};
use chrono::{TimeZone, Utc};
use criterion::criterion_group;
use criterion::criterion_main;
use criterion::{BenchmarkId, Criterion, Throughput};

criterion_group!(benches, bench_sign, bench_extract);
criterion_main!(benches);

const KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

pub fn bench_sign(c: &mut Criterion) {
    let mut group = c.benchmark_group("azure_blob_sign");
    let time = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 9).unwrap();

    group.bench_function("string_to_sign", |b| {
        b.iter(|| {
            string_to_sign(
                black_box("devstoreaccount1"),
                Operation::PutBlob,
                black_box("photos/2024/my cat.jpg"),
                4096,
                time,
            )
            .expect("must success")
        })
    });

    group.bench_function("request_signer", |b| {
        let cred = Credential::with_shared_key("devstoreaccount1", KEY);
        let resource = ResourcePath::parse("photos/2024/my cat.jpg").expect("path must be valid");
        let signer = RequestSigner::new().with_time(time);

        b.iter(|| {
            signer
                .sign(&cred, Operation::PutBlob, black_box(&resource), 4096)
                .expect("must success")
        })
    });

    group.finish();
}

fn listing(n: usize) -> Vec<u8> {
    let mut body = String::from(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?><EnumerationResults ContainerName=\"photos\"><Blobs>",
    );
    for i in 0..n {
        body.push_str(&format!(
            "<Blob><Name>dir/blob-{i:06}.bin</Name><Properties>\
             <Content-Length>1024</Content-Length><BlobType>BlockBlob</BlobType>\
             </Properties><Metadata><Name>meta</Name></Metadata></Blob>"
        ));
    }
    body.push_str("</Blobs><NextMarker /></EnumerationResults>");
    body.into_bytes()
}

pub fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("azure_blob_extract");

    for n in [10, 1_000, 5_000] {
        let body = listing(n);
        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &body, |b, body| {
            b.iter(|| extract_names(black_box(body)).expect("must success"))
        });
    }

    group.finish();
}
