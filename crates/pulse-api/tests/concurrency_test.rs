//! Concurrent upload integration tests.
//!
//! Run with: `cargo test -p pulse-api --test concurrency_test`

mod helpers;

use futures::future::join_all;
use helpers::engines::{MarkerEngine, INFECTED_MARKER};
use helpers::{setup_test_app_with, TestOptions, TEST_MAX_SIZE_BYTES};
use std::collections::HashSet;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_uploads_are_independent() {
    let app = setup_test_app_with(TestOptions {
        engine: Arc::new(MarkerEngine),
        ..TestOptions::default()
    })
    .await;
    let project_id = app.create_project("Concurrency").await;

    let mut infected = b"payload ".to_vec();
    infected.extend_from_slice(INFECTED_MARKER);
    let oversized = vec![b'z'; TEST_MAX_SIZE_BYTES as usize + 1];

    // Every third upload is clean, the others are split between infected and
    // oversized bodies.
    let payloads: Vec<(String, Vec<u8>)> = (0..24)
        .map(|i| {
            let name = format!("file-{:02}.txt", i);
            let data = match i % 3 {
                0 => format!("clean upload {}", i).into_bytes(),
                1 => infected.clone(),
                _ => oversized.clone(),
            };
            (name, data)
        })
        .collect();

    let responses = join_all(
        payloads
            .iter()
            .map(|(name, data)| app.upload(project_id, name, "text/plain", data)),
    )
    .await;

    let mut committed = HashSet::new();
    for (i, response) in responses.iter().enumerate() {
        let body: serde_json::Value = response.json();
        match i % 3 {
            0 => {
                assert_eq!(response.status_code(), 201, "body: {}", body);
                committed.insert(body["originalFilename"].as_str().unwrap().to_string());
            }
            1 => {
                assert_eq!(response.status_code(), 400);
                assert_eq!(body["code"], "scan_failed");
            }
            _ => {
                assert_eq!(response.status_code(), 400);
                assert_eq!(body["code"], "too_large");
            }
        }
    }

    let listed: HashSet<String> = app
        .list(project_id)
        .await
        .iter()
        .map(|a| a["originalFilename"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(listed, committed);
    assert_eq!(listed.len(), 8);
    assert_eq!(app.staged_count().await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_identical_uploads_get_distinct_attachments() {
    let app = setup_test_app_with(TestOptions::default()).await;
    let project_id = app.create_project("Duplicates").await;

    let responses = join_all(
        (0..10).map(|_| app.upload(project_id, "same.txt", "text/plain", b"same bytes")),
    )
    .await;

    let mut ids = HashSet::new();
    let mut storage_refs = HashSet::new();
    let mut checksums = HashSet::new();
    for response in &responses {
        assert_eq!(response.status_code(), 201);
        let body: serde_json::Value = response.json();
        ids.insert(body["_id"].as_str().unwrap().to_string());
        storage_refs.insert(body["storageRef"].as_str().unwrap().to_string());
        checksums.insert(body["checksumSha256"].as_str().unwrap().to_string());
    }
    assert_eq!(ids.len(), 10);
    assert_eq!(storage_refs.len(), 10);
    assert_eq!(checksums.len(), 1);
    assert_eq!(app.list(project_id).await.len(), 10);
}
