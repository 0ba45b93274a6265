//! End-to-end tests for the pagination and import pipeline
//!
//! These tests run the real HTTP client against a mock search API and the
//! file checkpoint store in a temporary directory:
//! - Resume after a failed page without re-fetching earlier pages
//! - End-of-data detection without an extra request
//! - Checkpoint file to profile store import

use prospect_ingest::checkpoint::{CheckpointStore, FileCheckpointStore};
use prospect_ingest::driver::{DriverConfig, PaginationDriver, RunOutcome, StopReason};
use prospect_ingest::fetcher::{HttpSearchClient, SearchFilters, PERSON_SEARCH_PATH};
use prospect_ingest::importer::Importer;
use prospect_ingest::store::MemoryProfileStore;
use prospect_ingest::IngestError;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockBuilder, MockServer, ResponseTemplate,
};

const PAGE_SIZE: u32 = 2;

fn search_response(profiles: Vec<Value>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "profiles": profiles,
        "total_display_count": "5"
    }))
}

fn page_request(page: u32) -> MockBuilder {
    Mock::given(method("POST"))
        .and(path(PERSON_SEARCH_PATH))
        .and(header("authorization", "Token secret"))
        .and(body_partial_json(json!({ "page": page, "limit": PAGE_SIZE })))
}

fn driver(
    server: &MockServer,
    checkpoint: &Path,
) -> PaginationDriver<HttpSearchClient, FileCheckpointStore> {
    let client = HttpSearchClient::new(server.uri(), "secret", Duration::from_secs(5))
        .expect("Failed to build client");
    PaginationDriver::new(
        client,
        FileCheckpointStore::new(checkpoint),
        DriverConfig {
            filters: SearchFilters {
                regions: vec!["San Francisco Bay Area".to_string()],
                titles: vec!["Founder".to_string()],
            },
            page_size: PAGE_SIZE,
            max_page: 20,
            request_interval: Duration::from_millis(10),
        },
    )
}

#[tokio::test]
async fn test_resume_after_failed_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let checkpoint = dir.path().join("state").join("scraping-state.json");

    page_request(1)
        .respond_with(search_response(vec![
            json!({ "name": "Ada Lovelace", "emails": ["ada@engine.org"] }),
            json!({ "name": "Alan Turing" }),
        ]))
        .expect(1)
        .mount(&server)
        .await;
    page_request(2)
        .respond_with(search_response(vec![
            json!({ "name": "Grace Hopper" }),
            json!({ "headline": "nameless" }),
        ]))
        .expect(1)
        .mount(&server)
        .await;
    page_request(3)
        .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    page_request(3)
        .respond_with(search_response(vec![json!({ "name": "Edsger Dijkstra" })]))
        .expect(1)
        .mount(&server)
        .await;
    page_request(4)
        .respond_with(search_response(vec![]))
        .expect(0)
        .mount(&server)
        .await;

    // First run stops at the failing page
    let first = driver(&server, &checkpoint)
        .run(&CancellationToken::new())
        .await
        .unwrap();
    match first.outcome {
        RunOutcome::Aborted { page, error } => {
            assert_eq!(page, 3);
            assert!(matches!(error, IngestError::RequestFailed { status: Some(503), .. }));
        },
        other => panic!("expected abort, got {other:?}"),
    }
    assert_eq!(first.pages_fetched, 2);

    let saved = FileCheckpointStore::new(&checkpoint).load().await.unwrap();
    assert_eq!(saved.latest_page, 2);
    assert_eq!(saved.record_count(), 4);

    // Second run picks up at page 3 and stops on the short page
    let second = driver(&server, &checkpoint)
        .run(&CancellationToken::new())
        .await
        .unwrap();
    assert!(matches!(second.outcome, RunOutcome::Done(StopReason::LastPage)));
    assert_eq!(second.start_page, 3);
    assert_eq!(second.pages_fetched, 1);

    let saved = FileCheckpointStore::new(&checkpoint).load().await.unwrap();
    assert_eq!(saved.latest_page, 3);
    assert_eq!(saved.pages.len(), 3);
}

#[tokio::test]
async fn test_checkpoint_file_import() {
    let dir = TempDir::new().unwrap();
    let checkpoint = dir.path().join("scraping-state.json");
    std::fs::write(
        &checkpoint,
        serde_json::to_vec_pretty(&json!({
            "latestPage": 2,
            "page1": [
                { "name": "Jane Doe", "emails": [], "employer": [{ "title": "CEO", "company_name": "Acme" }] },
                { "name": "John Roe", "emails": ["john@roe.io"] }
            ],
            "page2": [
                { "name": 42 },
                { "name": "Jane Doe", "headline": "Builder" }
            ]
        }))
        .unwrap(),
    )
    .unwrap();

    let state = FileCheckpointStore::new(&checkpoint).load().await.unwrap();
    assert_eq!(state.next_page(), 3);

    let importer = Importer::new(MemoryProfileStore::new()).with_batch_size(1);
    let summary = importer.import_all(&state.pages).await;

    assert_eq!(summary.imported, 3);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.skipped, 1);

    let store = importer.store();
    assert_eq!(store.profiles().len(), 2);
    let jane = store.get("jane.doe@placeholder.com").unwrap();
    assert_eq!(jane.person.headline.as_deref(), Some("Builder"));
    // the later record had no employer history, so it is gone
    assert!(jane.person.employers().is_empty());
    assert!(store.get("john@roe.io").is_some());
}

#[tokio::test]
async fn test_corrupt_checkpoint_stops_run_before_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(search_response(vec![]))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let checkpoint = dir.path().join("scraping-state.json");
    std::fs::write(&checkpoint, "{ \"latestPage\": \"two\" }").unwrap();

    let err = driver(&server, &checkpoint)
        .run(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::CorruptState { .. }));

    // the damaged file is left for the operator to inspect
    let contents = std::fs::read_to_string(&checkpoint).unwrap();
    assert!(contents.contains("two"));
}
