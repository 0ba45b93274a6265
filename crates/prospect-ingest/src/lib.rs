//! Prospect Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Resumable ingestion of person profiles from a paginated search API into
//! PostgreSQL.
//!
//! # Pipeline
//!
//! - **Fetcher** ([`fetcher`]): one search request per page
//! - **Checkpoint Store** ([`checkpoint`]): durable progress and raw pages
//! - **Pagination Driver** ([`driver`]): paced fetch/persist loop with resume
//! - **Record Validator** ([`validator`]): raw record to typed person
//! - **Ingestion Importer** ([`importer`]): validate, key and upsert
//!
//! Pagination and import are independent: the first fills the checkpoint,
//! the second reads it.
//!
//! # Example
//!
//! ```no_run
//! use prospect_ingest::checkpoint::{CheckpointStore, FileCheckpointStore};
//! use prospect_ingest::importer::Importer;
//! use prospect_ingest::store::MemoryProfileStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let state = FileCheckpointStore::new("scraping-state.json").load().await?;
//!     let summary = Importer::new(MemoryProfileStore::new())
//!         .import_all(&state.pages)
//!         .await;
//!     println!("imported {} skipped {}", summary.imported, summary.skipped);
//!     Ok(())
//! }
//! ```

pub mod checkpoint;
pub mod config;
pub mod driver;
pub mod error;
pub mod fetcher;
pub mod importer;
pub mod key;
pub mod models;
pub mod store;
pub mod validator;

pub use error::{IngestError, IngestResult, ValidationError};
