//! Data layer: snapshot models, the SQLite snapshot store, and batch
//! ingestion of fetcher output.

mod ingest;
mod models;
mod storage;

pub use ingest::{ingest_file, IngestReport};
pub use models::{MetricKind, MetricValues, Snapshot};
pub use storage::Storage;
