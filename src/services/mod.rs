pub mod credentials;
pub mod ingest;

pub use credentials::{CredentialError, CredentialStore, NewUser};
pub use ingest::{BulkIngestor, IngestError, IngestOutcome};
