//! Business services

pub mod ingestion;
pub mod oracle_client;

pub use ingestion::{ingest_report, CreatedReport, IngestionError};
pub use oracle_client::{HttpPriceOracle, OracleError, OracleRequest, OracleResponse, PriceOracle};
