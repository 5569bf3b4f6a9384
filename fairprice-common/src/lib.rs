//! # FairPrice Common Library
//!
//! Shared code for the FairPrice price-reporting service:
//! - Closed vocabularies (products, units, markets, months)
//! - Report and user entities
//! - Submission validation rules for both deployment variants
//! - API response envelope and pagination parameters
//! - Bootstrap configuration loading
//! - Database schema initialisation

pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod time;
pub mod validation;

pub use error::{Error, Result};
pub use models::{DeploymentVariant, Report, ReportLocation, ReportStatus, Role, User};
