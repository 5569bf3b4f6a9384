//! API types shared by the HTTP service and its clients
//!
//! Pure data types only; framework-specific response conversion lives in
//! the server crate.

pub mod types;

pub use types::{validate_pagination, ApiResponse, PageRequest, PaginationMeta};
