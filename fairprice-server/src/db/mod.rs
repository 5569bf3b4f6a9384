//! Report and user persistence

pub mod reports;
pub mod users;
