//! Data models for capitol-sync

pub mod import_result;
pub mod legislator;

pub use import_result::{ImportResult, ImportStatus, SessionRange};
pub use legislator::{Legislator, MemberPage, RawMember};
