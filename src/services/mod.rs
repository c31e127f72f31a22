//! Flow orchestration used by the page and API routes.
//!
//! ARCHITECTURE
//! ============
//! Each flow catches every failure at its boundary and hands the route a
//! typed error carrying a user-facing message. Nothing is retried.

pub mod feedback;
pub mod upload;
