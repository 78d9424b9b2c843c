//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern, providing
//! concrete implementations of domain port traits:
//!
//! - **gocardless**: reqwest-backed aggregator gateway
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **quota**: process-local sync quota counters
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod gocardless;
pub mod persistence;
pub mod quota;
