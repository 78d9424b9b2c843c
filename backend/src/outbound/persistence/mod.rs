//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL via Diesel with async support through `diesel-async` and
//! `bb8` connection pooling.
//!
//! The adapters are thin translators only: Diesel row structs
//! (`models.rs`) and schema definitions (`schema.rs`) stay internal to
//! this module, and every database error maps to a domain port error.

mod diesel_bank_account_repository;
mod diesel_connection_repository;
mod diesel_error_mapping;
mod diesel_ledger_repository;
mod models;
mod pool;
mod schema;

pub use diesel_bank_account_repository::DieselBankAccountRepository;
pub use diesel_connection_repository::DieselConnectionRepository;
pub use diesel_ledger_repository::DieselLedgerRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
