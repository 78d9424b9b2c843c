//! GoCardless Bank Account Data outbound adapters.
//!
//! This module provides a thin HTTP implementation of the
//! `BankDataGateway` port.

mod dto;
mod http_gateway;

pub use http_gateway::{DEFAULT_ENDPOINT, GoCardlessCredentials, GoCardlessHttpGateway};
