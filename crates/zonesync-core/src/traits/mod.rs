//! Core traits for zone reconciliation
//!
//! - [`DnsProvider`]: Provider backend capability interface
//! - [`DnsProviderFactory`]: Builds providers from configuration

pub mod dns_provider;

pub use dns_provider::{DnsProvider, DnsProviderFactory, RRSetRef};
