//! `StateStore` implementations: a Beacon API HTTP client for production use,
//! and an in-memory fixture store for tests and local fixture generation.

pub mod fixture_store;
pub mod http_store;

pub use fixture_store::FixtureBeaconStore;
pub use http_store::{BeaconClient, BeaconClientError, HttpBeaconStore};
