//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Firestore REST client for DocumentStore
//! - Firebase Auth REST client for IdentityProvider
//! - DuckDB for the demo-mode DocumentStore
//! - In-memory DocumentStore for tests
//! - Demo identity provider and seed data

pub mod demo;
pub mod duckdb;
pub mod firebase_auth;
pub mod firestore;
pub mod memory;

#[cfg(test)]
pub mod firebase_mock;
