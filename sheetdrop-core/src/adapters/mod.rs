//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the local RuleRepository
//! - SheetDrop REST API client for the remote RuleRepository

pub mod duckdb;
pub mod rest;

#[cfg(test)]
pub mod rest_mock;
