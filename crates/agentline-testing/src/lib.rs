//! Testing infrastructure for agentline integration tests.
//!
//! This crate provides utilities for writing robust integration tests:
//! - `fixtures`: `LogMsg` envelope builders and canned protocol lines

pub mod fixtures;
