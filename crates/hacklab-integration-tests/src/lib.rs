//! Integration test crate for the Hacklab puzzle engine.
//!
//! This crate has no library code. It only contains integration tests
//! that drive the engine end to end through the `Lab` façade, the
//! terminal and the persistence layer.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p hacklab-integration-tests
//! ```
