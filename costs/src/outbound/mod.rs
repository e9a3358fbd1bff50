//! Outbound adapters implementing domain ports.
//!
//! - **memory**: thread-safe in-memory installation backing every driven
//!   port, used by the `costlog-check` binary and the behaviour tests.
//!
//! Adapters are thin translators between domain types and their storage.
//! They contain no business logic.

pub mod memory;
