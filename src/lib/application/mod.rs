//! # Application Module
//!
//! - [`tooling`] - tool-server transport, connection lifecycle and result handling
//! - [`agent`] - the bounded tool-calling orchestration loop

pub mod agent;
pub mod tooling;
