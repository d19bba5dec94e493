//! Shared vocabulary for the ghostpen workspace: conversation messages,
//! system context segments, tool descriptors, usage counters, gateway
//! errors and the model call boundary.

pub mod context;
pub mod errors;
pub mod ids;
pub mod messages;
pub mod provider;
pub mod security;
pub mod tokens;
pub mod tools;
