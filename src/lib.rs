//! Shared plumbing for the ads-console binaries: credential bundle,
//! interactive prompts, and the authorization/client setup steps.

pub mod config;
pub mod prompt;
pub mod setup;
