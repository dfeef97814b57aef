//! Host loop integrations.

#[cfg(feature = "tokio")]
pub mod tokio;
