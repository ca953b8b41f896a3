//! Remote model providers.
//!
//! - [`provider`]: the `EmbeddingBackend` / `CompletionBackend` traits
//! - [`gemini`], [`groq`]: HTTP adapters for the hosted backends
//! - [`chain`]: ordered completion failover
//! - [`embedder`]: embedding with a degraded local fallback

pub mod chain;
pub mod embedder;
pub mod gemini;
pub mod groq;
pub mod provider;
