//! Ordered completion failover chain.
//!
//! Providers are invoked in configuration order with identical arguments.
//! Each failure is logged and the next provider is tried; there is no
//! per-provider retry. An answer from a non-primary provider is suffixed
//! with [`FALLBACK_MARKER`] so callers can surface provenance. When every
//! provider fails the chain reports exhaustion, the only fatal error of the
//! answering pipeline.

use std::sync::Arc;

use crate::errors::ApiError;

use super::provider::{CompletionBackend, CompletionRequest};

/// Appended to answers produced by a non-primary provider.
pub const FALLBACK_MARKER: &str = "\n\n_(answered by backup model)_";

#[derive(Clone)]
pub struct CompletionChain {
    providers: Vec<Arc<dyn CompletionBackend>>,
}

impl CompletionChain {
    pub fn new(providers: Vec<Arc<dyn CompletionBackend>>) -> Self {
        Self { providers }
    }

    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, ApiError> {
        for (position, provider) in self.providers.iter().enumerate() {
            match provider.complete(request).await {
                Ok(answer) => {
                    if position == 0 {
                        return Ok(answer);
                    }
                    tracing::warn!(
                        "completion served by fallback provider '{}' (position {})",
                        provider.name(),
                        position
                    );
                    return Ok(format!("{}{}", answer, FALLBACK_MARKER));
                }
                Err(err) => {
                    tracing::warn!(
                        "completion provider '{}' failed, advancing: {}",
                        provider.name(),
                        err
                    );
                }
            }
        }

        Err(ApiError::ProvidersExhausted)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    struct FixedBackend {
        name: &'static str,
        answer: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl FixedBackend {
        fn ok(name: &'static str, answer: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                answer: Some(answer),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                answer: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionBackend for FixedBackend {
        fn name(&self) -> &str {
            self.name
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<String, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answer {
                Some(answer) => Ok(answer.to_string()),
                None => Err(ApiError::Internal(format!("{} is down", self.name))),
            }
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            question: "q".to_string(),
            context: "c".to_string(),
            system_instruction: "s".to_string(),
        }
    }

    #[tokio::test]
    async fn primary_success_carries_no_marker() {
        let primary = FixedBackend::ok("primary", "the answer");
        let secondary = FixedBackend::ok("secondary", "unused");
        let chain = CompletionChain::new(vec![primary.clone(), secondary.clone()]);

        let answer = chain.complete(&request()).await.unwrap();

        assert_eq!(answer, "the answer");
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn fallback_answer_is_marked() {
        let primary = FixedBackend::failing("primary");
        let secondary = FixedBackend::ok("secondary", "backup answer");
        let chain = CompletionChain::new(vec![primary.clone(), secondary.clone()]);

        let answer = chain.complete(&request()).await.unwrap();

        assert_eq!(answer, format!("backup answer{}", FALLBACK_MARKER));
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn providers_are_tried_in_order_exactly_once() {
        let first = FixedBackend::failing("first");
        let second = FixedBackend::failing("second");
        let third = FixedBackend::ok("third", "late answer");
        let chain = CompletionChain::new(vec![first.clone(), second.clone(), third.clone()]);

        let answer = chain.complete(&request()).await.unwrap();

        assert!(answer.starts_with("late answer"));
        assert!(answer.ends_with(FALLBACK_MARKER));
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
        assert_eq!(third.calls(), 1);
    }

    #[tokio::test]
    async fn exhaustion_when_all_providers_fail() {
        let primary = FixedBackend::failing("primary");
        let secondary = FixedBackend::failing("secondary");
        let chain = CompletionChain::new(vec![primary, secondary]);

        let err = chain.complete(&request()).await.unwrap_err();

        assert!(matches!(err, ApiError::ProvidersExhausted));
    }

    #[tokio::test]
    async fn empty_chain_is_immediately_exhausted() {
        let chain = CompletionChain::new(Vec::new());
        let err = chain.complete(&request()).await.unwrap_err();
        assert!(matches!(err, ApiError::ProvidersExhausted));
    }
}
