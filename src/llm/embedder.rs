//! Embedding service with a degraded local fallback.
//!
//! When the remote embedding backend fails (network, auth, quota) the
//! service returns a pseudo-random vector of the configured dimensionality
//! instead of aborting, so ingestion and querying stay available at reduced
//! search quality. A backend response of the wrong dimensionality is treated
//! the same way. Every vector leaving this service has exactly `dimension`
//! components.

use std::sync::Arc;

use rand::Rng;

use super::provider::EmbeddingBackend;

#[derive(Clone)]
pub struct EmbeddingService {
    backend: Arc<dyn EmbeddingBackend>,
    dimension: usize,
}

impl EmbeddingService {
    pub fn new(backend: Arc<dyn EmbeddingBackend>, dimension: usize) -> Self {
        Self { backend, dimension }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Infallible by design: callers always get a usable vector.
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        match self.backend.embed(text).await {
            Ok(vector) if vector.len() == self.dimension => vector,
            Ok(vector) => {
                tracing::warn!(
                    "embedding backend '{}' returned {} dimensions, expected {}; degrading to random vector",
                    self.backend.name(),
                    vector.len(),
                    self.dimension
                );
                self.degraded_vector()
            }
            Err(err) => {
                tracing::warn!(
                    "embedding backend '{}' failed, degrading to random vector: {}",
                    self.backend.name(),
                    err
                );
                self.degraded_vector()
            }
        }
    }

    fn degraded_vector(&self) -> Vec<f32> {
        let mut rng = rand::rng();
        (0..self.dimension)
            .map(|_| rng.random_range(-1.0f32..1.0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::errors::ApiError;

    struct StaticBackend {
        vector: Option<Vec<f32>>,
    }

    #[async_trait]
    impl EmbeddingBackend for StaticBackend {
        fn name(&self) -> &str {
            "static"
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ApiError> {
            self.vector
                .clone()
                .ok_or_else(|| ApiError::Internal("backend unreachable".into()))
        }
    }

    #[tokio::test]
    async fn healthy_backend_vector_passes_through() {
        let service = EmbeddingService::new(
            Arc::new(StaticBackend {
                vector: Some(vec![0.5, -0.5, 0.25]),
            }),
            3,
        );

        let vector = service.embed("hello").await;

        assert_eq!(vector, vec![0.5, -0.5, 0.25]);
    }

    #[tokio::test]
    async fn backend_failure_degrades_to_correct_dimension() {
        let service = EmbeddingService::new(Arc::new(StaticBackend { vector: None }), 768);

        let vector = service.embed("hello").await;

        assert_eq!(vector.len(), 768);
        assert!(vector.iter().all(|v| (-1.0..1.0).contains(v)));
    }

    #[tokio::test]
    async fn wrong_dimension_from_backend_also_degrades() {
        let service = EmbeddingService::new(
            Arc::new(StaticBackend {
                vector: Some(vec![1.0; 12]),
            }),
            768,
        );

        let vector = service.embed("hello").await;

        assert_eq!(vector.len(), 768);
    }
}
