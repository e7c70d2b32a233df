//! Pluggable narrative-generation backend abstraction
//!
//! Backend-agnostic interface for the single AI operation this system
//! needs: plain-text completion over a system instruction and a user
//! prompt. The response contract is plain text with optional bullet-marked
//! lines; no structured-output validation is performed.
//!
//! # Configuration
//!
//! Environment variables:
//! - `SAVOR_AI_BACKEND`: Backend to use (ollama, mock). Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Model name (default: llama3.2)

mod mock;
mod ollama;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;

use async_trait::async_trait;

use crate::error::Result;

/// Trait defining the interface for narrative backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Generate a plain-text completion for the given prompt
    async fn generate(&self, system: &str, prompt: &str) -> Result<String>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete backend wrapper providing Clone + compile-time dispatch
#[derive(Clone)]
pub enum AIClient {
    Ollama(OllamaBackend),
    Mock(MockBackend),
}

impl AIClient {
    /// Create a client from environment variables.
    ///
    /// Returns None when no backend is configured; narrative generation
    /// then degrades to an "analysis unavailable" result.
    pub fn from_env() -> Option<Self> {
        match std::env::var("SAVOR_AI_BACKEND").as_deref() {
            Ok("mock") => Some(Self::Mock(MockBackend::new())),
            _ => OllamaBackend::from_env().map(Self::Ollama),
        }
    }
}

#[async_trait]
impl AIBackend for AIClient {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String> {
        match self {
            Self::Ollama(backend) => backend.generate(system, prompt).await,
            Self::Mock(backend) => backend.generate(system, prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            Self::Ollama(backend) => backend.health_check().await,
            Self::Mock(backend) => backend.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            Self::Ollama(backend) => backend.model(),
            Self::Mock(backend) => backend.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            Self::Ollama(backend) => backend.host(),
            Self::Mock(backend) => backend.host(),
        }
    }
}
