//! Mock backend for testing
//!
//! Returns a predictable bullet-formatted narrative so pipeline tests can
//! run without an LLM server.

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::AIBackend;

/// Mock narrative backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check and generate should succeed
    pub healthy: bool,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self { healthy: true }
    }

    /// Create an unhealthy mock backend; generate returns an error
    pub fn unhealthy() -> Self {
        Self { healthy: false }
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn generate(&self, _system: &str, _prompt: &str) -> Result<String> {
        if !self.healthy {
            return Err(Error::InvalidData("Mock backend is unhealthy".into()));
        }

        Ok("Overall the period showed steady performance.\n\
            Sales were concentrated in the top categories.\n\
            Guest traffic held up across the week.\n\
            - Food drives the majority of net sales\n\
            - Per-person average is within a healthy range\n\
            - Tips track closely with sales volume\n\
            - Review staffing on the slowest days\n\
            - Promote the underperforming categories\n\
            - Keep an eye on labor percentage"
            .to_string())
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
