//! # Security Configuration
//!
//! Describes how the client secures its channel and authenticates its calls.
//!
//! ```rust
//! use feast_client::{BearerToken, SecurityConfig};
//!
//! let config = SecurityConfig::builder()
//!     .tls_enabled(true)
//!     .certificate_path("/etc/feast/ca.pem")
//!     .credentials(BearerToken::new("token"))
//!     .build();
//!
//! assert!(config.is_tls_enabled());
//! ```
use crate::credentials::CallCredentials;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// Immutable security options consumed by the channel factory.
///
/// The default is a plaintext channel without credentials.
#[derive(Debug, Clone, Default)]
pub struct SecurityConfig {
    tls_enabled: bool,
    certificate_path: Option<PathBuf>,
    credentials: Option<Arc<dyn CallCredentials>>,
}

impl SecurityConfig {
    pub fn builder() -> SecurityConfigBuilder {
        SecurityConfigBuilder::default()
    }

    pub fn is_tls_enabled(&self) -> bool {
        self.tls_enabled
    }

    /// Path of a PEM file trusted instead of the system roots. Only used with TLS.
    pub fn certificate_path(&self) -> Option<&Path> {
        self.certificate_path.as_deref()
    }

    pub fn credentials(&self) -> Option<&Arc<dyn CallCredentials>> {
        self.credentials.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct SecurityConfigBuilder {
    inner: SecurityConfig,
}

impl SecurityConfigBuilder {
    pub fn tls_enabled(mut self, enabled: bool) -> Self {
        self.inner.tls_enabled = enabled;
        self
    }

    pub fn certificate_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.inner.certificate_path = Some(path.into());
        self
    }

    pub fn credentials(mut self, credentials: impl CallCredentials + 'static) -> Self {
        self.inner.credentials = Some(Arc::new(credentials));
        self
    }

    pub fn build(self) -> SecurityConfig {
        self.inner
    }
}
