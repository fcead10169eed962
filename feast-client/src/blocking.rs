//! # Blocking Client
//!
//! A synchronous facade over [`FeastClient`] for callers without an async runtime.
//!
//! The client owns a current-thread Tokio runtime and drives every call to completion
//! on the calling thread. Must not be used from within an async context.
use crate::{
    BoxError,
    channel::{ConfigError, TransportSecurity},
    client::{CallError, FeastClient},
    credentials::CallCredentials,
    proto::GetFeastServingInfoResponse,
    row::Row,
    security::SecurityConfig,
};
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};
use tonic::{
    codegen::{Service, http},
    transport::Channel,
};

/// Errors that can occur when building a [`BlockingFeastClient`].
#[derive(Debug, thiserror::Error)]
pub enum BlockingClientError {
    #[error("Failed to start the client runtime: '{0}'")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug)]
pub struct BlockingFeastClient<S = Channel> {
    client: FeastClient<S>,
    rt: Runtime,
}

impl BlockingFeastClient<Channel> {
    /// See [`FeastClient::create`].
    pub fn create(host: &str, port: u16) -> Result<Self, BlockingClientError> {
        Self::create_secure(host, port, SecurityConfig::default())
    }

    /// See [`FeastClient::create_secure`].
    pub fn create_secure(
        host: &str,
        port: u16,
        security_config: SecurityConfig,
    ) -> Result<Self, BlockingClientError> {
        let rt = runtime()?;
        // The lazy channel spawns its worker on the ambient runtime.
        let client = {
            let _guard = rt.enter();
            FeastClient::create_secure(host, port, security_config)?
        };

        Ok(Self { client, rt })
    }
}

impl<S> BlockingFeastClient<S>
where
    S: Service<http::Request<tonic::body::Body>, Response = http::Response<tonic::body::Body>>
        + Clone,
    S::Error: Into<BoxError>,
{
    /// See [`FeastClient::from_service`].
    pub fn from_service(
        service: S,
        credentials: Option<Arc<dyn CallCredentials>>,
    ) -> Result<Self, BlockingClientError> {
        let rt = runtime()?;
        let client = FeastClient::from_service(service, credentials);

        Ok(Self { client, rt })
    }

    pub fn transport_security(&self) -> Option<&TransportSecurity> {
        self.client.transport_security()
    }

    pub fn get_feast_serving_info(&self) -> Result<GetFeastServingInfoResponse, CallError> {
        self.rt.block_on(self.client.get_feast_serving_info())
    }

    pub fn get_online_features<R: AsRef<str>>(
        &self,
        feature_refs: &[R],
        rows: &[Row],
    ) -> Result<Vec<Row>, CallError> {
        self.rt
            .block_on(self.client.get_online_features(feature_refs, rows))
    }

    pub fn get_online_features_in_project<R: AsRef<str>>(
        &self,
        feature_refs: &[R],
        rows: &[Row],
        project: &str,
    ) -> Result<Vec<Row>, CallError> {
        self.rt.block_on(
            self.client
                .get_online_features_in_project(feature_refs, rows, project),
        )
    }

    /// See [`FeastClient::close`].
    pub fn close(&mut self) {
        self.rt.block_on(self.client.close())
    }
}

fn runtime() -> std::io::Result<Runtime> {
    Builder::new_current_thread().enable_all().build()
}
