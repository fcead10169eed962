//! # Feast Client
//!
//! [`FeastClient`] holds the serving stub and exposes the two remote calls of the
//! Feast serving API.
//!
//! The stub is built once, at construction, on top of the channel wrapped by the
//! [`FeastInterceptor`]: every call carries a tracing context and, when configured, the
//! call credentials. Calls take `&self`, so a single client can be shared between tasks;
//! the underlying tonic stub is cloned per call, which only clones a channel handle.
//!
//! ## Lifecycle
//!
//! [`FeastClient::close`] stops admitting new calls, waits up to
//! [`CHANNEL_SHUTDOWN_TIMEOUT`] for in-flight calls to drain and then releases the stub.
//! Closing is idempotent, and clones of a client share the same admission gate.
use crate::{
    BoxError,
    channel::{self, ConfigError, TransportSecurity},
    credentials::CallCredentials,
    feature_ref::create_feature_refs,
    interceptor::FeastInterceptor,
    proto::{
        EntityRow, GetFeastServingInfoRequest, GetFeastServingInfoResponse,
        GetOnlineFeaturesRequestV2, ServingServiceClient,
    },
    row::Row,
    security::SecurityConfig,
};
use std::{collections::HashSet, sync::Arc, time::Duration};
use tokio::sync::Semaphore;
use tonic::{
    codegen::{Service, http},
    service::interceptor::InterceptedService,
    transport::Channel,
};
use tracing::{debug, instrument, warn};

/// How long [`FeastClient::close`] waits for in-flight calls.
pub const CHANNEL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound of concurrently admitted calls, all of which `close` must reclaim.
/// Calls past this bound wait for a permit.
const MAX_IN_FLIGHT_CALLS: u32 = 1 << 20;

/// Errors that can occur while performing a call.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// The transport or the server failed the call. The status is passed through as is.
    #[error(transparent)]
    Status(#[from] tonic::Status),
    #[error("The client has been closed")]
    Closed,
}

type Stub<S> = ServingServiceClient<InterceptedService<S, FeastInterceptor>>;

/// Client for the Feast online serving API.
///
/// Calls are admitted through a gate shared by all clones of the client, which
/// admits at most 2^20 (1,048,576) concurrent calls. Further calls wait for an
/// in-flight call to finish before they are sent.
#[derive(Debug, Clone)]
pub struct FeastClient<S = Channel> {
    stub: Option<Stub<S>>,
    in_flight: Arc<Semaphore>,
    transport_security: Option<TransportSecurity>,
}

impl FeastClient<Channel> {
    /// Creates a client talking plaintext to `host:port`.
    ///
    /// The connection is established on the first call. Must be called from within a
    /// Tokio runtime.
    pub fn create(host: &str, port: u16) -> Result<Self, ConfigError> {
        Self::create_secure(host, port, SecurityConfig::default())
    }

    /// Creates a client with the channel security and credentials of `security_config`.
    ///
    /// # Returns
    ///
    /// * `Ok(FeastClient)` - The client, not yet connected.
    /// * `Err(ConfigError)` - The endpoint is invalid or the custom certificate could not
    ///   be loaded.
    pub fn create_secure(
        host: &str,
        port: u16,
        security_config: SecurityConfig,
    ) -> Result<Self, ConfigError> {
        let (channel, transport_security) =
            channel::connect_lazy(host, port, &security_config)?;

        debug!(host, port, ?transport_security, "created feast serving client");

        let mut client = Self::from_service(channel, security_config.credentials().cloned());
        client.transport_security = Some(transport_security);
        Ok(client)
    }
}

impl<S> FeastClient<S>
where
    S: Service<http::Request<tonic::body::Body>, Response = http::Response<tonic::body::Body>>
        + Clone,
    S::Error: Into<BoxError>,
{
    /// Creates a client from an existing Tonic service/channel.
    pub fn from_service(service: S, credentials: Option<Arc<dyn CallCredentials>>) -> Self {
        let intercepted = InterceptedService::new(service, FeastInterceptor::new(credentials));

        Self {
            stub: Some(ServingServiceClient::new(intercepted)),
            in_flight: Arc::new(Semaphore::new(MAX_IN_FLIGHT_CALLS as usize)),
            transport_security: None,
        }
    }

    /// The security mode of the channel, when the client built it.
    pub fn transport_security(&self) -> Option<&TransportSecurity> {
        self.transport_security.as_ref()
    }

    /// Obtains the version and type of the serving deployment.
    #[instrument(skip(self))]
    pub async fn get_feast_serving_info(&self) -> Result<GetFeastServingInfoResponse, CallError> {
        let mut stub = self.stub()?;
        let _permit = self.in_flight.acquire().await.map_err(|_| CallError::Closed)?;

        let response = stub
            .get_feast_serving_info(GetFeastServingInfoRequest {})
            .await?;

        Ok(response.into_inner())
    }

    /// Retrieves online features from the default project.
    ///
    /// See [`FeastClient::get_online_features_in_project`].
    pub async fn get_online_features<R: AsRef<str>>(
        &self,
        feature_refs: &[R],
        rows: &[Row],
    ) -> Result<Vec<Row>, CallError> {
        self.get_online_features_in_project(feature_refs, rows, "")
            .await
    }

    /// Retrieves online features.
    ///
    /// # Arguments
    ///
    /// * `feature_refs` - Features to retrieve as `table:feature`. Only the feature name is
    ///   required.
    /// * `rows` - One row per entity to look up, e.g. `Row::create().set("driver_id", 123)`.
    /// * `project` - Project to retrieve from. Empty means the server's default project.
    ///
    /// # Returns
    ///
    /// One row per entry of the response, in response order (the server answers one
    /// entry per input row). Each row holds the returned values and their statuses.
    #[instrument(skip_all, fields(features = feature_refs.len(), rows = rows.len(), project = %project))]
    pub async fn get_online_features_in_project<R: AsRef<str>>(
        &self,
        feature_refs: &[R],
        rows: &[Row],
        project: &str,
    ) -> Result<Vec<Row>, CallError> {
        let mut stub = self.stub()?;
        let request = build_online_features_request(feature_refs, rows, project);

        let _permit = self.in_flight.acquire().await.map_err(|_| CallError::Closed)?;
        let response = stub.get_online_features_v2(request).await?.into_inner();

        Ok(response.field_values.into_iter().map(Row::from).collect())
    }

    /// Shuts the client down.
    ///
    /// Waits up to [`CHANNEL_SHUTDOWN_TIMEOUT`] for in-flight calls to complete. Calls still
    /// running after the timeout are not cancelled; they keep their own channel handle.
    /// Calling this more than once is a no-op.
    pub async fn close(&mut self) {
        let Some(stub) = self.stub.take() else {
            return;
        };

        let drained = tokio::time::timeout(
            CHANNEL_SHUTDOWN_TIMEOUT,
            self.in_flight.acquire_many(MAX_IN_FLIGHT_CALLS),
        )
        .await;

        // Closed while the permits are still held, so no waiter slips in between.
        self.in_flight.close();

        match drained {
            Ok(Ok(_permits)) => debug!("feast serving client closed"),
            Ok(Err(_)) => debug!("feast serving client already closed by a clone"),
            Err(_) => warn!(
                timeout_secs = CHANNEL_SHUTDOWN_TIMEOUT.as_secs(),
                "timed out waiting for in-flight calls, closing anyway"
            ),
        }

        drop(stub);
    }

    fn stub(&self) -> Result<Stub<S>, CallError> {
        self.stub.clone().ok_or(CallError::Closed)
    }
}

/// Builds the wire request: one entity row per input row, in input order.
pub(crate) fn build_online_features_request<R: AsRef<str>>(
    feature_refs: &[R],
    rows: &[Row],
    project: &str,
) -> GetOnlineFeaturesRequestV2 {
    let features = create_feature_refs(feature_refs);
    let entity_rows: Vec<EntityRow> = rows.iter().map(EntityRow::from).collect();

    let entity_names: HashSet<&str> = rows
        .iter()
        .flat_map(|row| row.fields().keys().map(String::as_str))
        .collect();
    debug!(
        features = features.len(),
        entity_rows = entity_rows.len(),
        entity_names = entity_names.len(),
        "built online features request"
    );

    GetOnlineFeaturesRequestV2 {
        features,
        entity_rows,
        project: project.to_string(),
    }
}
