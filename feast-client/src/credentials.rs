//! # Call Credentials
//!
//! Credentials are applied to the metadata of every outbound call by the
//! [`FeastInterceptor`](crate::interceptor::FeastInterceptor).
use std::{fmt, str::FromStr, sync::Arc};
use tonic::{
    Status,
    metadata::{MetadataMap, MetadataValue},
};

pub const AUTHORIZATION_METADATA_KEY: &str = "authorization";
pub const BEARER_PREFIX: &str = "Bearer ";

/// Attaches authentication data to an outbound call.
///
/// Returning an error fails the call with that status before it is sent.
pub trait CallCredentials: Send + Sync + fmt::Debug {
    fn apply(&self, metadata: &mut MetadataMap) -> Result<(), Status>;
}

impl<T: CallCredentials + ?Sized> CallCredentials for Arc<T> {
    fn apply(&self, metadata: &mut MetadataMap) -> Result<(), Status> {
        (**self).apply(metadata)
    }
}

/// Static bearer token sent as `authorization: Bearer <token>`.
#[derive(Clone)]
pub struct BearerToken {
    token: String,
}

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl CallCredentials for BearerToken {
    fn apply(&self, metadata: &mut MetadataMap) -> Result<(), Status> {
        let value = MetadataValue::from_str(&format!("{BEARER_PREFIX}{}", self.token))
            .map_err(|_| Status::unauthenticated("bearer token is not a valid metadata value"))?;
        metadata.insert(AUTHORIZATION_METADATA_KEY, value);
        Ok(())
    }
}
