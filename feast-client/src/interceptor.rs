//! # Outbound Interceptor
//!
//! Every call issued by the [`FeastClient`](crate::FeastClient) goes through
//! [`FeastInterceptor`], which:
//!
//! 1. Attaches a W3C `traceparent` entry so the serving side can join the caller's trace.
//!    The parent is, in order: a `traceparent` already present on the request, the trace
//!    entered with [`with_trace_parent`] around the call, or a fresh root. A parent keeps
//!    its trace id and flags; only a new span id is generated for this hop.
//! 2. Applies the configured [`CallCredentials`], if any.
//!
//! ## References
//!
//! * [W3C Trace Context](https://www.w3.org/TR/trace-context/#traceparent-header)
use crate::credentials::CallCredentials;
use std::{future::Future, str::FromStr, sync::Arc};
use tonic::{
    GrpcMethod, Request, Status,
    metadata::{MetadataMap, MetadataValue},
    service::Interceptor,
};
use tracing::debug;
use uuid::Uuid;

pub const TRACEPARENT_METADATA_KEY: &str = "traceparent";

const TRACEPARENT_VERSION: &str = "00";
const SAMPLED_FLAGS: &str = "01";

tokio::task_local! {
    static CALLER_TRACE: TraceParent;
}

/// Runs `fut` with `parent` as the trace context of every call it issues.
///
/// ```rust,no_run
/// use feast_client::{FeastClient, TraceParent, with_trace_parent};
///
/// # async fn run(client: FeastClient) -> Result<(), Box<dyn std::error::Error>> {
/// let parent = TraceParent::parse("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01")
///     .unwrap_or_else(TraceParent::new_root);
///
/// with_trace_parent(parent, async {
///     client.get_feast_serving_info().await?;
///     client.get_feast_serving_info().await
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_trace_parent<F: Future>(parent: TraceParent, fut: F) -> F::Output {
    CALLER_TRACE.scope(parent, fut).await
}

#[derive(Debug, Clone, Default)]
pub struct FeastInterceptor {
    credentials: Option<Arc<dyn CallCredentials>>,
}

impl FeastInterceptor {
    pub fn new(credentials: Option<Arc<dyn CallCredentials>>) -> Self {
        Self { credentials }
    }
}

impl Interceptor for FeastInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let trace = inject_trace_context(request.metadata_mut());

        if let Some(method) = request.extensions().get::<GrpcMethod>() {
            debug!(
                service = method.service(),
                method = method.method(),
                trace_id = %trace.trace_id,
                span_id = %trace.span_id,
                "outbound call"
            );
        }

        if let Some(credentials) = &self.credentials {
            credentials.apply(request.metadata_mut())?;
        }

        Ok(request)
    }
}

/// The parsed fields of a `traceparent` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceParent {
    pub trace_id: String,
    pub span_id: String,
    pub flags: String,
}

impl TraceParent {
    /// Starts a new sampled trace.
    pub fn new_root() -> Self {
        Self {
            trace_id: Uuid::new_v4().simple().to_string(),
            span_id: new_span_id(),
            flags: SAMPLED_FLAGS.to_string(),
        }
    }

    /// Continues the trace with a new span id.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: new_span_id(),
            flags: self.flags.clone(),
        }
    }

    /// Parses a version `00` header. Returns `None` on anything malformed.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.trim().split('-');
        let (version, trace_id, span_id, flags) =
            (parts.next()?, parts.next()?, parts.next()?, parts.next()?);

        if parts.next().is_some()
            || version != TRACEPARENT_VERSION
            || !is_lower_hex(trace_id, 32)
            || !is_lower_hex(span_id, 16)
            || !is_lower_hex(flags, 2)
            || trace_id.bytes().all(|b| b == b'0')
            || span_id.bytes().all(|b| b == b'0')
        {
            return None;
        }

        Some(Self {
            trace_id: trace_id.to_string(),
            span_id: span_id.to_string(),
            flags: flags.to_string(),
        })
    }
}

impl std::fmt::Display for TraceParent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{TRACEPARENT_VERSION}-{}-{}-{}",
            self.trace_id, self.span_id, self.flags
        )
    }
}

/// Writes the `traceparent` for this call into `metadata` and returns it.
pub fn inject_trace_context(metadata: &mut MetadataMap) -> TraceParent {
    let trace = metadata
        .get(TRACEPARENT_METADATA_KEY)
        .and_then(|v| v.to_str().ok())
        .and_then(TraceParent::parse)
        .or_else(|| CALLER_TRACE.try_with(TraceParent::clone).ok())
        .map(|parent| parent.child())
        .unwrap_or_else(TraceParent::new_root);

    // Only lowercase hex and dashes, always a valid ascii value.
    if let Ok(value) = MetadataValue::from_str(&trace.to_string()) {
        metadata.insert(TRACEPARENT_METADATA_KEY, value);
    }

    trace
}

fn new_span_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(16);
    id
}

fn is_lower_hex(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{AUTHORIZATION_METADATA_KEY, BearerToken};

    const PARENT: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    fn traceparent_of(request: &Request<()>) -> TraceParent {
        let value = request
            .metadata()
            .get(TRACEPARENT_METADATA_KEY)
            .expect("traceparent missing")
            .to_str()
            .unwrap();
        TraceParent::parse(value).expect("invalid traceparent")
    }

    #[test]
    fn starts_a_new_trace_when_none_is_present() {
        let mut interceptor = FeastInterceptor::default();

        let request = interceptor.call(Request::new(())).unwrap();
        let trace = traceparent_of(&request);

        assert_eq!(trace.trace_id.len(), 32);
        assert_eq!(trace.span_id.len(), 16);
        assert_eq!(trace.flags, "01");
    }

    #[test]
    fn continues_an_existing_trace() {
        let mut interceptor = FeastInterceptor::default();
        let mut request = Request::new(());
        request
            .metadata_mut()
            .insert(TRACEPARENT_METADATA_KEY, PARENT.parse().unwrap());

        let request = interceptor.call(request).unwrap();
        let trace = traceparent_of(&request);

        assert_eq!(trace.trace_id, "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_ne!(trace.span_id, "00f067aa0ba902b7");
        assert_eq!(trace.flags, "01");
    }

    #[tokio::test]
    async fn continues_the_trace_of_the_enclosing_scope() {
        let parent = TraceParent::parse(PARENT).unwrap();

        let trace = with_trace_parent(parent, async {
            let mut interceptor = FeastInterceptor::default();
            traceparent_of(&interceptor.call(Request::new(())).unwrap())
        })
        .await;

        assert_eq!(trace.trace_id, "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_ne!(trace.span_id, "00f067aa0ba902b7");
    }

    #[tokio::test]
    async fn request_traceparent_wins_over_the_enclosing_scope() {
        let scope = TraceParent::new_root();
        let mut request = Request::new(());
        request
            .metadata_mut()
            .insert(TRACEPARENT_METADATA_KEY, PARENT.parse().unwrap());

        let trace = with_trace_parent(scope, async {
            let mut interceptor = FeastInterceptor::default();
            traceparent_of(&interceptor.call(request).unwrap())
        })
        .await;

        assert_eq!(trace.trace_id, "4bf92f3577b34da6a3ce929d0e0e4736");
    }

    #[test]
    fn replaces_a_malformed_traceparent() {
        let mut interceptor = FeastInterceptor::default();
        let mut request = Request::new(());
        request
            .metadata_mut()
            .insert(TRACEPARENT_METADATA_KEY, "garbage".parse().unwrap());

        let request = interceptor.call(request).unwrap();

        assert_ne!(traceparent_of(&request).trace_id, "garbage");
    }

    #[test]
    fn applies_credentials() {
        let mut interceptor = FeastInterceptor::new(Some(Arc::new(BearerToken::new("abc"))));

        let request = interceptor.call(Request::new(())).unwrap();

        assert_eq!(
            request.metadata().get(AUTHORIZATION_METADATA_KEY).unwrap(),
            "Bearer abc"
        );
    }

    #[test]
    fn credential_failure_rejects_the_call() {
        let mut interceptor = FeastInterceptor::new(Some(Arc::new(BearerToken::new("a\u{7f}"))));

        let status = interceptor.call(Request::new(())).unwrap_err();

        assert_eq!(status.code(), tonic::Code::Unauthenticated);
    }

    #[test]
    fn parse_rejects_invalid_headers() {
        assert!(TraceParent::parse(PARENT).is_some());
        assert!(TraceParent::parse("01-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01").is_none());
        assert!(TraceParent::parse("00-00000000000000000000000000000000-00f067aa0ba902b7-01").is_none());
        assert!(TraceParent::parse("00-4BF92F3577B34DA6A3CE929D0E0E4736-00f067aa0ba902b7-01").is_none());
        assert!(TraceParent::parse("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7").is_none());
        assert!(TraceParent::parse(&format!("{PARENT}-extra")).is_none());
    }

    #[test]
    fn display_matches_the_header_format() {
        assert_eq!(TraceParent::parse(PARENT).unwrap().to_string(), PARENT);
    }
}
