//! # Channel Factory
//!
//! Builds the transport channel to a Feast serving endpoint under one of three
//! security modes:
//!
//! * TLS disabled: plaintext `http://host:port`.
//! * TLS enabled without a certificate: `https://host:port` trusting the platform's
//!   native root certificates.
//! * TLS enabled with a certificate path: the PEM file at that path is the only
//!   trust anchor. A missing or malformed file is a [`ConfigError`], never a silent
//!   fallback to the system roots.
//!
//! Connections are established lazily, on the first call. There is no retry.
use crate::security::SecurityConfig;
use std::path::{Path, PathBuf};
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};

/// Errors that can occur while building a channel.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid serving endpoint '{uri}': '{source}'")]
    InvalidEndpoint {
        uri: String,
        source: tonic::transport::Error,
    },
    #[error("Invalid certificate provided at path '{}': '{source}'", path.display())]
    InvalidCertificate {
        path: PathBuf,
        source: CertificateError,
    },
    #[error("Invalid TLS configuration: '{0}'")]
    Tls(#[source] tonic::transport::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("failed to read certificate file: {0}")]
    Read(#[from] std::io::Error),
    /// The file has no complete PEM `CERTIFICATE` section.
    #[error("no PEM encoded certificate found")]
    NoCertificate,
    #[error("certificate rejected by the TLS layer: {0}")]
    Tls(#[from] tonic::transport::Error),
}

/// The security mode a channel was built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportSecurity {
    Plaintext,
    SystemTls,
    CustomTls { certificate_path: PathBuf },
}

impl TransportSecurity {
    pub fn is_tls(&self) -> bool {
        !matches!(self, TransportSecurity::Plaintext)
    }
}

/// Builds the endpoint for `host:port` according to `config`, without connecting.
pub fn endpoint(
    host: &str,
    port: u16,
    config: &SecurityConfig,
) -> Result<(Endpoint, TransportSecurity), ConfigError> {
    if !config.is_tls_enabled() {
        let endpoint = parse_endpoint("http", host, port)?;
        return Ok((endpoint, TransportSecurity::Plaintext));
    }

    let endpoint = parse_endpoint("https", host, port)?;

    match config.certificate_path() {
        Some(path) => {
            let tls = ClientTlsConfig::new().ca_certificate(read_certificate(path)?);
            let endpoint = endpoint
                .tls_config(tls)
                .map_err(|e| invalid_certificate(path, e.into()))?;
            Ok((
                endpoint,
                TransportSecurity::CustomTls {
                    certificate_path: path.to_path_buf(),
                },
            ))
        }
        None => {
            let tls = ClientTlsConfig::new().with_native_roots();
            let endpoint = endpoint.tls_config(tls).map_err(ConfigError::Tls)?;
            Ok((endpoint, TransportSecurity::SystemTls))
        }
    }
}

/// Builds a channel that connects on first use.
///
/// Must be called from within a Tokio runtime.
pub fn connect_lazy(
    host: &str,
    port: u16,
    config: &SecurityConfig,
) -> Result<(Channel, TransportSecurity), ConfigError> {
    let (endpoint, security) = endpoint(host, port, config)?;
    Ok((endpoint.connect_lazy(), security))
}

fn parse_endpoint(scheme: &str, host: &str, port: u16) -> Result<Endpoint, ConfigError> {
    let uri = format!("{scheme}://{host}:{port}");
    Endpoint::from_shared(uri.clone())
        .map_err(|source| ConfigError::InvalidEndpoint { uri, source })
}

const PEM_CERTIFICATE_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_CERTIFICATE_END: &str = "-----END CERTIFICATE-----";

fn read_certificate(path: &Path) -> Result<Certificate, ConfigError> {
    let pem = std::fs::read(path).map_err(|e| invalid_certificate(path, e.into()))?;

    // The TLS layer silently skips input without any PEM section.
    if !contains_pem_certificate(&pem) {
        return Err(invalid_certificate(path, CertificateError::NoCertificate));
    }

    Ok(Certificate::from_pem(pem))
}

/// Whether `pem` holds at least one complete `CERTIFICATE` section: the begin and end
/// markers on lines of their own, enclosing a non-empty base64 body.
///
/// The DER inside is not decoded; the TLS layer validates it.
fn contains_pem_certificate(pem: &[u8]) -> bool {
    let Ok(pem) = std::str::from_utf8(pem) else {
        return false;
    };

    let mut body: Option<usize> = None;
    for line in pem.lines().map(str::trim) {
        match body {
            None if line == PEM_CERTIFICATE_BEGIN => body = Some(0),
            None => {}
            Some(len) if line == PEM_CERTIFICATE_END => {
                if len > 0 {
                    return true;
                }
                body = None;
            }
            Some(len) if is_base64_line(line) => body = Some(len + line.len()),
            Some(_) => body = None,
        }
    }

    false
}

fn is_base64_line(line: &str) -> bool {
    !line.is_empty()
        && line
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
}

fn invalid_certificate(path: &Path, source: CertificateError) -> ConfigError {
    ConfigError::InvalidCertificate {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_endpoint_uses_http() {
        let (endpoint, security) =
            endpoint("localhost", 6566, &SecurityConfig::default()).unwrap();

        assert_eq!(security, TransportSecurity::Plaintext);
        assert!(!security.is_tls());
        assert_eq!(endpoint.uri().scheme_str(), Some("http"));
        assert_eq!(endpoint.uri().host(), Some("localhost"));
        assert_eq!(endpoint.uri().port_u16(), Some(6566));
    }

    #[test]
    fn tls_without_certificate_uses_system_roots() {
        let config = SecurityConfig::builder().tls_enabled(true).build();

        match endpoint("serving.example.com", 443, &config) {
            Ok((endpoint, security)) => {
                assert_eq!(security, TransportSecurity::SystemTls);
                assert_eq!(endpoint.uri().scheme_str(), Some("https"));
            }
            // Hosts without any installed root certificate
            Err(ConfigError::Tls(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn certificate_path_is_ignored_without_tls() {
        let config = SecurityConfig::builder()
            .certificate_path("/does/not/exist.pem")
            .build();

        let (_, security) = endpoint("localhost", 6566, &config).unwrap();

        assert_eq!(security, TransportSecurity::Plaintext);
    }

    #[test]
    fn missing_certificate_is_a_config_error() {
        let config = SecurityConfig::builder()
            .tls_enabled(true)
            .certificate_path("/does/not/exist.pem")
            .build();

        let err = endpoint("localhost", 6566, &config).unwrap_err();

        match err {
            ConfigError::InvalidCertificate { path, source } => {
                assert_eq!(path, Path::new("/does/not/exist.pem"));
                assert!(matches!(source, CertificateError::Read(_)));
            }
            other => panic!("expected invalid certificate error, got {other:?}"),
        }
    }

    const BODY: &str = "MIIBszCCAVmgAwIBAgIUQ2zq\nZm9vYmFyYmF6==";

    #[test]
    fn pem_section_is_detected() {
        let pem = format!("{PEM_CERTIFICATE_BEGIN}\n{BODY}\n{PEM_CERTIFICATE_END}\n");

        assert!(contains_pem_certificate(pem.as_bytes()));
    }

    #[test]
    fn pem_section_may_follow_other_text() {
        let pem = format!(
            "subject=CN=feast-test-ca\r\n{PEM_CERTIFICATE_BEGIN}\r\n{BODY}\r\n{PEM_CERTIFICATE_END}\r\n"
        );

        assert!(contains_pem_certificate(pem.as_bytes()));
    }

    #[test]
    fn begin_marker_inside_a_comment_is_not_a_certificate() {
        let pem = format!("# paste a {PEM_CERTIFICATE_BEGIN} block here\n{BODY}\n");

        assert!(!contains_pem_certificate(pem.as_bytes()));
    }

    #[test]
    fn unterminated_or_empty_sections_are_not_certificates() {
        let unterminated = format!("{PEM_CERTIFICATE_BEGIN}\n{BODY}\n");
        let empty = format!("{PEM_CERTIFICATE_BEGIN}\n{PEM_CERTIFICATE_END}\n");
        let garbage = format!("{PEM_CERTIFICATE_BEGIN}\nnot base64!\n{PEM_CERTIFICATE_END}\n");

        assert!(!contains_pem_certificate(unterminated.as_bytes()));
        assert!(!contains_pem_certificate(empty.as_bytes()));
        assert!(!contains_pem_certificate(garbage.as_bytes()));
        assert!(!contains_pem_certificate(&[0xff, 0xfe, 0x00]));
    }

    #[test]
    fn invalid_host_is_an_endpoint_error() {
        let err = endpoint("bad host", 6566, &SecurityConfig::default()).unwrap_err();

        assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
    }
}
