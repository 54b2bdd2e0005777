//! Minimal HTTP/1 client over plain TCP or rustls.
//!
//! One connection per request, driven by `hyper::client::conn::http1`. Used
//! both by the status-page client and by the HTTP probe.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HOST, USER_AGENT};
use http::{Method, Request, Uri};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

use crate::error::{ApiError, ApiResult};

const AGENT: &str = concat!("cachet-monitor/", env!("CARGO_PKG_VERSION"));

/// Status and body of a completed exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Shared TLS configurations for outgoing requests. Cheap to clone.
#[derive(Clone)]
pub struct HttpTransport {
    verified: Arc<rustls::ClientConfig>,
    unverified: Arc<rustls::ClientConfig>,
}

impl HttpTransport {
    /// Build a transport trusting the Mozilla root certificate store.
    pub fn new() -> ApiResult<Self> {
        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let verified = rustls::ClientConfig::builder_with_provider(
            rustls::crypto::ring::default_provider().into(),
        )
        .with_safe_default_protocol_versions()
        .map_err(|e| ApiError::Tls(format!("tls protocol version error: {e}")))?
        .with_root_certificates(root_store)
        .with_no_client_auth();

        let unverified = rustls::ClientConfig::builder_with_provider(
            rustls::crypto::ring::default_provider().into(),
        )
        .with_safe_default_protocol_versions()
        .map_err(|e| ApiError::Tls(format!("tls protocol version error: {e}")))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(danger::NoVerifier))
        .with_no_client_auth();

        Ok(Self {
            verified: Arc::new(verified),
            unverified: Arc::new(unverified),
        })
    }

    /// Perform one request. `verify_tls = false` accepts any certificate.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
        body: Option<Vec<u8>>,
        verify_tls: bool,
        timeout: Duration,
    ) -> ApiResult<HttpResponse> {
        tokio::time::timeout(
            timeout,
            self.send_inner(method, url, headers, body, verify_tls),
        )
        .await
        .map_err(|_| ApiError::Timeout)?
    }

    async fn send_inner(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
        body: Option<Vec<u8>>,
        verify_tls: bool,
    ) -> ApiResult<HttpResponse> {
        let target = Target::parse(url)?;

        let mut builder = Request::builder()
            .method(method)
            .uri(target.path.as_str())
            .header(HOST, target.host_header())
            .header(USER_AGENT, AGENT);
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let req = builder
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let stream = TcpStream::connect((target.host.as_str(), target.port)).await?;

        if target.tls {
            let config = if verify_tls {
                Arc::clone(&self.verified)
            } else {
                Arc::clone(&self.unverified)
            };
            let server_name = ServerName::try_from(target.host.as_str())
                .map_err(|e| ApiError::Tls(format!("invalid server name: {e}")))?
                .to_owned();
            let stream = TlsConnector::from(config)
                .connect(server_name, stream)
                .await
                .map_err(|e| ApiError::Tls(e.to_string()))?;
            exchange(stream, req).await
        } else {
            exchange(stream, req).await
        }
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

async fn exchange<S>(stream: S, req: Request<Full<Bytes>>) -> ApiResult<HttpResponse>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let io = TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(error = %e, "http connection closed with error");
        }
    });

    let resp = sender.send_request(req).await?;
    let status = resp.status().as_u16();
    let body = resp.into_body().collect().await?.to_bytes();
    Ok(HttpResponse { status, body })
}

/// Connection details extracted from an absolute URL.
#[derive(Debug, PartialEq, Eq)]
struct Target {
    tls: bool,
    host: String,
    port: u16,
    explicit_port: bool,
    path: String,
}

impl Target {
    fn parse(url: &str) -> ApiResult<Self> {
        let uri: Uri = url
            .parse()
            .map_err(|e| ApiError::InvalidUrl(format!("{url}: {e}")))?;

        let tls = match uri.scheme_str() {
            Some("https") => true,
            Some("http") => false,
            _ => return Err(ApiError::InvalidUrl(format!("{url}: scheme must be http or https"))),
        };
        let host = uri
            .host()
            .ok_or_else(|| ApiError::InvalidUrl(format!("{url}: missing host")))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let explicit_port = uri.port_u16().is_some();
        let port = uri.port_u16().unwrap_or(if tls { 443 } else { 80 });
        let path = uri
            .path_and_query()
            .map(|p| p.as_str().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "/".to_string());

        Ok(Self {
            tls,
            host,
            port,
            explicit_port,
            path,
        })
    }

    fn host_header(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        if self.explicit_port {
            format!("{host}:{}", self.port)
        } else {
            host
        }
    }
}

// ── Certificate verifier for non-strict targets ──────────────────────

mod danger {
    use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
    use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
    use rustls::{DigitallySignedStruct, Error, SignatureScheme};

    #[derive(Debug)]
    pub struct NoVerifier;

    impl ServerCertVerifier for NoVerifier {
        fn verify_server_cert(
            &self,
            _end_entity: &CertificateDer<'_>,
            _intermediates: &[CertificateDer<'_>],
            _server_name: &ServerName<'_>,
            _ocsp_response: &[u8],
            _now: UnixTime,
        ) -> Result<ServerCertVerified, Error> {
            Ok(ServerCertVerified::assertion())
        }

        fn verify_tls12_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn verify_tls13_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            rustls::crypto::ring::default_provider()
                .signature_verification_algorithms
                .supported_schemes()
        }
    }
}
