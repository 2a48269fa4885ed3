use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};

use crate::error::FetchError;

/// Where a raw request goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub secure: bool,
}

impl Endpoint {
    /// Host without IPv6 brackets, as needed for connecting and SNI.
    pub fn bare_host(&self) -> &str {
        self.host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(&self.host)
    }
}

/// Sends raw request bytes and returns raw response bytes.
pub trait Transport: Send + Sync {
    fn round_trip(&self, endpoint: &Endpoint, request: &[u8]) -> Result<Vec<u8>, FetchError>;
}

/// Blocking TCP transport, TLS through rustls with the webpki root store.
/// Reads until the peer closes the connection.
pub struct TcpTransport {
    timeout: Option<Duration>,
    tls: Arc<ClientConfig>,
}

impl TcpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let tls = ClientConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .map_err(|e| FetchError::Tls {
            host: String::new(),
            reason: e.to_string(),
        })?
        .with_root_certificates(roots)
        .with_no_client_auth();
        Ok(Self {
            timeout,
            tls: Arc::new(tls),
        })
    }

    fn connect(&self, endpoint: &Endpoint) -> Result<TcpStream, FetchError> {
        let stream = TcpStream::connect((endpoint.bare_host(), endpoint.port)).map_err(|source| {
            FetchError::Connect {
                host: endpoint.host.clone(),
                port: endpoint.port,
                source,
            }
        })?;
        // Best effort: an unsupported timeout leaves the call untimed.
        if let Err(err) = stream
            .set_read_timeout(self.timeout)
            .and_then(|()| stream.set_write_timeout(self.timeout))
        {
            log::debug!("socket timeout unavailable, continuing untimed: {err}");
        }
        Ok(stream)
    }
}

impl Transport for TcpTransport {
    fn round_trip(&self, endpoint: &Endpoint, request: &[u8]) -> Result<Vec<u8>, FetchError> {
        let stream = self.connect(endpoint)?;
        let io_err = |source| FetchError::Io {
            host: endpoint.host.clone(),
            port: endpoint.port,
            source,
        };

        if !endpoint.secure {
            let mut stream = stream;
            stream.write_all(request).map_err(io_err)?;
            return read_to_close(&mut stream).map_err(io_err);
        }

        let server_name = ServerName::try_from(endpoint.bare_host().to_string()).map_err(|e| {
            FetchError::Tls {
                host: endpoint.host.clone(),
                reason: e.to_string(),
            }
        })?;
        let conn =
            ClientConnection::new(Arc::clone(&self.tls), server_name).map_err(|e| {
                FetchError::Tls {
                    host: endpoint.host.clone(),
                    reason: e.to_string(),
                }
            })?;
        let mut tls = StreamOwned::new(conn, stream);
        tls.write_all(request).map_err(io_err)?;
        tls.flush().map_err(io_err)?;
        read_to_close(&mut tls).map_err(io_err)
    }
}

// Servers that drop the socket without a TLS close_notify surface as
// UnexpectedEof once data has arrived; that still ends the response.
fn read_to_close(reader: &mut impl Read) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(out),
            Ok(n) => out.extend_from_slice(&buf[..n]),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::UnexpectedEof && !out.is_empty() => {
                return Ok(out);
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_strips_ipv6_brackets() {
        let endpoint = Endpoint {
            host: "[::1]".into(),
            port: 8080,
            secure: false,
        };
        assert_eq!(endpoint.bare_host(), "::1");
    }

    #[test]
    fn test_read_to_close_collects_everything() {
        let mut input: &[u8] = b"HTTP/1.1 200 OK\r\n\r\nbody";
        assert_eq!(read_to_close(&mut input).unwrap(), b"HTTP/1.1 200 OK\r\n\r\nbody");
    }
}
