//! Failure classification
//!
//! Every failed call is mapped to a [`Classification`] before the executor
//! decides what to do with it. The mapping is driven by the allow-lists in
//! [`ClassifierConfig`] so a deployment can widen them without a rebuild.

use serde_json::Value;
use stampede_config::ClassifierConfig;
use std::error::Error as StdError;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Kind of a failure that happened before any response arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Connection refused or the socket pool is saturated
    ConnectionBusy,
    /// Peer closed or aborted the connection mid-flight
    ConnectionReset,
    /// The request or the connect phase timed out
    Timeout,
    /// Name resolution failed
    DnsNotFound,
    /// TLS handshake failed
    TlsHandshake,
    /// TLS record failed its integrity check
    TlsBadRecordMac,
    /// Peer spoke an unexpected TLS protocol version
    TlsWrongVersion,
    /// TLS packet length was out of bounds
    TlsPacketLength,
    /// The process ran out of sockets or file descriptors
    SocketExhausted,
    /// Anything not recognised above
    Other,
}

impl TransportKind {
    /// Config-facing name, matching `classifier.transient_transport` entries
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::ConnectionBusy => "connection_busy",
            TransportKind::ConnectionReset => "connection_reset",
            TransportKind::Timeout => "timeout",
            TransportKind::DnsNotFound => "dns_not_found",
            TransportKind::TlsHandshake => "tls_handshake",
            TransportKind::TlsBadRecordMac => "tls_bad_record_mac",
            TransportKind::TlsWrongVersion => "tls_wrong_version",
            TransportKind::TlsPacketLength => "tls_packet_length",
            TransportKind::SocketExhausted => "socket_exhausted",
            TransportKind::Other => "other",
        }
    }

    /// Derive the kind from a send failure
    ///
    /// Walks the source chain looking for an `std::io::Error` first; the
    /// remaining TLS and DNS cases only appear as rendered messages, so they
    /// are sniffed from the chain text.
    pub fn from_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            return TransportKind::Timeout;
        }

        let mut source = error.source();
        while let Some(cause) = source {
            if let Some(io) = cause.downcast_ref::<std::io::Error>() {
                match io.kind() {
                    std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe => return TransportKind::ConnectionReset,
                    std::io::ErrorKind::TimedOut => return TransportKind::Timeout,
                    std::io::ErrorKind::ConnectionRefused => return TransportKind::ConnectionBusy,
                    std::io::ErrorKind::AddrInUse | std::io::ErrorKind::AddrNotAvailable => {
                        return TransportKind::SocketExhausted
                    }
                    _ => {}
                }
            }
            source = cause.source();
        }

        Self::sniff(&render_chain(error))
    }

    /// Last-resort classification from rendered error text
    fn sniff(text: &str) -> Self {
        let text = text.to_ascii_lowercase();
        if text.contains("dns error") || text.contains("failed to lookup") {
            TransportKind::DnsNotFound
        } else if text.contains("bad record mac") {
            TransportKind::TlsBadRecordMac
        } else if text.contains("wrong version number") {
            TransportKind::TlsWrongVersion
        } else if text.contains("packet length") {
            TransportKind::TlsPacketLength
        } else if text.contains("too many open files") {
            TransportKind::SocketExhausted
        } else if text.contains("tls") || text.contains("certificate") || text.contains("handshake")
        {
            TransportKind::TlsHandshake
        } else if text.contains("connection refused") {
            TransportKind::ConnectionBusy
        } else if text.contains("connection reset") || text.contains("broken pipe") {
            TransportKind::ConnectionReset
        } else if text.contains("timed out") {
            TransportKind::Timeout
        } else {
            TransportKind::Other
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connection_busy" => Ok(TransportKind::ConnectionBusy),
            "connection_reset" => Ok(TransportKind::ConnectionReset),
            "timeout" => Ok(TransportKind::Timeout),
            "dns_not_found" => Ok(TransportKind::DnsNotFound),
            "tls_handshake" => Ok(TransportKind::TlsHandshake),
            "tls_bad_record_mac" => Ok(TransportKind::TlsBadRecordMac),
            "tls_wrong_version" => Ok(TransportKind::TlsWrongVersion),
            "tls_packet_length" => Ok(TransportKind::TlsPacketLength),
            "socket_exhausted" => Ok(TransportKind::SocketExhausted),
            "other" => Ok(TransportKind::Other),
            _ => Err(format!("unknown transport kind: {}", s)),
        }
    }
}

fn render_chain(error: &dyn StdError) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

/// What a failed call means for the retry loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// No response; the failure kind is in the transient allow-list
    TransientTransport(TransportKind),
    /// 5xx from the platform
    ServerError(u16),
    /// 401; the credential must be refreshed before the next attempt
    AuthExpired,
    /// Body code from the retryable allow-list despite a non-5xx status
    RetryableCode(String),
    /// The action was already applied; success with no payload
    BenignConflict(String),
    /// Unknown error code; never retried
    FatalUnknown { status: u16, code: String },
}

impl Classification {
    /// Whether the executor is allowed to retry this outcome
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Classification::TransientTransport(_)
                | Classification::ServerError(_)
                | Classification::AuthExpired
                | Classification::RetryableCode(_)
        )
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::TransientTransport(kind) => write!(f, "transport {}", kind),
            Classification::ServerError(status) => write!(f, "HTTP {}", status),
            Classification::AuthExpired => write!(f, "HTTP 401"),
            Classification::RetryableCode(code) => write!(f, "code {}", code),
            Classification::BenignConflict(code) => write!(f, "benign {}", code),
            Classification::FatalUnknown { status, code } => {
                write!(f, "HTTP {} code {}", status, code)
            }
        }
    }
}

/// Classifier backed by the configured allow-lists
#[derive(Debug, Clone)]
pub struct Classifier {
    benign_conflicts: Vec<String>,
    retryable_codes: Vec<String>,
    transient_transport: Vec<TransportKind>,
}

impl Classifier {
    pub fn from_config(config: &ClassifierConfig) -> Self {
        let transient_transport = config
            .transient_transport
            .iter()
            .filter_map(|name| match name.parse() {
                Ok(kind) => Some(kind),
                Err(_) => {
                    warn!("Ignoring unknown transient_transport entry: {}", name);
                    None
                }
            })
            .collect();

        Self {
            benign_conflicts: config.benign_conflicts.clone(),
            retryable_codes: config.retryable_codes.clone(),
            transient_transport,
        }
    }

    /// Classify a non-2xx response
    ///
    /// Status checks run before body-code checks: a 401 carrying a benign
    /// code still means the credential expired.
    pub fn classify_response(&self, status: u16, code: &str) -> Classification {
        if status == 401 {
            return Classification::AuthExpired;
        }
        if status >= 500 {
            return Classification::ServerError(status);
        }
        if self.retryable_codes.iter().any(|c| c == code) {
            return Classification::RetryableCode(code.to_string());
        }
        if self.benign_conflicts.iter().any(|c| c == code) {
            return Classification::BenignConflict(code.to_string());
        }
        Classification::FatalUnknown {
            status,
            code: code.to_string(),
        }
    }

    /// Whether a transport failure of this kind may be retried
    pub fn is_transient(&self, kind: TransportKind) -> bool {
        self.transient_transport.contains(&kind)
    }
}

/// Pull the platform error code out of a response body, if any
pub(crate) fn body_code(body: &Value) -> &str {
    body.get("code").and_then(Value::as_str).unwrap_or("")
}
