use std::fmt;
use std::str::FromStr;

/// Outcome of probing a URL, in the string form stored in the CSV.
///
/// Transport failures are data, not errors: every probe produces one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    /// No URL to probe.
    Empty,
    /// Final HTTP status after following redirects.
    Http(u16),
    /// The redirect cap was hit; carries the status of the redirect refused.
    MaxRedirects(u16),
    DnsError,
    ConnectionRefused,
    Timeout,
    InvalidUrl,
    /// Any other transport failure, e.g. `ECONNRESET` or `TLS`.
    Error(String),
}

impl ProbeStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, ProbeStatus::Http(200))
    }

    pub fn http_code(&self) -> Option<u16> {
        match self {
            ProbeStatus::Http(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStatus::Empty => Ok(()),
            ProbeStatus::Http(code) => write!(f, "{code}"),
            ProbeStatus::MaxRedirects(code) => write!(f, "{code}_MAX_REDIRECTS"),
            ProbeStatus::DnsError => f.write_str("DNS_ERROR"),
            ProbeStatus::ConnectionRefused => f.write_str("CONNECTION_REFUSED"),
            ProbeStatus::Timeout => f.write_str("TIMEOUT"),
            ProbeStatus::InvalidUrl => f.write_str("INVALID_URL"),
            ProbeStatus::Error(code) => write!(f, "ERROR_{code}"),
        }
    }
}

impl FromStr for ProbeStatus {
    type Err = std::convert::Infallible;

    /// Never fails: unrecognized text is kept as an `Error` tag so a
    /// hand-edited CSV still round-trips.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let status = match s {
            "" => ProbeStatus::Empty,
            "DNS_ERROR" => ProbeStatus::DnsError,
            "CONNECTION_REFUSED" => ProbeStatus::ConnectionRefused,
            "TIMEOUT" => ProbeStatus::Timeout,
            "INVALID_URL" => ProbeStatus::InvalidUrl,
            _ => {
                if let Ok(code) = s.parse::<u16>() {
                    ProbeStatus::Http(code)
                } else if let Some(code) = s
                    .strip_suffix("_MAX_REDIRECTS")
                    .and_then(|c| c.parse::<u16>().ok())
                {
                    ProbeStatus::MaxRedirects(code)
                } else if let Some(code) = s.strip_prefix("ERROR_") {
                    ProbeStatus::Error(code.to_string())
                } else {
                    ProbeStatus::Error(s.to_string())
                }
            }
        };
        Ok(status)
    }
}
