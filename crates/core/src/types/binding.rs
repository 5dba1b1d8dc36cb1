//! Client binding (`ip[:port]`) parsing and formatting.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The machine binding a license is locked to.
///
/// The license API stores the binding as a single `ip:port` string while the
/// edit forms present it as two separate fields, so this type owns the
/// splitting and recombining rules. Both halves are kept exactly as entered
/// (trimmed); no address validation happens here - the backend is the
/// authority on what it accepts.
///
/// ## Examples
///
/// ```
/// use keywarden_core::IpPort;
///
/// let binding = IpPort::parse("203.0.113.7:30120");
/// assert_eq!(binding.ip, "203.0.113.7");
/// assert_eq!(binding.port, "30120");
/// assert_eq!(binding.combined(), "203.0.113.7:30120");
///
/// // A binding cannot be port-only.
/// assert_eq!(IpPort::from_fields("", "30120").combined(), "");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpPort {
    /// Address half of the binding.
    pub ip: String,
    /// Port half of the binding; empty when the license is ip-only.
    pub port: String,
}

impl IpPort {
    /// Split a combined `ip:port` string on the first colon.
    ///
    /// Input without a colon is an ip-only binding; anything past a second
    /// colon is dropped.
    #[must_use]
    pub fn parse(combined: &str) -> Self {
        let mut parts = combined.split(':');
        let ip = parts.next().unwrap_or("").trim().to_owned();
        let port = parts.next().unwrap_or("").trim().to_owned();
        Self { ip, port }
    }

    /// Combine the two form fields into a binding.
    ///
    /// The ip field may itself carry an embedded `ip:port` (pasted whole);
    /// a non-empty embedded port wins over the separately supplied one.
    #[must_use]
    pub fn from_fields(ip: &str, port: &str) -> Self {
        let mut parsed = Self::parse(ip);
        if parsed.port.is_empty() {
            parsed.port = port.trim().to_owned();
        }
        parsed
    }

    /// Render back to the backend's combined form.
    ///
    /// An empty ip yields an empty string regardless of the port - there is
    /// no such thing as a port-only binding.
    #[must_use]
    pub fn combined(&self) -> String {
        if self.ip.is_empty() {
            String::new()
        } else if self.port.is_empty() {
            self.ip.clone()
        } else {
            format!("{}:{}", self.ip, self.port)
        }
    }

    /// Whether the binding is absent.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ip.is_empty()
    }
}

impl fmt::Display for IpPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.combined())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_on_first_colon() {
        let binding = IpPort::parse("203.0.113.7:30120");
        assert_eq!(binding.ip, "203.0.113.7");
        assert_eq!(binding.port, "30120");
    }

    #[test]
    fn test_parse_without_colon_is_ip_only() {
        let binding = IpPort::parse("203.0.113.7");
        assert_eq!(binding.ip, "203.0.113.7");
        assert_eq!(binding.port, "");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let binding = IpPort::parse(" 203.0.113.7 : 30120 ");
        assert_eq!(binding.ip, "203.0.113.7");
        assert_eq!(binding.port, "30120");
    }

    #[test]
    fn test_round_trip() {
        for input in ["203.0.113.7:30120", "203.0.113.7", "host.example"] {
            assert_eq!(IpPort::parse(input).combined(), input);
        }
    }

    #[test]
    fn test_combined_empty_ip_is_empty_string() {
        assert_eq!(IpPort::from_fields("", "30120").combined(), "");
        assert_eq!(IpPort::default().combined(), "");
    }

    #[test]
    fn test_combined_never_has_dangling_colon() {
        assert_eq!(IpPort::parse("203.0.113.7:").combined(), "203.0.113.7");
        assert_eq!(IpPort::from_fields("203.0.113.7", "").combined(), "203.0.113.7");
    }

    #[test]
    fn test_embedded_port_wins_over_field() {
        let binding = IpPort::from_fields("203.0.113.7:30120", "40120");
        assert_eq!(binding.port, "30120");
    }

    #[test]
    fn test_blank_embedded_port_falls_back_to_field() {
        let binding = IpPort::from_fields("203.0.113.7:", "40120");
        assert_eq!(binding.port, "40120");
        assert_eq!(binding.combined(), "203.0.113.7:40120");
    }

    #[test]
    fn test_parse_drops_third_segment() {
        let binding = IpPort::parse("203.0.113.7:30120:junk");
        assert_eq!(binding.ip, "203.0.113.7");
        assert_eq!(binding.port, "30120");
    }

    #[test]
    fn test_separate_fields_combine() {
        let binding = IpPort::from_fields("203.0.113.7", "30120");
        assert_eq!(binding.combined(), "203.0.113.7:30120");
    }
}
