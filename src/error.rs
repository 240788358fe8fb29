use crate::line_protocol::ProtocolError;

#[derive(Debug, thiserror::Error)]
pub enum PhotoinoError {
    #[error("Not connected: call open() first")]
    NotConnected,

    #[error("Could not open serial port {port}: {source}")]
    Connection {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("No serial port given and no candidate device found")]
    NoCandidatePort,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Invalid value for {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Setting {name} is not supported by the {backend} backend")]
    UnsupportedSetting {
        name: &'static str,
        backend: &'static str,
    },

    #[error("Invalid instrument configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Serial port enumeration failed: {0}")]
    Enumeration(#[source] serialport::Error),
}

impl PhotoinoError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Protocol(ProtocolError::Timeout))
    }

    pub fn is_malformed_reply(&self) -> bool {
        matches!(self, Self::Protocol(e) if e.is_malformed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_helpers() {
        assert!(PhotoinoError::from(ProtocolError::Timeout).is_timeout());
        assert!(!PhotoinoError::from(ProtocolError::Timeout).is_malformed_reply());

        let malformed = PhotoinoError::from(ProtocolError::MalformedReply { byte: b'x' });
        assert!(malformed.is_malformed_reply());
        assert!(!malformed.is_timeout());
        assert!(!PhotoinoError::NotConnected.is_timeout());
    }

    #[test]
    fn test_messages() {
        let err = PhotoinoError::InvalidParameter {
            name: "mean_count_rate",
            reason: "must not be negative (got -3)".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for mean_count_rate: must not be negative (got -3)"
        );
    }
}
