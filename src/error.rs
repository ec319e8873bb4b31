use std::fmt;

/// Main error type for the gossipkv replica node
#[derive(Debug)]
pub enum GossipKvError {
    /// Configuration or CLI argument errors
    Config(String),

    /// Node lifecycle errors
    Node(String),

    /// Transport layer errors
    Transport(String),

    /// System I/O errors
    Io(std::io::Error),

    /// A datagram that could not be turned into a gossip message
    Decode(DecodeError),
}

/// Reasons a received payload is rejected by the message codec
#[derive(Debug)]
pub enum DecodeError {
    /// Not valid JSON, unknown `type`, or missing/mistyped fields
    Json(serde_json::Error),

    /// Timestamps must be finite to be ordered
    InvalidTimestamp(f64),

    /// Encoded message does not fit in one datagram
    Oversized { len: usize, max: usize },
}

impl fmt::Display for GossipKvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GossipKvError::Config(msg) => write!(f, "Configuration error: {}", msg),
            GossipKvError::Node(msg) => write!(f, "Node error: {}", msg),
            GossipKvError::Transport(msg) => write!(f, "Transport error: {}", msg),
            GossipKvError::Io(err) => write!(f, "I/O error: {}", err),
            GossipKvError::Decode(err) => write!(f, "Decode error: {}", err),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Json(err) => write!(f, "JSON: {}", err),
            DecodeError::InvalidTimestamp(ts) => write!(f, "invalid timestamp {}", ts),
            DecodeError::Oversized { len, max } => {
                write!(f, "message of {} bytes exceeds {} byte limit", len, max)
            }
        }
    }
}

impl std::error::Error for GossipKvError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GossipKvError::Io(err) => Some(err),
            GossipKvError::Decode(err) => Some(err),
            _ => None,
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Json(err) => Some(err),
            _ => None,
        }
    }
}

// Convenient type alias for Results using our error type
pub type Result<T> = std::result::Result<T, GossipKvError>;

impl GossipKvError {
    /// Get the error type identifier
    pub fn error_type(&self) -> &'static str {
        match self {
            GossipKvError::Config(_) => "configuration_error",
            GossipKvError::Node(_) => "node_error",
            GossipKvError::Transport(_) => "transport_error",
            GossipKvError::Io(_) => "io_error",
            GossipKvError::Decode(_) => "decode_error",
        }
    }
}

// Conversions from common error types
impl From<std::io::Error> for GossipKvError {
    fn from(err: std::io::Error) -> Self {
        GossipKvError::Io(err)
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Json(err)
    }
}

impl From<serde_json::Error> for GossipKvError {
    fn from(err: serde_json::Error) -> Self {
        GossipKvError::Decode(DecodeError::Json(err))
    }
}

impl From<DecodeError> for GossipKvError {
    fn from(err: DecodeError) -> Self {
        GossipKvError::Decode(err)
    }
}

// Helper macros for common error construction patterns
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::GossipKvError::Config($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::GossipKvError::Config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! node_error {
    ($msg:expr) => {
        $crate::error::GossipKvError::Node($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::GossipKvError::Node(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! transport_error {
    ($msg:expr) => {
        $crate::error::GossipKvError::Transport($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::GossipKvError::Transport(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let config_err = GossipKvError::Config("Invalid port".to_string());
        assert_eq!(config_err.to_string(), "Configuration error: Invalid port");

        let io_err = GossipKvError::Io(std::io::Error::new(
            std::io::ErrorKind::AddrInUse,
            "Address in use",
        ));
        assert!(io_err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: GossipKvError = io_err.into();
        assert!(matches!(err, GossipKvError::Io(_)));
        assert_eq!(err.error_type(), "io_error");

        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: GossipKvError = json_err.into();
        assert!(matches!(err, GossipKvError::Decode(DecodeError::Json(_))));
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::Oversized { len: 70000, max: 65507 };
        assert_eq!(
            err.to_string(),
            "message of 70000 bytes exceeds 65507 byte limit"
        );
        let err = DecodeError::InvalidTimestamp(f64::INFINITY);
        assert_eq!(err.to_string(), "invalid timestamp inf");
    }

    #[test]
    fn test_macros() {
        let err = config_error!("Port {} is invalid", 65536);
        assert_eq!(
            err.to_string(),
            "Configuration error: Port 65536 is invalid"
        );

        let err = node_error!("already started");
        assert_eq!(err.to_string(), "Node error: already started");

        let err = transport_error!("No peers available");
        assert_eq!(err.error_type(), "transport_error");
    }
}
