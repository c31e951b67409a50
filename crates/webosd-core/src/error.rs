use thiserror::Error;

#[derive(Debug, Error)]
pub enum OsdError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid listen address {addr:?}: {reason}")]
    InvalidAddress { addr: String, reason: String },
}

impl OsdError {
    /// Short error code string, logged as `error_code` next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            OsdError::Config(_) => "CONFIG_ERROR",
            OsdError::InvalidAddress { .. } => "INVALID_ADDRESS",
        }
    }
}

pub type Result<T> = std::result::Result<T, OsdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(OsdError::Config("x".into()).code(), "CONFIG_ERROR");
        let err = OsdError::InvalidAddress {
            addr: "localhost".into(),
            reason: "missing port".into(),
        };
        assert_eq!(err.code(), "INVALID_ADDRESS");
        assert_eq!(
            err.to_string(),
            "Invalid listen address \"localhost\": missing port"
        );
    }
}
