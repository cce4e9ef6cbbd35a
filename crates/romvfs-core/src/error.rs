use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid token in signature pattern: '{0}'")]
    InvalidPatternToken(char),

    #[error("Signature pattern is empty")]
    EmptyPattern,

    #[error("Device '{0}' is already registered")]
    DeviceAlreadyRegistered(String),

    #[error("No device registered for signature [{0}]")]
    NoDeviceRegistered(String),

    #[error("No registered device could mount signature [{signature}]: {attempts}")]
    MountFailed { signature: String, attempts: String },

    #[error("Failed to initialize device '{device}': {source}")]
    DeviceInit {
        device: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Device setup failed: {0}")]
    DeviceSetup(String),

    #[error("Device is not initialized")]
    NotInitialized,

    #[error("Device has been disposed")]
    Disposed,

    #[error("No entry with id {0} in the file tree")]
    EntryNotFound(usize),

    #[error("Entry '{0}' is not a file")]
    NotAFile(String),

    #[error("Entry '{0}' is not a directory")]
    NotADirectory(String),

    #[error("No known signature matched the media")]
    UnrecognizedFormat,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.is_not_found());

        let other = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!Error::Io(other).is_not_found());
    }

    #[test]
    fn test_device_init_carries_cause() {
        let err = Error::DeviceInit {
            device: "host".to_string(),
            source: Box::new(Error::DeviceSetup("missing backing file".to_string())),
        };
        let message = err.to_string();
        assert!(message.contains("host"));
        assert!(message.contains("missing backing file"));
    }
}
