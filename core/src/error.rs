use thiserror::Error;

/// Valhalla Deploy error types
#[derive(Error, Debug)]
pub enum DeployError {
    /// Malformed interactive input; the caller re-prompts
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Readiness probe exhausted its attempts
    #[error("Timed out waiting for {host}:{port} after {attempts} attempts")]
    Timeout {
        host: String,
        port: u16,
        attempts: u32,
    },

    /// A required external tool is not installed
    #[error("Required tool not available: {0}")]
    ToolMissing(String),

    /// The interactive input stream closed or could not be read
    #[error("Prompt aborted: {0}")]
    Prompt(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for DeployError {
    fn from(err: serde_json::Error) -> Self {
        DeployError::Serialization(err.to_string())
    }
}

/// Result type alias for Valhalla Deploy operations
pub type Result<T> = std::result::Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let error = DeployError::Validation("ADMIN_IDS must be digits".to_string());
        assert_eq!(error.to_string(), "Invalid input: ADMIN_IDS must be digits");
    }

    #[test]
    fn test_timeout_error_display() {
        let error = DeployError::Timeout {
            host: "mysql".to_string(),
            port: 3306,
            attempts: 60,
        };
        assert_eq!(
            error.to_string(),
            "Timed out waiting for mysql:3306 after 60 attempts"
        );
    }

    #[test]
    fn test_tool_missing_error_display() {
        let error = DeployError::ToolMissing("docker".to_string());
        assert_eq!(error.to_string(), "Required tool not available: docker");
    }

    #[test]
    fn test_prompt_error_display() {
        let error = DeployError::Prompt("input stream closed".to_string());
        assert_eq!(error.to_string(), "Prompt aborted: input stream closed");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let deploy_error: DeployError = io_error.into();
        assert!(matches!(deploy_error, DeployError::Io(_)));
        assert!(deploy_error.to_string().contains("file not found"));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let result: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("{ invalid json }");
        let json_error = result.unwrap_err();
        let deploy_error: DeployError = json_error.into();
        assert!(matches!(deploy_error, DeployError::Serialization(_)));
    }

    #[test]
    fn test_other_error_display() {
        let error = DeployError::Other("unexpected".to_string());
        assert_eq!(error.to_string(), "unexpected");
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(DeployError::Other("test error".to_string()))
        }

        assert_eq!(returns_ok().unwrap(), 42);
        assert!(returns_err().is_err());
    }

    #[test]
    fn test_error_is_debug() {
        let error = DeployError::Validation("test".to_string());
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("Validation"));
    }
}
