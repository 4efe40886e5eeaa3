//! Error types for the orchestration client

/// Result type alias for orchestration operations
pub type DockerResult<T> = Result<T, DockerError>;

#[derive(thiserror::Error, Debug)]
pub enum DockerError {
    #[error("failed to initialize pooled docker connection: {message}")]
    BackendUnavailable { message: String },

    #[error("no such container: {id}")]
    NotFound { id: String },

    #[error("failed to pull image {image}: {message}")]
    ImagePull { image: String, message: String },

    #[error("docker API error: {0}")]
    Api(#[from] bollard::errors::Error),

    #[error("container backend error: {message}")]
    Backend { message: String },
}

impl DockerError {
    pub fn backend<S: Into<String>>(message: S) -> Self {
        DockerError::Backend {
            message: message.into(),
        }
    }

    /// Whether the backend reported that the container does not exist.
    ///
    /// Callers purging a container that already expired typically ignore this.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DockerError::NotFound { .. })
            || matches!(
                self,
                DockerError::Api(bollard::errors::Error::DockerResponseServerError {
                    status_code: 404,
                    ..
                })
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(DockerError::NotFound { id: "abc".into() }.is_not_found());

        let api = DockerError::Api(bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            message: "No such container: abc".into(),
        });
        assert!(api.is_not_found());

        let conflict = DockerError::Api(bollard::errors::Error::DockerResponseServerError {
            status_code: 409,
            message: "removal already in progress".into(),
        });
        assert!(!conflict.is_not_found());
        assert!(!DockerError::backend("boom").is_not_found());
    }

    #[test]
    fn test_error_messages_name_the_stage() {
        let err = DockerError::BackendUnavailable {
            message: "socket not found".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to initialize pooled docker connection: socket not found"
        );
    }
}
