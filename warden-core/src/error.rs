use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),
}

/// Failures talking to the remote tenant-config endpoint.
///
/// These never block a login or password change outright: the policy cache
/// degrades them to "no policy known" and every rule family treats that as
/// disabled.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Policy endpoint unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed policy document: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Record not found")]
    NotFound,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid user ID: {0}")]
    InvalidUserId(String),
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Email transport error: {0}")]
    Transport(String),

    #[error("Template error: {0}")]
    Template(String),
}

impl Error {
    pub fn is_policy_error(&self) -> bool {
        matches!(self, Error::Policy(_))
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_notification_error(&self) -> bool {
        matches!(self, Error::Notification(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let policy_error = Error::Policy(PolicyError::Unavailable("timeout".to_string()));
        assert_eq!(
            policy_error.to_string(),
            "Policy error: Policy endpoint unavailable: timeout"
        );

        let storage_error = Error::Storage(StorageError::NotFound);
        assert_eq!(storage_error.to_string(), "Storage error: Record not found");

        let validation_error =
            Error::Validation(ValidationError::InvalidPassword("too short".to_string()));
        assert_eq!(
            validation_error.to_string(),
            "Validation error: Invalid password: too short"
        );
    }

    #[test]
    fn test_error_from_conversions() {
        let error: Error = PolicyError::Unavailable("503".to_string()).into();
        assert!(matches!(error, Error::Policy(PolicyError::Unavailable(_))));

        let error: Error = StorageError::Database("locked".to_string()).into();
        assert!(matches!(error, Error::Storage(StorageError::Database(_))));
    }

    #[test]
    fn test_error_category_helpers() {
        assert!(Error::Policy(PolicyError::Unavailable("x".into())).is_policy_error());
        assert!(Error::Storage(StorageError::NotFound).is_storage_error());
        assert!(
            Error::Validation(ValidationError::MissingField("password".into()))
                .is_validation_error()
        );
        assert!(
            Error::Notification(NotificationError::Transport("smtp".into()))
                .is_notification_error()
        );
        assert!(!Error::Storage(StorageError::NotFound).is_policy_error());
    }
}
