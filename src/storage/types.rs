use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another instance of the application has locked the database
    #[error("Another instance of newsdigest appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Map lock-related sqlx errors to `InstanceLocked`.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return DatabaseError::InstanceLocked;
        }
        DatabaseError::Other(err)
    }
}

/// SQLITE_BUSY, SQLITE_LOCKED and SQLITE_CANTOPEN all surface as one of these.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
        || message.contains("unable to open database file")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_messages_detected() {
        assert!(is_lock_message("error returned from database: database is locked"));
        assert!(is_lock_message("(code: 14) unable to open database file"));
        assert!(!is_lock_message("no such table: local_store"));
    }

    #[test]
    fn test_instance_locked_message_names_app() {
        let msg = DatabaseError::InstanceLocked.to_string();
        assert!(msg.contains("newsdigest"));
    }
}
