use thiserror::Error;

/// Failures observed by the synchronization layer.
///
/// Values are stored in the layer's error slot and rendered for the user;
/// they carry the already formatted cause instead of the transport error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("failed to load orders: {0}")]
    Fetch(String),
    #[error("failed to {action} order {id}: {message}")]
    Mutation {
        action: &'static str,
        id: String,
        message: String,
    },
    #[error("failed to remove stored object {bucket}/{path}: {message}")]
    StorageCleanup {
        bucket: String,
        path: String,
        message: String,
    },
}

impl SyncError {
    pub fn fetch(err: &anyhow::Error) -> Self {
        SyncError::Fetch(format!("{err:#}"))
    }

    pub fn mutation(action: &'static str, id: &str, err: &anyhow::Error) -> Self {
        SyncError::Mutation {
            action,
            id: id.to_string(),
            message: format!("{err:#}"),
        }
    }

    /// Blocking errors replace the whole dashboard; the rest are reported
    /// next to the action that caused them.
    pub fn is_blocking(&self) -> bool {
        matches!(self, SyncError::Fetch(_))
    }
}
