use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ProcError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("process table unavailable: {0}")]
    Unavailable(String),
    #[error("serialization error: {0}")]
    Serialization(#[source] io::Error),
}

impl ProcError {
    /// Classify a failure to list the process table itself.
    ///
    /// EACCES/EPERM mean the table exists but we may not read it; anything
    /// else means the facility could not be reached.
    pub fn from_list_error(what: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(format!("{what}: {err}")),
            _ => Self::Unavailable(format!("{what}: {err}")),
        }
    }
}
