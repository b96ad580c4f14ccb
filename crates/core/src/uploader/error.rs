use thiserror::Error;

/// Errors from the resumable storage upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload initiation rejected with status {status}")]
    InitiateRejected { status: u16 },

    #[error("Upload initiation response carried no session URL")]
    MissingSessionUrl,

    #[error("Body upload rejected with status {status}")]
    UploadRejected { status: u16 },

    #[error("Download token fetch rejected with status {status}")]
    TokenFetchRejected { status: u16 },

    #[error("Object metadata carried no download token")]
    MissingDownloadToken,

    #[error("HTTP error during upload: {0}")]
    Http(#[from] reqwest::Error),
}

impl UploadError {
    /// Whether the queue should retry the item later.
    ///
    /// Server-side rejections in the 4xx range are permanent for this
    /// payload; everything else is assumed transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            UploadError::InitiateRejected { status }
            | UploadError::UploadRejected { status }
            | UploadError::TokenFetchRejected { status } => !(400..500).contains(status),
            UploadError::MissingSessionUrl | UploadError::MissingDownloadToken => false,
            UploadError::Http(_) => true,
        }
    }
}

/// Errors from post creation on a backend node.
#[derive(Debug, Error)]
pub enum PostError {
    /// The node rejected the bearer token. Handled by one forced
    /// refresh; a second rejection drops the item.
    #[error("Post creation rejected the bearer token")]
    Unauthorized,

    #[error("Post creation rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("HTTP error creating post: {0}")]
    Http(#[from] reqwest::Error),
}

impl PostError {
    pub fn is_retryable(&self) -> bool {
        match self {
            PostError::Unauthorized => false,
            PostError::Rejected { status, .. } => !(400..500).contains(status),
            PostError::Http(_) => true,
        }
    }
}
