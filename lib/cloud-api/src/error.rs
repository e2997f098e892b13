use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Cloud API Error: inner error occurred.\nSource: {src}\nError: {err}")]
    Inner { src: String, err: String },

    #[error("Cloud API Error: some error occurred.\nSource: {src}\nError: {err}")]
    Generic { src: String, err: String },

    #[error("Cloud API Error: request to {src} failed with status {status}.\nBody: {body}")]
    Status {
        src: String,
        status: u16,
        body: String,
    },

    #[error(
        "Cloud API Error: checksum mismatch downloading {id}.\nAlgorithm: {algorithm}\nExpected: {expected}\nActual: {actual}"
    )]
    ChecksumMismatch {
        id: String,
        algorithm: String,
        expected: String,
        actual: String,
    },

    #[error("Cloud API Error: delta feed ended without a delta or next link")]
    DeltaFeedTruncated,
}

pub fn inerr<S: ToString>(src: S) -> impl Fn(reqwest::Error) -> CloudError {
    move |err| CloudError::Inner {
        src: src.to_string(),
        err: err.to_string(),
    }
}

pub fn generr<S: ToString, T: ToString>(src: S, err: T) -> CloudError {
    CloudError::Generic {
        src: src.to_string(),
        err: err.to_string(),
    }
}
