use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocalFsError {
    #[error("Local Filesystem Error: inner error occurred.\nSource: {src}\nError: {err}")]
    Inner { src: String, err: String },

    #[error("Local Filesystem Error: some error occurred.\nSource: {src}\nError: {err}")]
    Generic { src: String, err: String },

    #[error("Local Filesystem Error: path is not valid UTF-8.\nPath: {path:?}")]
    NonUtf8Path { path: PathBuf },

    #[error("Local Filesystem Error: id {id} is claimed by multiple local entries but is known to neither the saved nor the cloud tree.\nId: {id}")]
    UnknownId { id: String },
}

pub fn inerr<S: ToString, E: std::error::Error>(src: S) -> impl Fn(E) -> LocalFsError {
    move |err: E| LocalFsError::Inner {
        src: src.to_string(),
        err: err.to_string(),
    }
}

pub fn generr<S: ToString, T: ToString>(src: S, err: T) -> LocalFsError {
    LocalFsError::Generic {
        src: src.to_string(),
        err: err.to_string(),
    }
}

pub fn error_context<S: ToString>(context: S) -> impl Fn(&str) -> String {
    move |failure: &str| format!("{}\nFailed to {}", context.to_string(), failure)
}
