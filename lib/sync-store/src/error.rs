use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Persisted State Error: inner error occurred.\nSource: {src}\nError: {err}")]
    Inner { src: String, err: String },

    #[error("Persisted State Error: missing config key {key:?}")]
    MissingConfig { key: String },

    #[error("Persisted State Error: cannot persist non-cloud file {id}")]
    NonCloudFile { id: String },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub fn inerr<S: ToString>(src: S) -> impl Fn(rusqlite::Error) -> StoreError {
    move |err| StoreError::Inner {
        src: src.to_string(),
        err: err.to_string(),
    }
}
