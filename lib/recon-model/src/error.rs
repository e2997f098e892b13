use thiserror::Error;

use super::Id;

#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("Reconciliation Model Error: parent directory does not exist.\nId: {parent_id}")]
    NoSuchDirectory { parent_id: Id },

    #[error("Reconciliation Model Error: no such file.\nId: {id}")]
    NoSuchFile { id: Id },

    #[error("Reconciliation Model Error: name already in use under directory.\nDirectory: {parent_id}\nName: {name}")]
    NameInUse { parent_id: Id, name: String },

    #[error("Reconciliation Model Error: directory is not empty, cannot delete.\nId: {id}")]
    DirectoryNotEmpty { id: Id },

    #[error("Reconciliation Model Error: operation is illegal against current tree.\nOperation: {op}")]
    IllegalOperation { op: String },
}
