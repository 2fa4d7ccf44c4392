//! Document references.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::storage::join_path;

/// A class label, e.g. `"USA"`.
pub type ClassLabel = String;

/// Identifies one document of the corpus: its class directory and file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentRef {
    /// The class (directory) the document belongs to.
    pub class: ClassLabel,
    /// The file name inside the class directory.
    pub name: String,
}

impl DocumentRef {
    /// Create a new document reference.
    pub fn new(class: impl Into<ClassLabel>, name: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
        }
    }

    /// Storage path of the document below the dataset root.
    pub fn path(&self, dataset_root: &str) -> String {
        join_path(&join_path(dataset_root, &self.class), &self.name)
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.class, self.name)
    }
}
