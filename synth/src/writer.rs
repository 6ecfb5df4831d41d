//! The file-output collaborator.
//!
//! Generation never touches the file system. Finished artifacts are handed to
//! a [`Writer`], which decides how (and whether atomically) they land.
//! [`MemoryWriter`] stages them in memory.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Errors raised while staging output.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("file already staged: {0}")]
    DuplicatePath(String),

    #[error("failed to serialize project model: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Kind of staged content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    SourceFileCsharp,
    SourceFileJson,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SourceFileCsharp => "source-file-csharp",
            Self::SourceFileJson => "source-file-json",
        }
    }
}

/// Receives finished text artifacts.
pub trait Writer {
    fn write_file(
        &mut self,
        path: &str,
        content: &str,
        source_map: Option<&str>,
        content_type: ContentType,
    ) -> Result<(), WriteError>;
}

/// One staged artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub content: String,
    pub source_map: Option<String>,
    pub content_type: ContentType,
}

/// In-memory writer keyed by path, iterated in path order.
///
/// Staging the same path twice is an error.
///
/// # Examples
///
/// ```
/// use cmdlet_synth::{ContentType, MemoryWriter, Writer};
///
/// let mut writer = MemoryWriter::new();
/// writer.write_file("./Contoso.csproj", "<Project />", None, ContentType::SourceFileCsharp).unwrap();
///
/// assert_eq!(writer.get("./Contoso.csproj").unwrap().content, "<Project />");
/// assert!(writer.write_file("./Contoso.csproj", "", None, ContentType::SourceFileCsharp).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    files: BTreeMap<String, StagedFile>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&StagedFile> {
        self.files.get(path)
    }

    /// Staged paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn into_files(self) -> BTreeMap<String, StagedFile> {
        self.files
    }
}

impl Writer for MemoryWriter {
    fn write_file(
        &mut self,
        path: &str,
        content: &str,
        source_map: Option<&str>,
        content_type: ContentType,
    ) -> Result<(), WriteError> {
        if self.files.contains_key(path) {
            return Err(WriteError::DuplicatePath(path.to_string()));
        }
        self.files.insert(
            path.to_string(),
            StagedFile {
                content: content.to_string(),
                source_map: source_map.map(String::from),
                content_type,
            },
        );
        Ok(())
    }
}
