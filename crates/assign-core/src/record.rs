/*
 * record.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * File records flowing through the transform.
 */

//! File records.
//!
//! A file record is the unit of work in a build pipeline: a path, a payload
//! and an open side-channel mapping that upstream stages use to pass data
//! along. The transform never depends on a concrete record type; it talks to
//! records through the [`FileRecord`] capability trait so that any pipeline
//! can plug its own file type in. [`File`] is the implementation shipped here.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use serde_json::{Map, Value};
use tokio::io::AsyncRead;

/// Side-channel data attached to a record.
pub type DataMap = Map<String, Value>;

/// A live byte stream payload.
pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

/// Error raised by a record that cannot produce a clone of itself.
pub type RecordError = Box<dyn std::error::Error + Send + Sync>;

/// Payload of a file record.
#[derive(Default)]
pub enum Contents {
    /// No payload (directories, files filtered upstream).
    #[default]
    Null,
    /// Materialized bytes.
    Buffer(Vec<u8>),
    /// Bytes still being produced.
    Stream(ByteStream),
}

impl Contents {
    /// Which kind of payload this is.
    pub fn kind(&self) -> ContentsKind {
        match self {
            Contents::Null => ContentsKind::Null,
            Contents::Buffer(_) => ContentsKind::Buffer,
            Contents::Stream(_) => ContentsKind::Stream,
        }
    }

    /// The bytes, if the payload is a buffer.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Contents::Buffer(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl fmt::Debug for Contents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contents::Null => write!(f, "Null"),
            Contents::Buffer(bytes) => write!(f, "Buffer({} bytes)", bytes.len()),
            Contents::Stream(_) => write!(f, "Stream"),
        }
    }
}

impl From<Vec<u8>> for Contents {
    fn from(bytes: Vec<u8>) -> Self {
        Contents::Buffer(bytes)
    }
}

impl From<&[u8]> for Contents {
    fn from(bytes: &[u8]) -> Self {
        Contents::Buffer(bytes.to_vec())
    }
}

impl From<&str> for Contents {
    fn from(text: &str) -> Self {
        Contents::Buffer(text.as_bytes().to_vec())
    }
}

impl From<String> for Contents {
    fn from(text: String) -> Self {
        Contents::Buffer(text.into_bytes())
    }
}

/// Type tag for [`Contents`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentsKind {
    Null,
    Buffer,
    Stream,
}

impl ContentsKind {
    /// Convert to a string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentsKind::Null => "null",
            ContentsKind::Buffer => "buffer",
            ContentsKind::Stream => "stream",
        }
    }
}

impl fmt::Display for ContentsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capabilities the transform needs from a file record.
///
/// Records are mutated in place and handed back, so implementations keep
/// their identity through the transform. `clone_without_contents` is allowed
/// to fail: a record that cannot describe itself is reported as a render
/// failure for its path rather than aborting the stage.
pub trait FileRecord: Send + fmt::Debug {
    /// Current path of the record.
    fn path(&self) -> &Path;

    /// Replace the record's path.
    fn set_path(&mut self, path: PathBuf);

    /// Which kind of payload the record carries.
    fn contents_kind(&self) -> ContentsKind;

    /// Payload bytes when the payload is a buffer.
    fn contents(&self) -> Option<&[u8]>;

    /// Replace the payload with a buffer.
    fn set_contents(&mut self, contents: Vec<u8>);

    /// Side-channel data, if any stage created it.
    fn data(&self) -> Option<&DataMap>;

    /// Side-channel data, created empty on first access.
    fn data_mut(&mut self) -> &mut DataMap;

    /// Copy path and side data into a fresh [`File`] whose payload is null.
    fn clone_without_contents(&self) -> Result<File, RecordError>;
}

/// In-memory file record.
#[derive(Debug, Default)]
pub struct File {
    path: PathBuf,
    history: Vec<PathBuf>,
    contents: Contents,
    data: Option<DataMap>,
}

impl File {
    /// Create a record at `path` with a null payload.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let history = if path.as_os_str().is_empty() {
            Vec::new()
        } else {
            vec![path.clone()]
        };
        Self {
            path,
            history,
            contents: Contents::Null,
            data: None,
        }
    }

    /// Set the payload.
    pub fn with_contents(mut self, contents: impl Into<Contents>) -> Self {
        self.contents = contents.into();
        self
    }

    /// Set the side-channel data.
    pub fn with_data(mut self, data: DataMap) -> Self {
        self.data = Some(data);
        self
    }

    /// Every path this record has had, oldest first.
    pub fn history(&self) -> &[PathBuf] {
        &self.history
    }

    /// Borrow the payload.
    pub fn payload(&self) -> &Contents {
        &self.contents
    }

    /// Take the payload, leaving null behind.
    pub fn take_contents(&mut self) -> Contents {
        std::mem::take(&mut self.contents)
    }

    /// Replace the payload with any kind of contents.
    pub fn set_payload(&mut self, contents: Contents) {
        self.contents = contents;
    }
}

impl FileRecord for File {
    fn path(&self) -> &Path {
        &self.path
    }

    fn set_path(&mut self, path: PathBuf) {
        if path != self.path {
            self.history.push(path.clone());
        }
        self.path = path;
    }

    fn contents_kind(&self) -> ContentsKind {
        self.contents.kind()
    }

    fn contents(&self) -> Option<&[u8]> {
        self.contents.as_bytes()
    }

    fn set_contents(&mut self, contents: Vec<u8>) {
        self.contents = Contents::Buffer(contents);
    }

    fn data(&self) -> Option<&DataMap> {
        self.data.as_ref()
    }

    fn data_mut(&mut self) -> &mut DataMap {
        self.data.get_or_insert_with(DataMap::new)
    }

    fn clone_without_contents(&self) -> Result<File, RecordError> {
        Ok(File {
            path: self.path.clone(),
            history: self.history.clone(),
            contents: Contents::Null,
            data: self.data.clone(),
        })
    }
}

/// Replace the extension of `path`, keeping its directory and stem.
///
/// `None` (or an empty extension) strips the extension. An empty path is
/// returned unchanged.
pub fn replace_extension(path: &Path, extension: Option<&OsStr>) -> PathBuf {
    if path.as_os_str().is_empty() {
        return PathBuf::new();
    }
    path.with_extension(extension.unwrap_or_default())
}

/// One item written to a stage.
///
/// Object-mode pipelines can carry arbitrary values, not only file records;
/// non-record values are rejected per item instead of at compile time.
#[derive(Debug)]
pub enum Chunk {
    /// A file record.
    File(Box<dyn FileRecord>),
    /// Any other value.
    Value(Value),
}

impl Chunk {
    /// Path associated with the chunk, if it has one.
    ///
    /// For non-record values this is the `path` field when it is a string.
    pub fn path(&self) -> Option<PathBuf> {
        match self {
            Chunk::File(file) => Some(file.path().to_path_buf()),
            Chunk::Value(value) => value.get("path").and_then(Value::as_str).map(PathBuf::from),
        }
    }
}

impl From<File> for Chunk {
    fn from(file: File) -> Self {
        Chunk::File(Box::new(file))
    }
}

impl From<Box<dyn FileRecord>> for Chunk {
    fn from(file: Box<dyn FileRecord>) -> Self {
        Chunk::File(file)
    }
}

impl From<Value> for Chunk {
    fn from(value: Value) -> Self {
        Chunk::Value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_file_has_null_contents() {
        let file = File::new("foo.html");
        assert_eq!(file.contents_kind(), ContentsKind::Null);
        assert!(file.contents().is_none());
        assert!(file.data().is_none());
        assert_eq!(file.history(), &[PathBuf::from("foo.html")]);
    }

    #[test]
    fn test_set_path_records_history() {
        let mut file = File::new("src/page.md");
        file.set_path(PathBuf::from("src/page.md"));
        file.set_path(PathBuf::from("src/page.html"));
        assert_eq!(
            file.history(),
            &[PathBuf::from("src/page.md"), PathBuf::from("src/page.html")]
        );
        assert_eq!(file.path(), Path::new("src/page.html"));
    }

    #[test]
    fn test_data_is_created_lazily() {
        let mut file = File::new("a.txt");
        assert!(file.data().is_none());
        file.data_mut().insert("title".into(), json!("Hello"));
        assert_eq!(file.data().unwrap()["title"], json!("Hello"));
    }

    #[test]
    fn test_clone_without_contents_drops_payload_only() {
        let mut data = DataMap::new();
        data.insert("title".into(), json!("Hello"));
        let file = File::new("bar.txt").with_contents("12345").with_data(data);

        let clone = file.clone_without_contents().unwrap();
        assert_eq!(clone.path(), Path::new("bar.txt"));
        assert_eq!(clone.contents_kind(), ContentsKind::Null);
        assert_eq!(clone.data(), file.data());
        assert_eq!(file.contents(), Some(&b"12345"[..]));
    }

    #[test]
    fn test_stream_contents_kind() {
        let stream: ByteStream = Box::pin(std::io::Cursor::new(b"streamed".to_vec()));
        let file = File::new("s.txt").with_contents(Contents::Stream(stream));
        assert_eq!(file.contents_kind(), ContentsKind::Stream);
        assert!(file.contents().is_none());
        assert_eq!(format!("{:?}", file.payload()), "Stream");
    }

    #[test]
    fn test_replace_extension() {
        let html = Some(OsStr::new("html"));
        assert_eq!(replace_extension(Path::new("bar.txt"), html), PathBuf::from("bar.html"));
        assert_eq!(
            replace_extension(Path::new("docs/a.b.md"), html),
            PathBuf::from("docs/a.b.html")
        );
        assert_eq!(replace_extension(Path::new("README"), html), PathBuf::from("README.html"));
        assert_eq!(replace_extension(Path::new("page.html"), None), PathBuf::from("page"));
        assert_eq!(replace_extension(Path::new(""), html), PathBuf::new());
    }

    #[test]
    fn test_chunk_path() {
        let chunk = Chunk::from(File::new("x.txt"));
        assert_eq!(chunk.path(), Some(PathBuf::from("x.txt")));

        let chunk = Chunk::from(json!({"path": "y.txt"}));
        assert_eq!(chunk.path(), Some(PathBuf::from("y.txt")));

        let chunk = Chunk::from(json!([1, 2, 3]));
        assert_eq!(chunk.path(), None);
    }
}
