//! Note documents and document discovery.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// File extensions treated as markdown notes.
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown", "mdown", "mkd", "mkdn"];

/// Content type of a note, derived from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    Text,
    Other,
}

impl ContentType {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match ext.as_deref() {
            Some(ext) if MARKDOWN_EXTENSIONS.contains(&ext) => ContentType::Markdown,
            Some("txt") | Some("text") => ContentType::Text,
            _ => ContentType::Other,
        }
    }

    pub fn is_markdown(&self) -> bool {
        matches!(self, ContentType::Markdown)
    }
}

/// A note file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
    content_type: ContentType,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let content_type = ContentType::from_path(&path);
        Self { path, content_type }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// File name without extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string())
    }

    pub fn read(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }
}

/// Collect markdown documents under `root`, sorted by path.
///
/// Hidden files and directories (names starting with `.`) are skipped.
/// With `recursive` false only direct children are returned.
pub fn collect_documents(root: &Path, recursive: bool) -> Vec<Document> {
    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut documents: Vec<Document> = WalkDir::new(root)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| Document::new(entry.into_path()))
        .filter(|document| document.content_type().is_markdown())
        .collect();

    documents.sort_by(|a, b| a.path().cmp(b.path()));
    documents
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(ContentType::from_path(Path::new("a.md")), ContentType::Markdown);
        assert_eq!(ContentType::from_path(Path::new("a.MKDN")), ContentType::Markdown);
        assert_eq!(ContentType::from_path(Path::new("a.txt")), ContentType::Text);
        assert_eq!(ContentType::from_path(Path::new("a.png")), ContentType::Other);
        assert_eq!(ContentType::from_path(Path::new("README")), ContentType::Other);
    }

    #[test]
    fn test_document_accessors() {
        let doc = Document::new("/notes/daily/today.md");
        assert_eq!(doc.stem(), "today");
        assert_eq!(doc.path(), Path::new("/notes/daily/today.md"));
        assert!(doc.content_type().is_markdown());
    }

    #[test]
    fn test_collect_documents_respects_recursion() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::create_dir_all(dir.path().join(".hidden")).unwrap();
        fs::write(dir.path().join("a.md"), "# A").unwrap();
        fs::write(dir.path().join("notes.txt"), "plain").unwrap();
        fs::write(dir.path().join("sub/b.markdown"), "# B").unwrap();
        fs::write(dir.path().join(".hidden/c.md"), "# C").unwrap();

        let flat = collect_documents(dir.path(), false);
        assert_eq!(flat.len(), 1);
        assert!(flat[0].path().ends_with("a.md"));

        let deep = collect_documents(dir.path(), true);
        let names: Vec<String> = deep.iter().map(Document::stem).collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }
}
