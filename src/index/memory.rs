//! In-memory index module
//!
//! Built once at startup, either by scanning a directory tree or from a TOML
//! manifest, and never modified while requests are served.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{Index, IndexError};

/// Ordered key to path table with O(1) lookup
#[derive(Debug, Default, Clone)]
pub struct MemoryIndex {
    entries: Vec<(String, PathBuf)>,
    positions: HashMap<String, usize>,
}

/// Options for building an index from a directory tree
#[derive(Debug, Clone, Default)]
pub struct DirectoryScan {
    /// Descend into subdirectories
    pub recursive: bool,
    /// Lowercase extensions to include; empty includes every file
    pub extensions: Vec<String>,
}

/// On-disk index manifest
///
/// ```toml
/// root = "/srv/corpus"          # optional, defaults to the manifest's directory
///
/// [[document]]
/// key = "doc-1"
/// path = "texts/doc-1.txt"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default, rename = "document")]
    pub documents: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    pub key: String,
    pub path: PathBuf,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, rejecting keys that are already present
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Result<(), IndexError> {
        let key = key.into();
        if self.positions.contains_key(&key) {
            return Err(IndexError::DuplicateKey(key));
        }
        self.positions.insert(key.clone(), self.entries.len());
        self.entries.push((key, path.into()));
        Ok(())
    }

    /// Build from `(key, path)` pairs, keeping their order
    pub fn from_entries<I, K, P>(entries: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<PathBuf>,
    {
        let mut index = Self::new();
        for (key, path) in entries {
            index.insert(key, path)?;
        }
        Ok(index)
    }

    /// Index every file under `root`
    ///
    /// A file's key is its path relative to `root` with the extension removed
    /// and `/` as separator, so `root/news/a1.txt` gets the key `news/a1`.
    /// Hidden files and directories are skipped. Keys are ordered by path.
    pub fn from_directory(root: &Path, scan: &DirectoryScan) -> Result<Self, IndexError> {
        if !root.is_dir() {
            return Err(IndexError::MissingRoot(root.to_path_buf()));
        }

        let mut files = Vec::new();
        collect_files(root, scan, &mut files)?;

        let mut index = Self::new();
        for path in files {
            let key = key_for(root, &path);
            index.insert(key, path)?;
        }
        Ok(index)
    }

    /// Load an index from a TOML manifest file
    pub fn from_manifest(path: &Path) -> Result<Self, IndexError> {
        let text = fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: Manifest = toml::from_str(&text)?;

        let base = manifest.root.clone().unwrap_or_else(|| {
            path.parent()
                .map(Path::to_path_buf)
                .unwrap_or_default()
        });
        Self::from_entries(
            manifest
                .documents
                .into_iter()
                .map(|entry| (entry.key, base.join(entry.path))),
        )
    }
}

impl Index for MemoryIndex {
    fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(key, _)| key.clone()).collect()
    }

    fn get(&self, key: &str) -> Option<PathBuf> {
        self.positions
            .get(key)
            .map(|&pos| self.entries[pos].1.clone())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

fn collect_files(
    dir: &Path,
    scan: &DirectoryScan,
    out: &mut Vec<PathBuf>,
) -> Result<(), IndexError> {
    let io_err = |source| IndexError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(dir)
        .map_err(io_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if path.is_dir() {
            if scan.recursive {
                collect_files(&path, scan, out)?;
            }
        } else if accepts(scan, &path) {
            out.push(path);
        }
    }
    Ok(())
}

fn accepts(scan: &DirectoryScan, path: &Path) -> bool {
    if scan.extensions.is_empty() {
        return true;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            scan.extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}

fn key_for(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path).with_extension("");
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, rel).unwrap();
    }

    #[test]
    fn test_insert_preserves_order_and_rejects_duplicates() {
        let mut index = MemoryIndex::new();
        index.insert("b", "/data/b.txt").unwrap();
        index.insert("a", "/data/a.txt").unwrap();
        assert_eq!(index.keys(), vec!["b", "a"]);
        assert_eq!(index.get("a"), Some(PathBuf::from("/data/a.txt")));
        assert_eq!(index.get("c"), None);
        assert!(matches!(
            index.insert("a", "/other"),
            Err(IndexError::DuplicateKey(k)) if k == "a"
        ));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_from_directory_flat() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.txt");
        touch(dir.path(), "a.json");
        touch(dir.path(), ".hidden.txt");
        touch(dir.path(), "sub/c.xml");

        let index = MemoryIndex::from_directory(dir.path(), &DirectoryScan::default()).unwrap();
        assert_eq!(index.keys(), vec!["a", "b"]);
        assert_eq!(index.get("a"), Some(dir.path().join("a.json")));
    }

    #[test]
    fn test_from_directory_recursive_with_filter() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.txt");
        touch(dir.path(), "skip.bin");
        touch(dir.path(), "news/b.XML");
        touch(dir.path(), "news/deep/c.txt");

        let scan = DirectoryScan {
            recursive: true,
            extensions: vec!["txt".to_string(), ".xml".to_string()],
        };
        let index = MemoryIndex::from_directory(dir.path(), &scan).unwrap();
        assert_eq!(index.keys(), vec!["a", "news/b", "news/deep/c"]);
    }

    #[test]
    fn test_from_directory_duplicate_stem() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.txt");
        touch(dir.path(), "a.xml");

        let err = MemoryIndex::from_directory(dir.path(), &DirectoryScan::default()).unwrap_err();
        assert!(matches!(err, IndexError::DuplicateKey(k) if k == "a"));
    }

    #[test]
    fn test_from_directory_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            MemoryIndex::from_directory(&missing, &DirectoryScan::default()),
            Err(IndexError::MissingRoot(_))
        ));
    }

    #[test]
    fn test_from_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("index.toml");
        fs::write(
            &manifest,
            r#"
[[document]]
key = "second"
path = "texts/2.txt"

[[document]]
key = "first"
path = "/abs/1.xml"
"#,
        )
        .unwrap();

        let index = MemoryIndex::from_manifest(&manifest).unwrap();
        assert_eq!(index.keys(), vec!["second", "first"]);
        assert_eq!(index.get("second"), Some(dir.path().join("texts/2.txt")));
        assert_eq!(index.get("first"), Some(PathBuf::from("/abs/1.xml")));
    }

    #[test]
    fn test_from_manifest_with_root() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("index.toml");
        fs::write(
            &manifest,
            "root = \"/srv/corpus\"\n[[document]]\nkey = \"k\"\npath = \"k.txt\"\n",
        )
        .unwrap();

        let index = MemoryIndex::from_manifest(&manifest).unwrap();
        assert_eq!(index.get("k"), Some(PathBuf::from("/srv/corpus/k.txt")));
    }

    #[test]
    fn test_from_manifest_errors() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("index.toml");

        assert!(matches!(
            MemoryIndex::from_manifest(&manifest),
            Err(IndexError::Io { .. })
        ));

        fs::write(&manifest, "[[document]]\nkey = 1\n").unwrap();
        assert!(matches!(
            MemoryIndex::from_manifest(&manifest),
            Err(IndexError::Manifest(_))
        ));
    }
}
