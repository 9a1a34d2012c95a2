//! リネーム済みファイルの保存先
//!
//! 同名ファイルがあれば `_01`, `_02`, ... を付けて空いている名前を探し、
//! 排他作成で書き込む。名前探しと書き込みはディレクトリ単位のロックで
//! 一つの操作にまとめ、既存ファイルを上書きしない。

use crate::error::{RenamerError, Result};
use crate::naming::numbered_filename;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// 連番の上限
const MAX_COUNTER: u32 = 9_999;

/// 保存済みファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub size: u64,
}

#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    max_filename_length: usize,
    lock: Mutex<()>,
}

impl FileStore {
    /// 出力フォルダを作成して開く
    pub fn open(root: impl Into<PathBuf>, max_filename_length: usize) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| RenamerError::storage(&root, e))?;
        Ok(Self {
            root,
            max_filename_length,
            lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.path_of(name)?.exists())
    }

    /// 空いている名前を決めて書き込む。実際に使った名前のパスを返す
    pub fn store(&self, desired: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.validate_name(desired)?;
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut counter = 0;
        loop {
            let name = if counter == 0 {
                desired.to_string()
            } else {
                numbered_filename(desired, counter, self.max_filename_length)
            };
            let path = self.root.join(&name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    if let Err(e) = file.write_all(bytes).and_then(|_| file.sync_all()) {
                        drop(file);
                        let _ = std::fs::remove_file(&path);
                        return Err(RenamerError::storage(&path, e));
                    }
                    tracing::info!("保存完了: {}", path.display());
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!("同名ファイルあり: {}", name);
                    counter += 1;
                    if counter > MAX_COUNTER {
                        return Err(RenamerError::storage(&path, e));
                    }
                }
                Err(e) => return Err(RenamerError::storage(&path, e)),
            }
        }
    }

    /// 元ファイルをコピーして保存
    pub fn store_copy(&self, desired: &str, source: &Path) -> Result<PathBuf> {
        let bytes = std::fs::read(source).map_err(|e| RenamerError::storage(source, e))?;
        self.store(desired, &bytes)
    }

    /// 保存済みファイルの一覧（名前順）
    pub fn list(&self) -> Result<Vec<StoredFile>> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| RenamerError::storage(&self.root, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RenamerError::storage(&self.root, e))?;
            let meta = entry.metadata().map_err(|e| RenamerError::storage(entry.path(), e))?;
            if !meta.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            files.push(StoredFile { name, size: meta.len() });
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    /// ファイル内容を取得（ダウンロード）
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_of(name)?;
        if !path.is_file() {
            return Err(RenamerError::FileNotFound(name.to_string()));
        }
        std::fs::read(&path).map_err(|e| RenamerError::storage(&path, e))
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_of(name)?;
        if !path.is_file() {
            return Err(RenamerError::FileNotFound(name.to_string()));
        }
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        std::fs::remove_file(&path).map_err(|e| RenamerError::storage(&path, e))?;
        tracing::info!("削除完了: {}", path.display());
        Ok(())
    }

    fn path_of(&self, name: &str) -> Result<PathBuf> {
        self.validate_name(name)?;
        Ok(self.root.join(name))
    }

    /// 出力フォルダの外を指す名前は拒否
    fn validate_name(&self, name: &str) -> Result<()> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
            || name.contains('\0')
        {
            return Err(RenamerError::InvalidStoredName(name.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_directory() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("nested").join("output");
        let store = FileStore::open(&root, 255).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root.as_path());
    }

    #[test]
    fn test_store_and_read() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path(), 255).unwrap();
        let path = store.store("a.pdf", b"hello").unwrap();
        assert_eq!(path, dir.path().join("a.pdf"));
        assert_eq!(store.read("a.pdf").unwrap(), b"hello");
        assert!(store.exists("a.pdf").unwrap());
    }

    #[test]
    fn test_store_collision_suffixes() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path(), 255).unwrap();
        let first = store.store("x.pdf", b"1").unwrap();
        let second = store.store("x.pdf", b"2").unwrap();
        let third = store.store("x.pdf", b"3").unwrap();
        assert_eq!(first.file_name().unwrap(), "x.pdf");
        assert_eq!(second.file_name().unwrap(), "x_01.pdf");
        assert_eq!(third.file_name().unwrap(), "x_02.pdf");
        assert_eq!(store.read("x.pdf").unwrap(), b"1");
    }

    #[test]
    fn test_rejects_path_traversal() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path(), 255).unwrap();
        for name in ["../evil.pdf", "a/b.pdf", "a\\b.pdf", "..", ""] {
            assert!(matches!(
                store.store(name, b"x"),
                Err(RenamerError::InvalidStoredName(_))
            ));
        }
    }

    #[test]
    fn test_list_skips_hidden_and_directories() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path(), 255).unwrap();
        store.store("b.pdf", b"bb").unwrap();
        store.store("a.pdf", b"a").unwrap();
        std::fs::write(dir.path().join(".extraction-cache.json"), "{}").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let files = store.list().unwrap();
        assert_eq!(
            files,
            vec![
                StoredFile { name: "a.pdf".into(), size: 1 },
                StoredFile { name: "b.pdf".into(), size: 2 },
            ]
        );
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path(), 255).unwrap();
        store.store("a.pdf", b"a").unwrap();
        store.delete("a.pdf").unwrap();
        assert!(!store.exists("a.pdf").unwrap());
        assert!(matches!(store.delete("a.pdf"), Err(RenamerError::FileNotFound(_))));
    }
}
