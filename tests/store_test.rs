//! 保存先テスト
//!
//! 同名回避と上書き禁止を検証

use pdf_renamer::error::RenamerError;
use pdf_renamer::store::FileStore;
use std::collections::HashSet;
use tempfile::tempdir;

/// 同じ名前を続けて保存すると連番だけが違う名前になる
#[test]
fn test_same_name_gets_counter_suffix() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = FileStore::open(dir.path(), 255).unwrap();

    let name = "20241201_社会保険診療報酬支払基金_診療報酬明細書.pdf";
    let paths: Vec<_> = (0..4).map(|i| store.store(name, format!("{}", i).as_bytes()).unwrap()).collect();
    let names: Vec<String> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(
        names,
        vec![
            "20241201_社会保険診療報酬支払基金_診療報酬明細書.pdf",
            "20241201_社会保険診療報酬支払基金_診療報酬明細書_01.pdf",
            "20241201_社会保険診療報酬支払基金_診療報酬明細書_02.pdf",
            "20241201_社会保険診療報酬支払基金_診療報酬明細書_03.pdf",
        ]
    );
    for (i, path) in paths.iter().enumerate() {
        assert_eq!(std::fs::read(path).unwrap(), format!("{}", i).as_bytes());
    }
}

/// 既存ファイルは上書きしない
#[test]
fn test_existing_file_is_not_overwritten() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("report.pdf"), b"original").unwrap();
    std::fs::write(dir.path().join("report_01.pdf"), b"original-01").unwrap();

    let store = FileStore::open(dir.path(), 255).unwrap();
    let path = store.store("report.pdf", b"new").unwrap();

    assert_eq!(path.file_name().unwrap(), "report_02.pdf");
    assert_eq!(std::fs::read(dir.path().join("report.pdf")).unwrap(), b"original");
    assert_eq!(std::fs::read(dir.path().join("report_01.pdf")).unwrap(), b"original-01");
}

/// 複数スレッドから同じ名前で保存しても衝突しない
#[test]
fn test_concurrent_store_same_name() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = FileStore::open(dir.path(), 255).unwrap();

    let paths: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = &store;
                s.spawn(move || store.store("same.pdf", format!("writer-{}", i).as_bytes()).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let unique: HashSet<_> = paths.iter().collect();
    assert_eq!(unique.len(), 8);
    assert_eq!(store.list().unwrap().len(), 8);

    let mut contents: Vec<String> = paths
        .iter()
        .map(|p| String::from_utf8(std::fs::read(p).unwrap()).unwrap())
        .collect();
    contents.sort();
    let mut expected: Vec<String> = (0..8).map(|i| format!("writer-{}", i)).collect();
    expected.sort();
    assert_eq!(contents, expected);
}

/// 連番付きでも最大長に収める
#[test]
fn test_numbered_name_respects_max_length() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = FileStore::open(dir.path(), 20).unwrap();

    let name = "abcdefghijklmnop.pdf";
    assert_eq!(name.chars().count(), 20);
    store.store(name, b"1").unwrap();
    let second = store.store(name, b"2").unwrap();

    let second_name = second.file_name().unwrap().to_string_lossy().to_string();
    assert_eq!(second_name, "abcdefghij..._01.pdf");
    assert_eq!(second_name.chars().count(), 20);
}

/// 元ファイルをコピーして保存、元ファイルは残る
#[test]
fn test_store_copy() {
    let src_dir = tempdir().expect("Failed to create temp dir");
    let out_dir = tempdir().expect("Failed to create temp dir");
    let source = src_dir.path().join("scan.pdf");
    std::fs::write(&source, b"%PDF-1.4").unwrap();

    let store = FileStore::open(out_dir.path(), 255).unwrap();
    let path = store.store_copy("renamed.pdf", &source).unwrap();

    assert_eq!(path, out_dir.path().join("renamed.pdf"));
    assert_eq!(store.read("renamed.pdf").unwrap(), b"%PDF-1.4");
    assert!(source.exists());
}

/// 存在しない元ファイルはストレージエラー
#[test]
fn test_store_copy_missing_source() {
    let out_dir = tempdir().expect("Failed to create temp dir");
    let store = FileStore::open(out_dir.path(), 255).unwrap();

    let result = store.store_copy("renamed.pdf", &out_dir.path().join("missing.pdf"));
    assert!(matches!(result, Err(RenamerError::Storage { .. })));
    assert!(store.list().unwrap().is_empty());
}

/// 出力フォルダ外へのアクセスは拒否
#[test]
fn test_read_outside_root_rejected() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = FileStore::open(dir.path().join("out"), 255).unwrap();
    std::fs::write(dir.path().join("secret.pdf"), b"secret").unwrap();

    assert!(matches!(store.read("../secret.pdf"), Err(RenamerError::InvalidStoredName(_))));
    assert!(matches!(store.delete("../secret.pdf"), Err(RenamerError::InvalidStoredName(_))));
    assert!(dir.path().join("secret.pdf").exists());
}
