//! 設定ファイルテスト
//!
//! 読み込み・既定値・上書き・検証を検証

use pdf_renamer::config::AppConfig;
use pdf_renamer::error::RenamerError;
use pdf_renamer::extractor::ExtractedInfo;
use pdf_renamer::naming::FilenameBuilder;
use tempfile::tempdir;

/// 空のJSONはすべて既定値
#[test]
fn test_empty_json_uses_defaults() {
    let config = AppConfig::from_json("{}").unwrap();

    assert_eq!(config.dify.api_url, "https://api.dify.ai/v1/workflows/run");
    assert_eq!(config.dify.timeout_seconds, 120);
    assert!(config.dify.api_key.is_none());
    assert_eq!(config.naming_rules.pattern, "{date}_{issuer}_{document_type}");
    assert_eq!(config.naming_rules.date_format, "%Y%m%d");
    assert_eq!(config.naming_rules.max_filename_length, 255);
    assert_eq!(config.naming_rules.replacement_char, '_');
    assert_eq!(config.file_processing.max_file_size_mb, 15);
    assert_eq!(config.issuers.len(), 6);
    assert_eq!(config.document_types.len(), 12);
    assert!(config.validate().is_ok());
}

/// 語彙はファイルに書いた順で照合される
#[test]
fn test_vocabulary_keeps_file_order() {
    let json = r#"{
        "issuers": {
            "支払基金": "社会保険診療報酬支払基金",
            "基金": "その他",
            "その他": "その他"
        }
    }"#;
    let config = AppConfig::from_json(json).unwrap();

    let keys: Vec<&str> = config.issuers.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["支払基金", "基金", "その他"]);

    // 「支払基金」と「基金」の両方を含む → 先に書いた方
    let builder = FilenameBuilder::new(config.naming_rules.clone(), config.vocabulary());
    assert_eq!(builder.normalizer().normalize_issuer("東京支払基金"), "社会保険診療報酬支払基金");
}

/// 命名規則の一部だけ指定
#[test]
fn test_partial_naming_rules() {
    let json = r#"{"naming_rules": {"pattern": "{issuer}-{date}", "date_format": "%Y-%m-%d"}}"#;
    let config = AppConfig::from_json(json).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.naming_rules.max_filename_length, 255);

    let builder = FilenameBuilder::new(config.naming_rules.clone(), config.vocabulary());
    let info = ExtractedInfo {
        issuer: "厚生労働省".to_string(),
        date: "2024年5月3日".to_string(),
        ..Default::default()
    };
    assert_eq!(builder.generate_filename(&info, "a.pdf"), "厚生労働省-2024-05-03.pdf");
}

#[test]
fn test_validate_rejects_bad_rules() {
    let cases = [
        r#"{"naming_rules": {"pattern": ""}}"#,
        r#"{"naming_rules": {"pattern": "{date}_{title}"}}"#,
        r#"{"naming_rules": {"date_format": "%Q"}}"#,
        r#"{"naming_rules": {"date_format": "%Y%m%d%z"}}"#,
        r#"{"naming_rules": {"invalid_chars": [".", "/"]}}"#,
        r#"{"naming_rules": {"max_filename_length": 5}}"#,
        r#"{"naming_rules": {"replacement_char": "?"}}"#,
        r#"{"issuers": {}}"#,
        r#"{"file_processing": {"allowed_extensions": []}}"#,
        r#"{"file_processing": {"max_file_size_mb": 0}}"#,
    ];
    for json in cases {
        let config = AppConfig::from_json(json).unwrap();
        assert!(
            matches!(config.validate(), Err(RenamerError::Config(_))),
            "検証を通ってしまった: {}",
            json
        );
    }
}

/// 環境変数相当の上書き（空文字は無視）
#[test]
fn test_apply_overrides() {
    let mut config = AppConfig::default();
    config.apply_overrides(Some("app-123".to_string()), Some("http://localhost/v1/workflows/run".to_string()));
    assert_eq!(config.dify.api_key.as_deref(), Some("app-123"));
    assert_eq!(config.dify.api_url, "http://localhost/v1/workflows/run");

    config.apply_overrides(Some("  ".to_string()), None);
    assert_eq!(config.dify.api_key.as_deref(), Some("app-123"));
}

/// 保存して読み直すと同じ内容
#[test]
fn test_save_and_load_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("nested").join("config.json");

    let mut config = AppConfig::default();
    config.set_api_key("app-secret-key".to_string(), Some(&path)).unwrap();
    assert!(path.exists());

    let loaded = AppConfig::load_file(Some(&path)).unwrap();
    assert_eq!(loaded.dify.api_key.as_deref(), Some("app-secret-key"));
    assert_eq!(loaded.issuers, config.issuers);
    assert_eq!(loaded.naming_rules, config.naming_rules);
    assert_eq!(loaded.masked_api_key(), "app-se...");
}

#[test]
fn test_masked_api_key_unset() {
    assert_eq!(AppConfig::default().masked_api_key(), "未設定");
}

/// 検証に失敗する設定ファイルは読み込みエラー
#[test]
fn test_load_rejects_invalid_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"naming_rules": {"max_filename_length": 3}}"#).unwrap();

    assert!(matches!(AppConfig::load(Some(&path)), Err(RenamerError::Config(_))));
}

/// ログファイル指定（親フォルダを作って追記）
#[test]
fn test_logging_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let log_path = dir.path().join("logs").join("pdf-renamer.log");
    let json = serde_json::json!({"logging": {"level": "debug", "file": log_path}}).to_string();

    let config = AppConfig::from_json(&json).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.file.as_deref(), Some(log_path.as_path()));

    use std::io::Write;
    let mut file = config.logging.open_log_file().unwrap().expect("ログファイルが開かれていない");
    file.write_all(b"first\n").unwrap();
    drop(file);
    let mut file = config.logging.open_log_file().unwrap().unwrap();
    file.write_all(b"second\n").unwrap();
    drop(file);

    assert_eq!(std::fs::read_to_string(&log_path).unwrap(), "first\nsecond\n");
}

#[test]
fn test_logging_file_unset() {
    let config = AppConfig::default();
    assert!(config.logging.file.is_none());
    assert!(config.logging.open_log_file().unwrap().is_none());
}
