//! ファイル名生成モジュール
//!
//! 正規化済みの発行機関・書類種別・日付を命名パターンに当てはめ、
//! 禁止文字の置換と長さ制限をかけたファイル名を作る。
//! 同名ファイルの回避は保存時に [`crate::store::FileStore`] が行う。

pub mod sanitize;

use crate::error::{RenamerError, Result};
use crate::extractor::ExtractedInfo;
use crate::normalizer::date::{is_valid_format, DEFAULT_DATE_FORMAT};
use crate::normalizer::{CanonicalVocabulary, DateFormatter, Normalizer};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use sanitize::{numbered_filename, sanitize, split_extension, truncate_to_length};

/// 使えるプレースホルダ
pub const PLACEHOLDERS: &[&str] = &["issuer", "document_type", "date"];

/// 最大長の下限（連番と拡張子が収まる長さ）
pub const MIN_FILENAME_LENGTH: usize = 16;

/// 命名規則
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingRules {
    /// 例: `{date}_{issuer}_{document_type}`
    pub pattern: String,
    /// strftime形式
    pub date_format: String,
    /// 文字数
    pub max_filename_length: usize,
    pub invalid_chars: Vec<char>,
    pub replacement_char: char,
}

impl Default for NamingRules {
    fn default() -> Self {
        Self {
            pattern: "{date}_{issuer}_{document_type}".into(),
            date_format: DEFAULT_DATE_FORMAT.into(),
            max_filename_length: 255,
            invalid_chars: vec!['<', '>', ':', '"', '/', '\\', '|', '?', '*'],
            replacement_char: '_',
        }
    }
}

impl NamingRules {
    pub fn validate(&self) -> Result<()> {
        lazy_static::lazy_static! {
            static ref PLACEHOLDER_RE: Regex = Regex::new(r"\{([^{}]*)\}").unwrap();
        }

        if self.pattern.trim().is_empty() {
            return Err(RenamerError::Config("命名パターンが空です".into()));
        }
        for cap in PLACEHOLDER_RE.captures_iter(&self.pattern) {
            if !PLACEHOLDERS.contains(&&cap[1]) {
                return Err(RenamerError::Config(format!(
                    "命名パターンに未知のプレースホルダがあります: {{{}}}",
                    &cap[1]
                )));
            }
        }
        if !is_valid_format(&self.date_format) {
            return Err(RenamerError::Config(format!(
                "日付形式が不正です: {}",
                self.date_format
            )));
        }
        if self.max_filename_length < MIN_FILENAME_LENGTH {
            return Err(RenamerError::Config(format!(
                "max_filename_length は {} 以上にしてください: {}",
                MIN_FILENAME_LENGTH, self.max_filename_length
            )));
        }
        // 拡張子の区切りと切り詰めの `...` に使う
        if self.invalid_chars.contains(&'.') {
            return Err(RenamerError::Config("invalid_chars に '.' は指定できません".into()));
        }
        if self.invalid_chars.contains(&self.replacement_char)
            || matches!(self.replacement_char, '/' | '\\')
        {
            return Err(RenamerError::Config(format!(
                "置換文字に禁止文字は使えません: {:?}",
                self.replacement_char
            )));
        }
        Ok(())
    }

    /// 禁止文字の置換のみ
    pub fn sanitize(&self, filename: &str) -> String {
        sanitize(filename, &self.invalid_chars, self.replacement_char)
    }
}

/// 抽出結果からファイル名を組み立てる
#[derive(Debug, Clone)]
pub struct FilenameBuilder {
    rules: NamingRules,
    normalizer: Normalizer,
    dates: DateFormatter,
}

impl FilenameBuilder {
    pub fn new(rules: NamingRules, vocabulary: CanonicalVocabulary) -> Self {
        let dates = DateFormatter::new(rules.date_format.clone());
        Self {
            rules,
            normalizer: Normalizer::new(vocabulary),
            dates,
        }
    }

    pub fn rules(&self) -> &NamingRules {
        &self.rules
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn dates(&self) -> &DateFormatter {
        &self.dates
    }

    /// 新しいファイル名を生成する（失敗しない）
    pub fn generate_filename(&self, extracted: &ExtractedInfo, original_filename: &str) -> String {
        let issuer = self.normalizer.normalize_issuer(&extracted.issuer);
        let document_type = self.normalizer.normalize_document_type(&extracted.document_type);
        let date = self.dates.format_date(&extracted.date);

        let base = Path::new(original_filename)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let (_, extension) = split_extension(&base);

        let mut filename = self.render_pattern(&issuer, &document_type, &date);
        filename.push_str(extension);

        let filename = truncate_to_length(&self.rules.sanitize(&filename), self.rules.max_filename_length);

        tracing::info!("ファイル名生成: {} -> {}", original_filename, filename);
        filename
    }

    /// 同名回避用の候補名
    pub fn numbered(&self, filename: &str, counter: u32) -> String {
        numbered_filename(filename, counter, self.rules.max_filename_length)
    }

    fn render_pattern(&self, issuer: &str, document_type: &str, date: &str) -> String {
        self.rules
            .pattern
            .replace("{issuer}", issuer)
            .replace("{document_type}", document_type)
            .replace("{date}", date)
    }
}
