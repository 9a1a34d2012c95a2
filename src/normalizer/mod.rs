//! 抽出値の正規化モジュール
//!
//! AIが抽出した自由記述の値を、決まった語彙と日付形式に揃える。
//!
//! ## 処理フロー
//! 1. 語彙との部分一致（宣言順で先勝ち）
//! 2. キーワードによる補助判定（ルール順で先勝ち）
//! 3. どちらにも該当しなければ「その他」

pub mod date;
pub mod rules;
pub mod vocabulary;

pub use date::DateFormatter;
pub use vocabulary::{CanonicalVocabulary, LabelMap, FALLBACK_LABEL};

use rules::{matching_labels, Rule, DOCUMENT_TYPE_RULES, ISSUER_RULES};

/// 発行機関・書類種別の正規化器
#[derive(Debug, Clone)]
pub struct Normalizer {
    vocabulary: CanonicalVocabulary,
}

impl Normalizer {
    pub fn new(vocabulary: CanonicalVocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &CanonicalVocabulary {
        &self.vocabulary
    }

    /// 発行機関名を正規ラベルに変換
    pub fn normalize_issuer(&self, raw: &str) -> String {
        normalize_label(&self.vocabulary.issuers, ISSUER_RULES, raw)
    }

    /// 書類種別を正規ラベルに変換
    pub fn normalize_document_type(&self, raw: &str) -> String {
        normalize_label(&self.vocabulary.document_types, DOCUMENT_TYPE_RULES, raw)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(CanonicalVocabulary::default())
    }
}

fn normalize_label(labels: &LabelMap, rules: &[Rule], raw: &str) -> String {
    let text = raw.trim();
    if text.is_empty() {
        return labels.fallback().to_string();
    }

    // 語彙との部分一致（双方向）
    if let Some((_, value)) = labels
        .iter()
        .find(|(key, _)| text.contains(key) || key.contains(text))
    {
        return value.to_string();
    }

    // 補助判定。語彙にないラベルを指すルールは飛ばす
    let by_rule = matching_labels(rules, text).find_map(|key| labels.get(key));
    if let Some(value) = by_rule {
        return value.to_string();
    }

    labels.fallback().to_string()
}
