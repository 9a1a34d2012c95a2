//! 正規ラベル語彙
//!
//! 発行機関・書類種別の許可リスト。JSONオブジェクトとして読み込み、
//! 宣言順を保持する（照合は宣言順で先勝ち）。

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 該当なしのときのラベル
pub const FALLBACK_LABEL: &str = "その他";

/// 宣言順を保持するキー→正規ラベルの対応表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    entries: Vec<(String, String)>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// ラベル自身をキーとする対応表を作る
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = Self::new();
        for label in labels {
            let label = label.into();
            map.insert(label.clone(), label);
        }
        map
    }

    /// 追加（既存キーは値のみ更新し、順序は維持）
    pub fn insert(&mut self, key: String, value: String) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// フォールバックラベル（未登録なら既定値）
    pub fn fallback(&self) -> &str {
        self.get(FALLBACK_LABEL).unwrap_or(FALLBACK_LABEL)
    }
}

impl Serialize for LabelMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LabelMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LabelMapVisitor;

        impl<'de> Visitor<'de> for LabelMapVisitor {
            type Value = LabelMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of canonical labels")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<LabelMap, A::Error> {
                let mut map = LabelMap::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(LabelMapVisitor)
    }
}

/// 発行機関・書類種別の語彙
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalVocabulary {
    pub issuers: LabelMap,
    pub document_types: LabelMap,
}

impl Default for CanonicalVocabulary {
    fn default() -> Self {
        Self {
            issuers: default_issuers(),
            document_types: default_document_types(),
        }
    }
}

pub fn default_issuers() -> LabelMap {
    LabelMap::from_labels([
        "国民健康保険団体連合会",
        "社会保険診療報酬支払基金",
        "厚生労働省",
        "保険者",
        "医療機関",
        FALLBACK_LABEL,
    ])
}

pub fn default_document_types() -> LabelMap {
    LabelMap::from_labels([
        "診療報酬明細書",
        "医療費通知",
        "保険証",
        "診断書",
        "処方箋",
        "返戻内訳書",
        "増減点連絡書",
        "過誤・再審査結果通知書",
        "保険過誤調整結果通知書",
        "資格確認結果連絡書",
        "当座口振込通知書",
        FALLBACK_LABEL,
    ])
}
