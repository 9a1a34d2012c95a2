//! キーワードによる補助判定ルール
//!
//! 語彙との部分一致で決まらなかった場合にのみ使う。
//! 上から順に評価し、最初に一致したルールを採用する。

/// (いずれかを含めば一致するキーワード, 正規ラベルのキー)
pub type Rule = (&'static [&'static str], &'static str);

pub const ISSUER_RULES: &[Rule] = &[
    (&["国民健康保険", "国保"], "国民健康保険団体連合会"),
    (&["社会保険", "支払基金"], "社会保険診療報酬支払基金"),
    (&["厚生労働省", "厚労省"], "厚生労働省"),
];

pub const DOCUMENT_TYPE_RULES: &[Rule] = &[
    (&["診療報酬", "明細"], "診療報酬明細書"),
    (&["医療費", "通知"], "医療費通知"),
    (&["保険証"], "保険証"),
    (&["診断書"], "診断書"),
    (&["処方箋"], "処方箋"),
    (&["返戻", "へんれい"], "返戻内訳書"),
    (&["増減点"], "増減点連絡書"),
    (&["過誤", "再審査"], "過誤・再審査結果通知書"),
    (&["調整"], "保険過誤調整結果通知書"),
    (&["資格", "確認"], "資格確認結果連絡書"),
    (&["振込", "当座"], "当座口振込通知書"),
];

/// 一致したルールのキーをルール順に返す
pub fn matching_labels<'a>(rules: &'a [Rule], text: &'a str) -> impl Iterator<Item = &'static str> + 'a {
    rules
        .iter()
        .filter(move |(keywords, _)| keywords.iter().any(|k| text.contains(k)))
        .map(|(_, key)| *key)
}

/// 最初に一致したルールのキー
pub fn first_match(rules: &[Rule], text: &str) -> Option<&'static str> {
    matching_labels(rules, text).next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_order() {
        // 「通知」と「調整」の両方を含む → 先に並ぶ医療費通知
        assert_eq!(
            first_match(DOCUMENT_TYPE_RULES, "調整通知"),
            Some("医療費通知")
        );
        assert_eq!(first_match(DOCUMENT_TYPE_RULES, "調整額"), Some("保険過誤調整結果通知書"));
    }

    #[test]
    fn test_first_match_none() {
        assert_eq!(first_match(ISSUER_RULES, "市役所"), None);
        assert_eq!(first_match(ISSUER_RULES, ""), None);
    }

    #[test]
    fn test_issuer_abbreviations() {
        assert_eq!(first_match(ISSUER_RULES, "県国保連"), Some("国民健康保険団体連合会"));
        assert_eq!(first_match(ISSUER_RULES, "厚労省 保険局"), Some("厚生労働省"));
    }
}
