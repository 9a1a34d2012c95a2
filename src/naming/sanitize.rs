//! ファイル名の整形
//!
//! 禁止文字の置換と長さ制限のみを行う。日本語・連続する区切り文字・
//! 先頭末尾の区切り文字はそのまま残す。長さは文字数で数える。

/// 切り詰めたことを示す印
pub const ELLIPSIS: &str = "...";

/// 禁止文字を置換文字に置き換える
///
/// 置換文字が禁止文字でない限り、2回適用しても結果は変わらない。
pub fn sanitize(filename: &str, invalid_chars: &[char], replacement: char) -> String {
    filename
        .chars()
        .map(|c| if invalid_chars.contains(&c) { replacement } else { c })
        .collect()
}

/// 語幹と拡張子（ドット込み）に分ける
///
/// 先頭のドットは拡張子の区切りとみなさない（`.env` は拡張子なし）。
/// 末尾がドットの名前（`abc...`）も拡張子なし。
pub fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(idx) if idx + 1 < filename.len() && filename[..idx].chars().any(|c| c != '.') => {
            filename.split_at(idx)
        }
        _ => (filename, ""),
    }
}

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// 最大長を超える場合、拡張子を残して語幹を切り詰め `...` を付ける
pub fn truncate_to_length(filename: &str, max_length: usize) -> String {
    if char_len(filename) <= max_length {
        return filename.to_string();
    }
    let (stem, ext) = split_extension(filename);
    fit(stem, "", ext, max_length)
}

/// 重複回避用の連番付きファイル名（`name_01.pdf`）
pub fn numbered_filename(filename: &str, counter: u32, max_length: usize) -> String {
    let (stem, ext) = split_extension(filename);
    let suffix = format!("_{:02}", counter);
    fit(stem, &suffix, ext, max_length)
}

/// `stem + suffix + ext` を最大長に収める。連番と拡張子を優先して残す
fn fit(stem: &str, suffix: &str, ext: &str, max_length: usize) -> String {
    let fixed = char_len(suffix) + char_len(ext);
    if char_len(stem) + fixed <= max_length {
        return format!("{}{}{}", stem, suffix, ext);
    }

    if fixed + ELLIPSIS.len() <= max_length {
        let keep = max_length - fixed - ELLIPSIS.len();
        let head: String = stem.chars().take(keep).collect();
        return format!("{}{}{}{}", head, ELLIPSIS, suffix, ext);
    }

    // 拡張子すら収まらない極端な設定では連番だけ残す
    let keep = max_length.saturating_sub(char_len(suffix));
    let head: String = format!("{}{}", stem, ext).chars().take(keep).collect();
    format!("{}{}", head, suffix).chars().take(max_length).collect()
}
