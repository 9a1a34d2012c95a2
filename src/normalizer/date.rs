//! 日付文字列の正規化
//!
//! 「2024年12月1日」「2024/12/1」「20241201」「12/1/2024」などを
//! 設定の日付形式（既定 `%Y%m%d`）に揃える。解釈できなければ当日。

use chrono::{Local, NaiveDate};
use regex::Regex;
use std::fmt::Write;

pub const DEFAULT_DATE_FORMAT: &str = "%Y%m%d";

lazy_static::lazy_static! {
    /// 評価順が結果を決める。曖昧な数字の並びは先に一致したパターンで解釈する
    static ref DATE_PATTERNS: Vec<Regex> = vec![
        // 2024年1月1日, 2024/1/1, 2024-1-1
        Regex::new(r"([0-9]{4})[年/-]([0-9]{1,2})[月/-]([0-9]{1,2})").unwrap(),
        // 20240101
        Regex::new(r"([0-9]{4})([0-9]{2})([0-9]{2})").unwrap(),
        // 1月1日2024, 1/1/2024
        Regex::new(r"([0-9]{1,2})[月/-]([0-9]{1,2})[日/-]([0-9]{4})").unwrap(),
    ];
}

/// strftime形式の書式として日付を出力できるか
///
/// 時刻指定子（`%H` など）は 00:00:00 として出力できるので可。
/// タイムゾーン指定子（`%z` など）は出力できないので不可。
pub fn is_valid_format(format: &str) -> bool {
    !format.is_empty()
        && NaiveDate::from_ymd_opt(2000, 1, 1)
            .and_then(|date| render_date(date, format))
            .is_some()
}

/// 日付を 00:00:00 の日時として書式に当てはめる。出力できない書式は None
fn render_date(date: NaiveDate, format: &str) -> Option<String> {
    let datetime = date.and_hms_opt(0, 0, 0)?;
    let mut out = String::new();
    write!(out, "{}", datetime.format(format)).ok()?;
    Some(out)
}

#[derive(Debug, Clone)]
pub struct DateFormatter {
    format: String,
}

impl DateFormatter {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    /// 日付文字列を設定の形式に変換する
    pub fn format_date(&self, raw: &str) -> String {
        match parse_date(raw) {
            Some(date) => self.render(date),
            None => self.today(),
        }
    }

    /// 当日の日付
    pub fn today(&self) -> String {
        self.render(Local::now().date_naive())
    }

    fn render(&self, date: NaiveDate) -> String {
        render_date(date, &self.format)
            .or_else(|| {
                tracing::warn!("日付形式を出力できません、既定形式を使います: {}", self.format);
                render_date(date, DEFAULT_DATE_FORMAT)
            })
            .unwrap_or_default()
    }
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}

/// パターン順に日付を解釈する。該当なしは None
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let text = fold_full_width_digits(raw.trim());
    if text.is_empty() {
        return None;
    }

    DATE_PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.captures(&text)?;
        resolve(&caps[1], &caps[2], &caps[3])
    })
}

/// 先頭グループが2桁なら西暦20xx、4桁でなければ (月, 日, 年) の並びとみなす
fn resolve(first: &str, second: &str, third: &str) -> Option<NaiveDate> {
    let (year, month, day) = if first.len() == 2 {
        (format!("20{}", first), second, third)
    } else if first.len() != 4 {
        (third.to_string(), first, second)
    } else {
        (first.to_string(), second, third)
    };

    let year: i32 = year.parse().ok()?;
    if year < 1 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

/// 全角数字を半角に
fn fold_full_width_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
            _ => c,
        })
        .collect()
}
