//! PDF File Renamer
//!
//! PDF書類を Dify ワークフローで解析し、発行機関・書類種別・日付から
//! 決まった規則でファイル名を付けて保存する。

pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod naming;
pub mod normalizer;
pub mod processor;
pub mod scanner;
pub mod store;
