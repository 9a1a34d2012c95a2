//! 書類情報の抽出（Dify ワークフロー連携）

pub mod cache;
mod dify;
mod types;

pub use dify::DifyClient;
pub use types::{ExtractedInfo, WorkflowData, WorkflowResponse};

use crate::error::Result;
use std::future::Future;
use std::path::Path;

/// PDFから発行機関・書類種別・日付を取り出す外部サービス
///
/// 結果が得られない場合は `Extraction` / `ApiCall` / `ApiParse` のいずれかで失敗する。
pub trait ExtractionClient {
    fn extract(&self, path: &Path) -> impl Future<Output = Result<ExtractedInfo>> + Send;
}
