//! Dify API クライアント
//!
//! 1. `/files/upload` にPDFをアップロードしてファイルIDを得る
//! 2. ワークフローを blocking モードで実行する
//! 3. 結果を [`ExtractedInfo`] に変換する

use super::types::{ExtractedInfo, WorkflowResponse};
use super::ExtractionClient;
use crate::config::DifySettings;
use crate::error::{RenamerError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const CONNECTION_TIMEOUT_SECS: u64 = 15;
const UPLOAD_TIMEOUT_SECS: u64 = 30;

pub struct DifyClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    workflow_url: String,
    user_id: String,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct WorkflowRequest<'a> {
    inputs: WorkflowInputs<'a>,
    response_mode: &'a str,
    user: &'a str,
}

#[derive(Serialize)]
struct WorkflowInputs<'a> {
    file: Vec<WorkflowFile<'a>>,
}

#[derive(Serialize)]
struct WorkflowFile<'a> {
    transfer_method: &'a str,
    upload_file_id: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Deserialize)]
struct UploadResponse {
    id: String,
}

impl DifyClient {
    pub fn new(settings: &DifySettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(RenamerError::MissingApiKey)?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| RenamerError::ApiCall(format!("HTTPクライアント初期化エラー: {}", e)))?;

        let key_preview: String = api_key.chars().take(8).collect();
        tracing::info!("Dify Client初期化完了 (API Key: {}..., Workflow URL: {})", key_preview, settings.api_url);

        Ok(Self {
            client,
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            workflow_url: settings.api_url.clone(),
            user_id: settings.user_id.clone(),
            timeout_secs: settings.timeout_seconds,
        })
    }

    /// API への疎通確認
    pub async fn test_connection(&self) -> Result<()> {
        tracing::info!("Dify API接続テスト開始: {}", self.base_url);

        let response = self
            .client
            .get(&self.base_url)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(CONNECTION_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| self.request_error(e, CONNECTION_TIMEOUT_SECS))?;

        let status = response.status();
        tracing::info!("Dify APIレスポンス: {}", status);

        match status {
            StatusCode::OK => Ok(()),
            StatusCode::UNAUTHORIZED => Err(RenamerError::ApiCall("APIキーが無効です".into())),
            StatusCode::FORBIDDEN => Err(RenamerError::ApiCall("APIキーの権限が不足しています".into())),
            s if s.as_u16() < 400 => {
                tracing::warn!("予期しないレスポンス: {}", s);
                Ok(())
            }
            s => Err(RenamerError::ApiCall(format!("予期しないレスポンス: {}", s))),
        }
    }

    /// PDFをアップロードしてファイルIDを返す
    pub async fn upload_file(&self, path: &Path) -> Result<String> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document.pdf".into());
        let bytes = tokio::fs::read(path).await?;

        tracing::info!("ファイルアップロード開始: {}", file_name);

        let part = Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str("application/pdf")
            .map_err(|e| RenamerError::ApiCall(e.to_string()))?;
        let form = Form::new().part("file", part).text("user", self.user_id.clone());

        let response = self
            .client
            .post(format!("{}/files/upload", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| self.request_error(e, UPLOAD_TIMEOUT_SECS))?;

        let body = Self::success_body(response, "ファイルアップロード").await?;
        let upload: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| RenamerError::ApiParse(format!("アップロードレスポンス: {}", e)))?;

        tracing::info!("ファイルアップロード成功: {}", upload.id);
        Ok(upload.id)
    }

    /// アップロード済みファイルでワークフローを実行
    pub async fn run_workflow(&self, file_id: &str) -> Result<WorkflowResponse> {
        let request = WorkflowRequest {
            inputs: WorkflowInputs {
                file: vec![WorkflowFile {
                    transfer_method: "local_file",
                    upload_file_id: file_id,
                    kind: "document",
                }],
            },
            response_mode: "blocking",
            user: &self.user_id,
        };

        tracing::info!("ワークフロー実行中...");
        tracing::debug!("ワークフローURL: {}", self.workflow_url);

        let response = self
            .client
            .post(&self.workflow_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| self.request_error(e, self.timeout_secs))?;

        let body = Self::success_body(response, "ワークフロー実行").await?;
        tracing::debug!("ワークフローレスポンス内容: {}", body);

        let parsed: WorkflowResponse = serde_json::from_str(&body)
            .map_err(|e| RenamerError::ApiParse(format!("ワークフローレスポンス: {}", e)))?;

        tracing::debug!(
            "ワークフロー完了: run_id={:?}, elapsed={:?}s, tokens={:?}",
            parsed.workflow_run_id,
            parsed.data.elapsed_time,
            parsed.data.total_tokens
        );
        Ok(parsed)
    }

    /// アップロードからワークフロー実行まで
    pub async fn process_pdf(&self, path: &Path) -> Result<WorkflowResponse> {
        tracing::info!("PDF処理開始: {}", path.display());
        let file_id = self.upload_file(path).await?;
        self.run_workflow(&file_id).await
    }

    /// 200/201 以外は失敗として本文を添える
    async fn success_body(response: reqwest::Response, action: &str) -> Result<String> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            Ok(body)
        } else {
            tracing::error!("{}失敗: {} - {}", action, status, body);
            Err(RenamerError::ApiCall(format!("{}失敗: {} - {}", action, status, body)))
        }
    }

    fn request_error(&self, e: reqwest::Error, timeout_secs: u64) -> RenamerError {
        if e.is_timeout() {
            RenamerError::ApiCall(format!("タイムアウトしました ({}秒)", timeout_secs))
        } else if e.is_connect() {
            RenamerError::ApiCall(format!("Dify APIへの接続に失敗しました: {}", self.base_url))
        } else {
            RenamerError::ApiCall(e.to_string())
        }
    }
}

impl ExtractionClient for DifyClient {
    async fn extract(&self, path: &Path) -> Result<ExtractedInfo> {
        let response = self.process_pdf(path).await?;
        let mut info = ExtractedInfo::from_workflow(&response)?;
        info.original_filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        tracing::info!(
            "抽出結果: 発行機関={}, 書類種別={}, 日付={}",
            info.issuer,
            info.document_type,
            info.date
        );
        Ok(info)
    }
}
