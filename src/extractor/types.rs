use crate::error::{RenamerError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 1書類ごとの抽出結果（空文字は未抽出）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedInfo {
    #[serde(default)]
    pub issuer: String,           // 発行機関

    #[serde(default)]
    pub document_type: String,    // 書類種別

    #[serde(default)]
    pub date: String,             // 日付（未整形）

    #[serde(default)]
    pub original_filename: String,
}

/// `/workflows/run` のレスポンス
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowResponse {
    #[serde(default)]
    pub workflow_run_id: Option<String>,
    pub data: WorkflowData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowData {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub outputs: Option<Map<String, Value>>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub elapsed_time: Option<f64>,
    #[serde(default)]
    pub total_tokens: Option<u64>,
}

/// Notionページのプロパティ名
const PROP_ISSUER: &str = "発行機関";
const PROP_DOCUMENT_TYPE: &str = "書類種別";
const PROP_TITLE: &str = "書類名";
const PROP_DATES: &[&str] = &["日付", "発行日"];

impl ExtractedInfo {
    /// ワークフロー結果から抽出値を取り出す
    ///
    /// 優先順位:
    /// 1. outputs 直下の `issuer` / `document_type` / `date`
    /// 2. `notion_response`（NotionページのJSON文字列）のプロパティ
    pub fn from_workflow(response: &WorkflowResponse) -> Result<Self> {
        let data = &response.data;
        if data.status.as_deref() == Some("failed") {
            return Err(RenamerError::Extraction(format!(
                "ワークフローが失敗しました: {}",
                data.error.as_deref().unwrap_or("原因不明")
            )));
        }

        let outputs = data
            .outputs
            .as_ref()
            .ok_or_else(|| RenamerError::ApiParse("outputs がありません".into()))?;

        let mut info = ExtractedInfo {
            issuer: output_str(outputs, "issuer"),
            document_type: output_str(outputs, "document_type"),
            date: output_str(outputs, "date"),
            ..Default::default()
        };

        if let Some(raw) = outputs.get("notion_response").and_then(Value::as_str) {
            let page: NotionPage = serde_json::from_str(raw)
                .map_err(|e| RenamerError::ApiParse(format!("notion_response: {}", e)))?;
            info.fill_from_notion(&page);
        }

        Ok(info)
    }

    fn fill_from_notion(&mut self, page: &NotionPage) {
        if self.issuer.is_empty() {
            if let Some(name) = page.select_name(PROP_ISSUER) {
                self.issuer = name;
            }
        }
        if self.document_type.is_empty() {
            if let Some(name) = page
                .select_name(PROP_DOCUMENT_TYPE)
                .or_else(|| page.title_text(PROP_TITLE))
            {
                self.document_type = name;
            }
        }
        if self.date.is_empty() {
            if let Some(start) = PROP_DATES.iter().find_map(|p| page.date_start(p)) {
                self.date = start;
            }
        }
    }
}

fn output_str(outputs: &Map<String, Value>, key: &str) -> String {
    outputs
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct NotionPage {
    #[serde(default)]
    properties: Map<String, Value>,
}

impl NotionPage {
    fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    fn select_name(&self, name: &str) -> Option<String> {
        non_empty(self.property(name)?.get("select")?.get("name")?.as_str()?)
    }

    fn title_text(&self, name: &str) -> Option<String> {
        let first = self.property(name)?.get("title")?.as_array()?.first()?;
        non_empty(first.get("plain_text")?.as_str()?)
    }

    fn date_start(&self, name: &str) -> Option<String> {
        non_empty(self.property(name)?.get("date")?.get("start")?.as_str()?)
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
