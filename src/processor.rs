//! 一括リネーム処理
//!
//! 1ファイルずつ順に「抽出 → ファイル名生成 → 保存」を行う。
//! 個別の失敗はその場で記録し、残りのファイルの処理を続ける。

use crate::error::{RenamerError, Result};
use crate::extractor::cache::{compute_file_hash, CacheFile};
use crate::extractor::{ExtractedInfo, ExtractionClient};
use crate::naming::FilenameBuilder;
use crate::scanner::PdfInfo;
use crate::store::FileStore;
use std::path::{Path, PathBuf};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// 1ファイル分の処理結果
#[derive(Debug, Clone)]
pub struct RenameOutcome {
    pub source: PathBuf,
    pub extracted: ExtractedInfo,
    /// 生成したファイル名（重複回避前）
    pub new_name: String,
    /// 保存先。ドライラン時は None
    pub stored_path: Option<PathBuf>,
}

impl RenameOutcome {
    /// 実際に使われたファイル名
    pub fn final_name(&self) -> String {
        self.stored_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.new_name.clone())
    }
}

#[derive(Debug)]
pub struct FileOutcome {
    pub file_name: String,
    pub result: Result<RenameOutcome>,
}

/// 一括処理の集計
#[derive(Debug, Default)]
pub struct BatchReport {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    fn record(&mut self, outcome: FileOutcome) {
        if outcome.result.is_ok() {
            self.success += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// 保存せずファイル名だけ決める
    pub dry_run: bool,
    /// 抽出結果キャッシュを置くフォルダ
    pub cache_dir: Option<PathBuf>,
}

pub struct Renamer<C> {
    client: C,
    builder: FilenameBuilder,
    store: FileStore,
    max_file_size_mb: u64,
}

impl<C: ExtractionClient + Sync> Renamer<C> {
    pub fn new(client: C, builder: FilenameBuilder, store: FileStore, max_file_size_mb: u64) -> Self {
        Self {
            client,
            builder,
            store,
            max_file_size_mb,
        }
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn builder(&self) -> &FilenameBuilder {
        &self.builder
    }

    /// 1ファイルを処理する
    pub async fn process_file(
        &self,
        pdf: &PdfInfo,
        dry_run: bool,
        cache: Option<&mut CacheFile>,
    ) -> Result<RenameOutcome> {
        tracing::info!("処理開始: {}", pdf.file_name);
        self.check_size(pdf)?;

        let extracted = self.extract(pdf, cache).await?;
        let new_name = self.builder.generate_filename(&extracted, &pdf.file_name);

        let stored_path = if dry_run {
            None
        } else {
            Some(self.store.store_copy(&new_name, &pdf.path)?)
        };

        let outcome = RenameOutcome {
            source: pdf.path.clone(),
            extracted,
            new_name,
            stored_path,
        };
        tracing::info!("処理完了: {} -> {}", pdf.file_name, outcome.final_name());
        Ok(outcome)
    }

    /// 複数ファイルを順に処理する。`on_progress` は1ファイルごとに呼ばれる
    pub async fn process_batch<F>(
        &self,
        files: &[PdfInfo],
        options: &BatchOptions,
        mut on_progress: F,
    ) -> BatchReport
    where
        F: FnMut(usize, usize, &FileOutcome),
    {
        let mut report = BatchReport {
            total: files.len(),
            ..Default::default()
        };
        let mut cache = options.cache_dir.as_deref().map(CacheFile::load);

        for (i, pdf) in files.iter().enumerate() {
            tracing::info!("[{}/{}] 処理中: {}", i + 1, files.len(), pdf.file_name);

            let result = self.process_file(pdf, options.dry_run, cache.as_mut()).await;
            if let Err(e) = &result {
                tracing::error!("ファイル処理エラー ({}): {}", pdf.file_name, e);
            }

            let outcome = FileOutcome {
                file_name: pdf.file_name.clone(),
                result,
            };
            on_progress(i + 1, files.len(), &outcome);
            report.record(outcome);
        }

        if let (Some(cache), Some(dir)) = (&cache, options.cache_dir.as_deref()) {
            save_cache(cache, dir);
        }

        tracing::info!(
            "処理結果: 総ファイル数 {} / 成功 {} / 失敗 {}",
            report.total,
            report.success,
            report.failed
        );
        report
    }

    fn check_size(&self, pdf: &PdfInfo) -> Result<()> {
        if pdf.size > self.max_file_size_mb.saturating_mul(BYTES_PER_MB) {
            return Err(RenamerError::FileTooLarge {
                name: pdf.file_name.clone(),
                size_mb: pdf.size as f64 / BYTES_PER_MB as f64,
                limit_mb: self.max_file_size_mb,
            });
        }
        Ok(())
    }

    async fn extract(&self, pdf: &PdfInfo, cache: Option<&mut CacheFile>) -> Result<ExtractedInfo> {
        let Some(cache) = cache else {
            return self.extract_uncached(pdf).await;
        };

        let hash = match compute_file_hash(&pdf.path) {
            Ok(h) => h,
            Err(e) => {
                // ハッシュが取れなければキャッシュを使わない
                tracing::warn!("ハッシュ計算失敗 ({}): {}", pdf.file_name, e);
                return self.extract_uncached(pdf).await;
            }
        };

        if let Some(info) = cache.get(&hash) {
            tracing::info!("キャッシュ使用: {}", pdf.file_name);
            let mut info = info.clone();
            info.original_filename = pdf.file_name.clone();
            return Ok(info);
        }

        let info = self.extract_uncached(pdf).await?;
        cache.insert(hash, pdf.file_name.clone(), pdf.size, info.clone());
        Ok(info)
    }

    async fn extract_uncached(&self, pdf: &PdfInfo) -> Result<ExtractedInfo> {
        let mut info = self.client.extract(&pdf.path).await?;
        info.original_filename = pdf.file_name.clone();
        Ok(info)
    }
}

fn save_cache(cache: &CacheFile, dir: &Path) {
    if let Err(e) = cache.save(dir) {
        tracing::warn!("キャッシュ保存失敗 ({}): {}", dir.display(), e);
    }
}
