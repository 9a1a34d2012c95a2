use anyhow::{bail, Context};
use clap::Parser;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_renamer::{cli, config, error, extractor, naming, processor, scanner, store};
use cli::{Cli, Commands};
use config::{AppConfig, LoggingSettings};
use extractor::cache::CacheFile;
use extractor::{DifyClient, ExtractedInfo};
use naming::FilenameBuilder;
use processor::{BatchOptions, Renamer};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use store::FileStore;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone();

    if let Commands::Config { set_api_key, show } = &cli.command {
        return run_config(config_path.as_deref(), set_api_key.clone(), *show);
    }

    let config = AppConfig::load(config_path.as_deref()).context("設定の読み込みに失敗しました")?;
    init_tracing(cli.verbose, &config.logging)?;

    match cli.command {
        Commands::Rename { input, output, dry_run, use_cache } => {
            println!("📄 pdf-renamer - リネーム{}\n", if dry_run { "（ドライラン）" } else { "" });

            // 1. PDFスキャン
            println!("[1/2] PDFをスキャン中...");
            let files = scanner::scan_input(&input, &config.file_processing.allowed_extensions)?;
            if files.is_empty() {
                return Err(error::RenamerError::NoPdfFound(input.display().to_string()).into());
            }
            println!("✔ {}個のPDFを検出\n", files.len());

            // 2. 解析・リネーム
            println!("[2/2] Difyで解析中...{}", if use_cache { " (キャッシュ有効)" } else { "" });
            let output_dir = output.unwrap_or_else(|| config.file_processing.output_folder.clone());
            let renamer = Renamer::new(
                DifyClient::new(&config.dify)?,
                FilenameBuilder::new(config.naming_rules.clone(), config.vocabulary()),
                FileStore::open(&output_dir, config.naming_rules.max_filename_length)?,
                config.file_processing.max_file_size_mb,
            );
            let options = BatchOptions {
                dry_run,
                cache_dir: use_cache.then(|| input_folder(&input)),
            };

            let progress = ProgressBar::new(files.len() as u64);
            progress.set_style(ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")?);
            let report = renamer
                .process_batch(&files, &options, |_, _, outcome| {
                    match &outcome.result {
                        Ok(done) => progress.println(format!("  ✔ {} -> {}", outcome.file_name, done.final_name())),
                        Err(e) => progress.println(format!("  ✗ {}: {}", outcome.file_name, e)),
                    }
                    progress.set_message(outcome.file_name.clone());
                    progress.inc(1);
                })
                .await;
            progress.finish_and_clear();

            println!("\n{}", "=".repeat(50));
            println!("処理結果:");
            println!("  総ファイル数: {}", report.total);
            println!("  成功: {}", report.success);
            println!("  失敗: {}", report.failed);
            if !dry_run {
                println!("  出力先: {}", output_dir.display());
            }
            println!("{}", "=".repeat(50));

            if report.failed > 0 {
                std::process::exit(1);
            }
        }

        Commands::Name { issuer, document_type, date, original } => {
            let builder = FilenameBuilder::new(config.naming_rules.clone(), config.vocabulary());
            let info = ExtractedInfo {
                issuer,
                document_type,
                date,
                original_filename: original.clone(),
            };
            println!("発行機関: {}", builder.normalizer().normalize_issuer(&info.issuer));
            println!("書類種別: {}", builder.normalizer().normalize_document_type(&info.document_type));
            println!("日付: {}", builder.dates().format_date(&info.date));
            println!("ファイル名: {}", builder.generate_filename(&info, &original));
        }

        Commands::List { output } => {
            let store = open_store(&config, output)?;
            let files = store.list()?;
            if files.is_empty() {
                println!("保存済みファイルはありません: {}", store.root().display());
            }
            for file in files {
                println!("{}\t{} bytes", file.name, file.size);
            }
        }

        Commands::Export { name, to, output } => {
            let store = open_store(&config, output)?;
            let bytes = store.read(&name)?;
            let dest = if to.is_dir() { to.join(&name) } else { to };
            std::fs::write(&dest, bytes).with_context(|| format!("書き出しに失敗: {}", dest.display()))?;
            println!("✔ 書き出しました: {}", dest.display());
        }

        Commands::Delete { name, yes, output } => {
            let store = open_store(&config, output)?;
            if !store.exists(&name)? {
                bail!("ファイルが見つかりません: {}", name);
            }
            let confirmed = yes
                || Confirm::new()
                    .with_prompt(format!("{} を削除しますか？", name))
                    .default(false)
                    .interact()?;
            if confirmed {
                store.delete(&name)?;
                println!("✔ 削除しました: {}", name);
            } else {
                println!("中止しました");
            }
        }

        Commands::Check => {
            let client = DifyClient::new(&config.dify)?;
            client.test_connection().await?;
            println!("✅ Dify API接続成功");
        }

        Commands::Cache { clear, folder, info } => {
            let target = folder.unwrap_or_else(|| PathBuf::from("."));
            let cache_path = CacheFile::cache_path(&target);

            if info || !clear {
                // デフォルトまたは--info: 情報表示
                if cache_path.exists() {
                    let cache = CacheFile::load(&target);
                    println!("キャッシュ情報:");
                    println!("  パス: {}", cache_path.display());
                    println!("  件数: {}", cache.len());
                    if let Ok(meta) = std::fs::metadata(&cache_path) {
                        println!("  サイズ: {} bytes", meta.len());
                    }
                } else {
                    println!("キャッシュファイルが存在しません: {}", cache_path.display());
                }
            }

            if clear {
                match CacheFile::clear(&target) {
                    Ok(true) => println!("✔ キャッシュを削除しました: {}", cache_path.display()),
                    Ok(false) => println!("キャッシュファイルが存在しません"),
                    Err(e) => println!("キャッシュ削除エラー: {}", e),
                }
            }
        }

        // 設定読み込み前に処理済み
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn init_tracing(verbose: bool, logging: &LoggingSettings) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = logging
        .open_log_file()
        .context("ログファイルを開けません")?
        .map(|file| fmt::layer().with_ansi(false).with_writer(Mutex::new(file)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

fn run_config(path: Option<&Path>, set_api_key: Option<String>, show: bool) -> anyhow::Result<()> {
    let mut config = AppConfig::load_file(path)?;

    if let Some(key) = set_api_key {
        config.set_api_key(key, path)?;
        println!("✔ APIキーを設定しました");
    }

    if show {
        let location = match path {
            Some(p) => p.to_path_buf(),
            None => AppConfig::config_path()?,
        };
        println!("設定: {}", location.display());
        println!("  ワークフローURL: {}", config.dify.api_url);
        println!("  APIキー: {}", config.masked_api_key());
        println!("  命名パターン: {}", config.naming_rules.pattern);
        println!("  日付形式: {}", config.naming_rules.date_format);
        println!("  最大ファイル名長: {}", config.naming_rules.max_filename_length);
        println!("  出力フォルダ: {}", config.file_processing.output_folder.display());
        println!("  発行機関: {}件 / 書類種別: {}件", config.issuers.len(), config.document_types.len());
    }

    Ok(())
}

fn open_store(config: &AppConfig, output: Option<PathBuf>) -> error::Result<FileStore> {
    let dir = output.unwrap_or_else(|| config.file_processing.output_folder.clone());
    FileStore::open(dir, config.naming_rules.max_filename_length)
}

/// キャッシュを置くフォルダ（入力がファイルならその親）
fn input_folder(input: &Path) -> PathBuf {
    if input.is_dir() {
        input.to_path_buf()
    } else {
        input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
