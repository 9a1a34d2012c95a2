use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdf-renamer")]
#[command(about = "PDF書類をAIで解析して自動リネームするツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 設定ファイル（デフォルト: ~/.config/pdf-renamer/config.json）
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// PDFを解析してリネーム保存
    Rename {
        /// PDFファイルまたはフォルダ
        #[arg(required = true)]
        input: PathBuf,

        /// 出力フォルダ（省略時は設定の output_folder）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// ドライラン（保存せずファイル名のみ表示）
        #[arg(long)]
        dry_run: bool,

        /// キャッシュを使用（再解析をスキップ）
        #[arg(long)]
        use_cache: bool,
    },

    /// 抽出値からファイル名をプレビュー（API呼び出しなし）
    Name {
        /// 発行機関
        #[arg(long, default_value = "")]
        issuer: String,

        /// 書類種別
        #[arg(short = 't', long, default_value = "")]
        document_type: String,

        /// 日付
        #[arg(short, long, default_value = "")]
        date: String,

        /// 元のファイル名
        #[arg(long, default_value = "document.pdf")]
        original: String,
    },

    /// 保存済みファイルの一覧
    List {
        /// 出力フォルダ
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 保存済みファイルを書き出す
    Export {
        /// 保存済みファイル名
        #[arg(required = true)]
        name: String,

        /// 書き出し先
        #[arg(long, required = true)]
        to: PathBuf,

        /// 出力フォルダ
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 保存済みファイルを削除
    Delete {
        /// 保存済みファイル名
        #[arg(required = true)]
        name: String,

        /// 確認なしで削除
        #[arg(short, long)]
        yes: bool,

        /// 出力フォルダ
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Dify APIの接続確認
    Check,

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// キャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// 対象フォルダ（省略時はカレント）
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },
}
