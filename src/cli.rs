use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chemvis")]
#[command(about = "化学設備データ ダッシュボード（CSVアップロード・集計表示・レポート出力）", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// バックエンドのベースURL（設定ファイルより優先）
    #[arg(long, global = true)]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 対話式ダッシュボード
    Dashboard,

    /// ログイン
    Login {
        /// ユーザー名
        #[arg(short, long)]
        username: Option<String>,

        /// パスワード（省略時は入力を求める）
        #[arg(short, long)]
        password: Option<String>,
    },

    /// アカウント登録
    Register {
        /// ユーザー名
        #[arg(short, long)]
        username: Option<String>,

        /// パスワード（省略時は入力を求める）
        #[arg(short, long)]
        password: Option<String>,
    },

    /// ログアウト（保存済みセッションを削除）
    Logout,

    /// ログイン中のユーザーを表示
    Whoami,

    /// CSVをアップロードして集計結果を表示
    Upload {
        /// CSVファイル
        #[arg(required = true)]
        file: PathBuf,

        /// レポートも出力する
        #[arg(long)]
        report: bool,

        /// 出力形式 (pdf/excel/both)
        #[arg(short, long, default_value = "pdf")]
        format: ExportFormat,

        /// 出力ファイル/ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// アップロード履歴を表示
    History,

    /// 履歴のデータを表示
    Show {
        /// 履歴ID
        #[arg(required = true)]
        id: i64,

        /// レポートも出力する
        #[arg(long)]
        report: bool,

        /// 出力形式 (pdf/excel/both)
        #[arg(short, long, default_value = "pdf")]
        format: ExportFormat,

        /// 出力ファイル/ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 設定を表示/編集
    Config {
        /// ベースURLを設定
        #[arg(long)]
        set_base_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Pdf,
    Excel,
    Both,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "both" => Ok(ExportFormat::Both),
            _ => Err(format!("Unknown format: {}. Use pdf, excel, or both", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Pdf => write!(f, "pdf"),
            ExportFormat::Excel => write!(f, "excel"),
            ExportFormat::Both => write!(f, "both"),
        }
    }
}
