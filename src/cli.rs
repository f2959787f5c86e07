use clap::{Parser, Subcommand};
use crop_doctor_common::RecordId;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "crop-doctor")]
#[command(about = "Upload a crop photo to detect diseases and get cure recommendations", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像をアップロードしてAI診断（フォルダ指定時は中の画像を順に処理）
    Upload {
        /// 画像ファイルまたはフォルダ（省略時はカレントフォルダから選択）
        path: Option<PathBuf>,

        /// 完了後に履歴を表示しない
        #[arg(long)]
        no_history: bool,
    },

    /// 既存レコードを再解析（結果は上書き）
    Analyze {
        /// レコードID
        #[arg(required = true)]
        id: RecordId,
    },

    /// 直近のアップロードと診断結果を表示
    History {
        /// 表示件数（省略時は設定値、既定20）
        #[arg(short, long)]
        limit: Option<usize>,

        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// Supabase への接続確認
    Check,

    /// 設定を表示/編集
    Config {
        /// Gemini APIキーを設定
        #[arg(long)]
        set_gemini_key: Option<String>,

        /// Supabase プロジェクトURLを設定
        #[arg(long)]
        set_supabase_url: Option<String>,

        /// Supabase anonキーを設定
        #[arg(long)]
        set_supabase_key: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
