use anyhow::Context;
use clap::Parser;
use crop_doctor::app::App;
use crop_doctor::cli::{Cli, Commands};
use crop_doctor::config::Config;
use crop_doctor::error::CropDoctorError;
use crop_doctor::history::{fetch_history, render_history, HistoryState, HistoryView};
use crop_doctor::scanner::{self, LocalImage};
use crop_doctor::services::Services;
use crop_doctor_common::Status;
use dialoguer::Select;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // .env が無いのは正常
    let _ = dotenvy::dotenv();
    init_tracing(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Upload { path, no_history } => {
            println!("🌿 crop-doctor - Upload & Analyze\n");
            config.report_missing();

            let images = resolve_upload_targets(path)?;
            let services = Services::from_config(&config)?;
            let app = App::new(services.clone());

            let follower = (!no_history).then(|| {
                let view = HistoryView::new(services.table.clone(), config.history_limit);
                tokio::spawn(view.follow(app.subscribe(), |state: HistoryState| {
                    println!("\n{}", render_history(&state));
                }))
            });

            let mut failures = 0;
            for (idx, path) in images.iter().enumerate() {
                if images.len() > 1 {
                    println!("[{}/{}] {}", idx + 1, images.len(), path.display());
                }

                let status = match scanner::load_image(path) {
                    Ok(image) => submit_with_spinner(&app, &image).await,
                    Err(e) => Status::Failure(format!("Upload Error: {}", e)),
                };
                if status.is_failure() {
                    failures += 1;
                }
                println!("{}", status);
            }

            // 送信側を閉じると履歴ビューは最後の更新を描画して終了する
            drop(app);
            if let Some(handle) = follower {
                handle.await.context("history view task failed")?;
            }

            if failures > 0 {
                println!("\n{} / {} failed", failures, images.len());
            } else {
                println!("\n✅ Done");
            }
        }

        Commands::Analyze { id } => {
            println!("🔬 crop-doctor - Re-analyze #{}\n", id);
            config.report_missing();

            let app = App::new(Services::from_config(&config)?);
            let spinner = new_spinner();
            let mut on_status = {
                let spinner = spinner.clone();
                move |s: &Status| spinner.set_message(s.message().to_string())
            };
            let status = app.reanalyze(&id, &mut on_status).await;
            spinner.finish_and_clear();
            println!("{}", status);
        }

        Commands::History { limit, json } => {
            config.report_missing();
            let services = Services::from_config(&config)?;
            let limit = limit.unwrap_or(config.history_limit);

            if json {
                let records = fetch_history(services.table.as_ref(), limit).await?;
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                let state = HistoryView::new(services.table.clone(), limit).load().await;
                println!("{}", render_history(&state));
            }
        }

        Commands::Check => {
            println!("🔌 crop-doctor - Connection check\n");
            for name in config.missing() {
                println!("  ✘ {} is not set", name);
            }

            let services = Services::from_config(&config)?;
            match services.table.recent(1).await {
                Ok(rows) => println!(
                    "  ✔ Connected to table '{}' ({} row sampled)",
                    config.table,
                    rows.len()
                ),
                Err(e) => println!("  ✘ Connection failed: {}", e),
            }
        }

        Commands::Config { set_gemini_key, set_supabase_url, set_supabase_key, show } => {
            // 環境変数を混ぜずにファイルの内容だけを編集する
            let mut stored = Config::load_from(&Config::config_path()?)?;
            let mut changed = false;

            if let Some(key) = set_gemini_key {
                stored.gemini_api_key = Some(key);
                changed = true;
            }
            if let Some(url) = set_supabase_url {
                stored.supabase_url = Some(url);
                changed = true;
            }
            if let Some(key) = set_supabase_key {
                stored.supabase_anon_key = Some(key);
                changed = true;
            }
            if changed {
                stored.save()?;
                println!("✔ Saved {}", Config::config_path()?.display());
            }

            if show || !changed {
                println!("Settings (file + environment):");
                println!("  Supabase URL:  {}", config.supabase_url.as_deref().unwrap_or("(not set)"));
                println!("  Supabase key:  {}", Config::masked(&config.supabase_anon_key));
                println!("  Gemini key:    {}", Config::masked(&config.gemini_api_key));
                println!("  Model:         {}", config.model);
                println!("  Bucket:        {}", config.bucket);
                println!("  Table:         {}", config.table);
                println!("  History limit: {}", config.history_limit);
                println!("  Timeout:       {}s", config.timeout_seconds);
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "crop_doctor=debug,info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn new_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

async fn submit_with_spinner(app: &App, image: &LocalImage) -> Status {
    let spinner = new_spinner();
    let mut on_status = {
        let spinner = spinner.clone();
        move |s: &Status| spinner.set_message(s.message().to_string())
    };
    let status = app.submit(image, &mut on_status).await;
    spinner.finish_and_clear();
    status
}

/// パス指定なし → 対話選択、フォルダ → 中の画像すべて、ファイル → そのまま
fn resolve_upload_targets(path: Option<PathBuf>) -> anyhow::Result<Vec<PathBuf>> {
    match path {
        Some(path) if path.is_dir() => {
            let images = scanner::scan_folder(&path)?;
            if images.is_empty() {
                return Err(CropDoctorError::NoImagesFound(path.display().to_string()).into());
            }
            Ok(images.into_iter().map(|i| i.path).collect())
        }
        Some(path) => Ok(vec![path]),
        None => Ok(vec![pick_image(&std::env::current_dir()?)?]),
    }
}

fn pick_image(folder: &Path) -> anyhow::Result<PathBuf> {
    let images = scanner::scan_folder(folder)?;
    if images.is_empty() {
        return Err(CropDoctorError::NoImagesFound(folder.display().to_string()).into());
    }

    let names: Vec<&str> = images.iter().map(|i| i.file_name.as_str()).collect();
    let selected = Select::new()
        .with_prompt("Select a crop image to upload")
        .items(&names)
        .default(0)
        .interact()
        .map_err(|e| CropDoctorError::Dialog(e.to_string()))?;

    Ok(images[selected].path.clone())
}
