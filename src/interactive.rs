//! 対話式ダッシュボード
//!
//! 画面状態ごとにメニューを出し、選ばれた操作を `Dashboard` に渡す。
//! 操作の失敗は状態側に保存されて次の描画で表示されるので、ここでは止めない。

use crate::cli::ExportFormat;
use crate::dashboard::Dashboard;
use crate::error::Result;
use crate::gateway::Backend;
use crate::render;
use chemvis_common::{AuthMode, ViewState};
use dialoguer::{Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

const QUIT: &str = "Quit";

enum Flow {
    Continue,
    Quit,
}

pub async fn run<B: Backend>(dashboard: &mut Dashboard<B>) -> Result<()> {
    loop {
        println!("\n{}\n", render::render(dashboard.state()));

        let flow = match dashboard.state().view() {
            ViewState::Intro => intro_menu(dashboard).await?,
            ViewState::AuthForm(mode) => auth_menu(dashboard, mode).await?,
            ViewState::Dashboard => dashboard_menu(dashboard).await?,
        };

        if let Flow::Quit = flow {
            return Ok(());
        }
    }
}

fn select(prompt: &str, items: &[&str]) -> Result<usize> {
    let choice = Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact()?;
    Ok(choice)
}

async fn intro_menu<B: Backend>(dashboard: &mut Dashboard<B>) -> Result<Flow> {
    match select("Menu", &["Get Started", QUIT])? {
        0 => {
            dashboard.proceed().await;
            Ok(Flow::Continue)
        }
        _ => Ok(Flow::Quit),
    }
}

async fn auth_menu<B: Backend>(dashboard: &mut Dashboard<B>, mode: AuthMode) -> Result<Flow> {
    match select(mode.title(), &[mode.submit_label(), mode.switch_label(), QUIT])? {
        0 => {
            let username: String = Input::new()
                .with_prompt("Username")
                .allow_empty(true)
                .interact_text()?;
            let password = Password::new()
                .with_prompt("Password")
                .allow_empty_password(true)
                .interact()?;
            if let Err(err) = dashboard.submit_auth(username.trim(), &password).await {
                tracing::debug!(error = %err, "auth attempt failed");
            }
            Ok(Flow::Continue)
        }
        1 => {
            dashboard.toggle_mode();
            Ok(Flow::Continue)
        }
        _ => Ok(Flow::Quit),
    }
}

async fn dashboard_menu<B: Backend>(dashboard: &mut Dashboard<B>) -> Result<Flow> {
    let items = [
        "Select CSV file",
        "Upload & Analyze",
        "Refresh history",
        "Open history entry",
        "Export report",
        "Logout",
        QUIT,
    ];

    match select("Dashboard", &items)? {
        0 => {
            let path: String = Input::new().with_prompt("CSV file").interact_text()?;
            dashboard.select_file(PathBuf::from(path.trim()));
        }
        1 => {
            let spinner = upload_spinner();
            let result = dashboard.upload().await;
            spinner.finish_and_clear();
            match result {
                Ok(()) => println!("✔ アップロード完了"),
                Err(err) => tracing::debug!(error = %err, "upload failed"),
            }
        }
        2 => {
            if let Err(err) = dashboard.refresh_history().await {
                tracing::debug!(error = %err, "history refresh failed");
            }
        }
        3 => open_history(dashboard).await?,
        4 => export(dashboard)?,
        5 => dashboard.logout(),
        _ => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

async fn open_history<B: Backend>(dashboard: &mut Dashboard<B>) -> Result<()> {
    let labels: Vec<String> = dashboard
        .state()
        .dashboard()
        .history
        .iter()
        .map(|entry| format!("{}  {}", entry.file_name, entry.uploaded_date()))
        .collect();
    if labels.is_empty() {
        println!("履歴がありません");
        return Ok(());
    }

    let index = Select::new()
        .with_prompt("History")
        .items(&labels[..])
        .default(0)
        .interact()?;
    if let Err(err) = dashboard.open_history_index(index).await {
        println!("✖ {}", err);
    }
    Ok(())
}

fn export<B: Backend>(dashboard: &Dashboard<B>) -> Result<()> {
    let formats = [ExportFormat::Pdf, ExportFormat::Excel, ExportFormat::Both];
    let labels: Vec<String> = formats.iter().map(|f| f.to_string()).collect();
    let choice = Select::new()
        .with_prompt("Format")
        .items(&labels[..])
        .default(0)
        .interact()?;
    let output: String = Input::new()
        .with_prompt("Output directory")
        .default(".".to_string())
        .interact_text()?;

    match dashboard.export_report(&formats[choice], &PathBuf::from(output.trim())) {
        Ok(paths) => {
            for path in paths {
                println!("✔ レポートを保存: {}", path.display());
            }
        }
        Err(err) => println!("✖ {}", err),
    }
    Ok(())
}

fn upload_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.set_message("Uploading...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
