use chemvis::{cli, config, dashboard, error, gateway, interactive, logging, render, session};
use chemvis_common::{AuthMode, ViewState};
use clap::Parser;
use cli::{Cli, Commands, ExportFormat};
use config::Config;
use dashboard::Dashboard;
use dialoguer::{Input, Password};
use error::{ChemVisError, Result};
use gateway::HttpGateway;
use indicatif::{ProgressBar, ProgressStyle};
use session::SessionStore;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("✖ {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(url) = &cli.base_url {
        config.base_url = url.trim_end_matches('/').to_string();
    }
    tracing::debug!(base_url = %config.base_url, "config loaded");

    let store = SessionStore::new(config.session_path()?);

    match cli.command {
        Commands::Dashboard => {
            let mut dashboard = Dashboard::start(HttpGateway::new(&config), store);
            interactive::run(&mut dashboard).await?;
        }

        Commands::Login { username, password } => {
            authenticate(&config, store, AuthMode::Login, username, password).await?;
        }

        Commands::Register { username, password } => {
            authenticate(&config, store, AuthMode::Register, username, password).await?;
        }

        Commands::Logout => match store.load() {
            Some(session) => {
                store.clear()?;
                println!("✔ ログアウトしました: {}", session.username);
            }
            None => println!("ログインしていません"),
        },

        Commands::Whoami => match store.load() {
            Some(session) => println!("{}", session.username),
            None => return Err(ChemVisError::NotAuthenticated),
        },

        Commands::Upload { file, report, format, output } => {
            let mut dashboard = open_dashboard(&config, store).await?;
            dashboard.select_file(file.clone());

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(ProgressStyle::default_spinner());
            spinner.set_message(format!("Uploading {}...", file.display()));
            spinner.enable_steady_tick(Duration::from_millis(100));
            let result = dashboard.upload().await;
            spinner.finish_and_clear();
            result?;

            println!("✔ アップロード完了: {}\n", file.display());
            println!("{}", render::render_dashboard(dashboard.state()));

            if report {
                write_report(&dashboard, &format, output.as_deref())?;
            }
        }

        Commands::History => {
            let mut dashboard = Dashboard::start(HttpGateway::new(&config), store);
            if dashboard.state().session().is_none() {
                return Err(ChemVisError::NotAuthenticated);
            }
            dashboard.enter();
            dashboard.refresh_history().await?;
            print!("{}", render::render_history(&dashboard.state().dashboard().history));
        }

        Commands::Show { id, report, format, output } => {
            let mut dashboard = open_dashboard(&config, store).await?;
            dashboard.open_history_item(id).await?;
            println!("{}", render::render_dashboard(dashboard.state()));

            if report {
                write_report(&dashboard, &format, output.as_deref())?;
            }
        }

        Commands::Config { set_base_url, show } => {
            let mut config = Config::load()?;

            if let Some(url) = set_base_url {
                config.set_base_url(url)?;
                println!("✔ ベースURLを設定しました: {}", config.base_url);
            }

            if show {
                println!("設定:");
                println!("  ベースURL: {}", config.base_url);
                println!("  認証スキーム: {}", config.auth_scheme);
                println!("  セッション: {}", config.session_path()?.display());
                println!("  設定ファイル: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

/// 保存済みセッションでダッシュボードを開く
///
/// 履歴一覧の取得に失敗しても、続くアップロード等はそのまま行う。
async fn open_dashboard(config: &Config, store: SessionStore) -> Result<Dashboard<HttpGateway>> {
    let mut dashboard = Dashboard::start(HttpGateway::new(config), store);
    if dashboard.state().session().is_none() {
        return Err(ChemVisError::NotAuthenticated);
    }
    dashboard.proceed().await;
    Ok(dashboard)
}

async fn authenticate(
    config: &Config,
    store: SessionStore,
    mode: AuthMode,
    username: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let mut dashboard = Dashboard::start(HttpGateway::new(config), store);
    if let Some(session) = dashboard.state().session() {
        println!("ログイン中です: {}（先に `chemvis logout` を実行してください）", session.username);
        return Ok(());
    }

    dashboard.enter();
    if dashboard.state().view() != ViewState::AuthForm(mode) {
        dashboard.toggle_mode();
    }

    let username = match username {
        Some(u) => u,
        None => Input::new().with_prompt("Username").interact_text()?,
    };
    let password = match password {
        Some(p) => p,
        None => Password::new().with_prompt("Password").interact()?,
    };

    dashboard.submit_auth(username.trim(), &password).await?;
    if let Some(session) = dashboard.state().session() {
        println!("✔ {}", render::render_header(&session.username));
    }
    Ok(())
}

fn write_report(dashboard: &Dashboard<HttpGateway>, format: &ExportFormat, output: Option<&Path>) -> Result<()> {
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    for path in dashboard.export_report(format, &output)? {
        println!("✔ レポートを保存: {}", path.display());
    }
    Ok(())
}
