use std::process::ExitCode;

use catclient_lib::{
    init_tracing, AccountMode, AppState, LauncherConfig, LauncherResult, ProcessState,
};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "catclient", version, about = "Minecraft launch core")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the versions offered by the manifest.
    Versions,
    /// Check credentials against the authentication server.
    Login {
        username: String,
        #[arg(long, env = "CATCLIENT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show or change the account mode.
    Mode {
        #[arg(value_enum)]
        mode: Option<ModeArg>,
    },
    /// Show the Java runtime, installing it with `--install`.
    Runtime {
        #[arg(long)]
        install: bool,
    },
    /// Launch a version and wait for the game to exit.
    Launch {
        version: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long, env = "CATCLIENT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Offline,
    ThirdPartyAuth,
}

impl From<ModeArg> for AccountMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Offline => AccountMode::Offline,
            ModeArg::ThirdPartyAuth => AccountMode::ThirdPartyAuth,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> LauncherResult<ExitCode> {
    let state = AppState::new(LauncherConfig::from_env())?;

    match command {
        Command::Versions => {
            state.catalog.refresh().await?;
            let default = state.catalog.default_selection().await;
            for id in state.catalog.snapshot().await.ids() {
                let marker = if default.as_deref() == Some(id.as_str()) {
                    " (default)"
                } else {
                    ""
                };
                println!("{id}{marker}");
            }
        }
        Command::Login { username, password } => {
            let identity = state.auth.authenticate(&username, &password).await?;
            println!("Signed in as {} ({})", identity.profile_name, identity.profile_id);
        }
        Command::Mode { mode } => {
            if let Some(mode) = mode {
                state.set_mode(mode.into()).await?;
            }
            println!("{}", state.config.load().await?.mode.as_str());
        }
        Command::Runtime { install } => {
            let handle = if install {
                state.runtime.ensure().await?
            } else {
                state.runtime.status().await?
            };
            let status = if handle.available { "available" } else { "missing" };
            println!("{} ({status})", handle.executable_path.display());
        }
        Command::Launch {
            version,
            username,
            password,
        } => {
            if let Some(username) = username {
                let password = password.unwrap_or_default();
                state.auth.authenticate(&username, &password).await?;
            }

            state.catalog.refresh().await?;
            let version = match version {
                Some(version) => version,
                None => state.catalog.default_selection().await.unwrap_or_default(),
            };

            let mut handle = state.launcher.launch(&version).await?;
            println!("Started {} (PID {})", handle.version_id(), handle.pid());
            return Ok(match handle.wait().await {
                ProcessState::Exited { code: Some(0) } => ExitCode::SUCCESS,
                ProcessState::Exited { code } => {
                    println!("Game exited with code {code:?}");
                    ExitCode::FAILURE
                }
                ProcessState::Failed(reason) => {
                    println!("Game supervision failed: {reason}");
                    ExitCode::FAILURE
                }
                ProcessState::Running => ExitCode::SUCCESS,
            });
        }
    }

    Ok(ExitCode::SUCCESS)
}
