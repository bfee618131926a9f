#![deny(warnings)]

mod page;
mod routes;
mod state;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use language_assistant_core::completion::OpenAiCompletionClient;
use language_assistant_core::config::{
    resolve_app_config, resolve_optional_string, AppConfig, ConfigOverrides, Env, FileConfig,
    StdEnv, ENV_CONFIG_PATH,
};
use language_assistant_core::controller::{Controller, ControllerConfig};
use language_assistant_core::form::{FormState, TranslationRequest};
use language_assistant_core::options::{Language, Politeness, Proficiency};
use language_assistant_core::prompt::build_prompt;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use state::AppState;

const DEFAULT_CONFIG_FILE: &str = "language-assistant.toml";

#[derive(Parser, Debug)]
#[command(name = "language-assistant")]
#[command(about = "Sentence translator with politeness control and vocabulary notes")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// TOML config file (defaults to ./language-assistant.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    openai_key: Option<String>,

    #[arg(long, global = true)]
    openai_base_url: Option<String>,

    #[arg(long, global = true)]
    model: Option<String>,

    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the web app (default)
    Serve(ServeArgs),
    /// Translate one sentence and print the model's answer
    Translate(RequestArgs),
    /// Print the prompt that would be sent, without calling the API
    Prompt(RequestArgs),
}

#[derive(ClapArgs, Debug, Default)]
struct ServeArgs {
    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,
}

#[derive(ClapArgs, Debug)]
struct RequestArgs {
    text: String,

    #[arg(long, default_value = "English")]
    from: Language,

    #[arg(long, default_value = "Japanese")]
    to: Language,

    #[arg(long, default_value = "Workplace Casual")]
    politeness: Politeness,

    #[arg(long, default_value = "Beginner")]
    proficiency: Proficiency,

    #[arg(long, default_value = "")]
    instructions: String,
}

impl RequestArgs {
    fn into_request(self) -> TranslationRequest {
        TranslationRequest {
            source_text: self.text,
            optional_instructions: self.instructions,
            input_language: self.from,
            output_language: self.to,
            politeness: self.politeness,
            proficiency: self.proficiency,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let command = args
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    let serve = match &command {
        Command::Serve(serve) => Some(serve),
        _ => None,
    };
    let overrides = ConfigOverrides {
        host: serve.and_then(|s| s.host.clone()),
        port: serve.and_then(|s| s.port),
        api_key: args.openai_key,
        base_url: args.openai_base_url,
        model: args.model,
    };
    let cfg = build_config(args.config, overrides, &env)?;

    tracing::info!(
        app_name = %cfg.app_name,
        model = cfg.completion.model.as_str(),
        credential_configured = cfg.completion.api_key.is_some(),
        "config loaded"
    );

    match command {
        Command::Serve(_) => run_server(cfg).await,
        Command::Translate(req) => run_translate(cfg, req.into_request()).await,
        Command::Prompt(req) => {
            println!("{}", build_prompt(&req.into_request()));
            Ok(())
        }
    }
}

fn build_controller(cfg: &AppConfig) -> Controller {
    Controller::new(
        ControllerConfig::from_completion(&cfg.completion),
        OpenAiCompletionClient::new(cfg.completion.base_url.clone()),
    )
}

async fn run_server(cfg: AppConfig) -> anyhow::Result<()> {
    let addr = cfg.server.socket_addr()?;
    if cfg.completion.api_key.is_none() {
        tracing::warn!("no completion api credential configured; translations will fail until one is set");
    }

    let state = AppState::new(&cfg.app_name, build_controller(&cfg));
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "serving");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_translate(cfg: AppConfig, request: TranslationRequest) -> anyhow::Result<()> {
    let controller = build_controller(&cfg);
    let mut form = FormState::new();
    form.apply(request);

    if let Err(err) = controller.submit(&mut form).await {
        anyhow::bail!("{}", err.notice().message);
    }
    if let Some(result) = form.result() {
        println!("{}", result.raw_response_text);
    }
    Ok(())
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

/// An explicitly named config file must exist; the default one is optional.
fn build_config(
    cli_path: Option<PathBuf>,
    overrides: ConfigOverrides,
    env: &impl Env,
) -> anyhow::Result<AppConfig> {
    let explicit = resolve_optional_string(
        cli_path.map(|p| p.display().to_string()),
        ENV_CONFIG_PATH,
        env,
    );

    let file = match explicit {
        Some(path) => FileConfig::load(Path::new(&path))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            FileConfig::load(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => FileConfig::default(),
    };

    Ok(resolve_app_config(overrides, file, env)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use language_assistant_core::config::MapEnv;

    fn temp_config(prefix: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("{prefix}_{}_{nanos}.toml", std::process::id()))
    }

    #[test]
    fn named_config_file_must_exist() {
        let missing = temp_config("missing");
        let env = MapEnv::default().with_var(ENV_CONFIG_PATH, &missing.display().to_string());
        let err = build_config(None, ConfigOverrides::default(), &env).expect_err("should fail");
        assert!(err.to_string().contains("failed to read config file"));

        let err = build_config(Some(missing), ConfigOverrides::default(), &MapEnv::default())
            .expect_err("should fail");
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn flag_path_beats_env_path() {
        let path = temp_config("flag_path");
        std::fs::write(&path, "app_name = \"From Flag\"\n").expect("write");
        let env = MapEnv::default()
            .with_var(ENV_CONFIG_PATH, &temp_config("unused").display().to_string());

        let cfg = build_config(Some(path.clone()), ConfigOverrides::default(), &env);
        let _ = std::fs::remove_file(&path);
        assert_eq!(cfg.expect("valid config").app_name, "From Flag");
    }

    #[test]
    fn blank_key_still_builds_a_config() {
        let path = temp_config("blank_key");
        std::fs::write(&path, "[completion]\napi_key = \"\"\n").expect("write");
        let env = MapEnv::default().with_var("OPENAI_KEY", "");

        let cfg = build_config(Some(path.clone()), ConfigOverrides::default(), &env);
        let _ = std::fs::remove_file(&path);
        assert!(cfg.expect("valid config").completion.api_key.is_none());
    }

    #[test]
    fn request_args_parse_option_labels() {
        let args = Args::try_parse_from([
            "language-assistant",
            "prompt",
            "Hello",
            "--to",
            "Mandarin Chinese",
            "--politeness",
            "Super Polite",
        ])
        .expect("valid args");
        let Some(Command::Prompt(req)) = args.command else {
            panic!("expected prompt subcommand");
        };
        let request = req.into_request();
        assert_eq!(request.output_language, Language::MandarinChinese);
        assert_eq!(request.politeness, Politeness::SuperPolite);
        assert_eq!(request.proficiency, Proficiency::Beginner);
    }
}
