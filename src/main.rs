use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use course_assistant::config::{ClientConfig, ConfigError};
use course_assistant::net::gateway::{ApiRequest, GatewayError};
use course_assistant::net::payload::FormData;
use course_assistant::router::RouterError;
use course_assistant::state::store::ActionFailure;
use course_assistant::util::date::{DateInput, relative_time};
use course_assistant::{App, AppError};
use serde_json::{Map, Value, json};
use time::OffsetDateTime;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    App(#[from] AppError),
    #[error("{0}")]
    Action(#[from] ActionFailure),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Router(#[from] RouterError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("not logged in; run `course-assistant login` first")]
    NotLoggedIn,
}

#[derive(Parser, Debug)]
#[command(name = "course-assistant", about = "Software engineering course assistant client")]
struct Cli {
    /// Overrides the environment-derived API base URL.
    #[arg(long)]
    base_url: Option<String>,

    #[arg(long, env = "SESSION_STORE_PATH", default_value = ".course-assistant/session.json")]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        username: String,
        #[arg(long, env = "COURSE_ASSISTANT_PASSWORD")]
        password: String,
    },
    Register {
        /// Registration field as key=value; repeatable.
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },
    Logout,
    Whoami {
        /// Ask the backend instead of reading the local session.
        #[arg(long, default_value_t = false)]
        remote: bool,
    },
    Conversations(ConversationsCommand),
    KnowledgeBases,
    /// Run a navigation through the route guard and print where it lands.
    Navigate { path: String },
    Routes,
    /// Multipart POST to any backend path (agent endpoints).
    Post(PostArgs),
    RelativeTime { date: String },
}

#[derive(Args, Debug)]
struct ConversationsCommand {
    #[command(subcommand)]
    command: ConversationsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ConversationsSubcommand {
    List,
    Delete { id: String },
    Clear,
}

#[derive(Args, Debug)]
struct PostArgs {
    path: String,

    #[arg(long = "field", value_parser = parse_key_value)]
    fields: Vec<(String, String)>,

    /// File part as key=path; repeatable.
    #[arg(long = "file", value_parser = parse_key_value)]
    files: Vec<(String, String)>,

    /// Write the raw response body here instead of printing JSON.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.api_base_url = base_url.trim_end_matches('/').to_owned();
    }
    config.storage_path = Some(cli.session_file);

    let app = App::from_config(config)?;
    let _watcher = app.spawn_session_watcher();

    match cli.command {
        Command::Login { username, password } => {
            app.store.login(&username, &password).await?;
            eprintln!("logged in as {username}");
            Ok(())
        }
        Command::Register { fields } => {
            let fields: Map<String, Value> = fields.into_iter().map(|(k, v)| (k, Value::String(v))).collect();
            print_json(&app.store.register(fields).await?)
        }
        Command::Logout => {
            app.store.logout();
            eprintln!("logged out");
            Ok(())
        }
        Command::Whoami { remote } => run_whoami(&app, remote).await,
        Command::Conversations(conversations) => run_conversations(&app, conversations).await,
        Command::KnowledgeBases => {
            require_login(&app)?;
            print_json(&app.store.fetch_knowledge_bases().await?)
        }
        Command::Navigate { path } => {
            let nav = app.router.push(&path)?;
            print_json(&json!({
                "location": nav.location.full_path(),
                "route": nav.route,
                "title": nav.title,
            }))
        }
        Command::Routes => {
            for (pattern, record) in app.router.routes().patterns() {
                let lock = if record.meta.requires_auth { "auth" } else { "-" };
                println!("{pattern:<24} {lock:<5} {}", record.name);
            }
            Ok(())
        }
        Command::Post(args) => run_post(&app, args).await,
        Command::RelativeTime { date } => {
            let input = date.parse::<i64>().map_or(DateInput::Text(date), DateInput::Millis);
            println!("{}", relative_time(input, OffsetDateTime::now_utc(), app.config.display_offset));
            Ok(())
        }
    }
}

async fn run_whoami(app: &App, remote: bool) -> Result<(), CliError> {
    require_login(app)?;
    if remote {
        return print_json(&app.api.auth().get_profile().await?);
    }
    print_json(&json!({
        "user_id": app.session.user_id(),
        "username": app.session.username(),
        "is_admin": app.session.is_admin(),
    }))
}

async fn run_conversations(app: &App, conversations: ConversationsCommand) -> Result<(), CliError> {
    require_login(app)?;
    match conversations.command {
        ConversationsSubcommand::List => print_json(&app.store.fetch_conversations().await?),
        ConversationsSubcommand::Delete { id } => {
            app.store.delete_conversation(&id).await?;
            eprintln!("deleted conversation {id}");
            Ok(())
        }
        ConversationsSubcommand::Clear => print_json(&app.api.conversations().delete_all().await?),
    }
}

async fn run_post(app: &App, args: PostArgs) -> Result<(), CliError> {
    let mut form: FormData = args.fields.into_iter().collect();
    for (name, path) in args.files {
        let bytes = tokio::fs::read(&path).await?;
        let file_name = PathBuf::from(&path)
            .file_name()
            .map_or_else(|| path.clone(), |n| n.to_string_lossy().into_owned());
        form = form.file(name, file_name, bytes, None);
    }

    let request = ApiRequest::post(args.path, form);
    match args.output {
        Some(output) => {
            let bytes = app.gateway.send_bytes(request).await?;
            tokio::fs::write(&output, &bytes).await?;
            eprintln!("wrote {} bytes to {}", bytes.len(), output.display());
            Ok(())
        }
        None => print_json(&app.gateway.send(request).await?),
    }
}

fn require_login(app: &App) -> Result<(), CliError> {
    if app.session.is_logged_in() { Ok(()) } else { Err(CliError::NotLoggedIn) }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_owned(), v.to_owned()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
