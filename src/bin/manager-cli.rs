use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "manager-cli")]
#[command(about = "Command-line client for the Traefik Manager API", long_about = None)]
struct Cli {
    /// API base URL, including the base path
    #[arg(short, long, env = "MANAGER_URL", default_value = "http://localhost:9000/api/v1")]
    url: String,

    /// Shared secret sent with every request
    #[arg(short, long, env = "MANAGER_API_KEY")]
    key: Option<String>,

    /// Header carrying the shared secret
    #[arg(long, default_value = "X-API-Key")]
    header: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Routers,
    Services,
    Middlewares,
}

impl Kind {
    fn path(self) -> &'static str {
        match self {
            Kind::Routers => "routers",
            Kind::Services => "services",
            Kind::Middlewares => "middlewares",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check manager health
    Health,
    /// List every resource of a kind
    List { kind: Kind },
    /// Show one resource
    Get { kind: Kind, id: String },
    /// Delete one resource
    Delete { kind: Kind, id: String },
    /// Create a resource from a JSON file (`-` reads stdin)
    Apply {
        kind: Kind,
        file: PathBuf,
        /// Replace an existing resource instead of creating one
        #[arg(long)]
        update: bool,
    },
    /// Fetch the configuration served to the gateway
    Provider {
        /// Provider endpoint, relative to the server root
        #[arg(long, default_value = "/traefik/provider")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(
            HeaderName::from_bytes(cli.header.as_bytes())?,
            HeaderValue::from_str(key)?,
        );
    }
    let client = reqwest::Client::builder().default_headers(headers).build()?;
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::Health => client.get(format!("{base}/health")),
        Commands::List { kind } => client.get(format!("{base}/{}", kind.path())),
        Commands::Get { kind, id } => client.get(format!("{base}/{}/{id}", kind.path())),
        Commands::Delete { kind, id } => client.delete(format!("{base}/{}/{id}", kind.path())),
        Commands::Apply { kind, file, update } => {
            let body: Value = serde_json::from_str(&read_input(&file)?)?;
            if update {
                let id = body
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or("--update needs an \"id\" field in the document")?
                    .to_string();
                client
                    .put(format!("{base}/{}/{id}", kind.path()))
                    .json(&body)
            } else {
                client.post(format!("{base}/{}", kind.path())).json(&body)
            }
        }
        Commands::Provider { path } => {
            let root = reqwest::Url::parse(base)?.join(&path)?;
            client.get(root)
        }
    };

    print_response(request.send().await?).await
}

fn read_input(file: &Path) -> std::io::Result<String> {
    if file.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin())
    } else {
        std::fs::read_to_string(file)
    }
}

/// Prints the body; returns whether the status was a success.
async fn print_response(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{rendered}");
        Ok(true)
    } else {
        eprintln!("Error: API returned status {status}");
        eprintln!("{rendered}");
        Ok(false)
    }
}
