use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grade_ledger::{
    api,
    client::GradingClient,
    config::ClientConfig,
    models::{Notebook, Role, SessionContext, SubmissionKey},
    render,
    sync::LedgerSync,
};

#[derive(Parser)]
#[command(name = "gradectl")]
#[command(about = "Inspect and grade notebook submissions")]
struct Cli {
    /// Grading service base URL (overrides the config file)
    #[arg(long, env = "GRADER_URL", global = true)]
    url: Option<String>,

    /// API token (overrides the config file)
    #[arg(long, env = "GRADER_API_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SubmissionArgs {
    #[arg(long)]
    lecture: u64,
    #[arg(long)]
    assignment: u64,
    #[arg(long)]
    submission: u64,
    /// Your role in the lecture
    #[arg(long, default_value = "instructor", value_parser = parse_role)]
    role: Role,
}

impl SubmissionArgs {
    fn key(&self) -> SubmissionKey {
        SubmissionKey::new(self.lecture, self.assignment, self.submission)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the grading role of every cell in a notebook file
    Classify {
        notebook: PathBuf,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show the grade ledger of a submission
    Show {
        #[command(flatten)]
        submission: SubmissionArgs,
        /// Print the raw properties payload
        #[arg(long)]
        json: bool,
    },
    /// Edit one cell's grade and save the ledger
    Grade {
        #[command(flatten)]
        submission: SubmissionArgs,
        #[arg(long)]
        notebook: String,
        #[arg(long)]
        cell: String,
        #[arg(long)]
        score: Option<f64>,
        #[arg(long)]
        extra_credit: Option<f64>,
        #[arg(long)]
        comment: Option<String>,
        /// Point budget to check the score against (defaults to the cell's max_score)
        #[arg(long)]
        max_points: Option<f64>,
    },
    /// Run the in-memory reference grading service
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "4010")]
        port: u16,

        /// JSON file with submissions to preload
        #[arg(long)]
        seed: Option<PathBuf>,
    },
}

fn parse_role(s: &str) -> Result<Role, String> {
    Role::from_str(s).ok_or_else(|| format!("unknown role '{}'", s))
}

/// Initialize tracing with output to stderr so stdout carries command output
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "grade_ledger=info,tower_http=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn ledger_sync(cli_url: Option<String>, cli_token: Option<String>, args: &SubmissionArgs) -> LedgerSync {
    let mut config = ClientConfig::load();
    if let Some(url) = cli_url {
        config.base_url = url;
    }
    if let Some(token) = cli_token {
        config.api_token = Some(token);
    }

    let username = config
        .username
        .clone()
        .unwrap_or_else(|| std::env::var("USER").unwrap_or_else(|_| "grader".to_string()));
    let context = SessionContext::new(username).with_role(args.lecture, args.role);
    LedgerSync::new(GradingClient::from_config(&config), context)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Classify { notebook, json } => {
            let content = std::fs::read_to_string(&notebook)
                .with_context(|| format!("Failed to read {}", notebook.display()))?;
            let parsed = Notebook::from_json(&content).context("Failed to parse notebook")?;
            let tools = parsed.classify_cells();

            if json {
                println!("{}", serde_json::to_string_pretty(&tools)?);
            } else {
                for (i, tool) in tools.iter().enumerate() {
                    let points = tool
                        .points
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:>3}  {:<12} {:<24} {}",
                        i,
                        tool.kind.as_str(),
                        tool.id.as_deref().unwrap_or("-"),
                        points
                    );
                }
            }
        }
        Commands::Show { submission, json } => {
            let sync = ledger_sync(cli.url, cli.token, &submission);
            let ledger = sync.load(&submission.key()).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&ledger.to_value()?)?);
            } else {
                print!("{}", render::render_summary(&ledger));
            }
        }
        Commands::Grade {
            submission,
            notebook,
            cell,
            score,
            extra_credit,
            comment,
            max_points,
        } => {
            let sync = ledger_sync(cli.url, cli.token, &submission);
            let key = submission.key();
            let mut ledger = sync.load(&key).await?;

            if let Some(score) = score {
                match max_points.or(ledger.max_score(&notebook, &cell)?) {
                    Some(points) => ledger.set_manual_score_checked(&notebook, &cell, score, points)?,
                    None => ledger.set_manual_score(&notebook, &cell, score)?,
                }
            }
            if let Some(extra_credit) = extra_credit {
                ledger.set_extra_credit_checked(&notebook, &cell, extra_credit)?;
            }
            if let Some(comment) = comment {
                ledger.set_comment(&notebook, &cell, comment)?;
            }

            sync.save(&key, &ledger).await?;
            print!("{}", render::render_summary(&ledger));
        }
        Commands::Serve { port, seed } => {
            let store = match seed {
                Some(path) => {
                    let content = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    api::GradingStore::from_seed(&content).context("Failed to parse seed file")?
                }
                None => api::GradingStore::new(),
            };
            tracing::info!("Loaded {} submissions", store.len());

            let app = api::create_router(store, api::middleware::AuthConfig::from_env());

            let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
            tracing::info!(
                "Grading service listening on http://127.0.0.1:{}{}",
                port,
                api::BASE_PATH
            );

            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_connection_flags_read_the_environment() {
        let command = Cli::command();
        let env_of = |name: &str| {
            command
                .get_arguments()
                .find(|arg| arg.get_id() == name)
                .and_then(|arg| arg.get_env())
                .map(|env| env.to_string_lossy().into_owned())
        };
        assert_eq!(env_of("url").as_deref(), Some("GRADER_URL"));
        assert_eq!(env_of("token").as_deref(), Some("GRADER_API_TOKEN"));
    }

    #[test]
    fn test_flag_overrides_environment() {
        let cli = Cli::try_parse_from([
            "gradectl",
            "--url",
            "http://127.0.0.1:9000/services/grader",
            "show",
            "--lecture",
            "1",
            "--assignment",
            "2",
            "--submission",
            "7",
        ])
        .unwrap();
        assert_eq!(cli.url.as_deref(), Some("http://127.0.0.1:9000/services/grader"));
        let Commands::Show { submission, .. } = cli.command else {
            panic!("expected show command");
        };
        assert_eq!(submission.key(), SubmissionKey::new(1, 2, 7));
        assert_eq!(submission.role, Role::Instructor);
    }
}
