use chrono::Weekday;
use clap::Parser;
use reqwest::Url;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iteration_keeper::client::AzdoClient;
use iteration_keeper::config::{self, IterationConfig};
use iteration_keeper::lifecycle;

#[derive(Parser)]
#[command(name = "itkeep")]
#[command(
    about = "Create a year of bi-weekly sprint iterations, assign them to teams, and retire old ones"
)]
struct Cli {
    /// Personal access token
    #[arg(long, env = "AZDO_PAT", hide_env_values = true)]
    pat: String,

    /// Organization URI, e.g. https://dev.azure.com/fabrikam
    #[arg(short, long)]
    account_uri: Url,

    /// Year to create the sprint iterations for
    #[arg(short, long)]
    year: i32,

    /// Team to assign the iterations to (repeatable)
    #[arg(short, long = "team", required = true)]
    teams: Vec<String>,

    /// Project name
    #[arg(short, long)]
    project_name: String,

    /// Root iteration path, relative to the project's iteration root
    #[arg(short = 'i', long)]
    root_iteration_path: String,

    /// Number of finished iterations each team keeps
    #[arg(short = 'k', long = "number-iteration-keep", default_value_t = config::DEFAULT_ITERATIONS_TO_KEEP)]
    iterations_to_keep: usize,

    /// Weekday sprints start on
    #[arg(short = 'd', long, default_value = "Monday", value_parser = parse_weekday)]
    first_day_of_sprint: Weekday,

    /// Do not create sprints that already finished
    #[arg(short = 'f', long)]
    only_create_if_future: bool,
}

impl Cli {
    fn into_config(self) -> IterationConfig {
        IterationConfig {
            pat: self.pat,
            account_uri: self.account_uri,
            year: self.year,
            teams: self.teams,
            project: self.project_name,
            root_iteration_path: self.root_iteration_path,
            iterations_to_keep: self.iterations_to_keep,
            first_day_of_sprint: self.first_day_of_sprint,
            only_create_if_future: self.only_create_if_future,
        }
    }
}

fn parse_weekday(s: &str) -> Result<Weekday, String> {
    config::parse_weekday(s).map_err(|e| e.to_string())
}

/// Initialize tracing with output to stderr so stdout only carries the run summary
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "iteration_keeper=info,itkeep=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = cli.into_config();
    config.validate()?;
    tracing::debug!(?config, "configuration");

    let client = AzdoClient::new(config.account_uri.clone(), config.pat.clone());
    let report = lifecycle::run(&client, &config, lifecycle::today()).await?;
    println!("{}", report);
    Ok(())
}
