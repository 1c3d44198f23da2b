use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};

mod commands;

use commands::{ClusterArgs, InputArgs};

#[derive(Parser)]
#[command(
    name = "tilegrid",
    about = "Tilegrid: tile placement for multi-sample structured-grid runs",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register samples and verify the job has enough ranks.
    ///
    /// Samples are registered in command-line order, -i and -m interleaved
    /// as given; each -m file adds two samples.
    Check {
        #[command(flatten)]
        inputs: InputArgs,
        /// Ranks supplied to the job
        #[arg(short, long)]
        ranks: u32,
    },
    /// Print the rank, slot and processor of every tile of every sample.
    Plan {
        #[command(flatten)]
        inputs: InputArgs,
        #[command(flatten)]
        cluster: ClusterArgs,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tilegrid=info".parse()?)
        )
        .init();

    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    let Some((_, sub)) = matches.subcommand() else {
        anyhow::bail!("no subcommand given");
    };

    match cli.command {
        Commands::Check { inputs, ranks } => commands::check::check(&inputs.with_positions(sub), ranks),
        Commands::Plan { inputs, cluster, format } => {
            commands::plan::plan(&inputs.with_positions(sub), &cluster, &format)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subcommand_matches_carry_input_positions() {
        let matches = Cli::command()
            .try_get_matches_from(["tilegrid", "check", "-m", "pair.toml", "-i", "one.toml", "--ranks", "4"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "check");

        let first = |id: &str| sub.indices_of(id).and_then(|mut i| i.next()).unwrap();
        assert!(first("duals") < first("singles"));
    }
}
