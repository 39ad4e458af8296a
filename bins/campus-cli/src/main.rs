mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "campus-cli")]
#[command(about = "Campus judge CLI - Manage coding challenges and run submissions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a coding challenge to the catalog
    AddChallenge {
        /// Challenge title
        #[arg(short, long)]
        title: String,

        /// Problem statement
        #[arg(short, long)]
        description: String,

        /// Description of the input the program receives
        #[arg(short, long)]
        input_format: String,

        /// Output a correct program prints
        #[arg(short, long)]
        expected_output: String,
    },

    /// List challenges, newest first
    ListChallenges {
        /// Print JSON instead of a table
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Delete a challenge together with its submissions
    DeleteChallenge {
        /// Challenge id
        #[arg(short, long)]
        id: u64,

        /// Skip confirmation
        #[arg(short, long, default_value = "false")]
        yes: bool,
    },

    /// Evaluate a source file against a challenge and record the submission
    Submit {
        /// Source file to run
        #[arg(short, long)]
        file: PathBuf,

        /// Challenge id
        #[arg(short, long)]
        challenge: u64,

        /// Submitting user id
        #[arg(short, long)]
        user: u64,

        /// Language (python, java, cpp, c, javascript, csharp)
        #[arg(short, long, default_value = "python")]
        language: String,

        /// Standard input for the run
        #[arg(long, default_value = "")]
        input: String,
    },

    /// Show a user's submission history, newest first
    Submissions {
        /// User id
        #[arg(short, long)]
        user: u64,

        /// Print JSON instead of a table
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::AddChallenge {
            title,
            description,
            input_format,
            expected_output,
        } => {
            commands::add_challenge(title, description, input_format, expected_output).await?;
        }
        Commands::ListChallenges { json } => {
            commands::list_challenges(json).await?;
        }
        Commands::DeleteChallenge { id, yes } => {
            commands::delete_challenge(id, yes).await?;
        }
        Commands::Submit {
            file,
            challenge,
            user,
            language,
            input,
        } => {
            commands::submit(&file, challenge, user, language, input).await?;
        }
        Commands::Submissions { user, json } => {
            commands::list_submissions(user, json).await?;
        }
    }

    Ok(())
}
