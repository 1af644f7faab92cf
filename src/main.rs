use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "goalplan", about = "Household goal projection and amortization planner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Serve the plan API over HTTP")]
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    #[command(about = "Evaluate one plan and print the response JSON to stdout")]
    Plan {
        #[arg(long, help = "Plan payload file; uses the built-in default plan when omitted")]
        input: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve { port } => {
            if let Err(e) = goalplan::api::run_http_server(port).await {
                eprintln!("Server error: {e}");
                process::exit(1);
            }
        }
        Command::Plan { input, pretty } => {
            if let Err(e) = goalplan::api::run_plan_file(input.as_deref(), pretty) {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    }
}
