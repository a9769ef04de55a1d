use clap::{Parser, Subcommand};

use sdci_cli::{ClientError, SdciClient};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "sdci", version, about = "Trigger tasks on an sdci server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a task on the server and exit with its exit code
    Run {
        #[arg(long, env = "SDCI_TOKEN", hide_env_values = true)]
        token: String,
        /// Server address, e.g. `ci.example.com:8842`
        server: String,
        task: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    println!("@ SDCI CLI v{VERSION}\n");

    let code = match cli.command {
        Command::Run {
            token,
            server,
            task,
            args,
        } => {
            println!("Invoking Task {task} with args {args:?}...\n");
            match run(&server, &token, &task, &args).await {
                Ok(code) => code,
                Err(e) => {
                    eprintln!("[Client Failed to execute task] - {e}");
                    1
                }
            }
        }
    };
    std::process::exit(code);
}

/// Stream the run, then report the recorded exit code (1 when absent).
async fn run(server: &str, token: &str, task: &str, args: &[String]) -> Result<i32, ClientError> {
    let client = SdciClient::new(server, token);
    let mut stdout = std::io::stdout();
    client.trigger(task, args, &mut stdout).await?;
    println!();

    let record = client.status(task).await?;
    Ok(record.exit_code.unwrap_or(1))
}
