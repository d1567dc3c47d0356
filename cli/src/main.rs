//! PortReaper CLI - Free ports held by respawning dev servers
//!
//! A command-line tool for listing bound ports, killing the processes
//! behind them, and chasing the supervisors that bring them back.

mod commands;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "portreaper")]
#[command(author, version, about = "Free ports held by respawning dev servers")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List listening ports
    #[command(alias = "ls")]
    List {
        /// Filter by port number
        #[arg(short, long)]
        port: Option<u16>,

        /// Search process name, port and PID
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Show every process, not only development servers
        #[arg(short, long)]
        all: bool,
    },

    /// Kill the process on a port and watch for a respawn
    Kill {
        /// Port number to free
        #[arg(required_unless_present = "pid")]
        port: Option<u16>,

        /// Kill this PID instead of looking up a port
        #[arg(long, conflicts_with = "port")]
        pid: Option<u32>,

        /// Kill respawning parents without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the parent of a process
    Parent { pid: u32 },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current settings
    Show,
    /// Set the pause between a kill and the verification scan
    SetSettleDelay {
        /// Delay in milliseconds
        millis: u64,
    },
    /// Set how many parents one respawn chase may kill
    SetMaxDepth { depth: usize },
}

fn init_logging(verbose: u8) -> anyhow::Result<()> {
    // The -v flag wins over PORTREAPER_LOG for the overall level;
    // the variable can still tune individual crates.
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.parse()?)
        .with_env_var("PORTREAPER_LOG")
        .from_env()?;
    let env_filter = if verbose > 0 {
        env_filter.add_directive(level.parse()?)
    } else {
        env_filter
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_target(false);

    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter)
        .init();

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Some(Commands::List { port, name, all }) => {
            commands::list::run(port, name, all, cli.json).await?;
        }
        Some(Commands::Kill { port, pid, yes }) => {
            let target = match (port, pid) {
                (_, Some(pid)) => commands::kill::Target::Pid(pid),
                (Some(port), None) => commands::kill::Target::Port(port),
                (None, None) => anyhow::bail!("Specify a port or --pid"),
            };
            commands::kill::run(target, yes, cli.json).await?;
        }
        Some(Commands::Parent { pid }) => {
            commands::parent::run(pid, cli.json).await?;
        }
        Some(Commands::Config { action }) => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => commands::config::show(cli.json).await?,
            ConfigAction::SetSettleDelay { millis } => {
                commands::config::set_settle_delay(millis).await?
            }
            ConfigAction::SetMaxDepth { depth } => commands::config::set_max_depth(depth).await?,
        },
        None => {
            commands::list::run(None, None, false, cli.json).await?;
        }
    }

    Ok(())
}
