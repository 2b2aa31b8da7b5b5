//! # findfig demo application
//!
//! A sample CLI tool that showcases how to integrate
//! [findfig](https://docs.rs/findfig) into a real application. It exists
//! purely to demonstrate and manually verify findfig's behavior.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example findfig_demo -- myapp find
//! cargo run --example findfig_demo -- myapp discover --select configFiles,boundaries
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                 | How to exercise it                                                         |
//! |-------------------------|----------------------------------------------------------------------------|
//! | First match             | Create `.myapp.yaml` in cwd, then run `myapp find`                         |
//! | Env override            | `MYAPP_CONFIG=/tmp/x.json cargo run --example findfig_demo -- myapp find`  |
//! | Full pentad as JSON     | `cargo run --example findfig_demo -- myapp discover`                       |
//! | Projection              | `cargo run --example findfig_demo -- myapp discover --select configDirs`   |
//! | Custom precedence       | `cargo run --example findfig_demo -- myapp find --precedence user,project` |
//! | Workspace boundary      | `cargo run --example findfig_demo -- myapp workspace`                      |
//! | Extra boundary marker   | `cargo run --example findfig_demo -- myapp workspace --boundary Cargo.toml` |
//! | Config directories      | `cargo run --example findfig_demo -- myapp dirs`                           |
//! | Decision log            | `cargo run --example findfig_demo -- --verbose myapp find`                 |

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use findfig::{DiscoverArgs, Findfig, FindfigBuilder, Found};

// ---------------------------------------------------------------------------
// CLI definitions
// ---------------------------------------------------------------------------

/// findfig demo: locate config files the way a CLI tool would.
#[derive(Parser, Debug)]
#[command(name = "findfig-demo")]
struct Cli {
    /// Log discovery decisions (same as RUST_LOG=findfig=trace).
    #[arg(long, global = true)]
    verbose: bool,

    /// Application name to discover config for.
    app: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the single highest-precedence config file.
    Find(DiscoverArgs),
    /// Print the full discovery result as JSON.
    Discover(DiscoverArgs),
    /// Print the workspace boundary directory.
    Workspace(DiscoverArgs),
    /// Print every config directory, highest precedence first.
    Dirs(DiscoverArgs),
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("findfig=trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn make_builder(app: &str, args: DiscoverArgs) -> FindfigBuilder {
    args.apply(Findfig::builder().app_name(app))
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("Discovery error:\n{e}");
    std::process::exit(1);
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Find(args) => match make_builder(&cli.app, args).find_app_config() {
            Ok(Some(Found::Path(path))) => println!("{}", path.display()),
            Ok(Some(Found::All(result))) => match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{json}"),
                Err(e) => fail(e),
            },
            Ok(None) => {
                eprintln!("No config file found for {:?}", cli.app);
                std::process::exit(2);
            }
            Err(e) => fail(e),
        },
        Commands::Discover(args) => {
            let result = make_builder(&cli.app, args).discover().unwrap_or_else(|e| fail(e));
            let json = serde_json::to_string_pretty(&result).unwrap_or_else(|e| fail(e));
            println!("{json}");
        }
        Commands::Workspace(args) => {
            match make_builder(&cli.app, args)
                .find_workspace_boundary()
                .unwrap_or_else(|e| fail(e))
            {
                Some(dir) => println!("{}", dir.display()),
                None => println!("(no workspace boundary up to the filesystem root)"),
            }
        }
        Commands::Dirs(args) => {
            let dirs = make_builder(&cli.app, args)
                .find_app_config_dirs()
                .unwrap_or_else(|e| fail(e));
            for dir in dirs {
                println!("{}", dir.display());
            }
        }
    }
}
