//! Binmock CLI
//!
//! Entry point for the `binmock` command-line tool: inspect and build stub
//! executables, or talk to a running coordinator by hand.

use std::io::{self, Read};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use binmock::binmock_protocol::client;
use binmock::{build_stub_binary, telemetry, BinmockConfig, InvocationRequest, Rustc, StubTemplate};
use clap::{Parser, Subcommand};
use tracing::debug;

#[derive(Parser)]
#[command(name = "binmock")]
#[command(about = "Scriptable fake executables for tests", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stub source for an identifier and coordinator address
    Render {
        /// Mock identifier baked into the stub
        #[arg(long)]
        id: String,

        /// Coordinator address, e.g. 127.0.0.1:40123
        #[arg(long)]
        addr: SocketAddr,
    },

    /// Compile a stub and print the path of the executable
    Build {
        /// Mock identifier baked into the stub
        #[arg(long)]
        id: String,

        /// Coordinator address, e.g. 127.0.0.1:40123
        #[arg(long)]
        addr: SocketAddr,

        /// File name of the executable
        #[arg(long, default_value = binmock::synthesis::DEFAULT_BINARY_NAME)]
        name: String,

        /// Directory to build under (default: configured scratch dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Send one invocation report and print the response
    Invoke {
        /// Coordinator address
        #[arg(long)]
        addr: SocketAddr,

        /// Mock identifier
        #[arg(long)]
        id: String,

        /// Forward this process's stdin as the invocation's stdin
        #[arg(long)]
        stdin: bool,

        /// Arguments to report (after --)
        #[arg(last = true)]
        args: Vec<String>,
    },
}

fn main() {
    telemetry::init_tracing("info");
    let cli = Cli::parse();

    match cli.command {
        Commands::Render { id, addr } => run_render(&id, addr),
        Commands::Build {
            id,
            addr,
            name,
            out_dir,
        } => run_build(&id, addr, &name, out_dir),
        Commands::Invoke {
            addr,
            id,
            stdin,
            args,
        } => run_invoke(addr, &id, stdin, args),
    }
}

fn run_render(id: &str, addr: SocketAddr) {
    match StubTemplate::embedded().render(id, addr) {
        Ok(source) => print!("{}", source),
        Err(e) => {
            eprintln!("Error rendering stub: {}", e);
            process::exit(1);
        }
    }
}

fn run_build(id: &str, addr: SocketAddr, name: &str, out_dir: Option<PathBuf>) {
    let config = match BinmockConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    };
    let scratch_dir = out_dir.unwrap_or_else(|| config.scratch_dir.clone());
    debug!(scratch_dir = %scratch_dir.display(), "building stub");

    match build_stub_binary(&Rustc::from_config(&config), &scratch_dir, name, id, addr) {
        Ok(path) => println!("{}", path.display()),
        Err(e) => {
            eprintln!("Error building stub: {}", e);
            process::exit(1);
        }
    }
}

fn run_invoke(addr: SocketAddr, id: &str, forward_stdin: bool, args: Vec<String>) {
    let mut request = InvocationRequest::new(id)
        .with_args(args)
        .with_env(std::env::vars().map(|(k, v)| format!("{}={}", k, v)));

    if forward_stdin {
        let mut input = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut input) {
            eprintln!("Error reading stdin: {}", e);
            process::exit(1);
        }
        request = request.with_stdin(input.lines());
    }

    let response = match client::invoke(addr, &request) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}
