use std::net::SocketAddr;
use std::process::ExitCode;

use tower_lsp_server::{LspService, Server};
use tracing_subscriber::EnvFilter;

use cem_lsp::server::Backend;

const USAGE: &str = "\
cem-lsp -- language server over a custom-elements manifest

Analyzes the workspace it is launched in, keeps the manifest in memory,
and answers editor requests for custom-element tags in HTML documents
and tagged template literals.

Usage:
  cem-lsp [--stdio | --listen <ADDR>]

Options:
  --stdio          Serve on stdin/stdout (the default)
  --listen <ADDR>  Serve a single connection on a TCP address,
                   e.g. 127.0.0.1:9257
  -h, --help       Print this help message
  -V, --version    Print version information";

/// How the server talks to its client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Stdio,
    Tcp(SocketAddr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Serve(Transport),
    Version,
    Help,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Command, String> {
    let mut transport = Transport::Stdio;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-V" | "--version" => return Ok(Command::Version),
            "--stdio" => transport = Transport::Stdio,
            "--listen" => {
                let addr = args
                    .next()
                    .ok_or_else(|| "--listen requires an address".to_string())?;
                let addr: SocketAddr = addr
                    .parse()
                    .map_err(|_| format!("invalid listen address '{addr}'"))?;
                transport = Transport::Tcp(addr);
            }
            other => return Err(format!("unrecognized argument '{other}'")),
        }
    }

    Ok(Command::Serve(transport))
}

/// Logs go to stderr: with the stdio transport, stdout belongs to the
/// JSON-RPC framing and a single stray line corrupts the stream.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

async fn serve(transport: Transport) -> Result<(), String> {
    let (service, socket) = LspService::new(Backend::new);

    match transport {
        Transport::Stdio => {
            tracing::info!("serving on stdio");
            Server::new(tokio::io::stdin(), tokio::io::stdout(), socket)
                .serve(service)
                .await;
        }
        Transport::Tcp(addr) => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .map_err(|e| format!("cannot listen on {addr}: {e}"))?;
            tracing::info!("listening on {addr}");
            let (stream, peer) = listener
                .accept()
                .await
                .map_err(|e| format!("accept failed: {e}"))?;
            tracing::info!("client connected from {peer}");
            let (read, write) = stream.into_split();
            Server::new(read, write, socket).serve(service).await;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let command = match parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("cem-lsp: {message}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match command {
        Command::Help => {
            println!("{USAGE}");
            ExitCode::SUCCESS
        }
        Command::Version => {
            println!("cem-lsp {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Command::Serve(transport) => {
            init_tracing();
            tracing::info!("cem-lsp {} starting", env!("CARGO_PKG_VERSION"));
            match serve(transport).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(message) => {
                    eprintln!("cem-lsp: {message}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
