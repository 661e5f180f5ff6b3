//! Formwright CLI and REST API entry point.
//!
//! Binary name: `fwr`
//!
//! Parses CLI arguments, initializes storage, then dispatches to the
//! matching command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flags.
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new(match cli.verbose {
            0 if cli.quiet => "error",
            0 => "warn",
            1 => "info,fwr=debug,formwright_core=debug,formwright_infra=debug",
            _ => "trace",
        }),
    };
    if let Err(e) = formwright_observe::init_tracing_with_filter(filter, cli.otel) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    let result = run(cli).await;
    formwright_observe::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "fwr", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init(cli.ephemeral).await?;

    match cli.command {
        Commands::New {
            title,
            description,
            wizard,
            fields,
        } => {
            cli::form::new_form(&state, title, description, wizard, &fields, cli.json).await?;
        }

        Commands::List => {
            cli::form::list_forms(&state, cli.json).await?;
        }

        Commands::Show { id } => {
            cli::form::show_form(&state, &id, cli.json).await?;
        }

        Commands::Export { id, output } => {
            cli::form::export_form(&state, &id, output.as_deref()).await?;
        }

        Commands::Import { file } => {
            cli::form::import_form(&state, &file, cli.json).await?;
        }

        Commands::Publish { id } => {
            cli::form::set_published(&state, &id, true, cli.json).await?;
        }

        Commands::Unpublish { id } => {
            cli::form::set_published(&state, &id, false, cli.json).await?;
        }

        Commands::Serve { port, host } => {
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            if !cli.quiet {
                println!(
                    "  {} Formwright API listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}")).cyan()
                );
                if cli.ephemeral {
                    println!(
                        "  {}",
                        console::style("Ephemeral mode: forms are lost on exit").yellow()
                    );
                } else {
                    println!(
                        "  {}",
                        console::style(format!("Data: {}", state.data_dir.display())).dim()
                    );
                }
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
