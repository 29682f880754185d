use clap::Parser;
use mapped_edits_core::UriIdentityService;
use mapped_edits_ext_host::ExtensionHost;
use mapped_edits_ext_host::cli::Args;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let identity = Arc::new(UriIdentityService::new(args.ignore_path_casing));
    let host = ExtensionHost::new(tokio::io::stdin(), tokio::io::stdout(), identity);

    if args.builtin_providers() && let Err(e) = host.register_builtin_providers() {
        tracing::error!("failed to register built-in providers: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!("extension host ready");
    match host.serve().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("extension host stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}
