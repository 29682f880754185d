use mapped_edits_lsp::server::{Backend, methods};
use tower_lsp_server::{LspService, Server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(Backend::new)
        .custom_method(methods::PROVIDE_MAPPED_EDITS, Backend::provide_mapped_edits)
        .finish();

    Server::new(stdin, stdout, socket).serve(service).await;
}
