use clap::Parser;

/// Command line of the extension host process.
///
/// The main side spawns this binary and speaks the RPC protocol over its
/// stdin and stdout.
#[derive(Parser, Debug)]
#[command(name = "mapped-edits-ext-host")]
#[command(about = "Runs mapped edits providers for a mapped-edits-lsp server")]
pub struct Args {
    /// Treat URIs that differ only in path case as the same resource
    #[arg(long)]
    pub ignore_path_casing: bool,

    /// Do not register the built-in providers
    #[arg(long)]
    pub no_builtin_providers: bool,
}

impl Args {
    pub fn builtin_providers(&self) -> bool {
        !self.no_builtin_providers
    }
}
