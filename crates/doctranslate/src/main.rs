use crate::prelude::*;
use clap::Parser;

mod error;
mod fragments;
mod oracle;
mod pipeline;
mod prelude;
mod serve;
mod translate;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Translate PDF, DOCX and plain-text documents with a local LLM"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    #[clap(flatten)]
    ollama: crate::oracle::OllamaOptions,

    /// Whether to display additional information.
    #[clap(
        long,
        env = "DOCTRANSLATE_VERBOSE",
        global = true,
        default_value = "false"
    )]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Translate a document, keeping its layout
    Translate(crate::translate::App),

    /// Dump the text fragments extracted from a PDF
    Fragments(crate::fragments::App),

    /// Serve the translation endpoint over HTTP
    Serve(crate::serve::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Translate(sub_app) => crate::translate::run(sub_app, app.global).await,
        SubCommands::Fragments(sub_app) => crate::fragments::run(sub_app, app.global).await,
        SubCommands::Serve(sub_app) => crate::serve::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
