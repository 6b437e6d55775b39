use crate::pipeline::run_blocking;
use crate::prelude::{eprintln, println, *};
use doctranslate_core::fragment::TextFragment;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, clap::Parser)]
#[command(name = "fragments")]
#[command(about = "Print the positioned text fragments of a PDF as JSON")]
pub struct App {
    /// PDF file to inspect
    pub path: PathBuf,

    /// Only print this page (1-based)
    #[clap(short, long)]
    pub page: Option<u32>,
}

#[derive(Debug, Serialize)]
struct PageFragments {
    page: u32,
    fragments: Vec<TextFragment>,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let bytes = std::fs::read(&app.path)
        .with_context(|| f!("Failed to read file '{}'", app.path.display()))?;

    let pages = run_blocking(move || pdf::extract_fragments(&bytes).map_err(|e| eyre!(e))).await?;
    let pages = select_pages(pages, app.page)?;

    if global.verbose {
        let total: usize = pages.iter().map(|p| p.fragments.len()).sum();
        eprintln!("{} fragments on {} pages", total, pages.len());
    }

    println!("{}", serde_json::to_string_pretty(&pages)?);

    Ok(())
}

fn select_pages(
    pages: Vec<(u32, Vec<TextFragment>)>,
    only: Option<u32>,
) -> Result<Vec<PageFragments>> {
    let total = pages.len();
    let selected: Vec<PageFragments> = pages
        .into_iter()
        .filter(|(page, _)| only.map_or(true, |n| n == *page))
        .map(|(page, fragments)| PageFragments { page, fragments })
        .collect();

    match only {
        Some(n) if selected.is_empty() => Err(eyre!(
            "Page {} does not exist (document has {} pages)",
            n,
            total
        )),
        _ => Ok(selected),
    }
}
