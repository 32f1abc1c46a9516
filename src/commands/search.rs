//! Search command - semantic, keyword or hybrid search over the archive

use anyhow::{Context as _, Result};
use colored::Colorize;

use episodic::{SearchEngine, SearchMode, SearchOptions, SearchResult};

use super::{preview, validate_date_bound, Context};

/// Execute search command
pub fn execute(
    ctx: &Context,
    query: &str,
    limit: Option<usize>,
    mode: SearchMode,
    after: Option<String>,
    before: Option<String>,
    json: bool,
) -> Result<()> {
    let options = SearchOptions {
        limit: limit.unwrap_or(ctx.config.search.default_limit),
        mode,
        after: validate_date_bound("after", after)?,
        before: validate_date_bound("before", before)?,
    };

    let archive = ctx.open_archive()?;
    let embedder = ctx.embedder()?;
    let engine = SearchEngine::new(
        embedder.as_ref(),
        archive.index(),
        archive.store(),
        ctx.config.search.retrieval(),
    );

    let results = engine
        .search_conversations(query, &options)
        .context("Search failed")?;

    if json {
        let json = serde_json::to_string_pretty(&results)
            .context("Failed to serialize results to JSON")?;
        println!("{}", json);
        return Ok(());
    }

    print_results(query, &options, &results);
    Ok(())
}

fn print_results(query: &str, options: &SearchOptions, results: &[SearchResult]) {
    println!("🔍 \"{}\" ({} mode)", query, options.mode);
    if options.after.is_some() || options.before.is_some() {
        println!(
            "   window: {} .. {}",
            options.after.as_deref().unwrap_or("*"),
            options.before.as_deref().unwrap_or("*")
        );
    }
    println!();

    if results.is_empty() {
        println!("No matching exchanges.");
        return;
    }

    for (rank, result) in results.iter().enumerate() {
        let exchange = &result.exchange;
        println!(
            "{:>2}. {} {} {}",
            rank + 1,
            format!("[{:.3}]", result.similarity).green(),
            exchange.timestamp.dimmed(),
            exchange.conversation_id.cyan()
        );
        println!("    {}", preview(&exchange.text, 160));
    }
}
