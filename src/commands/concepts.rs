//! Concepts command - rank exchanges against several concepts jointly

use anyhow::{Context as _, Result};
use colored::Colorize;

use episodic::{ConceptSearchOptions, ConceptSearchResult, SearchEngine};

use super::{preview, validate_date_bound, Context};

pub fn execute(
    ctx: &Context,
    concepts: &[String],
    limit: Option<usize>,
    after: Option<String>,
    before: Option<String>,
    json: bool,
) -> Result<()> {
    let options = ConceptSearchOptions {
        limit: limit.unwrap_or(ctx.config.search.default_limit),
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
        .search_multiple_concepts(concepts, &options)
        .context("Multi-concept search failed")?;

    if json {
        let json = serde_json::to_string_pretty(&results)
            .context("Failed to serialize results to JSON")?;
        println!("{}", json);
        return Ok(());
    }

    print_results(concepts, &results);
    Ok(())
}

fn print_results(concepts: &[String], results: &[ConceptSearchResult]) {
    println!("🔍 Concepts: {}", concepts.join(" + "));
    println!();

    if results.is_empty() {
        println!("No matching exchanges.");
        return;
    }

    for (rank, result) in results.iter().enumerate() {
        let per_concept = concepts
            .iter()
            .zip(result.concept_similarities.iter())
            .map(|(concept, sim)| format!("{}={:.2}", concept, sim))
            .collect::<Vec<_>>()
            .join(", ");

        println!(
            "{:>2}. {} {} ({})",
            rank + 1,
            format!("[{:.3}]", result.average_similarity).green(),
            result.exchange.timestamp.dimmed(),
            per_concept
        );
        println!("    {}", preview(&result.exchange.text, 160));
    }
}
