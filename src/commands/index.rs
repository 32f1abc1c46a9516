//! Index command - rebuild and inspect the vector index

use anyhow::Result;
use serde::Serialize;

use episodic::index::VectorIndex;

use super::Context;

#[derive(Debug, Serialize)]
struct IndexStatus {
    path: String,
    exchanges: usize,
    indexed_vectors: usize,
    dimension: usize,
    model: String,
    first_timestamp: Option<String>,
    last_timestamp: Option<String>,
}

/// Rebuild the USearch index from embeddings stored in SQLite
pub fn rebuild(ctx: &Context) -> Result<()> {
    let mut archive = ctx.open_archive()?;
    println!("🔧 Rebuilding vector index...");
    let count = archive.rebuild_index()?;
    println!("✓ Indexed {} exchange(s)", count);
    Ok(())
}

pub fn status(ctx: &Context, json: bool) -> Result<()> {
    let archive = ctx.open_archive()?;
    let span = archive.store().time_span()?;

    let status = IndexStatus {
        path: ctx.storage_path.display().to_string(),
        exchanges: archive.count()?,
        indexed_vectors: archive.index().total_stored()?,
        dimension: archive.dimension(),
        model: ctx.config.embeddings.model_name.clone(),
        first_timestamp: span.as_ref().map(|(first, _)| first.clone()),
        last_timestamp: span.map(|(_, last)| last),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("📚 Archive: {}", status.path);
    println!("   Exchanges:       {}", status.exchanges);
    println!("   Indexed vectors: {}", status.indexed_vectors);
    println!("   Dimension:       {} ({})", status.dimension, status.model);
    if let (Some(first), Some(last)) = (&status.first_timestamp, &status.last_timestamp) {
        println!("   Time span:       {} .. {}", first, last);
    }
    Ok(())
}
