//! Import command - load pre-extracted exchanges from JSONL
//!
//! One exchange per line:
//! `{"id": "...", "conversation_id": "...", "timestamp": "...", "text": "..."}`
//! (`id` optional). Timestamps are normalised to RFC 3339 UTC with
//! millisecond precision so lexical order matches chronological order.

use anyhow::{bail, Context as _, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Deserialize;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use episodic::embeddings::EmbeddingProvider;
use episodic::storage::{Archive, NewExchange};

use super::Context;

#[derive(Debug, Deserialize)]
struct ImportRecord {
    #[serde(default)]
    id: Option<String>,
    conversation_id: String,
    timestamp: String,
    text: String,
}

#[derive(Debug, Default)]
struct ImportStats {
    files: usize,
    imported: usize,
    duplicates: usize,
    skipped: usize,
}

pub fn execute(ctx: &Context, path: &Path) -> Result<()> {
    let files = collect_files(path)?;
    if files.is_empty() {
        bail!("No .jsonl files found at {}", path.display());
    }

    let embedder = ctx.embedder()?;
    let mut archive = ctx.open_archive()?;
    if embedder.dimension() != archive.dimension() {
        bail!(
            "Embedder produces {}-d vectors but the archive index is {}-d",
            embedder.dimension(),
            archive.dimension()
        );
    }

    println!("📥 Importing {} file(s) with {}", files.len(), embedder.model_name());

    let mut stats = ImportStats::default();
    for file in &files {
        import_file(file, embedder.as_ref(), &mut archive, &mut stats)
            .with_context(|| format!("Failed to import {}", file.display()))?;
        stats.files += 1;
    }

    archive.save()?;
    info!(?stats, "import complete");

    println!(
        "✓ Imported {} exchange(s) from {} file(s)",
        stats.imported, stats.files
    );
    if stats.duplicates > 0 {
        println!("  {} already archived", stats.duplicates);
    }
    if stats.skipped > 0 {
        println!("  {} skipped (see warnings)", stats.skipped);
    }
    Ok(())
}

fn collect_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("Import path not found: {}", path.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "jsonl"))
        .collect();
    files.sort();
    Ok(files)
}

fn import_file(
    file: &Path,
    embedder: &dyn EmbeddingProvider,
    archive: &mut Archive,
    stats: &mut ImportStats,
) -> Result<()> {
    let reader = BufReader::new(std::fs::File::open(file)?);

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record: ImportRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(e) => {
                warn!(file = %file.display(), line = line_no + 1, error = %e, "malformed record");
                stats.skipped += 1;
                continue;
            }
        };

        let Some(timestamp) = normalize_timestamp(&record.timestamp) else {
            warn!(file = %file.display(), line = line_no + 1, timestamp = %record.timestamp, "unparseable timestamp");
            stats.skipped += 1;
            continue;
        };

        let embedding = match embedder.embed_passage(&record.text) {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(file = %file.display(), line = line_no + 1, error = %e, "cannot embed exchange");
                stats.skipped += 1;
                continue;
            }
        };

        let exchange = NewExchange {
            id: record.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            conversation_id: record.conversation_id,
            timestamp,
            text: record.text,
            embedding,
        };

        match archive.insert(&exchange)? {
            Some(_) => stats.imported += 1,
            None => stats.duplicates += 1,
        }
    }

    Ok(())
}

/// RFC 3339 (any offset) or bare date, as RFC 3339 UTC with milliseconds
fn normalize_timestamp(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(
            ts.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        );
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?.and_utc();
    Some(midnight.to_rfc3339_opts(SecondsFormat::Millis, true))
}
