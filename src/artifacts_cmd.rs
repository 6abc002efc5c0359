//! `pagefeed artifacts`: load pages, resolve every item's artifact.
//!
//! Resolves are issued for all rows at once, as a list view would when a
//! screenful of rows appears, and results are printed in row order.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::sync::mpsc;

use crate::models::Artifact;
use crate::scroll::scroll_to_end;
use crate::session::Session;

pub async fn run_artifacts(
    session: &Session,
    max_pages: Option<usize>,
    out_dir: Option<&Path>,
) -> Result<()> {
    scroll_to_end(&session.collection, max_pages).await?;
    let items = session.collection.items();

    if items.is_empty() {
        println!("No items.");
        return Ok(());
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<(usize, Artifact)>();
    let mut pending = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let tx = tx.clone();
        pending.push(session.resolver.resolve(item, index, move |artifact| {
            let _ = tx.send((index, artifact));
        }));
    }
    drop(tx);

    for resolution in pending {
        resolution.wait().await;
    }

    let mut resolved = Vec::with_capacity(items.len());
    while let Some(entry) = rx.recv().await {
        resolved.push(entry);
    }
    resolved.sort_by_key(|(index, _)| *index);

    if let Some(dir) = out_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let mut placeholders = 0usize;
    for (index, artifact) in &resolved {
        let name = &items[*index].name;
        if artifact.is_placeholder() {
            placeholders += 1;
            println!("{:>5}  {:<32}  (placeholder)", index, name);
            continue;
        }

        println!(
            "{:>5}  {:<32}  {:>8} bytes  {}",
            index,
            name,
            artifact.len(),
            &artifact.sha256_hex()[..16]
        );

        if let Some(dir) = out_dir {
            let path = dir.join(artifact_file_name(*index, name, artifact));
            tokio::fs::write(&path, &artifact.bytes[..])
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
    }

    println!();
    println!(
        "{} artifacts resolved, {} placeholder(s), {} cached",
        resolved.len(),
        placeholders,
        session.cache().len()
    );
    Ok(())
}

/// `<index>-<name>.<ext>`, with the name reduced to filesystem-safe chars.
fn artifact_file_name(index: usize, name: &str, artifact: &Artifact) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}-{}.{}", index, safe, extension_for(artifact.content_type.as_deref()))
}

fn extension_for(content_type: Option<&str>) -> &'static str {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .unwrap_or("");
    match mime {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}
