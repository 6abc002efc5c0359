//! `pagefeed list`: load pages and print the items.

use anyhow::Result;

use crate::collection::PaginatedCollection;
use crate::scroll::scroll_to_end;

/// Scroll through up to `max_pages` pages and print every item.
///
/// Human output is one `name  artifact_url` line per item; `--json` prints
/// the raw item records as a JSON array.
pub async fn run_list(
    collection: &PaginatedCollection,
    max_pages: Option<usize>,
    json: bool,
) -> Result<()> {
    let summary = scroll_to_end(collection, max_pages).await?;
    let items = collection.items();

    if json {
        let records: Vec<&serde_json::Value> = items.iter().map(|i| &i.raw).collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No items.");
        return Ok(());
    }

    let width = items.iter().map(|i| i.name.len()).max().unwrap_or(0);
    for (index, item) in items.iter().enumerate() {
        println!(
            "{:>5}  {:<width$}  {}",
            index,
            item.name,
            item.artifact_url,
            width = width
        );
    }
    println!();
    println!(
        "{} items from {} page(s){}",
        summary.items,
        summary.pages,
        if summary.reached_end {
            ""
        } else {
            ", more available"
        }
    );
    Ok(())
}
