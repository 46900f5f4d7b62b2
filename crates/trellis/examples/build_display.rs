//! Example: build a display document from a CSV file.
//!
//! Usage:
//!   cargo run --example build_display -- <file_path> <panel_column>

use std::env;
use std::path::Path;

use trellis::Trellis;

fn main() -> trellis::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: cargo run --example build_display -- <file_path> <panel_column>");
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);
    if !path.exists() {
        eprintln!("Error: File not found: {}", path.display());
        std::process::exit(1);
    }

    let trellis = Trellis::new();
    let (table, source) = trellis.load(path)?;

    let separator = "=".repeat(60);
    println!("{}", separator);
    println!("Display for: {} ({} rows)", source.file, source.row_count);
    println!("{}", separator);

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "display".to_string());
    let mut display = trellis.display(&name, &table, &args[2])?;

    println!();
    println!("## Meta Variables");
    for meta in display.metas().values() {
        let extra = match meta.kind.levels() {
            Some(levels) => format!(" [{} levels]", levels.len()),
            None => String::new(),
        };
        println!("  {:24} {}{}", meta.name, meta.kind_name(), extra);
    }

    let document = display.serialize()?;
    println!();
    println!("## Output");
    println!("  keysig: {}", document.display.keysig);
    println!("  rows: {}", document.data.len());
    println!("  unmatched values: {}", document.audit().total_unmatched());

    if let Some(first) = document.data.first() {
        println!();
        println!("## First Row");
        println!("{}", serde_json::to_string_pretty(first)?);
    }

    Ok(())
}
