//! Infer command - show the meta kind chosen for each column.

use std::path::PathBuf;

use colored::Colorize;
use trellis::MetaKind;
use trellis::inference::InferredMeta;

pub fn run(
    file: PathBuf,
    factor: Vec<String>,
    json_output: bool,
    config: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (trellis, table, source) = super::load(&file, &factor, config)?;
    let inferred = trellis.infer(&table);

    if json_output {
        let output = serde_json::json!({
            "file": source.file,
            "hash": source.hash,
            "rows": source.row_count,
            "columns": inferred,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {} ({} rows, {} columns)",
        "Inferred metas for".cyan().bold(),
        source.file.white(),
        source.row_count,
        source.column_count
    );
    println!();

    let width = inferred
        .iter()
        .map(|i| i.meta.name.len())
        .max()
        .unwrap_or(0);

    for item in &inferred {
        let row = Row::new(item, width);
        println!(
            "  {}  {}  {}  {}  {}",
            row.name.white().bold(),
            row.kind.green(),
            row.rule.dimmed(),
            row.counts.dimmed(),
            row.detail
        );
    }

    Ok(())
}

/// One table line, padded before colouring so escape codes never count
/// toward the column width.
struct Row {
    name: String,
    kind: String,
    rule: String,
    counts: String,
    detail: String,
}

impl Row {
    fn new(item: &InferredMeta, width: usize) -> Self {
        let detail = match &item.meta.kind {
            MetaKind::Factor { levels } => format!("{} level(s)", levels.len()),
            MetaKind::Number { digits, .. } => format!("digits={}", digits),
            MetaKind::Date { format } => format!("format={}", format),
            MetaKind::Time {
                timezone: Some(tz), ..
            } => format!("timezone={}", tz),
            _ => String::new(),
        };
        Self {
            name: format!("{:width$}", item.meta.name, width = width),
            kind: format!("{:8}", item.meta.kind_name().to_string()),
            rule: format!("{:16}", item.rule.as_str()),
            counts: format!(
                "{} distinct, {} missing",
                item.profile.distinct_count, item.profile.missing_count
            ),
            detail,
        }
    }
}
