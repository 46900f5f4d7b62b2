//! Build command - configure a display and write its document.

use std::path::PathBuf;

use colored::Colorize;
use log::info;
use trellis::display::{Layout, PanelKind, PanelOptions};
use trellis::{DisplayModel, SortDirection};

use crate::cli::BuildArgs;

pub fn run(args: BuildArgs, config: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let (trellis, table, source) = super::load(&args.file, &args.factor, config)?;

    let name = match &args.name {
        Some(name) => name.clone(),
        None => args
            .file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or("Cannot derive a display name from the file path; use --name")?,
    };

    let mut display = DisplayModel::new(name.as_str(), &table)?;
    if let Some(description) = &args.description {
        display.set_description(description.as_str());
    }
    display
        .set_panel_column(&args.panel)?
        .set_panel_options(PanelOptions {
            kind: if args.iframe {
                PanelKind::Iframe
            } else {
                PanelKind::Img
            },
            aspect: args.aspect,
        })?;

    for meta in &args.meta {
        display.declare(&meta.column, &meta.kind)?;
    }
    display.infer_metas_with(trellis.inference());

    let mut layout = Layout::new(args.ncol);
    if let Some(nrow) = args.nrow {
        layout = layout.with_nrow(nrow);
    }
    display.set_layout(layout)?;

    if !args.label.is_empty() {
        display.set_labels(args.label.iter().cloned())?;
    }
    for sort in &args.sort {
        let dir = if sort.descending {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        display.add_sort(&sort.column, dir)?;
    }
    if !args.key.is_empty() {
        display.set_key_columns(args.key.iter().cloned())?;
    }

    let document = display.serialize()?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&name).join("displayObj.json"));
    document.save(&output)?;
    info!("Wrote display '{}' from {}", name, source.hash);

    println!(
        "{} {} ({} panels, {} metas)",
        "Wrote".green().bold(),
        output.display().to_string().white(),
        document.data.len(),
        document.display.metas.len()
    );

    let audit = document.audit();
    for (meta, count) in &audit.unmatched {
        println!(
            "  {} {} value(s) in '{}' did not match its kind and were written as null",
            "warning:".yellow().bold(),
            count,
            meta
        );
    }
    if audit.missing_panels > 0 {
        println!(
            "  {} {} row(s) have no panel",
            "warning:".yellow().bold(),
            audit.missing_panels
        );
    }

    Ok(())
}
