//! Fuzz target for loading, inference and serialization.
//!
//! Any delimited input with a first column must either be rejected with an
//! error or serialize without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use trellis::DisplayModel;
use trellis::input::Parser;

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }
    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(table) = Parser::new().parse_str(content) else {
        return;
    };
    let Some(panel) = table.column_names().next().map(str::to_string) else {
        return;
    };

    let Ok(mut display) = DisplayModel::new("fuzz", &table) else {
        return;
    };
    if display.set_panel_column(&panel).is_err() {
        return;
    }
    display.infer_metas();
    if let Ok(document) = display.serialize() {
        let _ = document.to_json_pretty();
    }
});
