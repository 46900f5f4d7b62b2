//! Fuzz target for per-kind encoding of arbitrary text cells.

#![no_main]

use libfuzzer_sys::fuzz_target;
use trellis::input::CellValue;
use trellis::serialize::to_wire;
use trellis::MetaVariable;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }
    let text = String::from_utf8_lossy(data);
    let metas = [
        MetaVariable::factor("f", ["a", "b", text.as_ref()]),
        MetaVariable::number("n"),
        MetaVariable::date("d"),
        MetaVariable::time("t", None),
        MetaVariable::base("b"),
    ];
    for meta in &metas {
        let encoded = meta.encode(CellValue::Text(&text));
        let _ = to_wire(&meta.kind, &encoded);
    }
});
