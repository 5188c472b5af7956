mod common;

use common::{find, library, numbers, run_one, table, HEADERS};
use kisymgen_core::pin::{ElectricalType, GraphicStyle};
use kisymgen_core::{Error, Run};

const BASE: [&str; 4] = [
    "BASE|fp|||",
    "|left|1|A||input",
    "|left|2|B",
    "|left|3|C",
];

fn with_base<'a>(rest: &[&'a str]) -> Vec<&'a str> {
    let mut lines = BASE.to_vec();
    lines.extend_from_slice(rest);
    lines
}

#[test]
fn test_derive_delete_and_insert() {
    let lines = with_base(&[
        "CHILD|||||BASE",
        "|delete|2",
        "CHILD2|||||BASE",
        "|before|2",
        "|left|9|X||input",
    ]);
    let (run, report, out) = run_one(&lines);

    assert!(run.summary().is_success());
    assert_eq!(report.symbols, 3);
    assert_eq!(numbers(find(&out, "CHILD")), vec!["1", "3"]);
    assert_eq!(numbers(find(&out, "CHILD2")), vec!["1", "9", "2", "3"]);

    // the parent is untouched and attributes are inherited
    assert_eq!(numbers(find(&out, "BASE")), vec!["1", "2", "3"]);
    let child = find(&out, "CHILD");
    assert_eq!(child.property("Footprint").unwrap().value, "fp");
    assert_eq!(child.property("Value").unwrap().value, "CHILD");
}

#[test]
fn test_derive_overload_replaces_pin() {
    let lines = with_base(&["NEW|||||BASE", "|right|2|B_NEW||output"]);
    let (_, _, out) = run_one(&lines);
    let child = find(&out, "NEW");
    let pin = child.pin("2").unwrap();
    assert_eq!(pin.name, "B_NEW");
    assert_eq!(pin.electrical, ElectricalType::Output);
    assert_eq!(pin.rotation, 180);
    assert_eq!(child.pins.len(), 3);
}

#[test]
fn test_derive_missing_pin_fails() {
    let lines = with_base(&["BAD|||||BASE", "|delete|7", "|left|8|Y||input"]);
    let (run, report, out) = run_one(&lines);
    assert_eq!(out.len(), 1);
    assert_eq!(report.failures, 1);
    assert!(run.registry().get("BAD").is_none());
    assert!(!run.summary().is_success());
}

#[test]
fn test_odd_min_width_is_rejected() {
    let (run, report, out) = run_one(&["ODD|fp||||||3", "|left|1|A||input"]);
    assert!(out.is_empty());
    assert_eq!(report.failures, 1);
    assert_eq!(report.skipped_pin_rows, 1);
    assert!(run.registry().is_empty());

    let (_, report, out) = run_one(&["EVEN|fp||||||4", "|left|1|A||input"]);
    assert_eq!(report.failures, 0);
    // half of the minimum width plus the default padding on each side
    let body = out[0].body.unwrap();
    assert_eq!(body.x1 - body.x0, 6.0);
}

#[test]
fn test_extension_symbols() {
    let lines = with_base(&[
        "EXT|fp2|||||BASE",
        "EXT_OF_EXT||||||EXT",
        "PINNED||||||BASE",
        "|left|4|D||input",
        "WIDE||||||BASE|4",
        "FROM_EXT|||||EXT",
    ]);
    let (run, report, out) = run_one(&lines);

    let ext = find(&out, "EXT");
    assert_eq!(ext.extends.as_deref(), Some("BASE"));
    assert!(ext.pins.is_empty());
    assert!(ext.body.is_none());
    assert_eq!(ext.property("Footprint").unwrap().value, "fp2");
    assert_eq!(find(&out, "EXT_OF_EXT").extends.as_deref(), Some("EXT"));

    // pins on an extension, a body column on an extension, deriving from one
    assert_eq!(report.failures, 3);
    assert_eq!(report.skipped_pin_rows, 1);
    for name in ["PINNED", "WIDE", "FROM_EXT"] {
        assert!(run.registry().get(name).is_none(), "{name}");
    }
    assert_eq!(out.len(), 3);
}

#[test]
fn test_bus_expansion_and_alternates() {
    let (run, _, out) = run_one(&[
        "BUS|fp|||",
        "|left|0,1,2,3|D$||bidirectional",
        "|left|1|SDA||open_collector",
        "|right|4,5|A$(7-1)||output",
    ]);
    assert!(run.summary().is_success());
    let bus = &out[0];
    let names: Vec<&str> = bus.pins.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["D0", "D1", "D2", "D3", "A7", "A6"]);

    let d1 = bus.pin("1").unwrap();
    assert_eq!(d1.alternates.len(), 1);
    assert_eq!(d1.alternates[0].name, "SDA");
    assert_eq!(d1.alternates[0].electrical, ElectricalType::OpenCollector);
    assert!(bus.pin("0").unwrap().alternates.is_empty());
}

#[test]
fn test_sticky_columns() {
    let (_, _, out) = run_one(&[
        "S|fp|||",
        "|right|1|A|inverted|power_in",
        "||2|B",
        "|left|3|C",
    ]);
    let sym = &out[0];
    let b = sym.pin("2").unwrap();
    assert_eq!(b.style, GraphicStyle::Inverted);
    assert_eq!(b.electrical, ElectricalType::PowerIn);
    assert_eq!(b.rotation, 180);
    assert_eq!(sym.pin("3").unwrap().rotation, 0);
}

#[test]
fn test_pin_errors_are_recoverable() {
    let (_, report, out) = run_one(&[
        "GAP|fp|||",
        "|left|--- x|",
        "|left|1|A||input",
        "DUP|fp|||",
        "|left|1,1|D$||input",
        "OK|fp|||",
        "|left|1|A||input",
    ]);
    assert_eq!(report.failures, 2);
    // the row after the bad gap was never processed
    assert_eq!(report.skipped_pin_rows, 1);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].name, "OK");
}

#[test]
fn test_invalid_enumerated_value() {
    let (_, report, out) = run_one(&["E|fp|||", "|left|1|A||sideways"]);
    assert!(out.is_empty());
    assert_eq!(report.failures, 1);
}

#[test]
fn test_streams_share_registry() {
    let mut run = Run::new();
    let mut out = Vec::new();

    let mut first = library("a.csv", &BASE);
    run.process_stream(&mut first, &mut out).unwrap();

    let mut broken = table("broken.csv", &["|pin category"]);
    let report = run.process_stream(&mut broken, &mut out).unwrap();
    assert!(matches!(report.aborted, Some(Error::Header { .. })));

    let mut second = library("b.csv", &["CHILD|||||BASE", "|delete|1", "BASE|fp|||"]);
    let report = run.process_stream(&mut second, &mut out).unwrap();
    assert_eq!(report.symbols, 1);
    // BASE is already registered by the first stream
    assert_eq!(report.failures, 1);

    let summary = run.summary();
    assert_eq!(summary.symbols, 2);
    assert_eq!(summary.streams.len(), 3);
    assert_eq!(summary.aborted_streams(), 1);
    assert!(!summary.is_success());
    assert_eq!(numbers(find(&out, "CHILD")), vec!["2", "3"]);

    let registered: Vec<_> = run
        .registry()
        .iter()
        .map(|symbol| (symbol.name(), symbol.location.source.as_str()))
        .collect();
    assert_eq!(registered, vec![("BASE", "a.csv"), ("CHILD", "b.csv")]);
}

#[test]
fn test_summary_json() {
    let mut run = Run::new();
    let mut out = Vec::new();
    run.process_stream(&mut library("a.csv", &BASE), &mut out)
        .unwrap();
    run.process_stream(&mut table("broken.csv", &["|pin category"]), &mut out)
        .unwrap();

    let json = serde_json::to_value(run.summary()).unwrap();
    assert_eq!(json["symbols"], 1);
    assert_eq!(json["streams"][0]["source"], "a.csv");
    assert!(json["streams"][0].get("aborted").is_none());
    let aborted = json["streams"][1]["aborted"].as_str().unwrap();
    assert!(aborted.starts_with("HeaderError: "), "{aborted}");

    let symbol = serde_json::to_value(&out[0]).unwrap();
    assert_eq!(symbol["name"], "BASE");
    assert!(symbol.get("extends").is_none());
    assert_eq!(symbol["pins"][0]["number"], "1");
}

#[test]
fn test_headers_only_and_empty_streams() {
    let mut run = Run::new();
    let mut out = Vec::new();

    let report = run
        .process_stream(&mut table("headers.csv", &HEADERS), &mut out)
        .unwrap();
    assert!(report.aborted.is_none());
    assert_eq!(report.rows, 2);

    let report = run
        .process_stream(&mut table("empty.csv", &[]), &mut out)
        .unwrap();
    assert!(matches!(report.aborted, Some(Error::Header { .. })));
    assert!(out.is_empty());
}

#[test]
fn test_leading_pin_rows_are_skipped() {
    let (run, report, out) = run_one(&["|left|1|A||input", "|left|2|B", "R|fp|||", "|left|1|A||input"]);
    assert_eq!(report.skipped_pin_rows, 2);
    assert_eq!(report.failures, 0);
    assert_eq!(out.len(), 1);
    assert!(!run.summary().is_success());
}
