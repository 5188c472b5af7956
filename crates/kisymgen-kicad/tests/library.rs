use kisymgen_core::{MemorySource, Run};
use kisymgen_kicad::{library_path, KicadLibraryWriter};
use kisymgen_sexpr::Sexpr;

const LIBRARY: &[&str] = &[
    "symbol name,footprint,datasheet,description,keywords,derive from,kicad extends,text",
    ",pin category,pin number,pin name,pin gr type,pin el type,pin hidden",
    "# a comment row",
    "MCU,QFN-16,,,,,,MCU",
    ",left,1,VCC,,power_in",
    ",left,2,GND,,power_in,yes",
    ",right,3,PA0,,bidirectional",
    "MCU_B,QFN-20,,,,,MCU",
];

fn build() -> KicadLibraryWriter {
    let mut writer = KicadLibraryWriter::new();
    let mut run = Run::new();
    run.process_stream(&mut MemorySource::from_lines("lib.csv", LIBRARY), &mut writer)
        .unwrap();
    assert!(run.summary().is_success());
    writer
}

fn symbol<'a>(lib: &'a Sexpr, name: &str) -> &'a Sexpr {
    lib.children("symbol")
        .find(|s| s.as_list().and_then(|l| l[1].as_atom()) == Some(name))
        .unwrap()
}

#[test]
fn test_library_header() {
    let lib = build().to_sexpr();
    assert_eq!(lib.keyword(), Some("kicad_symbol_lib"));
    assert_eq!(lib.child("version").unwrap().to_string(), "(version 20231120)");
    assert_eq!(
        lib.child("generator").unwrap().to_string(),
        "(generator \"kisymgen\")"
    );
    assert_eq!(lib.children("symbol").count(), 2);
}

#[test]
fn test_units_and_extension() {
    let lib = build().to_sexpr();

    let mcu = symbol(&lib, "MCU");
    let units: Vec<&Sexpr> = mcu.children("symbol").collect();
    assert_eq!(units.len(), 2);
    assert!(units[0].child("rectangle").is_some());
    assert!(units[0].child("text").is_some());
    let pins: Vec<&Sexpr> = units[1].children("pin").collect();
    assert_eq!(pins.len(), 3);
    // the hidden GND pin has zero length
    assert!(pins[1].as_list().unwrap().contains(&Sexpr::symbol("hide")));
    assert_eq!(pins[1].child("length").unwrap().to_string(), "(length 0)");

    let ext = symbol(&lib, "MCU_B");
    assert_eq!(ext.child("extends").unwrap().to_string(), "(extends \"MCU\")");
    assert!(ext.child("symbol").is_none());
    let footprint = ext
        .children("property")
        .find(|p| p.as_list().unwrap()[1] == Sexpr::string("Footprint"))
        .unwrap();
    assert_eq!(footprint.as_list().unwrap()[2], Sexpr::string("QFN-20"));
}

#[test]
fn test_render_and_write() {
    let writer = build();
    let text = writer.render();
    assert!(text.starts_with("(kicad_symbol_lib\n  (version 20231120)\n  (generator \"kisymgen\")\n"));
    assert!(text.ends_with(")\n"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.kicad_sym");
    std::fs::write(&path, "stale").unwrap();
    writer.write_to(&path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), text);
}

#[test]
fn test_write_to_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.kicad_sym");
    let err = KicadLibraryWriter::new().write_to(&path).unwrap_err();
    assert!(err.to_string().contains("out.kicad_sym"));
}

#[test]
fn test_library_path() {
    assert_eq!(library_path("a").to_str(), Some("a.kicad_sym"));
    assert_eq!(library_path("lib/x.kicad_sym").to_str(), Some("lib/x.kicad_sym"));
}
