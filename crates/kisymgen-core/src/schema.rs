//! Column tables and header validation.
//!
//! Every accepted column of the symbol header and the pin header is
//! described once, in order, by a [`ColumnSpec`]. The record builder walks
//! these tables front to back, so later columns may rely on earlier ones.

use std::collections::HashMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::error::{Error, Location, Result};
use crate::pin::{Category, ElectricalType, GraphicStyle};
use crate::source::Row;

/// One pin grid unit in millimetres.
pub const GRID_MM: f64 = 2.54;

/// How strongly a column is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Necessity {
    /// The column may be absent; an empty cell stores nothing.
    Optional,
    /// The column must be present; the cell may be empty.
    Mandatory,
    /// The column must be present and the cell must not be empty.
    RequiredNonEmpty,
}

impl Necessity {
    pub fn column_required(self) -> bool {
        !matches!(self, Necessity::Optional)
    }

    pub fn describe(self) -> &'static str {
        match self {
            Necessity::Optional => "Optional",
            Necessity::Mandatory => "Mandatory",
            Necessity::RequiredNonEmpty => "Value required",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Bool,
    Int,
    Float,
}

/// A converted cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, and integers widened to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl ColumnKind {
    pub fn describe(self) -> &'static str {
        match self {
            ColumnKind::Text => "string",
            ColumnKind::Bool => "boolean",
            ColumnKind::Int => "integer",
            ColumnKind::Float => "float",
        }
    }

    /// Convert a raw cell into a typed value.
    pub fn convert(self, raw: &str, column: &str, location: &Location) -> Result<Value> {
        let conversion_error = |message: String| {
            Error::validation(
                format!("Error during conversion of column: {column} value: {raw:?}! Message {message}"),
                location,
            )
        };
        match self {
            ColumnKind::Text => Ok(Value::Text(raw.to_string())),
            ColumnKind::Bool => parse_bool(raw, column, location).map(Value::Bool),
            ColumnKind::Int => raw
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| conversion_error(e.to_string())),
            ColumnKind::Float => raw
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| conversion_error(e.to_string())),
        }
    }
}

/// `yes`/`y`/`true` and `no`/`n`/`false`, case-insensitive. Empty is false.
pub fn parse_bool(raw: &str, column: &str, location: &Location) -> Result<bool> {
    if raw.is_empty() {
        return Ok(false);
    }
    match raw.to_lowercase().as_str() {
        "y" | "yes" | "true" => Ok(true),
        "n" | "no" | "false" => Ok(false),
        other => Err(Error::validation(
            format!("Wrong value {other:?} in {column}. Valid values: \"yes\" or \"no\"."),
            location,
        )),
    }
}

/// Static description of one column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec<C> {
    pub id: C,
    pub name: &'static str,
    pub necessity: Necessity,
    pub kind: ColumnKind,
    pub default: Option<&'static str>,
    pub sticky: bool,
    pub valid: &'static [&'static str],
    pub info: &'static str,
}

impl<C: Copy> ColumnSpec<C> {
    const fn new(id: C, name: &'static str, necessity: Necessity, kind: ColumnKind) -> Self {
        Self {
            id,
            name,
            necessity,
            kind,
            default: None,
            sticky: false,
            valid: &[],
            info: "",
        }
    }

    const fn default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    const fn sticky(mut self) -> Self {
        self.sticky = true;
        self
    }

    const fn valid(mut self, valid: &'static [&'static str]) -> Self {
        self.valid = valid;
        self
    }

    const fn info(mut self, info: &'static str) -> Self {
        self.info = info;
        self
    }
}

impl<C> ColumnSpec<C> {
    pub fn is_enumerated(&self) -> bool {
        !self.valid.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolColumn {
    Name,
    DeriveFrom,
    KicadExtends,
    Footprint,
    Datasheet,
    Description,
    Keywords,
    FpFilters,
    Reference,
    Text,
    InBom,
    OnBoard,
    HidePinNumbers,
    PinNameOffset,
    HidePinNames,
    MinWidth,
    MinHeight,
    WPadding,
    HPadding,
    TextFontSize,
    TextGap,
    HRefValueGap,
    WRefValuePinGap,
}

impl SymbolColumn {
    /// Columns an extension symbol may fill in.
    pub fn allowed_on_extension(self) -> bool {
        matches!(
            self,
            SymbolColumn::Reference
                | SymbolColumn::Footprint
                | SymbolColumn::Datasheet
                | SymbolColumn::Description
                | SymbolColumn::Keywords
                | SymbolColumn::FpFilters
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinColumn {
    Category,
    Number,
    Name,
    GraphicStyle,
    ElectricalType,
    Stacked,
    Hidden,
    Length,
    NameFontSize,
    NumberFontSize,
}

use ColumnKind::{Bool, Float, Int, Text};
use Necessity::{Mandatory, Optional, RequiredNonEmpty};

pub static SYMBOL_COLUMNS: &[ColumnSpec<SymbolColumn>] = &[
    ColumnSpec::new(SymbolColumn::Name, "symbol name", RequiredNonEmpty, Text),
    ColumnSpec::new(SymbolColumn::DeriveFrom, "derive from", Optional, Text).info(
        "Build a new symbol and derive attributes and pins from the named symbol.\n\
         Given symbol attributes overwrite the original values. Pins can be deleted,\n\
         inserted or overloaded.",
    ),
    ColumnSpec::new(SymbolColumn::KicadExtends, "kicad extends", Optional, Text)
        .info("KiCad symbol attribute: the parent of an extension symbol (derived in KiCad)."),
    ColumnSpec::new(SymbolColumn::Footprint, "footprint", Mandatory, Text),
    ColumnSpec::new(SymbolColumn::Datasheet, "datasheet", Mandatory, Text),
    ColumnSpec::new(SymbolColumn::Description, "description", Mandatory, Text),
    ColumnSpec::new(SymbolColumn::Keywords, "keywords", Mandatory, Text),
    ColumnSpec::new(SymbolColumn::FpFilters, "fp filters", Optional, Text),
    ColumnSpec::new(SymbolColumn::Reference, "reference", Optional, Text).default("U"),
    ColumnSpec::new(SymbolColumn::Text, "text", Optional, Text)
        .info("The text field in the main symbol rectangle."),
    ColumnSpec::new(SymbolColumn::InBom, "in bom", Optional, Bool).default("yes"),
    ColumnSpec::new(SymbolColumn::OnBoard, "on board", Optional, Bool).default("yes"),
    ColumnSpec::new(SymbolColumn::HidePinNumbers, "hide pin numbers", Optional, Bool)
        .default("no"),
    ColumnSpec::new(SymbolColumn::PinNameOffset, "pin name offset", Optional, Int)
        .default("20")
        .info("KiCad symbol attribute: the pin name offset in mils."),
    ColumnSpec::new(SymbolColumn::HidePinNames, "hide pin names", Optional, Bool)
        .default("no"),
    ColumnSpec::new(SymbolColumn::MinWidth, "min width", Optional, Int)
        .default("2")
        .info("The minimum width of the pin shape rectangle in pin grid units (must be even)."),
    ColumnSpec::new(SymbolColumn::MinHeight, "min height", Optional, Int)
        .default("2")
        .info("The minimum height of the pin shape rectangle in pin grid units (must be even)."),
    ColumnSpec::new(SymbolColumn::WPadding, "w padding", Optional, Float)
        .default("1.0")
        .info(
            "Horizontal padding from the pin shape rectangle to the body rectangle\n\
             in pin grid units. Fractions (0.5, 0.25) are possible.",
        ),
    ColumnSpec::new(SymbolColumn::HPadding, "h padding", Optional, Float)
        .default("1.0")
        .info(
            "Vertical padding from the pin shape rectangle to the body rectangle\n\
             in pin grid units. Fractions (0.5, 0.25) are possible.",
        ),
    ColumnSpec::new(SymbolColumn::TextFontSize, "text font size", Optional, Int)
        .default("50")
        .info("Font size of the text field in mils."),
    ColumnSpec::new(SymbolColumn::TextGap, "text gap", Optional, Float).info(
        "Gap between the top of the pin shape rectangle and the center of the text\n\
         field in pin grid units. Without a value the gap depends on the vertical\n\
         pin count: above 15 it is 5.5, above 5 it is 2.5, otherwise 0.5.",
    ),
    ColumnSpec::new(SymbolColumn::HRefValueGap, "h r/v gap", Optional, Float)
        .default("0.5")
        .info("Vertical distance from the body to Reference and Value in pin grid units."),
    ColumnSpec::new(SymbolColumn::WRefValuePinGap, "w r/v gap", Optional, Float)
        .default("0.75")
        .info("Horizontal distance from the top pins to Reference and Value in pin grid units."),
];

pub static PIN_COLUMNS: &[ColumnSpec<PinColumn>] = &[
    ColumnSpec::new(PinColumn::Category, "pin category", RequiredNonEmpty, Text)
        .sticky()
        .valid(Category::NAMES)
        .info(
            "The side of a pin (left, right, top, bottom). Derived symbols may also use\n\
             the pseudo categories delete, before, after and overload.",
        ),
    ColumnSpec::new(PinColumn::Number, "pin number", RequiredNonEmpty, Text).info(
        "A pin number, a comma separated bus list, or a gap marker '---' / '--- n'.",
    ),
    ColumnSpec::new(PinColumn::Name, "pin name", Mandatory, Text).info(
        "The pin name. '$', '$(N)', '$(N+K)' and '$(N-K)' are replaced by a serial number.",
    ),
    ColumnSpec::new(PinColumn::GraphicStyle, "pin gr type", Mandatory, Text)
        .default("line")
        .sticky()
        .valid(GraphicStyle::NAMES),
    ColumnSpec::new(PinColumn::ElectricalType, "pin el type", RequiredNonEmpty, Text)
        .sticky()
        .valid(ElectricalType::NAMES),
    ColumnSpec::new(PinColumn::Stacked, "pin stacked", Optional, Bool),
    ColumnSpec::new(PinColumn::Hidden, "pin hidden", Optional, Bool),
    ColumnSpec::new(PinColumn::Length, "pin length", Optional, Float)
        .default("1.0")
        .sticky()
        .info(
            "The pin length in pin grid units. Padding plus pin length must be an integer.",
        ),
    ColumnSpec::new(PinColumn::NameFontSize, "name font size", Optional, Float)
        .default("50")
        .sticky()
        .info("Pin name font size in mils."),
    ColumnSpec::new(PinColumn::NumberFontSize, "number font size", Optional, Float)
        .default("50")
        .sticky()
        .info("Pin number font size in mils."),
];

/// Trim, lower-case and collapse whitespace, `-` and `_` into single spaces.
pub fn normalize_column_name(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Which of the two header rows is being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderRole {
    /// The first header; its leading cell names a symbol column.
    Symbol,
    /// The second header; its leading cell is empty.
    Pin,
}

/// A validated header: normalized cells plus a name to column index map.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderMap {
    header: Vec<String>,
    columns: HashMap<String, usize>,
}

impl HeaderMap {
    pub fn validate<C>(row: &Row, specs: &[ColumnSpec<C>], role: HeaderRole) -> Result<Self> {
        let header: Vec<String> = row.cells.iter().map(|c| normalize_column_name(c)).collect();
        let location = &row.location;
        let lead_empty = header.first().map_or(true, String::is_empty);

        match role {
            HeaderRole::Symbol if lead_empty => {
                return Err(Error::header(
                    "Column 0 in the first line header must contain a mandatory field!",
                    location,
                ));
            }
            HeaderRole::Pin if !lead_empty => {
                return Err(Error::header(
                    "Column 0 in the second line header must be empty!",
                    location,
                ));
            }
            _ => {}
        }

        let mut columns = HashMap::new();
        for (idx, name) in header.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            if columns.insert(name.clone(), idx).is_some() {
                return Err(Error::header(
                    format!("Column: {name:?} exists more than once in header: {:?}", row.cells),
                    location,
                ));
            }
        }

        let missing: Vec<&str> = specs
            .iter()
            .filter(|spec| spec.necessity.column_required() && !columns.contains_key(spec.name))
            .map(|spec| spec.name)
            .collect();
        if !missing.is_empty() {
            return Err(Error::header(
                format!("Headline: {:?} misses required fields: {missing:?}", row.cells),
                location,
            ));
        }

        let unknown: Vec<&str> = header
            .iter()
            .filter(|name| !name.is_empty() && !specs.iter().any(|spec| spec.name == name.as_str()))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(Error::header(
                format!("Headline: {:?} has surplus fields: {unknown:?}", row.cells),
                location,
            ));
        }

        log::debug!("Validated {role:?} header with {} column(s) {location}", columns.len());
        Ok(Self { header, columns })
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    /// The cell under `name`, empty when the column or the cell is absent.
    pub fn cell<'r>(&self, row: &'r Row, name: &str) -> &'r str {
        self.column(name)
            .and_then(|idx| row.cells.get(idx))
            .map_or("", String::as_str)
    }

    /// Describe the first cell that has no header slot, if any.
    pub fn surplus(&self, row: &Row, entity: &str) -> Option<String> {
        if row.cells.len() > self.header.len() {
            return Some(format!("Surplus {entity} data fields: {:?}", row.cells));
        }
        row.cells
            .iter()
            .zip(&self.header)
            .find(|(cell, name)| name.is_empty() && !cell.is_empty())
            .map(|(cell, _)| format!("Surplus {entity} data field {cell:?}"))
    }
}

fn describe_table<C>(out: &mut String, title: &str, intro: &str, specs: &[ColumnSpec<C>]) {
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "=".repeat(title.len()));
    let _ = writeln!(out, "{intro}\n");
    for spec in specs {
        let default = spec.default.unwrap_or("no default");
        let _ = writeln!(
            out,
            "{:<20} -- {};  Type: {};  Is sticky: {};  Default: {}",
            spec.name,
            spec.necessity.describe(),
            spec.kind.describe(),
            spec.sticky,
            default
        );
        if spec.is_enumerated() {
            let _ = writeln!(out, "    Valid values: {}", spec.valid.join(", "));
        }
        if !spec.info.is_empty() {
            let _ = writeln!(out, "{}", spec.info);
        }
        out.push('\n');
    }
}

/// Human readable documentation of both column tables.
pub fn column_documentation() -> String {
    let mut out = String::new();
    describe_table(
        &mut out,
        "Symbol Description",
        "The first header line describes symbol rows. Its first column must name a\n\
         symbol column. Header entries are case insensitive; '-', '_' and spaces are\n\
         interchangeable.",
        SYMBOL_COLUMNS,
    );
    describe_table(
        &mut out,
        "Pin Description",
        "The second header line describes pin rows. Its first column must be empty.\n\
         Sticky columns are copied from the previous pin of the same symbol.",
        PIN_COLUMNS,
    );
    let _ = writeln!(out, "A pin grid unit is {GRID_MM} mm.");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        Row::new(
            cells.iter().map(|c| c.to_string()).collect(),
            Location::new("test.csv", 1, 1),
        )
    }

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("  Derive-From "), "derive from");
        assert_eq!(normalize_column_name("derive_from"), "derive from");
        assert_eq!(normalize_column_name("H R/V  Gap"), "h r/v gap");
        assert_eq!(normalize_column_name(""), "");
    }

    #[test]
    fn test_validate_symbol_header() {
        let header = row(&[
            "Symbol Name",
            "Footprint",
            "",
            "datasheet",
            "DESCRIPTION",
            "keywords",
        ]);
        let map = HeaderMap::validate(&header, SYMBOL_COLUMNS, HeaderRole::Symbol).unwrap();
        assert_eq!(map.column("symbol name"), Some(0));
        assert_eq!(map.column("datasheet"), Some(3));
        assert_eq!(map.column("reference"), None);

        // validating twice yields equal maps
        let again = HeaderMap::validate(&header, SYMBOL_COLUMNS, HeaderRole::Symbol).unwrap();
        assert_eq!(map, again);
    }

    #[test]
    fn test_header_errors() {
        let lead_empty = row(&["", "symbol name"]);
        let err = HeaderMap::validate(&lead_empty, SYMBOL_COLUMNS, HeaderRole::Symbol).unwrap_err();
        assert!(matches!(err, Error::Header { .. }));

        let duplicate = row(&["symbol name", "footprint", "Footprint"]);
        let err = HeaderMap::validate(&duplicate, SYMBOL_COLUMNS, HeaderRole::Symbol).unwrap_err();
        assert!(err.message().contains("more than once"));

        let missing = row(&["symbol name", "footprint"]);
        let err = HeaderMap::validate(&missing, SYMBOL_COLUMNS, HeaderRole::Symbol).unwrap_err();
        assert!(err.message().contains("\"datasheet\""));
        assert!(err.message().contains("\"keywords\""));

        let unknown = row(&["", "pin category", "pin number", "pin name", "pin gr type", "pin el type", "color"]);
        let err = HeaderMap::validate(&unknown, PIN_COLUMNS, HeaderRole::Pin).unwrap_err();
        assert!(err.message().contains("surplus fields: [\"color\"]"));

        let lead_set = row(&["pin category", "pin number"]);
        let err = HeaderMap::validate(&lead_set, PIN_COLUMNS, HeaderRole::Pin).unwrap_err();
        assert!(err.message().contains("must be empty"));
    }

    #[test]
    fn test_cell_and_surplus() {
        let header = row(&["", "pin category", "pin number", "pin name", "pin gr type", "pin el type", ""]);
        let map = HeaderMap::validate(&header, PIN_COLUMNS, HeaderRole::Pin).unwrap();

        let data = row(&["", "left", "1"]);
        assert_eq!(map.cell(&data, "pin number"), "1");
        assert_eq!(map.cell(&data, "pin name"), "");
        assert_eq!(map.cell(&data, "pin length"), "");
        assert!(map.surplus(&data, "pin").is_none());

        let under_empty = row(&["", "left", "1", "A", "", "input", "oops"]);
        assert_eq!(
            map.surplus(&under_empty, "pin").as_deref(),
            Some("Surplus pin data field \"oops\"")
        );

        let too_long = row(&["", "left", "1", "A", "", "input", "", "x"]);
        assert!(map.surplus(&too_long, "pin").unwrap().starts_with("Surplus pin data fields"));
    }

    #[test]
    fn test_convert() {
        let loc = Location::default();
        assert_eq!(ColumnKind::Bool.convert("Yes", "in bom", &loc).unwrap(), Value::Bool(true));
        assert_eq!(ColumnKind::Bool.convert("", "in bom", &loc).unwrap(), Value::Bool(false));
        assert!(matches!(
            ColumnKind::Bool.convert("maybe", "in bom", &loc),
            Err(Error::Validation { .. })
        ));
        assert_eq!(ColumnKind::Int.convert("20", "x", &loc).unwrap(), Value::Int(20));
        assert!(ColumnKind::Int.convert("2.5", "x", &loc).is_err());
        assert_eq!(ColumnKind::Float.convert("0.5", "x", &loc).unwrap(), Value::Float(0.5));
    }

    #[test]
    fn test_column_documentation_lists_every_column() {
        let doc = column_documentation();
        for spec in SYMBOL_COLUMNS {
            assert!(doc.contains(spec.name), "missing {}", spec.name);
        }
        for spec in PIN_COLUMNS {
            assert!(doc.contains(spec.name), "missing {}", spec.name);
        }
        assert!(doc.contains("Valid values: left, right, top, bottom, delete, before, after, overload"));
    }
}
