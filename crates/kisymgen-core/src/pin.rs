use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Location, Result};

/// Declares a closed set of lower-case keywords with lookup in both directions.
macro_rules! keyword_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const NAMES: &'static [&'static str] = &[$($text),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn parse(text: &str) -> Option<Self> {
                match text {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

keyword_enum!(
    /// The side of the body a pin sits on.
    Side {
        Left => "left",
        Right => "right",
        Top => "top",
        Bottom => "bottom",
    }
);

keyword_enum!(
    /// KiCad pin graphic style.
    GraphicStyle {
        Line => "line",
        Inverted => "inverted",
        Clock => "clock",
        InvertedClock => "inverted_clock",
        InputLow => "input_low",
        ClockLow => "clock_low",
        OutputLow => "output_low",
        EdgeClockHigh => "edge_clock_high",
        NonLogic => "non_logic",
    }
);

keyword_enum!(
    /// KiCad pin electrical type.
    ElectricalType {
        Input => "input",
        Output => "output",
        Bidirectional => "bidirectional",
        TriState => "tri_state",
        OpenCollector => "open_collector",
        OpenEmitter => "open_emitter",
        Passive => "passive",
        Free => "free",
        Unspecified => "unspecified",
        NoConnect => "no_connect",
        PowerIn => "power_in",
        PowerOut => "power_out",
    }
);

impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];

    /// Rotation in degrees of a pin on this side.
    pub fn rotation(self) -> u16 {
        match self {
            Side::Left => 0,
            Side::Right => 180,
            Side::Top => 270,
            Side::Bottom => 90,
        }
    }
}

/// A pin's category: a side for real pins, or a patch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Side(Side),
    Delete,
    Before,
    After,
    Overload,
}

impl Category {
    pub const NAMES: &'static [&'static str] = &[
        "left", "right", "top", "bottom", "delete", "before", "after", "overload",
    ];

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "delete" => Some(Category::Delete),
            "before" => Some(Category::Before),
            "after" => Some(Category::After),
            "overload" => Some(Category::Overload),
            other => Side::parse(other).map(Category::Side),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Side(side) => side.as_str(),
            Category::Delete => "delete",
            Category::Before => "before",
            Category::After => "after",
            Category::Overload => "overload",
        }
    }

    pub fn is_pseudo(self) -> bool {
        !matches!(self, Category::Side(_))
    }

    pub fn side(self) -> Option<Side> {
        match self {
            Category::Side(side) => Some(side),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The content of the pin number cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PinNumber {
    /// No number; only the overload pseudo-pin has none.
    None,
    /// `---` or `--- n`: layout space for `count` pins.
    Gap { marker: String, count: u32 },
    /// One number, or a bus given as a comma separated list.
    Wires(Vec<String>),
}

impl PinNumber {
    pub fn is_gap_marker(text: &str) -> bool {
        text.starts_with("---")
    }

    /// Parse a non-empty number cell.
    pub fn parse(text: &str, location: &Location) -> Result<Self> {
        if Self::is_gap_marker(text) {
            let count = parse_gap_count(text).ok_or_else(|| {
                Error::pin(format!("No valid gap count: value: {text:?}"), location)
            })?;
            return Ok(PinNumber::Gap {
                marker: text.to_string(),
                count,
            });
        }

        let wires: Vec<String> = text.split(',').map(|w| w.trim().to_string()).collect();
        let mut seen = HashSet::new();
        for wire in &wires {
            if !seen.insert(wire.as_str()) {
                return Err(Error::pin(
                    format!("Duplicate pin: {wire:?} in bus: {wires:?}"),
                    location,
                ));
            }
        }
        Ok(PinNumber::Wires(wires))
    }

    /// The comparable number list, used to match parent runs.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            PinNumber::None => Vec::new(),
            PinNumber::Gap { marker, .. } => vec![marker.as_str()],
            PinNumber::Wires(wires) => wires.iter().map(String::as_str).collect(),
        }
    }

    pub fn wires(&self) -> &[String] {
        match self {
            PinNumber::Wires(wires) => wires,
            _ => &[],
        }
    }

    pub fn is_gap(&self) -> bool {
        matches!(self, PinNumber::Gap { .. })
    }
}

impl fmt::Display for PinNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinNumber::None => Ok(()),
            PinNumber::Gap { marker, .. } => f.write_str(marker),
            PinNumber::Wires(wires) => f.write_str(&wires.join(",")),
        }
    }
}

/// `---` is one gap, `--- 3` (or `---3`) is three. Zero and other suffixes are rejected.
fn parse_gap_count(text: &str) -> Option<u32> {
    let rest = text.trim_start_matches('-');
    if text.len() - rest.len() < 3 {
        return None;
    }
    let rest = rest.trim_start();
    if rest.is_empty() {
        return Some(1);
    }
    if !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse::<u32>().ok().filter(|count| *count >= 1)
}

/// One pin row after validation and conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pin {
    pub location: Location,
    #[serde(skip)]
    pub protected: bool,
    pub category: Category,
    pub number: PinNumber,
    pub name: String,
    pub style: GraphicStyle,
    pub electrical: ElectricalType,
    pub stacked: bool,
    pub hidden: bool,
    /// In pin grid units.
    pub length: f64,
    /// In mils.
    pub name_font_size: f64,
    /// In mils.
    pub number_font_size: f64,
}

impl Pin {
    pub fn is_gap(&self) -> bool {
        self.number.is_gap()
    }

    pub fn is_pseudo(&self) -> bool {
        self.category.is_pseudo()
    }

    pub fn gap_count(&self) -> u32 {
        match self.number {
            PinNumber::Gap { count, .. } => count,
            _ => 0,
        }
    }

    /// Whether `other` is an alternate function of `self`.
    ///
    /// Neither pin may be a gap, and the numbers of `other` must be a
    /// non-empty subset of the numbers of `self`.
    pub fn is_alt_function(&self, other: &Pin) -> bool {
        if self.is_gap() || other.is_gap() {
            return false;
        }
        let mine = self.number.wires();
        let theirs = other.number.wires();
        !theirs.is_empty() && theirs.iter().all(|wire| mine.contains(wire))
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} {:?}", self.category, self.number.to_string(), self.name)
    }
}
