//! The fully positioned symbol handed to emitters.
//!
//! Coordinates and lengths are in pin grid units, font sizes and offsets in
//! mils. Y grows upwards.

use serde::Serialize;

use crate::error::Location;
use crate::pin::{ElectricalType, GraphicStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Justify {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub key: String,
    pub value: String,
    pub x: f64,
    pub y: f64,
    pub justify: Justify,
    pub hidden: bool,
}

impl Property {
    pub(crate) fn hidden(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            x: 0.0,
            y: 0.0,
            justify: Justify::Center,
            hidden: true,
        }
    }
}

/// The body rectangle, from the lower left to the upper right corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Body {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Caption {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alternate {
    pub name: String,
    pub electrical: ElectricalType,
    pub style: GraphicStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedPin {
    pub number: String,
    pub name: String,
    /// The connection point, `length` away from the body edge.
    pub x: f64,
    pub y: f64,
    pub rotation: u16,
    /// Zero for hidden pins.
    pub length: f64,
    pub style: GraphicStyle,
    pub electrical: ElectricalType,
    pub hidden: bool,
    pub name_font_size: f64,
    pub number_font_size: f64,
    pub alternates: Vec<Alternate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedSymbol {
    pub name: String,
    /// Set for KiCad extension symbols, which carry properties only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    pub properties: Vec<Property>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
    pub pins: Vec<PlacedPin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<Caption>,
    pub in_bom: bool,
    pub on_board: bool,
    pub hide_pin_numbers: bool,
    pub hide_pin_names: bool,
    pub pin_name_offset: f64,
    pub location: Location,
}

impl PlacedSymbol {
    pub fn property(&self, key: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.key == key)
    }

    pub fn pin(&self, number: &str) -> Option<&PlacedPin> {
        self.pins.iter().find(|p| p.number == number)
    }
}
