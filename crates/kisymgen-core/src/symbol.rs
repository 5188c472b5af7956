use serde::Serialize;

use crate::error::{Error, Location, Result};
use crate::pin::Pin;
use crate::schema::{SymbolColumn, Value};

/// Typed symbol attributes, one field per symbol column.
///
/// Sizes and gaps are in pin grid units, font sizes and offsets in mils.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolAttributes {
    pub name: String,
    pub footprint: String,
    pub datasheet: String,
    pub description: String,
    pub keywords: String,
    pub fp_filters: Option<String>,
    pub reference: String,
    pub text: Option<String>,
    pub in_bom: bool,
    pub on_board: bool,
    pub hide_pin_numbers: bool,
    pub pin_name_offset: i64,
    pub hide_pin_names: bool,
    pub min_width: i64,
    pub min_height: i64,
    pub w_padding: f64,
    pub h_padding: f64,
    pub text_font_size: i64,
    pub text_gap: Option<f64>,
    pub h_ref_value_gap: f64,
    pub w_ref_value_pin_gap: f64,
}

impl Default for SymbolAttributes {
    fn default() -> Self {
        Self {
            name: String::new(),
            footprint: String::new(),
            datasheet: String::new(),
            description: String::new(),
            keywords: String::new(),
            fp_filters: None,
            reference: "U".to_string(),
            text: None,
            in_bom: true,
            on_board: true,
            hide_pin_numbers: false,
            pin_name_offset: 20,
            hide_pin_names: false,
            min_width: 2,
            min_height: 2,
            w_padding: 1.0,
            h_padding: 1.0,
            text_font_size: 50,
            text_gap: None,
            h_ref_value_gap: 0.5,
            w_ref_value_pin_gap: 0.75,
        }
    }
}

impl SymbolAttributes {
    /// KiCad requires the value to equal the name.
    pub fn value(&self) -> &str {
        &self.name
    }

    /// The stored value of a column, `None` when unset.
    ///
    /// Parent links are not attributes and always read as `None`.
    pub fn get(&self, column: SymbolColumn) -> Option<Value> {
        let text = |s: &String| Some(Value::Text(s.clone()));
        match column {
            SymbolColumn::Name => text(&self.name),
            SymbolColumn::DeriveFrom | SymbolColumn::KicadExtends => None,
            SymbolColumn::Footprint => text(&self.footprint),
            SymbolColumn::Datasheet => text(&self.datasheet),
            SymbolColumn::Description => text(&self.description),
            SymbolColumn::Keywords => text(&self.keywords),
            SymbolColumn::FpFilters => self.fp_filters.clone().map(Value::Text),
            SymbolColumn::Reference => text(&self.reference),
            SymbolColumn::Text => self.text.clone().map(Value::Text),
            SymbolColumn::InBom => Some(Value::Bool(self.in_bom)),
            SymbolColumn::OnBoard => Some(Value::Bool(self.on_board)),
            SymbolColumn::HidePinNumbers => Some(Value::Bool(self.hide_pin_numbers)),
            SymbolColumn::PinNameOffset => Some(Value::Int(self.pin_name_offset)),
            SymbolColumn::HidePinNames => Some(Value::Bool(self.hide_pin_names)),
            SymbolColumn::MinWidth => Some(Value::Int(self.min_width)),
            SymbolColumn::MinHeight => Some(Value::Int(self.min_height)),
            SymbolColumn::WPadding => Some(Value::Float(self.w_padding)),
            SymbolColumn::HPadding => Some(Value::Float(self.h_padding)),
            SymbolColumn::TextFontSize => Some(Value::Int(self.text_font_size)),
            SymbolColumn::TextGap => self.text_gap.map(Value::Float),
            SymbolColumn::HRefValueGap => Some(Value::Float(self.h_ref_value_gap)),
            SymbolColumn::WRefValuePinGap => Some(Value::Float(self.w_ref_value_pin_gap)),
        }
    }

    /// Store a converted value into the field behind `column`.
    pub fn set(&mut self, column: SymbolColumn, value: Value, location: &Location) -> Result<()> {
        let mismatch = || {
            Error::logic(
                format!("Value {value:?} does not fit symbol column {column:?}"),
                location,
            )
        };
        macro_rules! store {
            ($field:expr, $getter:ident) => {
                $field = value.$getter().ok_or_else(mismatch)?.into()
            };
        }
        match column {
            SymbolColumn::Name => store!(self.name, as_text),
            SymbolColumn::DeriveFrom | SymbolColumn::KicadExtends => return Err(mismatch()),
            SymbolColumn::Footprint => store!(self.footprint, as_text),
            SymbolColumn::Datasheet => store!(self.datasheet, as_text),
            SymbolColumn::Description => store!(self.description, as_text),
            SymbolColumn::Keywords => store!(self.keywords, as_text),
            SymbolColumn::FpFilters => {
                self.fp_filters = Some(value.as_text().ok_or_else(mismatch)?.to_string())
            }
            SymbolColumn::Reference => store!(self.reference, as_text),
            SymbolColumn::Text => self.text = Some(value.as_text().ok_or_else(mismatch)?.to_string()),
            SymbolColumn::InBom => store!(self.in_bom, as_bool),
            SymbolColumn::OnBoard => store!(self.on_board, as_bool),
            SymbolColumn::HidePinNumbers => store!(self.hide_pin_numbers, as_bool),
            SymbolColumn::PinNameOffset => store!(self.pin_name_offset, as_int),
            SymbolColumn::HidePinNames => store!(self.hide_pin_names, as_bool),
            SymbolColumn::MinWidth => store!(self.min_width, as_int),
            SymbolColumn::MinHeight => store!(self.min_height, as_int),
            SymbolColumn::WPadding => store!(self.w_padding, as_float),
            SymbolColumn::HPadding => store!(self.h_padding, as_float),
            SymbolColumn::TextFontSize => store!(self.text_font_size, as_int),
            SymbolColumn::TextGap => self.text_gap = Some(value.as_float().ok_or_else(mismatch)?),
            SymbolColumn::HRefValueGap => store!(self.h_ref_value_gap, as_float),
            SymbolColumn::WRefValuePinGap => store!(self.w_ref_value_pin_gap, as_float),
        }
        Ok(())
    }
}

/// How a symbol relates to an earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Parent {
    None,
    /// A KiCad extension: same pins and body, own properties.
    Extends(String),
    /// Attributes and pins are copied from the parent and patched.
    DeriveFrom(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Symbol {
    pub location: Location,
    pub attributes: SymbolAttributes,
    pub pins: Vec<Pin>,
    pub parent: Parent,
}

impl Symbol {
    pub fn new(location: Location, attributes: SymbolAttributes, parent: Parent) -> Self {
        Self {
            location,
            attributes,
            pins: Vec::new(),
            parent,
        }
    }

    pub fn name(&self) -> &str {
        &self.attributes.name
    }

    pub fn is_extension(&self) -> bool {
        matches!(self.parent, Parent::Extends(_))
    }

    pub fn extends(&self) -> Option<&str> {
        match &self.parent {
            Parent::Extends(name) => Some(name),
            _ => None,
        }
    }

    pub fn derives_from(&self) -> Option<&str> {
        match &self.parent {
            Parent::DeriveFrom(name) => Some(name),
            _ => None,
        }
    }
}
