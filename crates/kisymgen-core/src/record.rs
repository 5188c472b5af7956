//! Turn validated rows into typed pins and symbols.

use crate::error::{Error, Result};
use crate::pin::{Category, ElectricalType, GraphicStyle, Pin, PinNumber};
use crate::registry::SymbolRegistry;
use crate::schema::{
    ColumnSpec, HeaderMap, Necessity, PinColumn, SymbolColumn, Value, PIN_COLUMNS, SYMBOL_COLUMNS,
};
use crate::source::Row;
use crate::symbol::{Parent, Symbol, SymbolAttributes};

/// Carry-forward state between the pin rows of one symbol.
#[derive(Debug, Default, Clone)]
pub struct PinContext {
    /// The last pin that was neither a gap nor a pseudo-pin.
    pub previous_pin: Option<Pin>,
    /// The category of the last pin row of any kind.
    pub previous_category: Option<Category>,
}

impl PinContext {
    pub fn remember(&mut self, pin: &Pin) {
        if !pin.is_gap() && !pin.is_pseudo() {
            self.previous_pin = Some(pin.clone());
        }
        self.previous_category = Some(pin.category);
    }

    fn sticky_value(&self, column: PinColumn) -> Option<String> {
        if column == PinColumn::Category {
            return self.previous_category.map(|c| c.as_str().to_string());
        }
        let pin = self.previous_pin.as_ref()?;
        let text = match column {
            PinColumn::GraphicStyle => pin.style.as_str().to_string(),
            PinColumn::ElectricalType => pin.electrical.as_str().to_string(),
            PinColumn::Length => pin.length.to_string(),
            PinColumn::NameFontSize => pin.name_font_size.to_string(),
            PinColumn::NumberFontSize => pin.number_font_size.to_string(),
            _ => return None,
        };
        Some(text)
    }
}

/// Accumulates pin columns until every one has been seen.
#[derive(Debug, Default)]
struct PinDraft {
    category: Option<Category>,
    number: Option<PinNumber>,
    name: String,
    style: Option<GraphicStyle>,
    electrical: Option<ElectricalType>,
    stacked: bool,
    hidden: bool,
    length: Option<f64>,
    name_font_size: Option<f64>,
    number_font_size: Option<f64>,
}

impl PinDraft {
    fn set(&mut self, column: PinColumn, raw: &str, value: Value, row: &Row) -> Result<()> {
        let location = &row.location;
        let unknown = || Error::logic(format!("Unexpected value {raw:?} for {column:?}"), location);
        match column {
            PinColumn::Category => self.category = Some(Category::parse(raw).ok_or_else(unknown)?),
            PinColumn::Number if raw.is_empty() => self.number = Some(PinNumber::None),
            PinColumn::Number => self.number = Some(PinNumber::parse(raw, location)?),
            PinColumn::Name => self.name = raw.to_string(),
            PinColumn::GraphicStyle => self.style = Some(GraphicStyle::parse(raw).ok_or_else(unknown)?),
            PinColumn::ElectricalType => {
                self.electrical = Some(ElectricalType::parse(raw).ok_or_else(unknown)?)
            }
            PinColumn::Stacked => self.stacked = value.as_bool().ok_or_else(unknown)?,
            PinColumn::Hidden => self.hidden = value.as_bool().ok_or_else(unknown)?,
            PinColumn::Length => self.length = value.as_float(),
            PinColumn::NameFontSize => self.name_font_size = value.as_float(),
            PinColumn::NumberFontSize => self.number_font_size = value.as_float(),
        }
        Ok(())
    }

    /// Gaps and pseudo-pins keep the column defaults for the columns they skip.
    fn finish(self, row: &Row) -> Result<Pin> {
        let category = self
            .category
            .ok_or_else(|| Error::logic("Pin without category", &row.location))?;
        Ok(Pin {
            location: row.location.clone(),
            protected: false,
            category,
            number: self.number.unwrap_or(PinNumber::None),
            name: self.name,
            style: self.style.unwrap_or(GraphicStyle::Line),
            electrical: self.electrical.unwrap_or(ElectricalType::Unspecified),
            stacked: self.stacked,
            hidden: self.hidden,
            length: self.length.unwrap_or(1.0),
            name_font_size: self.name_font_size.unwrap_or(50.0),
            number_font_size: self.number_font_size.unwrap_or(50.0),
        })
    }
}

fn check_valid<C>(spec: &ColumnSpec<C>, value: &str, row: &Row) -> Result<()> {
    if spec.is_enumerated() && !spec.valid.contains(&value) {
        return Err(Error::validation(
            format!(
                "Column {} value {value:?} is invalid! Valid values: {}",
                spec.name,
                spec.valid.join(", ")
            ),
            &row.location,
        ));
    }
    Ok(())
}

/// Build one pin from a pin row.
pub fn build_pin(header: &HeaderMap, row: &Row, context: &PinContext) -> Result<Pin> {
    if let Some(message) = header.surplus(row, "pin") {
        return Err(Error::pin(message, &row.location));
    }

    let mut draft = PinDraft::default();
    let mut cut_off: Option<&str> = None;

    for spec in PIN_COLUMNS {
        let check = cut_off.is_none();
        let mut value = header.cell(row, spec.name).to_string();

        if spec.id == PinColumn::Number && PinNumber::is_gap_marker(&value) {
            cut_off = Some("pin gap");
        }
        if spec.id == PinColumn::Name {
            if let Some(category) = draft.category.filter(|c| c.is_pseudo()) {
                cut_off = Some("pseudo pin");
                let numbered = !matches!(draft.number, None | Some(PinNumber::None));
                if category == Category::Overload && numbered {
                    return Err(Error::pin(
                        "Pin number is not allowed for overload!",
                        &row.location,
                    ));
                }
            }
        }

        if !check {
            if !value.is_empty() {
                log::warn!(
                    "Ignored value: {value:?} in {} column: {:?} {}",
                    cut_off.unwrap_or_default(),
                    spec.name,
                    row.location
                );
            }
            continue;
        }

        if value.is_empty() && spec.sticky {
            if let Some(previous) = context.sticky_value(spec.id) {
                value = previous;
            }
        }
        if value.is_empty()
            && spec.necessity == Necessity::RequiredNonEmpty
            && draft.category != Some(Category::Overload)
        {
            return Err(Error::pin(
                format!("Value is required for {:?}", spec.name),
                &row.location,
            ));
        }
        if value.is_empty() {
            if let Some(default) = spec.default {
                value = default.to_string();
            }
        }
        check_valid(spec, &value, row)?;

        if !value.is_empty() || spec.necessity != Necessity::Optional {
            let converted = spec.kind.convert(&value, spec.name, &row.location)?;
            draft.set(spec.id, &value, converted, row)?;
        }
    }

    let pin = draft.finish(row)?;
    log::trace!("Built pin {pin} {}", row.location);
    Ok(pin)
}

/// Build a symbol (without pins) from a symbol row.
///
/// `derive from` and `kicad extends` must name symbols already in
/// `registry`. Empty cells of a derived symbol copy the parent's value.
pub fn build_symbol(header: &HeaderMap, row: &Row, registry: &SymbolRegistry) -> Result<Symbol> {
    let location = &row.location;
    if let Some(message) = header.surplus(row, "symbol") {
        return Err(Error::symbol(message, location));
    }

    let mut attributes = SymbolAttributes::default();
    let mut parent = Parent::None;
    let mut derived_from: Option<&Symbol> = None;

    for spec in SYMBOL_COLUMNS {
        let mut value = header.cell(row, spec.name).to_string();

        match spec.id {
            SymbolColumn::DeriveFrom if !value.is_empty() => {
                let base = registry.get(&value).ok_or_else(|| {
                    Error::symbol(format!("Derived from symbol {value:?} not found!"), location)
                })?;
                if base.is_extension() {
                    return Err(Error::symbol(
                        format!("Cannot derive from extension symbol {value:?}"),
                        location,
                    ));
                }
                derived_from = Some(base);
                parent = Parent::DeriveFrom(value);
                continue;
            }
            SymbolColumn::KicadExtends if !value.is_empty() => {
                if derived_from.is_some() {
                    return Err(Error::symbol(
                        format!(
                            "Cannot extend and derive from another symbol {:?}",
                            attributes.name
                        ),
                        location,
                    ));
                }
                if !registry.contains(&value) {
                    return Err(Error::symbol(
                        format!("Symbol to extend {value:?} not found!"),
                        location,
                    ));
                }
                parent = Parent::Extends(value);
                continue;
            }
            SymbolColumn::DeriveFrom | SymbolColumn::KicadExtends => continue,
            _ => {}
        }

        if value.is_empty() {
            if let Some(inherited) = derived_from.and_then(|base| base.attributes.get(spec.id)) {
                attributes.set(spec.id, inherited, location)?;
                continue;
            }
            if spec.necessity == Necessity::RequiredNonEmpty {
                return Err(Error::symbol(
                    format!("Value is required for {:?}", spec.name),
                    location,
                ));
            }
        }

        if matches!(parent, Parent::Extends(_))
            && !value.is_empty()
            && !spec.id.allowed_on_extension()
        {
            return Err(Error::symbol(
                format!(
                    "{:?} is not allowed for extension symbols in symbol: {:?}",
                    spec.name, attributes.name
                ),
                location,
            ));
        }

        if value.is_empty() {
            if let Some(default) = spec.default {
                value = default.to_string();
            }
        }
        check_valid(spec, &value, row)?;

        if value.is_empty() && spec.necessity == Necessity::Optional {
            continue;
        }
        let converted = spec.kind.convert(&value, spec.name, location)?;
        if let (SymbolColumn::MinWidth | SymbolColumn::MinHeight, Value::Int(size)) =
            (spec.id, &converted)
        {
            if size % 2 != 0 {
                return Err(Error::symbol(
                    format!(
                        "{} must be even. Value is: {size} in symbol: {:?}",
                        spec.name, attributes.name
                    ),
                    location,
                ));
            }
        }
        attributes.set(spec.id, converted, location)?;
    }

    log::debug!("Built symbol {:?} {location}", attributes.name);
    Ok(Symbol::new(location.clone(), attributes, parent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Location;
    use crate::pin::Side;
    use crate::schema::HeaderRole;

    fn row(cells: &[&str]) -> Row {
        Row::new(
            cells.iter().map(|c| c.to_string()).collect(),
            Location::new("test.csv", 3, 3),
        )
    }

    fn pin_header() -> HeaderMap {
        let header = row(&[
            "",
            "pin category",
            "pin number",
            "pin name",
            "pin gr type",
            "pin el type",
            "pin hidden",
            "pin length",
        ]);
        HeaderMap::validate(&header, PIN_COLUMNS, HeaderRole::Pin).unwrap()
    }

    fn symbol_header() -> HeaderMap {
        let header = row(&[
            "symbol name",
            "derive from",
            "kicad extends",
            "footprint",
            "datasheet",
            "description",
            "keywords",
            "min width",
            "text",
        ]);
        HeaderMap::validate(&header, SYMBOL_COLUMNS, HeaderRole::Symbol).unwrap()
    }

    #[test]
    fn test_build_pin_with_defaults() {
        let pin = build_pin(
            &pin_header(),
            &row(&["", "left", "1", "A", "", "input"]),
            &PinContext::default(),
        )
        .unwrap();
        assert_eq!(pin.category, Category::Side(Side::Left));
        assert_eq!(pin.number, PinNumber::Wires(vec!["1".into()]));
        assert_eq!(pin.style, GraphicStyle::Line);
        assert_eq!(pin.electrical, ElectricalType::Input);
        assert_eq!(pin.length, 1.0);
        assert!(!pin.hidden);
    }

    #[test]
    fn test_sticky_columns() {
        let header = pin_header();
        let mut context = PinContext::default();
        let first = build_pin(
            &header,
            &row(&["", "right", "1", "A", "clock", "output", "", "2.5"]),
            &context,
        )
        .unwrap();
        context.remember(&first);

        let gap = build_pin(&header, &row(&["", "", "--- 2"]), &context).unwrap();
        assert!(gap.is_gap());
        assert_eq!(gap.category, Category::Side(Side::Right));
        context.remember(&gap);

        let second = build_pin(&header, &row(&["", "", "2", "B", "", "", "yes"]), &context).unwrap();
        assert_eq!(second.category, Category::Side(Side::Right));
        assert_eq!(second.style, GraphicStyle::Clock);
        assert_eq!(second.electrical, ElectricalType::Output);
        assert_eq!(second.length, 2.5);
        assert!(second.hidden);
    }

    #[test]
    fn test_pin_errors() {
        let header = pin_header();
        let ctx = PinContext::default();

        let missing_el = build_pin(&header, &row(&["", "left", "1", "A"]), &ctx).unwrap_err();
        assert!(matches!(missing_el, Error::Pin { .. }));

        let bad_style = build_pin(&header, &row(&["", "left", "1", "A", "wavy", "input"]), &ctx)
            .unwrap_err();
        assert!(matches!(bad_style, Error::Validation { .. }));

        let numbered_overload =
            build_pin(&header, &row(&["", "overload", "3"]), &ctx).unwrap_err();
        assert_eq!(numbered_overload.message(), "Pin number is not allowed for overload!");

        let bad_gap = build_pin(&header, &row(&["", "left", "--- 0"]), &ctx).unwrap_err();
        assert!(matches!(bad_gap, Error::Pin { .. }));

        let dup_bus = build_pin(&header, &row(&["", "left", "1,2,1", "D$", "", "input"]), &ctx)
            .unwrap_err();
        assert!(dup_bus.message().contains("Duplicate pin"));

        let surplus = build_pin(&header, &row(&["", "left", "1", "A", "", "input", "", "", "x"]), &ctx)
            .unwrap_err();
        assert!(matches!(surplus, Error::Pin { .. }));
    }

    #[test]
    fn test_pseudo_pins_skip_later_columns() {
        let header = pin_header();
        let ctx = PinContext::default();
        let overload = build_pin(&header, &row(&["", "overload"]), &ctx).unwrap();
        assert_eq!(overload.category, Category::Overload);
        assert_eq!(overload.number, PinNumber::None);

        // "wavy" is never validated for a pseudo-pin
        let delete = build_pin(&header, &row(&["", "delete", "2", "", "wavy"]), &ctx).unwrap();
        assert_eq!(delete.category, Category::Delete);
        assert_eq!(delete.number.keys(), vec!["2"]);
    }

    #[test]
    fn test_build_symbol_defaults_and_checks() {
        let header = symbol_header();
        let registry = SymbolRegistry::default();
        let sym = build_symbol(
            &header,
            &row(&["U1", "", "", "fp", "ds", "desc", "kw", "", "Hello"]),
            &registry,
        )
        .unwrap();
        assert_eq!(sym.name(), "U1");
        assert_eq!(sym.attributes.value(), "U1");
        assert_eq!(sym.attributes.reference, "U");
        assert_eq!(sym.attributes.min_width, 2);
        assert_eq!(sym.attributes.text.as_deref(), Some("Hello"));
        assert_eq!(sym.attributes.fp_filters, None);
        assert_eq!(sym.parent, Parent::None);

        let odd = build_symbol(
            &header,
            &row(&["U2", "", "", "", "", "", "", "3"]),
            &registry,
        )
        .unwrap_err();
        assert!(matches!(odd, Error::Symbol { .. }));
        assert!(odd.message().contains("must be even"));

        let missing_parent = build_symbol(&header, &row(&["U3", "NOPE"]), &registry).unwrap_err();
        assert!(missing_parent.message().contains("not found"));
    }

    #[test]
    fn test_derived_symbol_copies_parent_attributes() {
        let header = symbol_header();
        let mut registry = SymbolRegistry::default();
        let base = build_symbol(
            &header,
            &row(&["BASE", "", "", "fp", "ds", "desc", "kw", "4", "Title"]),
            &registry,
        )
        .unwrap();
        registry.insert(base).unwrap();

        let child = build_symbol(
            &header,
            &row(&["CHILD", "BASE", "", "", "other", "", "", "", ""]),
            &registry,
        )
        .unwrap();
        assert_eq!(child.parent, Parent::DeriveFrom("BASE".into()));
        assert_eq!(child.attributes.footprint, "fp");
        assert_eq!(child.attributes.datasheet, "other");
        assert_eq!(child.attributes.min_width, 4);
        assert_eq!(child.attributes.text.as_deref(), Some("Title"));

        let both = build_symbol(&header, &row(&["X", "BASE", "BASE"]), &registry).unwrap_err();
        assert!(both.message().contains("Cannot extend and derive"));
    }

    #[test]
    fn test_extension_symbol_rules() {
        let header = symbol_header();
        let mut registry = SymbolRegistry::default();
        let base = build_symbol(&header, &row(&["BASE", "", "", "fp"]), &registry).unwrap();
        registry.insert(base).unwrap();

        let ext = build_symbol(&header, &row(&["EXT", "", "BASE", "fp2"]), &registry).unwrap();
        assert_eq!(ext.extends(), Some("BASE"));
        assert_eq!(ext.attributes.footprint, "fp2");
        registry.insert(ext).unwrap();

        let not_allowed = build_symbol(
            &header,
            &row(&["EXT2", "", "BASE", "", "", "", "", "4"]),
            &registry,
        )
        .unwrap_err();
        assert!(not_allowed.message().contains("not allowed for extension"));

        let from_ext = build_symbol(&header, &row(&["D", "EXT"]), &registry).unwrap_err();
        assert!(matches!(from_ext, Error::Symbol { .. }));
    }
}
