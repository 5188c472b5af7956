//! Body size, pin placement and property positions.
//!
//! All arithmetic happens in pin grid units. A side with `p` effective pins
//! needs an edge of `2 * half_len(p)` units; pins are centred on that edge
//! so the body stays symmetric around the origin.

use std::collections::HashSet;

use crate::bus::{self, SideItem, Wire};
use crate::error::{Error, Result};
use crate::pin::{Pin, Side};
use crate::placed::{Alternate, Body, Caption, Justify, PlacedPin, PlacedSymbol, Property};
use crate::registry::SymbolRegistry;
use crate::symbol::{Symbol, SymbolAttributes};

/// Gap between the body and the first hidden property, in grid units.
const HIDDEN_TEXT_GAP: f64 = 1.0;
const TEXT_GAP: f64 = 0.5;
const TEXT_GAP_BIG: f64 = 2.5;
const TEXT_GAP_VERY_BIG: f64 = 5.5;
const PIN_COUNT_BIG: u32 = 5;
const PIN_COUNT_VERY_BIG: u32 = 15;

/// The geometry inputs of a symbol, derived from its pin list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinShapeProperties {
    pub half_width: i64,
    pub half_height: i64,
    pub count_left: u32,
    pub count_right: u32,
    pub count_top: u32,
    pub count_bottom: u32,
    pub len_left: f64,
    pub len_right: f64,
    pub len_top: f64,
    pub len_bottom: f64,
}

impl PinShapeProperties {
    pub fn count(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.count_left,
            Side::Right => self.count_right,
            Side::Top => self.count_top,
            Side::Bottom => self.count_bottom,
        }
    }

    pub fn max_length(&self, side: Side) -> f64 {
        match side {
            Side::Left => self.len_left,
            Side::Right => self.len_right,
            Side::Top => self.len_top,
            Side::Bottom => self.len_bottom,
        }
    }

    /// Half extent along the edge a side's pins are spread over.
    fn half_extent(&self, side: Side) -> i64 {
        match side {
            Side::Left | Side::Right => self.half_height,
            Side::Top | Side::Bottom => self.half_width,
        }
    }
}

/// `(p - 1) / 2` for odd `p`, `p / 2` for even `p`.
pub fn half_len(pin_count: u32) -> i64 {
    let p = i64::from(pin_count);
    if p % 2 == 1 {
        (p - 1) / 2
    } else {
        p / 2
    }
}

/// Offset of the first pin from the start of an edge of half length `half`.
pub fn center_start(half: i64, pin_count: u32) -> i64 {
    let p = i64::from(pin_count);
    let start = (2 * half + 1 - p).div_euclid(2);
    if p % 2 == 0 {
        start + 1
    } else {
        start
    }
}

fn add_slots(count: u32, slots: usize, pin: &Pin) -> Result<u32> {
    u32::try_from(slots)
        .ok()
        .and_then(|slots| count.checked_add(slots))
        .ok_or_else(|| {
            Error::pin(
                format!("Too many pin slots on one side: {pin}"),
                &pin.location,
            )
        })
}

fn side_pins(pins: &[Pin], side: Side) -> impl Iterator<Item = &Pin> {
    pins.iter().filter(move |pin| pin.category.side() == Some(side))
}

/// Layout slots used by one side.
///
/// Gaps count their repeat count and a primary pin counts its wires.
/// Alternate functions and stacked pins take no extra slot.
pub fn effective_pin_count(pins: &[Pin], side: Side) -> Result<u32> {
    let mut count = 0;
    let mut primary: Option<&Pin> = None;
    for pin in side_pins(pins, side) {
        if pin.stacked {
            if primary.is_some_and(|main| main.is_alt_function(pin)) {
                return Err(Error::pin(
                    format!("Alternate function must not be stacked: {pin}"),
                    &pin.location,
                ));
            }
            primary = None;
        } else if pin.is_gap() {
            count = add_slots(count, pin.gap_count() as usize, pin)?;
            primary = None;
        } else {
            match primary {
                Some(main) if main.is_alt_function(pin) => {
                    if main.hidden != pin.hidden {
                        return Err(Error::pin(
                            format!(
                                "Alternate function hidden: {} Main pin hidden: {} combination not allowed!",
                                pin.hidden, main.hidden
                            ),
                            &pin.location,
                        ));
                    }
                }
                _ => {
                    count = add_slots(count, pin.number.wires().len(), pin)?;
                    primary = Some(pin);
                }
            }
        }
    }
    log::trace!("{side} effective pin count: {count}");
    Ok(count)
}

fn max_pin_length(pins: &[Pin], side: Side) -> f64 {
    side_pins(pins, side)
        .filter(|pin| !pin.is_gap())
        .map(|pin| pin.length)
        .fold(0.0, f64::max)
}

/// Compute the pin shape of a symbol that has its own pins.
pub fn pin_shape(symbol: &Symbol) -> Result<PinShapeProperties> {
    if let Some(pseudo) = symbol.pins.iter().find(|pin| pin.is_pseudo()) {
        return Err(Error::logic(
            format!("Pseudo pin {pseudo} reached the geometry stage"),
            &pseudo.location,
        ));
    }
    let pins = &symbol.pins;
    let count_left = effective_pin_count(pins, Side::Left)?;
    let count_right = effective_pin_count(pins, Side::Right)?;
    let count_top = effective_pin_count(pins, Side::Top)?;
    let count_bottom = effective_pin_count(pins, Side::Bottom)?;

    let attrs = &symbol.attributes;
    let half_width = half_len(count_top.max(count_bottom)).max(attrs.min_width / 2);
    let half_height = half_len(count_left.max(count_right)).max(attrs.min_height / 2);

    let shape = PinShapeProperties {
        half_width,
        half_height,
        count_left,
        count_right,
        count_top,
        count_bottom,
        len_left: max_pin_length(pins, Side::Left),
        len_right: max_pin_length(pins, Side::Right),
        len_top: max_pin_length(pins, Side::Top),
        len_bottom: max_pin_length(pins, Side::Bottom),
    };
    log::debug!(
        "Pin shape of {:?}: half width {half_width}, half height {half_height}",
        symbol.name()
    );
    Ok(shape)
}

/// Whether the placer has put down a pin on its side yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlacerState {
    Fresh,
    Placed,
}

/// Walks the slots of one side.
#[derive(Debug)]
struct SidePlacer {
    side: Side,
    x: f64,
    y: f64,
    state: PlacerState,
}

impl SidePlacer {
    fn new(side: Side, shape: &PinShapeProperties, attrs: &SymbolAttributes) -> Self {
        let hw = shape.half_width as f64;
        let hh = shape.half_height as f64;
        let start = center_start(shape.half_extent(side), shape.count(side)) as f64;
        let (x, y) = match side {
            Side::Left => (-(hw + attrs.w_padding), hh - start),
            Side::Right => (hw + attrs.w_padding, hh - start),
            Side::Top => (-(hw - start), hh + attrs.h_padding),
            Side::Bottom => (-(hw - start), -(hh + attrs.h_padding)),
        };
        Self {
            side,
            x,
            y,
            state: PlacerState::Fresh,
        }
    }

    fn advance(&mut self) {
        match self.side {
            Side::Left | Side::Right => self.y -= 1.0,
            Side::Top | Side::Bottom => self.x += 1.0,
        }
    }

    fn skip(&mut self, count: u32) {
        let units = f64::from(count);
        match self.side {
            Side::Left | Side::Right => self.y -= units,
            Side::Top | Side::Bottom => self.x += units,
        }
    }

    /// The body-edge position for the next wire.
    fn next_slot(&mut self, stacked: bool) -> (f64, f64) {
        if self.state == PlacerState::Placed && !stacked {
            self.advance();
        }
        self.state = PlacerState::Placed;
        (self.x, self.y)
    }
}

fn place_wire(
    wire: Wire,
    placer: &mut SidePlacer,
    symbol: &Symbol,
    seen: &mut HashSet<String>,
) -> Result<PlacedPin> {
    let number = wire.number().to_string();
    let primary = wire.primary;
    if !seen.insert(number.clone()) {
        return Err(Error::pin(
            format!("Duplicate pin number {number}"),
            &primary.location,
        ));
    }

    let padding = match placer.side {
        Side::Left | Side::Right => symbol.attributes.w_padding,
        Side::Top | Side::Bottom => symbol.attributes.h_padding,
    };
    if (padding + primary.length).fract() != 0.0 {
        return Err(Error::symbol(
            format!(
                "Invalid pin_len: {} padding: {padding} combination in pin: {number} Symbol {}",
                primary.length,
                symbol.name()
            ),
            &primary.location,
        ));
    }

    let (edge_x, edge_y) = placer.next_slot(primary.stacked);
    let length = if primary.hidden { 0.0 } else { primary.length };
    let (x, y) = match placer.side {
        Side::Left => (edge_x - length, edge_y),
        Side::Right => (edge_x + length, edge_y),
        Side::Top => (edge_x, edge_y + length),
        Side::Bottom => (edge_x, edge_y - length),
    };
    log::trace!("Pin {number} {:?} at ({x}, {y})", primary.name);

    Ok(PlacedPin {
        number,
        name: primary.name,
        x,
        y,
        rotation: placer.side.rotation(),
        length,
        style: primary.style,
        electrical: primary.electrical,
        hidden: primary.hidden,
        name_font_size: primary.name_font_size,
        number_font_size: primary.number_font_size,
        alternates: wire
            .alternates
            .into_iter()
            .map(|alt| Alternate {
                name: alt.name,
                electrical: alt.electrical,
                style: alt.style,
            })
            .collect(),
    })
}

fn place_pins(symbol: &Symbol, shape: &PinShapeProperties) -> Result<Vec<PlacedPin>> {
    let mut placed = Vec::new();
    let mut seen = HashSet::new();
    for side in Side::ALL {
        let mut placer = SidePlacer::new(side, shape, &symbol.attributes);
        for item in bus::group_functions(side_pins(&symbol.pins, side)) {
            match item {
                SideItem::Gap(count) => placer.skip(count),
                SideItem::Functions(group) => {
                    for wire in bus::expand(&group) {
                        placed.push(place_wire(wire, &mut placer, symbol, &mut seen)?);
                    }
                }
            }
        }
    }
    Ok(placed)
}

fn properties(attrs: &SymbolAttributes, shape: &PinShapeProperties) -> Vec<Property> {
    let mut props = vec![
        Property::hidden("Reference", &attrs.reference),
        Property::hidden("Value", attrs.value()),
        Property::hidden("Description", &attrs.description),
        Property::hidden("Datasheet", &attrs.datasheet),
        Property::hidden("Footprint", &attrs.footprint),
        Property::hidden("ki_keywords", &attrs.keywords),
    ];
    if let Some(filters) = attrs.fp_filters.as_deref().filter(|f| !f.is_empty()) {
        props.push(Property::hidden("ki_fp_filters", filters));
    }

    let hw = shape.half_width as f64;
    let hh = shape.half_height as f64;

    // Description, Datasheet and Footprint go below the body, one unit apart.
    let mut y = -(hh + shape.len_bottom + attrs.h_padding + HIDDEN_TEXT_GAP);
    for prop in &mut props[2..5] {
        prop.y = y;
        y -= HIDDEN_TEXT_GAP;
    }

    let ref_y = hh + attrs.h_padding + attrs.h_ref_value_gap;
    let (reference, value) = if shape.count_top > 0 || shape.count_bottom > 0 {
        let (first, last) = if shape.count_top > 0 {
            let first = -(hw - center_start(shape.half_width, shape.count_top) as f64);
            (first, first + f64::from(shape.count_top) - 1.0)
        } else {
            (0.0, 0.0)
        };
        (
            (first - attrs.w_ref_value_pin_gap, ref_y, Justify::Right),
            (last + attrs.w_ref_value_pin_gap, ref_y, Justify::Left),
        )
    } else {
        ((0.0, ref_y, Justify::Center), (0.0, -ref_y, Justify::Center))
    };
    for (prop, (x, y, justify)) in props[..2].iter_mut().zip([reference, value]) {
        prop.x = x;
        prop.y = y;
        prop.justify = justify;
        prop.hidden = false;
    }
    props
}

fn caption(attrs: &SymbolAttributes, shape: &PinShapeProperties) -> Option<Caption> {
    let text = attrs.text.as_deref().filter(|t| !t.is_empty())?;
    let gap = attrs.text_gap.unwrap_or_else(|| {
        let vertical = shape.count_left.max(shape.count_right);
        if vertical > PIN_COUNT_VERY_BIG {
            TEXT_GAP_VERY_BIG
        } else if vertical > PIN_COUNT_BIG {
            TEXT_GAP_BIG
        } else {
            TEXT_GAP
        }
    });
    Some(Caption {
        text: text.to_string(),
        x: 0.0,
        y: (shape.half_height as f64 - gap).max(0.0),
        font_size: attrs.text_font_size as f64,
    })
}

/// Lay out a resolved symbol.
///
/// Extension symbols borrow the pin shape of their root ancestor from
/// `registry` and come out with properties only.
pub fn place(symbol: &Symbol, registry: &SymbolRegistry) -> Result<PlacedSymbol> {
    let attrs = &symbol.attributes;
    let mut placed = PlacedSymbol {
        name: symbol.name().to_string(),
        extends: None,
        properties: Vec::new(),
        body: None,
        pins: Vec::new(),
        caption: None,
        in_bom: attrs.in_bom,
        on_board: attrs.on_board,
        hide_pin_numbers: attrs.hide_pin_numbers,
        hide_pin_names: attrs.hide_pin_names,
        pin_name_offset: attrs.pin_name_offset as f64,
        location: symbol.location.clone(),
    };

    if let Some(parent) = symbol.extends() {
        let root = registry.extension_root(symbol)?;
        let shape = pin_shape(root)?;
        placed.properties = properties(attrs, &shape);
        placed.extends = Some(parent.to_string());
        return Ok(placed);
    }

    let shape = pin_shape(symbol)?;
    let hw = shape.half_width as f64 + attrs.w_padding;
    let hh = shape.half_height as f64 + attrs.h_padding;
    placed.properties = properties(attrs, &shape);
    placed.body = Some(Body {
        x0: -hw,
        y0: -hh,
        x1: hw,
        y1: hh,
    });
    placed.caption = caption(attrs, &shape);
    placed.pins = place_pins(symbol, &shape)?;
    log::debug!("Placed {:?} with {} pin(s)", placed.name, placed.pins.len());
    Ok(placed)
}
