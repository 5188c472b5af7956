//! Conversion of a placed symbol into its `(symbol ...)` form.

use kisymgen_core::placed::{Body, Caption, Justify, PlacedPin, Property};
use kisymgen_core::{PlacedSymbol, GRID_MM};
use kisymgen_sexpr::Sexpr;

/// Millimetres per mil.
pub const MIL_MM: f64 = 0.0254;

/// Body outline width in mils.
pub const BODY_LINE_WIDTH_MIL: f64 = 10.0;

/// Font size of every property in mils.
pub const PROPERTY_FONT_MIL: f64 = 50.0;

pub fn grid_to_mm(value: f64) -> f64 {
    value * GRID_MM
}

pub fn mil_to_mm(value: f64) -> f64 {
    value * MIL_MM
}

fn yes_no(flag: bool) -> Sexpr {
    Sexpr::symbol(if flag { "yes" } else { "no" })
}

fn at(x: f64, y: f64, rotation: f64) -> Sexpr {
    Sexpr::form(
        "at",
        [
            Sexpr::number(grid_to_mm(x)),
            Sexpr::number(grid_to_mm(y)),
            Sexpr::number(rotation),
        ],
    )
}

fn font(size_mil: f64) -> Sexpr {
    let size = mil_to_mm(size_mil);
    Sexpr::form(
        "font",
        [Sexpr::form("size", [Sexpr::number(size), Sexpr::number(size)])],
    )
}

fn effects(size_mil: f64, justify: Justify, hidden: bool) -> Sexpr {
    let mut items = vec![font(size_mil)];
    match justify {
        Justify::Left => items.push(Sexpr::form("justify", [Sexpr::symbol("left")])),
        Justify::Right => items.push(Sexpr::form("justify", [Sexpr::symbol("right")])),
        Justify::Center => {}
    }
    if hidden {
        items.push(Sexpr::symbol("hide"));
    }
    Sexpr::form("effects", items)
}

fn property(prop: &Property) -> Sexpr {
    Sexpr::form(
        "property",
        [
            Sexpr::string(&prop.key),
            Sexpr::string(&prop.value),
            at(prop.x, prop.y, 0.0),
            effects(PROPERTY_FONT_MIL, prop.justify, prop.hidden),
        ],
    )
}

fn rectangle(body: &Body) -> Sexpr {
    let point = |keyword: &str, x: f64, y: f64| {
        Sexpr::form(
            keyword,
            [Sexpr::number(grid_to_mm(x)), Sexpr::number(grid_to_mm(y))],
        )
    };
    Sexpr::form(
        "rectangle",
        [
            point("start", body.x0, body.y0),
            point("end", body.x1, body.y1),
            Sexpr::form(
                "stroke",
                [
                    Sexpr::form("width", [Sexpr::number(mil_to_mm(BODY_LINE_WIDTH_MIL))]),
                    Sexpr::form("type", [Sexpr::symbol("default")]),
                ],
            ),
            Sexpr::form("fill", [Sexpr::form("type", [Sexpr::symbol("background")])]),
        ],
    )
}

fn text(caption: &Caption) -> Sexpr {
    Sexpr::form(
        "text",
        [
            Sexpr::string(&caption.text),
            at(caption.x, caption.y, 0.0),
            effects(caption.font_size, Justify::Center, false),
        ],
    )
}

fn pin(pin: &PlacedPin) -> Sexpr {
    let mut items = vec![
        Sexpr::symbol(pin.electrical.as_str()),
        Sexpr::symbol(pin.style.as_str()),
        at(pin.x, pin.y, f64::from(pin.rotation)),
        Sexpr::form("length", [Sexpr::number(grid_to_mm(pin.length))]),
    ];
    if pin.hidden {
        items.push(Sexpr::symbol("hide"));
    }
    items.push(Sexpr::form(
        "name",
        [
            Sexpr::string(&pin.name),
            effects(pin.name_font_size, Justify::Center, false),
        ],
    ));
    items.push(Sexpr::form(
        "number",
        [
            Sexpr::string(&pin.number),
            effects(pin.number_font_size, Justify::Center, false),
        ],
    ));
    for alternate in &pin.alternates {
        items.push(Sexpr::form(
            "alternate",
            [
                Sexpr::string(&alternate.name),
                Sexpr::symbol(alternate.electrical.as_str()),
                Sexpr::symbol(alternate.style.as_str()),
            ],
        ));
    }
    Sexpr::form("pin", items)
}

/// Build the `(symbol "name" ...)` form.
///
/// Graphics go into unit `<name>_0_1` (shared by all units), pins into
/// `<name>_1_1`. Extension symbols only carry `extends` and properties.
pub fn symbol_to_sexpr(symbol: &PlacedSymbol) -> Sexpr {
    let mut items = vec![Sexpr::string(&symbol.name)];

    if let Some(parent) = &symbol.extends {
        items.push(Sexpr::form("extends", [Sexpr::string(parent)]));
        items.extend(symbol.properties.iter().map(property));
        return Sexpr::form("symbol", items);
    }

    if symbol.hide_pin_numbers {
        items.push(Sexpr::form("pin_numbers", [Sexpr::symbol("hide")]));
    }
    let mut pin_names = vec![Sexpr::form(
        "offset",
        [Sexpr::number(mil_to_mm(symbol.pin_name_offset))],
    )];
    if symbol.hide_pin_names {
        pin_names.push(Sexpr::symbol("hide"));
    }
    items.push(Sexpr::form("pin_names", pin_names));
    items.push(Sexpr::form("exclude_from_sim", [yes_no(false)]));
    items.push(Sexpr::form("in_bom", [yes_no(symbol.in_bom)]));
    items.push(Sexpr::form("on_board", [yes_no(symbol.on_board)]));
    items.extend(symbol.properties.iter().map(property));

    let mut graphics = vec![Sexpr::string(format!("{}_0_1", symbol.name))];
    graphics.extend(symbol.body.as_ref().map(rectangle));
    graphics.extend(symbol.caption.as_ref().map(text));
    items.push(Sexpr::form("symbol", graphics));

    let mut pins = vec![Sexpr::string(format!("{}_1_1", symbol.name))];
    pins.extend(symbol.pins.iter().map(pin));
    items.push(Sexpr::form("symbol", pins));

    Sexpr::form("symbol", items)
}
