//! Bus expansion and alternate-function grouping.
//!
//! A pin whose number cell lists several wires (`1,2,3`) is a bus. Each wire
//! becomes one physical pin; a `$` token in the name is replaced by a
//! running serial number:
//!
//! | token    | start | step |
//! |----------|-------|------|
//! | `$`      | 0     | +1   |
//! | `$(N)`   | N     | +1   |
//! | `$(N+K)` | N     | +K   |
//! | `$(N-K)` | N     | -K   |

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

use crate::pin::{Pin, PinNumber};

static SERIAL_FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\((\d+)([+-])?(\d+)?\)").expect("serial form pattern"));
static SERIAL_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$").expect("serial token pattern"));

/// How serial numbers are substituted into one pin name.
#[derive(Debug, Clone)]
pub struct BusNaming {
    pattern: Option<&'static Regex>,
    pub start: i64,
    pub step: i64,
}

impl BusNaming {
    /// Pick the naming scheme for `name`. The `$(...)` form wins over a bare `$`.
    pub fn for_name(name: &str) -> Self {
        if let Some(caps) = SERIAL_FORM.captures(name) {
            let number = |idx: usize| caps.get(idx).and_then(|m| m.as_str().parse::<i64>().ok());
            let start = number(1).unwrap_or(0);
            let magnitude = number(3).unwrap_or(1);
            let step = match caps.get(2).map(|m| m.as_str()) {
                Some("-") => -magnitude,
                _ => magnitude,
            };
            return Self {
                pattern: Some(&*SERIAL_FORM),
                start,
                step,
            };
        }
        let pattern = SERIAL_TOKEN.is_match(name).then_some(&*SERIAL_TOKEN);
        Self {
            pattern,
            start: 0,
            step: 1,
        }
    }

    /// Replace every occurrence of the token with `serial`.
    pub fn render(&self, name: &str, serial: i64) -> String {
        match self.pattern {
            Some(pattern) => pattern
                .replace_all(name, NoExpand(&serial.to_string()))
                .into_owned(),
            None => name.to_string(),
        }
    }
}

/// One entry in the pin list of a side.
#[derive(Debug, Clone, PartialEq)]
pub enum SideItem<'a> {
    /// Layout space for this many pins.
    Gap(u32),
    /// A primary pin followed by its alternate functions.
    Functions(Vec<&'a Pin>),
}

/// Split the pins of one side into gaps and alternate-function groups.
///
/// A pin joins the current group when it is an alternate function of the
/// group's first pin.
pub fn group_functions<'a>(pins: impl IntoIterator<Item = &'a Pin>) -> Vec<SideItem<'a>> {
    let mut items = Vec::new();
    let mut current: Vec<&'a Pin> = Vec::new();
    for pin in pins {
        if pin.is_gap() {
            if !current.is_empty() {
                items.push(SideItem::Functions(std::mem::take(&mut current)));
            }
            items.push(SideItem::Gap(pin.gap_count()));
            continue;
        }
        match current.first() {
            Some(primary) if primary.is_alt_function(pin) => current.push(pin),
            Some(_) => {
                items.push(SideItem::Functions(std::mem::take(&mut current)));
                current.push(pin);
            }
            None => current.push(pin),
        }
    }
    if !current.is_empty() {
        items.push(SideItem::Functions(current));
    }
    items
}

/// One physical pin: the primary function and its alternates, each with a
/// single wire number and a rendered name.
#[derive(Debug, Clone, PartialEq)]
pub struct Wire {
    pub primary: Pin,
    pub alternates: Vec<Pin>,
}

impl Wire {
    pub fn number(&self) -> &str {
        self.primary.number.wires().first().map_or("", String::as_str)
    }
}

/// Expand a function group into one [`Wire`] per number of the primary.
///
/// Every function keeps its own serial counter, advanced only for the wires
/// it covers.
pub fn expand(group: &[&Pin]) -> Vec<Wire> {
    let Some(primary) = group.first() else {
        return Vec::new();
    };
    let namings: Vec<BusNaming> = group.iter().map(|pin| BusNaming::for_name(&pin.name)).collect();
    let mut serials: Vec<i64> = namings.iter().map(|naming| naming.start).collect();

    let mut wires = Vec::new();
    for number in primary.number.wires() {
        let mut functions = Vec::new();
        for (idx, function) in group.iter().enumerate() {
            if !function.number.wires().contains(number) {
                continue;
            }
            let mut single = (*function).clone();
            single.number = PinNumber::Wires(vec![number.clone()]);
            single.name = namings[idx].render(&function.name, serials[idx]);
            serials[idx] += namings[idx].step;
            functions.push(single);
        }
        let mut functions = functions.into_iter();
        if let Some(first) = functions.next() {
            wires.push(Wire {
                primary: first,
                alternates: functions.collect(),
            });
        }
    }
    log::trace!("Expanded {:?} into {} wire(s)", primary.name, wires.len());
    wires
}
