//! Patch a parent's pin list into the pin list of a derived symbol.

use std::ops::Range;

use crate::error::{Error, Result};
use crate::pin::{Category, Pin};

/// Where the next real patch pin goes.
#[derive(Debug)]
enum PatchState {
    /// Overwrite the matching parent run.
    Idle,
    /// Insert at this index; set by `delete`, `before` and `after`.
    Inserting(usize),
    /// The anchor replaced a parent run; its alternate functions follow at `next`.
    Overloading { anchor: Pin, next: usize },
}

/// The first unprotected entry whose number list equals the patch pin's,
/// plus every directly following alternate function of the patch pin.
fn matching_run(pins: &[Pin], patch: &Pin) -> Option<Range<usize>> {
    let keys = patch.number.keys();
    let start = pins
        .iter()
        .position(|pin| !pin.protected && pin.number.keys() == keys)?;
    let alternates = pins[start + 1..]
        .iter()
        .take_while(|pin| patch.is_alt_function(pin))
        .count();
    Some(start..start + 1 + alternates)
}

fn require_run(pins: &[Pin], patch: &Pin, what: &str) -> Result<Range<usize>> {
    matching_run(pins, patch).ok_or_else(|| {
        Error::pin(
            format!("Pin number to {what} not found! Number: {:?}", patch.number.to_string()),
            &patch.location,
        )
    })
}

/// Apply `patch` to a copy of `parent`.
///
/// Pins inserted after `delete`, `before` or `after` are protected until the
/// end of the patch, so later operations never match them.
pub fn resolve(parent: &[Pin], patch: Vec<Pin>) -> Result<Vec<Pin>> {
    let mut pins: Vec<Pin> = parent.to_vec();
    for pin in &mut pins {
        pin.protected = false;
    }
    let mut state = PatchState::Idle;
    let mut patch = patch.into_iter().peekable();

    while let Some(mut pin) = patch.next() {
        match pin.category {
            Category::Overload => {
                if let Some(next) = patch.peek().filter(|next| next.is_pseudo()) {
                    return Err(Error::validation(
                        format!("Pseudo pin {:?} must not follow an overload pin", next.category.as_str()),
                        &next.location,
                    ));
                }
                state = PatchState::Idle;
            }
            Category::Delete => {
                let run = require_run(&pins, &pin, "delete")?;
                log::trace!("Delete pins {run:?} {}", pin.location);
                pins.drain(run.clone());
                state = PatchState::Inserting(run.start);
            }
            Category::Before | Category::After => {
                let run = require_run(&pins, &pin, "insert")?;
                let index = if pin.category == Category::Before {
                    run.start
                } else {
                    run.end
                };
                log::trace!("Insert marker at {index} {}", pin.location);
                state = PatchState::Inserting(index);
            }
            Category::Side(_) => {
                state = match state {
                    PatchState::Inserting(index) => {
                        pin.protected = true;
                        pins.insert(index, pin);
                        PatchState::Inserting(index + 1)
                    }
                    PatchState::Overloading { anchor, next } if anchor.is_alt_function(&pin) => {
                        pins.insert(next, pin);
                        PatchState::Overloading {
                            anchor,
                            next: next + 1,
                        }
                    }
                    _ => {
                        let run = require_run(&pins, &pin, "overload")?;
                        log::trace!("Overload pins {run:?} {}", pin.location);
                        pins.drain(run.clone());
                        let anchor = pin.clone();
                        pins.insert(run.start, pin);
                        PatchState::Overloading {
                            anchor,
                            next: run.start + 1,
                        }
                    }
                };
            }
        }
    }

    for pin in &mut pins {
        pin.protected = false;
    }
    Ok(pins)
}
