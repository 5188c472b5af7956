//! A small S-expression tree used to build KiCad symbol library files.
//!
//! The tree only distinguishes between bare symbols, quoted strings and
//! lists. Numbers are stored as symbols, already formatted the way KiCad
//! writes them (see [`Sexpr::number`]).

use std::fmt;

/// An S-expression value
#[derive(Debug, Clone, PartialEq)]
pub enum Sexpr {
    /// A symbol - unquoted identifier or number
    Symbol(String),
    /// A string - quoted text
    String(String),
    /// A list of S-expressions
    List(Vec<Sexpr>),
}

impl Sexpr {
    /// Create a symbol (unquoted atom)
    pub fn symbol(s: impl Into<String>) -> Self {
        Sexpr::Symbol(s.into())
    }

    /// Create a string (quoted atom)
    pub fn string(s: impl Into<String>) -> Self {
        Sexpr::String(s.into())
    }

    /// Create a number atom with at most four decimals and no trailing zeros.
    pub fn number(value: f64) -> Self {
        Sexpr::Symbol(format_number(value))
    }

    /// Create a list from a vector of S-expressions
    pub fn list(items: Vec<Sexpr>) -> Self {
        Sexpr::List(items)
    }

    /// Create a list whose head is the symbol `keyword`.
    ///
    /// ```
    /// use kisymgen_sexpr::Sexpr;
    /// let at = Sexpr::form("at", [Sexpr::number(1.27), Sexpr::number(0.0)]);
    /// assert_eq!(at.to_string(), "(at 1.27 0)");
    /// ```
    pub fn form(keyword: &str, rest: impl IntoIterator<Item = Sexpr>) -> Self {
        let mut items = vec![Sexpr::symbol(keyword)];
        items.extend(rest);
        Sexpr::List(items)
    }

    /// Get the atom value if this is an atom (symbol or string)
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Sexpr::Symbol(s) | Sexpr::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the list items if this is a list
    pub fn as_list(&self) -> Option<&[Sexpr]> {
        match self {
            Sexpr::List(items) => Some(items),
            _ => None,
        }
    }

    /// The leading keyword of a list, if any.
    pub fn keyword(&self) -> Option<&str> {
        match self.as_list()?.first()? {
            Sexpr::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Iterate over the child lists that start with `keyword`.
    pub fn children<'a, 'k>(&'a self, keyword: &'k str) -> impl Iterator<Item = &'a Sexpr> + use<'a, 'k> {
        self.as_list()
            .unwrap_or_default()
            .iter()
            .filter(move |item| item.keyword() == Some(keyword))
    }

    /// The first child list that starts with `keyword`.
    pub fn child(&self, keyword: &str) -> Option<&Sexpr> {
        self.children(keyword).next()
    }
}

/// Format a float the way KiCad files expect it.
pub fn format_number(value: f64) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    // avoid "-0"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    let mut text = format!("{rounded:.4}");
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    text
}

/// Format an S-expression with KiCad-style indentation
pub fn format_sexpr(sexpr: &Sexpr, indent_level: usize) -> String {
    let mut out = String::new();
    write_sexpr(&mut out, sexpr, indent_level);
    log::trace!("Formatted S-expression into {} bytes", out.len());
    out
}

fn write_sexpr(out: &mut String, sexpr: &Sexpr, indent_level: usize) {
    match sexpr {
        Sexpr::Symbol(s) => out.push_str(s),
        Sexpr::String(s) => {
            out.push('"');
            out.push_str(&escape_string(s));
            out.push('"');
        }
        Sexpr::List(items) if is_inline(items) => {
            out.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_sexpr(out, item, indent_level + 1);
            }
            out.push(')');
        }
        Sexpr::List(items) => {
            let indent = "  ".repeat(indent_level + 1);
            out.push('(');
            // Leading atoms stay on the opening line: (symbol "Name"
            let mut rest = items.iter().peekable();
            let mut first = true;
            while let Some(item) = rest.next_if(|item| !matches!(item, Sexpr::List(_))) {
                if !first {
                    out.push(' ');
                }
                write_sexpr(out, item, indent_level + 1);
                first = false;
            }
            for item in rest {
                out.push('\n');
                out.push_str(&indent);
                write_sexpr(out, item, indent_level + 1);
            }
            out.push('\n');
            out.push_str(&"  ".repeat(indent_level));
            out.push(')');
        }
    }
}

fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            _ => result.push(ch),
        }
    }
    result
}

fn is_inline(items: &[Sexpr]) -> bool {
    if let Some(Sexpr::Symbol(first)) = items.first() {
        match first.as_str() {
            "at" | "xy" | "start" | "end" | "size" | "width" | "type" | "length" | "offset"
            | "justify" | "version" | "generator" | "extends" | "in_bom" | "on_board"
            | "exclude_from_sim" | "pin_numbers" | "alternate" => return true,
            "font" | "stroke" | "fill" | "pin_names" | "effects" | "name" | "number" => {
                // Short nested forms stay on one line, e.g. (effects (font (size 1.27 1.27)))
                return depth(items) <= 4;
            }
            _ => {}
        }
    }

    items.len() <= 3 && items.iter().all(|item| item.as_atom().is_some())
}

fn depth(items: &[Sexpr]) -> usize {
    1 + items
        .iter()
        .filter_map(Sexpr::as_list)
        .map(depth)
        .max()
        .unwrap_or(0)
}

impl fmt::Display for Sexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_sexpr(self, 0))
    }
}
