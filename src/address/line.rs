//! Parser for one line of converter output:
//! `name;level,...[,!PP],X,Y[,NOTE]`.
//!
//! Elements are the leading fields containing `;`. The optional priority
//! marker follows them, then the two coordinates, then the note (every
//! remaining field, re-joined with `,`). Blank lines and lines starting with
//! `#` yield `None`.

use eyre::Result;

use super::{AddressElement, AddressLevel, NormalizedLine};
use crate::config::DEFAULT_PRIORITY;
use crate::error::DictError;

pub fn parse_line(text: &str, origin: &str, line_no: usize) -> Result<Option<NormalizedLine>> {
    let text = text.trim_end_matches(['\r', '\n']);
    if text.trim().is_empty() || text.starts_with('#') {
        return Ok(None);
    }

    parse_fields(text)
        .map(Some)
        .map_err(|reason| DictError::input_format(origin, line_no, reason).into())
}

fn parse_fields(text: &str) -> std::result::Result<NormalizedLine, String> {
    let mut fields = text.split(',').peekable();

    let mut elements: Vec<AddressElement> = Vec::new();
    while let Some(field) = fields.next_if(|f| f.contains(';')) {
        let element = parse_element(field)?;
        if let Some(prev) = elements.last() {
            if element.level <= prev.level {
                return Err(format!(
                    "level {} of '{}' does not follow level {} of '{}'",
                    element.level, element.name, prev.level, prev.name
                ));
            }
        }
        elements.push(element);
    }
    if elements.is_empty() {
        return Err("no address elements".to_string());
    }

    let priority = match fields.next_if(|f| f.starts_with('!')) {
        Some(marker) => parse_priority(marker)?,
        None => DEFAULT_PRIORITY,
    };

    let x = parse_coordinate(fields.next(), "x")?;
    let y = parse_coordinate(fields.next(), "y")?;
    let note = fields.collect::<Vec<_>>().join(",");

    Ok(NormalizedLine {
        elements,
        priority,
        x,
        y,
        note,
    })
}

fn parse_element(field: &str) -> std::result::Result<AddressElement, String> {
    let (name, level) = field
        .rsplit_once(';')
        .ok_or_else(|| format!("element '{}' has no level", field))?;

    let level = level
        .trim()
        .parse::<u8>()
        .ok()
        .and_then(AddressLevel::from_u8)
        .ok_or_else(|| format!("invalid level '{}' in element '{}'", level, field))?;

    if name.is_empty() {
        return Err(format!("empty name at level {}", level));
    }
    if name.chars().any(char::is_control) {
        return Err(format!("control character in name '{}'", name.escape_debug()));
    }

    Ok(AddressElement::new(name, level))
}

fn parse_priority(marker: &str) -> std::result::Result<u8, String> {
    let digits = &marker[1..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid priority marker '{}'", marker));
    }
    digits
        .parse::<u8>()
        .map_err(|_| format!("priority '{}' out of range", marker))
}

fn parse_coordinate(field: Option<&str>, axis: &str) -> std::result::Result<f64, String> {
    let field = field.ok_or_else(|| format!("missing {} coordinate", axis))?;
    match field.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(format!("non-numeric {} coordinate '{}'", axis, field)),
    }
}
