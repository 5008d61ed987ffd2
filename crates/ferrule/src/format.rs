//! printf-style formatting for body text.
//!
//! Format strings are often runtime data (translated messages), so they are
//! applied at runtime against a list of JSON values.
//!
//! Supported syntax: `%[argnum$][flags][width][.precision]conversion`
//!
//! | Conversion | Output |
//! |------------|--------|
//! | `s` | string (precision truncates) |
//! | `d`, `i` | signed decimal integer |
//! | `u` | unsigned decimal integer |
//! | `f`, `F` | decimal float, precision defaults to 6 |
//! | `e`, `E` | scientific notation |
//! | `x`, `X`, `o`, `b` | hex, upper hex, octal, binary |
//! | `c` | character from code point |
//! | `%%` | a literal `%` |
//!
//! Flags: `-` left-justify, `0` zero-pad numbers, `+` always print the sign,
//! ` ` space before positive numbers.

use serde_json::Value;
use thiserror::Error;

/// Errors applying a format string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    /// The format string references more arguments than were given.
    #[error("format string needs argument {position} but {given} were supplied")]
    MissingArgument { position: usize, given: usize },

    /// Unknown conversion character.
    #[error("unknown conversion '%{0}'")]
    UnknownConversion(char),

    /// The format string ends in the middle of a conversion.
    #[error("format string ends inside a conversion")]
    Incomplete,

    /// A width or precision exceeds [`MAX_FIELD_WIDTH`].
    #[error("field width {0} exceeds the maximum of {max}", max = MAX_FIELD_WIDTH)]
    FieldTooWide(usize),
}

/// Largest width or precision a conversion may ask for.
pub const MAX_FIELD_WIDTH: usize = 4096;

#[derive(Debug, Default)]
struct Spec {
    left: bool,
    zero: bool,
    plus: bool,
    space: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

/// Applies `args` to a printf-style `format` string.
///
/// ```rust
/// use ferrule::format_printf;
/// use serde_json::json;
///
/// let text = format_printf("%s has %03d items (%.1f%%)", &[json!("cart"), json!(7), json!(12.34)]).unwrap();
/// assert_eq!(text, "cart has 007 items (12.3%)");
/// ```
pub fn format_printf(format: &str, args: &[Value]) -> Result<String, FormatError> {
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::with_capacity(format.len());
    let mut next_arg = 0;
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '%' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        i += 1;

        match chars.get(i) {
            None => return Err(FormatError::Incomplete),
            Some('%') => {
                out.push('%');
                i += 1;
                continue;
            }
            Some(_) => {}
        }

        // Positional argument: digits followed by `$`.
        let mut position = None;
        let digits_end = i + chars[i..].iter().take_while(|c| c.is_ascii_digit()).count();
        if digits_end > i && chars.get(digits_end) == Some(&'$') {
            position = read_number(&chars, &mut i);
            i += 1;
        }

        let mut spec = Spec::default();
        while let Some(&flag) = chars.get(i) {
            match flag {
                '-' => spec.left = true,
                '0' => spec.zero = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                _ => break,
            }
            i += 1;
        }
        spec.width = read_field(&chars, &mut i)?;
        if chars.get(i) == Some(&'.') {
            i += 1;
            spec.precision = Some(read_field(&chars, &mut i)?.unwrap_or(0));
        }

        let conversion = *chars.get(i).ok_or(FormatError::Incomplete)?;
        i += 1;

        // Positions are 1-based; `%0$s` names no argument.
        let index = match position {
            Some(0) => {
                return Err(FormatError::MissingArgument {
                    position: 0,
                    given: args.len(),
                })
            }
            Some(n) => n - 1,
            None => {
                let n = next_arg;
                next_arg += 1;
                n
            }
        };
        let arg = args.get(index).ok_or(FormatError::MissingArgument {
            position: index + 1,
            given: args.len(),
        })?;

        out.push_str(&convert(conversion, arg, &spec)?);
    }

    Ok(out)
}

fn read_number(chars: &[char], i: &mut usize) -> Option<usize> {
    let start = *i;
    while chars.get(*i).is_some_and(|c| c.is_ascii_digit()) {
        *i += 1;
    }
    if *i == start {
        return None;
    }
    chars[start..*i].iter().collect::<String>().parse().ok()
}

/// Reads a width or precision, rejecting values above [`MAX_FIELD_WIDTH`].
fn read_field(chars: &[char], i: &mut usize) -> Result<Option<usize>, FormatError> {
    let start = *i;
    let value = read_number(chars, i);
    match value {
        Some(n) if n > MAX_FIELD_WIDTH => Err(FormatError::FieldTooWide(n)),
        None if *i > start => Err(FormatError::FieldTooWide(usize::MAX)),
        _ => Ok(value),
    }
}

fn convert(conversion: char, arg: &Value, spec: &Spec) -> Result<String, FormatError> {
    let text = match conversion {
        's' => {
            let s = as_text(arg);
            let s: String = match spec.precision {
                Some(p) => s.chars().take(p).collect(),
                None => s,
            };
            return Ok(pad(s, spec, false));
        }
        'd' | 'i' => signed(as_int(arg), spec),
        'u' => (as_int(arg) as u64).to_string(),
        'f' | 'F' => {
            let f = as_float(arg);
            signed_float(format!("{:.*}", spec.precision.unwrap_or(6), f.abs()), f, spec)
        }
        'e' | 'E' => {
            let f = as_float(arg);
            let raw = format!("{:.*e}", spec.precision.unwrap_or(6), f.abs());
            let sci = match raw.split_once('e') {
                Some((mantissa, exp)) if exp.starts_with('-') => format!("{}e{}", mantissa, exp),
                Some((mantissa, exp)) => format!("{}e+{}", mantissa, exp),
                None => raw,
            };
            let sci = if conversion == 'E' {
                sci.to_uppercase()
            } else {
                sci
            };
            signed_float(sci, f, spec)
        }
        'x' => format!("{:x}", as_int(arg) as u64),
        'X' => format!("{:X}", as_int(arg) as u64),
        'o' => format!("{:o}", as_int(arg) as u64),
        'b' => format!("{:b}", as_int(arg) as u64),
        'c' => {
            let c = u32::try_from(as_int(arg))
                .ok()
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            return Ok(pad(c.to_string(), spec, false));
        }
        other => return Err(FormatError::UnknownConversion(other)),
    };
    Ok(pad(text, spec, true))
}

fn signed(n: i64, spec: &Spec) -> String {
    if n < 0 {
        n.to_string()
    } else if spec.plus {
        format!("+{}", n)
    } else if spec.space {
        format!(" {}", n)
    } else {
        n.to_string()
    }
}

fn signed_float(digits: String, f: f64, spec: &Spec) -> String {
    if f.is_sign_negative() && f != 0.0 {
        format!("-{}", digits)
    } else if spec.plus {
        format!("+{}", digits)
    } else if spec.space {
        format!(" {}", digits)
    } else {
        digits
    }
}

fn pad(text: String, spec: &Spec, numeric: bool) -> String {
    let len = text.chars().count();
    let Some(width) = spec.width.filter(|&w| w > len) else {
        return text;
    };
    let fill = width - len;

    if spec.left {
        format!("{}{}", text, " ".repeat(fill))
    } else if spec.zero && numeric {
        let sign_len = text
            .chars()
            .next()
            .filter(|c| matches!(*c, '-' | '+' | ' '))
            .map_or(0, char::len_utf8);
        let (sign, digits) = text.split_at(sign_len);
        format!("{}{}{}", sign, "0".repeat(fill), digits)
    } else {
        format!("{}{}", " ".repeat(fill), text)
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn as_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| u as i64))
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().map(|f| f as i64).unwrap_or(0),
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

fn as_float(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    }
}
