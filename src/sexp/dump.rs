use super::Value;

/// Render a [`Value`] in canonical wire form.
///
/// Strings are double-quoted with `"` and `\` escaped by a backslash; no other
/// character is escaped. Lists are space-separated inside parentheses.
/// Finite floats always carry a decimal point so they read back as floats.
pub fn dump(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Integer(num) => out.push_str(&num.to_string()),
        Value::Float(num) => write_float(out, *num),
        Value::String(text) => write_string(out, text),
        Value::List(items) => {
            out.push('(');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(' ');
                }
                write_value(out, item);
            }
            out.push(')');
        }
    }
}

fn write_float(out: &mut String, num: f64) {
    // `Display` for f64 never uses exponent notation and prints the shortest
    // text that reads back to the same value.
    let text = num.to_string();
    out.push_str(&text);
    if num.is_finite() && !text.contains('.') {
        out.push_str(".0");
    }
}

fn write_string(out: &mut String, text: &str) {
    out.push('"');
    for ch in text.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
}
