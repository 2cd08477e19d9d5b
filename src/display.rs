use crate::calc_engine::{is_operator, is_whitespace};

pub fn format_number(x: f64) -> String {
    if x.abs() > 1e10 || (x.abs() < 1e-5 && x != 0.0) {
        format!("{:.6e}", x)
    } else {
        let s = format!("{:.6}", x);
        let trimmed = s.trim_end_matches('0').trim_end_matches('.');
        // "-0.000000" trims down to "-0"
        if trimmed == "-0" {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    }
}

/// Normalizes spacing: one space around binary operators, none after a
/// unary minus or inside parentheses.
pub fn format_with_spaces(expr: &str) -> String {
    let mut result = String::new();
    let mut last: Option<char> = None;

    for c in expr.chars().filter(|&c| !is_whitespace(c)) {
        let unary = c == '-' && last.map_or(true, |l| l == '(' || is_operator(l));
        if is_operator(c) && !unary {
            result.push(' ');
            result.push(c);
            result.push(' ');
        } else {
            result.push(c);
        }
        last = Some(c);
    }

    result.split(' ').filter(|part| !part.is_empty()).collect::<Vec<_>>().join(" ")
}
