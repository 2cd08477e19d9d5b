use exprcalc::calc_engine::{is_whitespace, CalcError, Scanner, Token};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

fn token_style(token: &Result<Token, CalcError>, base_style: Style) -> Style {
    match token {
        Ok(Token::Number(_)) => Style::default().fg(Color::LightGreen),
        Ok(Token::Op(_)) => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        Ok(Token::LParen | Token::RParen) => base_style.add_modifier(Modifier::BOLD),
        // Invalid characters and malformed literals alike.
        Err(_) => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::UNDERLINED),
    }
}

/// Styles `expr` token by token, using the same scanner as the evaluator so
/// the colours show exactly what it will accept.
pub fn highlight_expression(expr: &str, base_style: Style) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut scanner = Scanner::new(expr);
    let mut start = scanner.position();

    while let Some(token) = scanner.next_token() {
        let text = &expr[start..scanner.position()];
        let body = text.trim_start_matches(is_whitespace);
        let gap = &text[..text.len() - body.len()];

        if !gap.is_empty() {
            spans.push(Span::raw(gap.to_string()));
        }
        spans.push(Span::styled(body.to_string(), token_style(&token, base_style)));
        start = scanner.position();
    }

    let rest = &expr[start..];
    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    spans
}
