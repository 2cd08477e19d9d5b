use crate::tui_mode::app::App;
use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

fn heading(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
    ))
}

/// Last valid top line for a help text of `line_count` lines.
fn clamp_scroll(scroll: usize, line_count: usize) -> usize {
    scroll.min(line_count.saturating_sub(1))
}

pub fn render_help(frame: &mut Frame, app: &mut App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" exprcalc Help ")
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(Color::Black));

    let help_text = vec![
        Line::from(Span::styled(
            "exprcalc - Arithmetic Expression Calculator",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        heading("Operations:"),
        Line::from("  + : Addition        (e.g., 5 + 3 = 8)"),
        Line::from("  - : Subtraction     (e.g., 10 - 4 = 6)"),
        Line::from("  * : Multiplication  (e.g., 6 * 7 = 42)"),
        Line::from("  / : Division        (e.g., 15 / 3 = 5)"),
        Line::from("  ( ) : Grouping      (e.g., (2 + 3) * 4 = 20)"),
        Line::from("  -x : Negation       (e.g., --5 = 5, -(2 + 3) = -5)"),
        Line::from(""),
        Line::from("  * and / bind tighter than + and -; equal tiers go left to right."),
        Line::from("  Numbers are decimals such as 42, 1.5 or .25."),
        Line::from(""),
        heading("Errors:"),
        Line::from("  invalid expression     : misplaced operator, empty (), bad number"),
        Line::from("  invalid character      : anything that is not a number, operator or paren"),
        Line::from("  mismatched parentheses : unbalanced ( and )"),
        Line::from("  division by zero       : dividing by 0 or -0"),
        Line::from(""),
        heading("Commands:"),
        Line::from("  details <expression> : Show step-by-step evaluation with time"),
        Line::from("  clear : Clear calculation history"),
        Line::from("  help : Show this help screen"),
        Line::from("  quit : Exit the calculator"),
        Line::from(""),
        heading("Navigation:"),
        Line::from("  ← → : Move cursor left/right"),
        Line::from("  Ctrl+←/→ : Move cursor by words"),
        Line::from("  Home/End : Move to start/end of line"),
        Line::from("  Ctrl+U : Clear current input"),
        Line::from("  ↑ ↓ : Navigate calculation history"),
        Line::from("  PgUp/PgDn : Page through history"),
        Line::from("  Mouse wheel : Scroll through history"),
        Line::from("  Esc : Close this screen"),
        Line::from(""),
        heading("Examples:"),
        Line::from("  2 + 2 * 2"),
        Line::from("  ((1 + 2) * (3 + 4)) / 2"),
        Line::from("  details 1.5 * 2.5 + 3.75 / 1.25"),
    ];

    // Stored back so scrolling up responds at once after overshooting.
    app.help_scroll = clamp_scroll(app.help_scroll, help_text.len());
    let offset = u16::try_from(app.help_scroll).unwrap_or(u16::MAX);

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true })
        .scroll((offset, 0));

    frame.render_widget(Clear, frame.size());
    frame.render_widget(paragraph, frame.size());
}
