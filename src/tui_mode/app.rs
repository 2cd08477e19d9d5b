use exprcalc::calc_engine::{evaluate_traced, CalcError, EvaluationTrace, Step};
use std::time::{Duration, Instant};

pub struct HistoryEntry {
    pub input: String,
    pub result: Result<f64, CalcError>,
    pub detailed_steps: Vec<Step>,
    pub detailed_mode: bool,
    pub duration: Duration,
}

#[derive(Debug, PartialEq)]
enum Command<'a> {
    Quit,
    Clear,
    Help,
    Evaluate { expression: &'a str, detailed: bool },
}

const DETAILS: &str = "details";

fn parse_command(input: &str) -> Command<'_> {
    match input.to_lowercase().as_str() {
        "quit" | "exit" | "q" => return Command::Quit,
        "clear" | "reset" => return Command::Clear,
        "help" => return Command::Help,
        _ => {}
    }

    let prefix = input
        .get(..DETAILS.len() + 1)
        .filter(|p| p.eq_ignore_ascii_case("details "));
    if prefix.is_some() {
        return Command::Evaluate {
            expression: input[DETAILS.len() + 1..].trim(),
            detailed: true,
        };
    }

    let suffix_start = input.len().saturating_sub(DETAILS.len() + 1);
    let suffix = input
        .get(suffix_start..)
        .filter(|s| s.eq_ignore_ascii_case(" details"));
    if suffix.is_some() {
        return Command::Evaluate {
            expression: input[..suffix_start].trim(),
            detailed: true,
        };
    }

    Command::Evaluate {
        expression: input,
        detailed: false,
    }
}

pub struct App {
    pub input: String,
    pub cursor_position: usize,
    pub input_scroll: usize,
    pub history: Vec<HistoryEntry>,
    pub cursor_history: usize,
    pub should_quit: bool,
    pub show_help: bool,
    pub help_scroll: usize,
    pub list_height: usize,
    pub item_start_indices: Vec<usize>,
    pub history_scroll: usize,
    pub scroll_to_bottom: bool,
    pub terminal_too_small: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        App {
            input: String::new(),
            cursor_position: 0,
            input_scroll: 0,
            history: Vec::new(),
            cursor_history: 0,
            should_quit: false,
            show_help: false,
            help_scroll: 0,
            list_height: 5,
            item_start_indices: Vec::new(),
            history_scroll: 0,
            scroll_to_bottom: false,
            terminal_too_small: false,
        }
    }

    pub fn adjust_input_scroll(&mut self, visible_width: usize) {
        let total_chars = self.input.chars().count();

        if self.cursor_position < self.input_scroll {
            self.input_scroll = self.cursor_position;
        } else if self.cursor_position >= self.input_scroll + visible_width {
            self.input_scroll = self.cursor_position + 1 - visible_width;
        }

        self.input_scroll = self.input_scroll.min(total_chars.saturating_sub(visible_width));
    }

    pub fn submit(&mut self) {
        let input = self.input.trim().to_string();
        if input.is_empty() {
            return;
        }

        match parse_command(&input) {
            Command::Quit => {
                self.should_quit = true;
                return;
            }
            Command::Clear => {
                self.history.clear();
                self.cursor_history = 0;
                self.history_scroll = 0;
            }
            Command::Help => self.open_help(),
            Command::Evaluate { expression, detailed } => {
                self.record(expression, detailed);
            }
        }
        self.clear_input();
    }

    fn record(&mut self, expression: &str, detailed_mode: bool) {
        let start_time = Instant::now();
        let mut trace = EvaluationTrace::new(detailed_mode);
        let result = evaluate_traced(expression, &mut trace);
        let duration = start_time.elapsed();

        self.history.push(HistoryEntry {
            input: expression.to_string(),
            result,
            detailed_steps: trace.steps,
            detailed_mode,
            duration,
        });
        self.cursor_history = self.history.len() - 1;
        self.scroll_to_bottom = true;
    }

    pub fn open_help(&mut self) {
        self.show_help = true;
        self.help_scroll = 0;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
        self.help_scroll = 0;
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_idx = Self::char_index_to_byte_index(&self.input, self.cursor_position);
        self.input.insert(byte_idx, c);
        self.cursor_position += 1;
    }

    pub fn delete_before_cursor(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            self.delete_at_cursor();
        }
    }

    pub fn delete_at_cursor(&mut self) {
        let byte_idx = Self::char_index_to_byte_index(&self.input, self.cursor_position);
        if let Some(c) = self.input[byte_idx..].chars().next() {
            self.input.drain(byte_idx..byte_idx + c.len_utf8());
        }
    }

    pub fn move_cursor(&mut self, direction: i32) {
        match direction {
            -1 => self.cursor_position = self.cursor_position.saturating_sub(1),
            1 => self.cursor_position = (self.cursor_position + 1).min(self.input.chars().count()),
            _ => {}
        }
    }

    pub fn move_cursor_to_start(&mut self) {
        self.cursor_position = 0;
        self.input_scroll = 0;
    }

    pub fn move_cursor_to_end(&mut self) {
        self.cursor_position = self.input.chars().count();
    }

    pub fn move_cursor_by_words(&mut self, direction: i32) {
        let chars: Vec<char> = self.input.chars().collect();
        let mut pos = self.cursor_position.min(chars.len());

        if direction < 0 {
            while pos > 0 && chars[pos - 1].is_whitespace() {
                pos -= 1;
            }
            while pos > 0 && !chars[pos - 1].is_whitespace() {
                pos -= 1;
            }
        } else {
            while pos < chars.len() && !chars[pos].is_whitespace() {
                pos += 1;
            }
            while pos < chars.len() && chars[pos].is_whitespace() {
                pos += 1;
            }
        }
        self.cursor_position = pos;
    }

    pub fn navigate_history(&mut self, direction: i32) {
        if direction < 0 && self.cursor_history > 0 {
            self.cursor_history -= 1;
        } else if direction > 0 && self.cursor_history < self.history.len().saturating_sub(1) {
            self.cursor_history += 1;
        }
        self.recall_selected();
    }

    pub fn scroll_history(&mut self, direction: i32) {
        let step = self.list_height.saturating_sub(1).max(1);
        if direction < 0 {
            self.cursor_history = self.cursor_history.saturating_sub(step);
        } else {
            self.cursor_history = self
                .cursor_history
                .saturating_add(step)
                .min(self.history.len().saturating_sub(1));
        }
        self.recall_selected();
    }

    fn recall_selected(&mut self) {
        if let Some(entry) = self.history.get(self.cursor_history) {
            self.input = entry.input.clone();
        }
        self.cursor_position = self.input.chars().count();
        self.input_scroll = 0;
        self.scroll_to_bottom = false;
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
        self.cursor_position = 0;
        self.input_scroll = 0;
    }

    pub fn char_index_to_byte_index(s: &str, char_index: usize) -> usize {
        s.char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(s.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn submit(app: &mut App, line: &str) {
        app.input = line.to_string();
        app.cursor_position = line.chars().count();
        app.submit();
    }

    #[test]
    fn commands() {
        assert_eq!(parse_command("QUIT"), Command::Quit);
        assert_eq!(parse_command("reset"), Command::Clear);
        assert_eq!(parse_command("help"), Command::Help);
        assert_eq!(
            parse_command("Details 2 + 2"),
            Command::Evaluate { expression: "2 + 2", detailed: true }
        );
        assert_eq!(
            parse_command("2 * 3 details"),
            Command::Evaluate { expression: "2 * 3", detailed: true }
        );
        assert_eq!(
            parse_command("1 - 1"),
            Command::Evaluate { expression: "1 - 1", detailed: false }
        );
        // multi-byte input must not split a char
        assert_eq!(
            parse_command("½½½½"),
            Command::Evaluate { expression: "½½½½", detailed: false }
        );
    }

    #[test]
    fn submit_records_result_and_clears_input() {
        let mut app = App::new();
        submit(&mut app, "  (2 + 3) * 4 ");

        assert_eq!(app.history.len(), 1);
        assert_eq!(app.history[0].input, "(2 + 3) * 4");
        assert_eq!(app.history[0].result, Ok(20.0));
        assert!(!app.history[0].detailed_mode);
        assert!(app.input.is_empty());
        assert_eq!(app.cursor_position, 0);
        assert!(app.scroll_to_bottom);
    }

    #[test]
    fn submit_records_errors() {
        let mut app = App::new();
        submit(&mut app, "1 / 0");
        assert_eq!(app.history[0].result, Err(CalcError::DivisionByZero));
    }

    #[test]
    fn details_mode_keeps_steps() {
        let mut app = App::new();
        submit(&mut app, "details 2 + 3 * 4");

        let entry = &app.history[0];
        assert!(entry.detailed_mode);
        assert_eq!(entry.result, Ok(14.0));
        assert_eq!(entry.detailed_steps.len(), 2);
        assert_eq!(entry.detailed_steps[0].operation, "3 * 4");
    }

    #[test]
    fn blank_input_is_ignored() {
        let mut app = App::new();
        submit(&mut app, "   ");
        assert!(app.history.is_empty());
    }

    #[test]
    fn quit_clear_help() {
        let mut app = App::new();
        submit(&mut app, "1+1");
        submit(&mut app, "clear");
        assert!(app.history.is_empty());

        submit(&mut app, "help");
        assert!(app.show_help);
        app.close_help();
        assert!(!app.show_help);

        submit(&mut app, "exit");
        assert!(app.should_quit);
    }

    #[test]
    fn history_navigation_recalls_input() {
        let mut app = App::new();
        submit(&mut app, "1+1");
        submit(&mut app, "2+2");
        submit(&mut app, "3+3");

        app.navigate_history(-1);
        assert_eq!(app.input, "2+2");
        app.navigate_history(-1);
        app.navigate_history(-1);
        assert_eq!(app.input, "1+1");
        app.navigate_history(1);
        assert_eq!(app.input, "2+2");
        assert_eq!(app.cursor_position, 3);
    }

    #[test]
    fn editing() {
        let mut app = App::new();
        for c in "12+3".chars() {
            app.insert_char(c);
        }
        app.move_cursor(-1);
        app.delete_before_cursor();
        assert_eq!(app.input, "123");
        assert_eq!(app.cursor_position, 2);

        app.move_cursor_to_start();
        app.delete_at_cursor();
        assert_eq!(app.input, "23");

        app.move_cursor_to_end();
        app.insert_char('½');
        app.delete_before_cursor();
        assert_eq!(app.input, "23");
    }

    #[test]
    fn word_movement() {
        let mut app = App::new();
        app.input = "12 +  34".to_string();
        app.move_cursor_to_end();

        app.move_cursor_by_words(-1);
        assert_eq!(app.cursor_position, 6);
        app.move_cursor_by_words(-1);
        assert_eq!(app.cursor_position, 3);
        app.move_cursor_by_words(1);
        assert_eq!(app.cursor_position, 6);
    }

    #[test]
    fn input_scroll_follows_cursor() {
        let mut app = App::new();
        app.input = "1234567890".to_string();
        app.move_cursor_to_end();
        app.adjust_input_scroll(4);
        assert_eq!(app.input_scroll, 6);

        app.move_cursor_to_start();
        app.adjust_input_scroll(4);
        assert_eq!(app.input_scroll, 0);
    }
}
