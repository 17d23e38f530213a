//! Command bar: free-text input interpreted as navigation or search commands

use std::sync::LazyLock;
use std::time::{Duration, Instant};

use log::{debug, info};
use regex::Regex;

pub const INVALID_INPUT_ALERT: &str =
    "Please enter a valid URL or text query like \"Go to page...\" or \"Search for term...\".";
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(300);

static GO_TO_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)go to page ([0-9]+)").expect("Failed to compile go-to-page regex")
});
static SEARCH_FOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)search for (.+)").expect("Failed to compile search regex")
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandKind {
    /// 1-based page number
    GoToPage(usize),
    Search(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    /// Shown in the interaction area when the command is dispatched
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Interpretation {
    Command(Command),
    /// Input that is a URL but not a command
    Url(String),
    Invalid,
}

/// Interpret one line of input.
///
/// The go-to-page pattern wins over search when both occur.
#[must_use]
pub fn interpret(input: &str) -> Interpretation {
    if let Some(caps) = GO_TO_PAGE.captures(input) {
        // A digit run that does not fit is not a page anyone can go to
        return match caps[1].parse::<usize>() {
            Ok(page) => Interpretation::Command(Command {
                kind: CommandKind::GoToPage(page),
                message: format!("Navigating to page {page}."),
            }),
            Err(_) => Interpretation::Invalid,
        };
    }

    if let Some(caps) = SEARCH_FOR.captures(input) {
        let term = caps[1].to_string();
        return Interpretation::Command(Command {
            message: format!("Searching for term \"{term}\" within the document."),
            kind: CommandKind::Search(term),
        });
    }

    if reqwest::Url::parse(input).is_ok() {
        return Interpretation::Url(input.to_string());
    }

    Interpretation::Invalid
}

impl Interpretation {
    /// Text to surface for inputs that are not commands
    #[must_use]
    pub fn notice(&self) -> Option<String> {
        match self {
            Interpretation::Command(_) => None,
            Interpretation::Url(url) => Some(format!("Detected as URL: {url}")),
            Interpretation::Invalid => Some(INVALID_INPUT_ALERT.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Submitted again inside the cooldown window; nothing happened
    Ignored,
    Interpreted(Interpretation),
}

/// Single-line text input with a resubmission guard
#[derive(Debug)]
pub struct CommandBar {
    input: String,
    /// Cursor position in chars
    cursor: usize,
    cooldown: Duration,
    last_submit: Option<Instant>,
}

impl Default for CommandBar {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl CommandBar {
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self {
            input: String::new(),
            cursor: 0,
            cooldown,
            last_submit: None,
        }
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        self.submit_at(Instant::now())
    }

    /// Interpret the current input and clear it, unless the previous
    /// submission was less than the cooldown ago
    pub fn submit_at(&mut self, now: Instant) -> SubmitOutcome {
        if let Some(last) = self.last_submit
            && now.saturating_duration_since(last) < self.cooldown
        {
            debug!("Ignoring submission inside cooldown");
            return SubmitOutcome::Ignored;
        }
        self.last_submit = Some(now);

        let interpretation = interpret(&self.input);
        info!("Command input {:?} -> {interpretation:?}", self.input);
        self.clear();
        SubmitOutcome::Interpreted(interpretation)
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
        self.cursor = self.input.chars().count();
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_index)
            .map_or(self.input.len(), |(i, _)| i)
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.input.insert(at, c);
        self.cursor += 1;
    }

    /// Insert pasted text; line breaks become spaces
    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars() {
            self.insert_char(if c == '\n' || c == '\r' { ' ' } else { c });
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.input.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.input.chars().count() {
            let at = self.byte_index(self.cursor);
            self.input.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.input.chars().count();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(input: &str) -> Command {
        match interpret(input) {
            Interpretation::Command(command) => command,
            other => panic!("expected a command for {input:?}, got {other:?}"),
        }
    }

    #[test]
    fn go_to_page_is_case_insensitive() {
        let cmd = command("Go To Page 12");
        assert_eq!(cmd.kind, CommandKind::GoToPage(12));
        assert_eq!(cmd.message, "Navigating to page 12.");
    }

    #[test]
    fn go_to_page_matches_anywhere() {
        assert_eq!(
            command("please go to page 3 now").kind,
            CommandKind::GoToPage(3)
        );
    }

    #[test]
    fn oversized_page_number_is_invalid() {
        assert_eq!(
            interpret("go to page 99999999999999999999999"),
            Interpretation::Invalid
        );
    }

    #[test]
    fn search_term_is_captured_verbatim() {
        let cmd = command("search for  Neural Networks ");
        assert_eq!(cmd.kind, CommandKind::Search(" Neural Networks ".to_string()));
        assert_eq!(
            cmd.message,
            "Searching for term \" Neural Networks \" within the document."
        );
    }

    #[test]
    fn go_to_page_wins_over_search() {
        assert_eq!(
            command("search for go to page 4").kind,
            CommandKind::GoToPage(4)
        );
    }

    #[test]
    fn urls_are_detected() {
        let result = interpret("https://example.com/paper.pdf");
        assert_eq!(
            result.notice().as_deref(),
            Some("Detected as URL: https://example.com/paper.pdf")
        );
    }

    #[test]
    fn anything_else_is_invalid() {
        for input in ["hello", "", "go to page", "search for"] {
            assert_eq!(interpret(input), Interpretation::Invalid, "{input:?}");
        }
        assert_eq!(
            Interpretation::Invalid.notice().as_deref(),
            Some(INVALID_INPUT_ALERT)
        );
    }

    #[test]
    fn submit_clears_input() {
        let mut bar = CommandBar::default();
        bar.set_input("go to page 2");
        let outcome = bar.submit_at(Instant::now());
        assert!(matches!(
            outcome,
            SubmitOutcome::Interpreted(Interpretation::Command(_))
        ));
        assert_eq!(bar.input(), "");
    }

    #[test]
    fn rapid_resubmission_is_ignored() {
        let mut bar = CommandBar::new(Duration::from_millis(300));
        let start = Instant::now();
        bar.set_input("go to page 2");
        assert!(matches!(bar.submit_at(start), SubmitOutcome::Interpreted(_)));

        bar.set_input("go to page 3");
        assert_eq!(
            bar.submit_at(start + Duration::from_millis(100)),
            SubmitOutcome::Ignored
        );
        assert_eq!(bar.input(), "go to page 3");

        assert_eq!(
            bar.submit_at(start + Duration::from_millis(301)),
            SubmitOutcome::Interpreted(Interpretation::Command(Command {
                kind: CommandKind::GoToPage(3),
                message: "Navigating to page 3.".to_string(),
            }))
        );
    }

    #[test]
    fn editing_respects_cursor() {
        let mut bar = CommandBar::default();
        bar.insert_str("sarch");
        bar.move_home();
        bar.move_right();
        bar.insert_char('e');
        assert_eq!(bar.input(), "search");

        bar.move_end();
        bar.backspace();
        assert_eq!(bar.input(), "searc");
        bar.move_home();
        bar.delete();
        assert_eq!(bar.input(), "earc");
        assert_eq!(bar.cursor(), 0);
    }

    #[test]
    fn multibyte_input_is_edited_by_char() {
        let mut bar = CommandBar::default();
        bar.insert_str("séarch");
        bar.move_left();
        bar.backspace();
        assert_eq!(bar.input(), "séarh");
    }
}
