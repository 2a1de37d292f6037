use std::io::{self, BufRead};
use std::sync::mpsc::Receiver;

use crate::category::Category;

/// Everything the quiz loop can be asked to do, parsed from one line of
/// input.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Answer(Category),
    Stats,
    Reset,
    Submit(String),
    Confirm,
    Cancel,
    Board,
    NextPage,
    PreviousPage,
    NewSession,
    Export(String),
    Help,
    Quit,
    /// Non-empty input that matched nothing; carried so the loop can
    /// answer with a hint instead of silently swallowing it.
    Unknown(String),
}

/// Parse one input line. `None` means the line was blank.
pub fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut parts = trimmed.split_whitespace();
    let head = parts.next()?.to_ascii_lowercase();
    let rest = parts.collect::<Vec<_>>().join(" ");

    let command = match head.as_str() {
        // `n`/`s`/`h` answer directly; cancel is spelled `no`.
        "n" | "s" | "h" | "neutral" | "soft" | "hard" => match Category::from_token(&head) {
            Some(category) => Command::Answer(category),
            None => Command::Unknown(trimmed.to_string()),
        },
        "answer" | "a" => match Category::from_token(&rest) {
            Some(category) => Command::Answer(category),
            None => Command::Unknown(trimmed.to_string()),
        },
        "stats" => Command::Stats,
        "reset" => Command::Reset,
        "submit" => {
            if rest.is_empty() {
                Command::Unknown(trimmed.to_string())
            } else {
                Command::Submit(rest)
            }
        }
        "y" | "yes" | "confirm" => Command::Confirm,
        "no" | "cancel" => Command::Cancel,
        "board" | "leaderboard" => Command::Board,
        "next" => Command::NextPage,
        "prev" | "previous" => Command::PreviousPage,
        "new" => Command::NewSession,
        "export" => {
            if rest.is_empty() {
                Command::Unknown(trimmed.to_string())
            } else {
                Command::Export(rest)
            }
        }
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        _ => Command::Unknown(trimmed.to_string()),
    };
    Some(command)
}

/// Source of user commands for the quiz loop.
pub trait CommandSource {
    /// Block until the next command, or `None` at end of input.
    fn next_command(&mut self) -> Option<Command>;
}

/// Production source reading lines from stdin. Blank lines are skipped.
pub struct StdinCommandSource;

impl CommandSource for StdinCommandSource {
    fn next_command(&mut self) -> Option<Command> {
        let stdin = io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => return None,
                Ok(_) => {
                    if let Some(command) = parse_command(&line) {
                        return Some(command);
                    }
                }
            }
        }
    }
}

/// Test command source fed from a channel
pub struct TestCommandSource {
    rx: Receiver<Command>,
}

impl TestCommandSource {
    pub fn new(rx: Receiver<Command>) -> Self {
        Self { rx }
    }
}

impl CommandSource for TestCommandSource {
    fn next_command(&mut self) -> Option<Command> {
        self.rx.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn parses_answers_in_both_spellings() {
        assert_eq!(parse_command("n"), Some(Command::Answer(Category::Neutral)));
        assert_eq!(parse_command("HARD"), Some(Command::Answer(Category::Hard)));
        assert_eq!(
            parse_command("answer soft"),
            Some(Command::Answer(Category::Soft))
        );
        assert_eq!(
            parse_command("a h"),
            Some(Command::Answer(Category::Hard))
        );
    }

    #[test]
    fn cancel_is_spelled_no_not_n() {
        assert_eq!(parse_command("no"), Some(Command::Cancel));
        assert_eq!(parse_command("n"), Some(Command::Answer(Category::Neutral)));
        assert_eq!(parse_command("cancel"), Some(Command::Cancel));
    }

    #[test]
    fn submit_carries_the_username() {
        assert_eq!(
            parse_command("submit genome_fan"),
            Some(Command::Submit("genome_fan".to_string()))
        );
        // Missing argument is not a valid submit.
        assert_eq!(
            parse_command("submit"),
            Some(Command::Unknown("submit".to_string()))
        );
    }

    #[test]
    fn paging_and_misc_commands_parse() {
        assert_eq!(parse_command("board"), Some(Command::Board));
        assert_eq!(parse_command("next"), Some(Command::NextPage));
        assert_eq!(parse_command("prev"), Some(Command::PreviousPage));
        assert_eq!(parse_command("stats"), Some(Command::Stats));
        assert_eq!(parse_command("reset"), Some(Command::Reset));
        assert_eq!(parse_command("new"), Some(Command::NewSession));
        assert_eq!(parse_command("q"), Some(Command::Quit));
        assert_eq!(
            parse_command("export out.csv"),
            Some(Command::Export("out.csv".to_string()))
        );
    }

    #[test]
    fn blank_is_none_and_garbage_is_unknown() {
        assert_eq!(parse_command("   "), None);
        assert_eq!(
            parse_command("frobnicate"),
            Some(Command::Unknown("frobnicate".to_string()))
        );
    }

    #[test]
    fn test_source_drains_the_channel() {
        let (tx, rx) = mpsc::channel();
        tx.send(Command::Stats).unwrap();
        tx.send(Command::Quit).unwrap();
        drop(tx);

        let mut source = TestCommandSource::new(rx);
        assert_eq!(source.next_command(), Some(Command::Stats));
        assert_eq!(source.next_command(), Some(Command::Quit));
        assert_eq!(source.next_command(), None);
    }
}
