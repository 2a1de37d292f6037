use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use sweepbench::app_dirs::AppDirs;
use sweepbench::category::Category;
use sweepbench::config::{Config, ConfigStore, FileConfigStore};
use sweepbench::history::{AnswerDb, AnswerRecord, ResultsLog, SessionSummary};
use sweepbench::leaderboard::LeaderboardClient;
use sweepbench::matrix::ConfusionMatrix;
use sweepbench::picker::{Question, QuestionSource, RandomPicker};
use sweepbench::ranked_store::SqliteRankedStore;
use sweepbench::runtime::{Command, CommandSource, StdinCommandSource};
use sweepbench::session::{Outcome, SessionRecorder};
use sweepbench::store::{FileStatsStore, StatsStore};
use sweepbench::submit::SubmitWorkflow;
use sweepbench::util;

/// terminal human benchmark for classifying selective-sweep patterns
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Classify haplotype sweep images as Neutral, Soft or Hard, build up a cumulative confusion matrix across sessions, and submit your accuracy to a shared leaderboard."
)]
pub struct Cli {
    /// number of questions per quiz session
    #[clap(short = 'q', long)]
    questions: Option<usize>,

    /// leaderboard entries per page
    #[clap(short = 'p', long)]
    page_size: Option<usize>,

    /// minimum answered questions required before submitting a score
    #[clap(long)]
    min_attempts: Option<u32>,

    /// number of images available per category
    #[clap(long)]
    images_per_category: Option<u32>,

    /// path to the shared leaderboard database
    #[clap(long)]
    leaderboard_db: Option<PathBuf>,

    /// skip the per-answer history database (no response-time analytics)
    #[clap(long)]
    no_history: bool,
}

impl Cli {
    /// Flags override the config file; anything not given keeps the
    /// file's (or default) value.
    fn effective_config(&self, base: Config) -> Config {
        Config {
            questions_per_session: self.questions.unwrap_or(base.questions_per_session).max(1),
            page_size: self.page_size.unwrap_or(base.page_size).max(1),
            min_attempts: self.min_attempts.unwrap_or(base.min_attempts),
            images_per_category: self
                .images_per_category
                .unwrap_or(base.images_per_category)
                .max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Quiz,
    Results,
    Leaderboard,
}

pub struct App {
    config: Config,
    state: AppState,
    recorder: SessionRecorder,
    picker: Box<dyn QuestionSource>,
    stats_store: Box<dyn StatsStore>,
    client: LeaderboardClient,
    workflow: SubmitWorkflow,
    history: Option<AnswerDb>,
    results_log: Option<ResultsLog>,
    current: Option<Question>,
    asked_at: Option<Instant>,
    question_number: u32,
    session_response_ms: Vec<f64>,
}

impl App {
    pub fn new(
        config: Config,
        picker: Box<dyn QuestionSource>,
        stats_store: Box<dyn StatsStore>,
        client: LeaderboardClient,
        history: Option<AnswerDb>,
        results_log: Option<ResultsLog>,
    ) -> Self {
        let recorder = SessionRecorder::new(config.questions_per_session);
        let workflow = SubmitWorkflow::new(config.min_attempts);
        Self {
            config,
            state: AppState::Quiz,
            recorder,
            picker,
            stats_store,
            client,
            workflow,
            history,
            results_log,
            current: None,
            asked_at: None,
            question_number: 0,
            session_response_ms: Vec::new(),
        }
    }

    pub fn greet(&self) {
        println!("sweepbench — can you spot selection in a haplotype plot?");
        let cumulative = self.stats_store.load();
        println!(
            "Cumulative accuracy so far: {} ({}/{} correct)",
            fmt_accuracy(cumulative.accuracy_pct()),
            cumulative.total_correct,
            cumulative.total_attempted,
        );
        println!("Type 'help' for commands.\n");
    }

    pub fn start_session(&mut self) {
        self.recorder = SessionRecorder::new(self.config.questions_per_session);
        self.session_response_ms.clear();
        self.question_number = 0;
        self.state = AppState::Quiz;
        self.next_question();
    }

    fn next_question(&mut self) {
        let question = self.picker.next_question();
        self.question_number += 1;
        println!(
            "Question {}/{} — {}",
            self.question_number, self.config.questions_per_session, question.image
        );
        println!("Your call? [n]eutral / [s]oft / [h]ard");
        self.current = Some(question);
        self.asked_at = Some(Instant::now());
    }

    /// Dispatch one command; returns `false` when the loop should exit.
    pub fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Answer(guess) => self.handle_answer(guess),
            Command::Stats => self.print_stats(),
            Command::Reset => self.handle_reset(),
            Command::Submit(username) => self.handle_submit_request(&username),
            Command::Confirm => self.handle_confirm(),
            Command::Cancel => {
                if self.workflow.cancel() {
                    println!("Submission cancelled; your stats are untouched.");
                } else {
                    println!("Nothing to cancel.");
                }
            }
            Command::Board => {
                match self.client.refresh() {
                    Ok(()) => {
                        self.state = AppState::Leaderboard;
                        self.print_board();
                    }
                    Err(e) => println!("{e} — try 'board' again"),
                }
            }
            Command::NextPage => match self.client.next_page() {
                Ok(true) => self.print_board(),
                Ok(false) => println!("No further pages."),
                Err(e) => println!("{e} — try again"),
            },
            Command::PreviousPage => match self.client.previous_page() {
                Ok(true) => self.print_board(),
                Ok(false) => println!("Already on the first page."),
                Err(e) => println!("{e} — try again"),
            },
            Command::NewSession => {
                if !self.recorder.is_finalized() && self.recorder.answered() > 0 {
                    println!("Abandoning the current session; its answers are not counted.");
                }
                self.start_session();
            }
            Command::Export(path) => self.handle_export(&path),
            Command::Help => print_help(),
            Command::Unknown(input) => {
                println!("Unrecognized command '{input}' — type 'help'.");
            }
            Command::Quit => {
                if !self.recorder.is_finalized() && self.recorder.answered() > 0 {
                    println!("Partial session discarded.");
                }
                println!("Bye.");
                return false;
            }
        }
        true
    }

    fn handle_answer(&mut self, guess: Category) {
        let question = match (&self.state, self.current.take()) {
            (AppState::Quiz, Some(q)) => q,
            (_, current) => {
                self.current = current;
                println!("No question pending — type 'new' to start a session.");
                return;
            }
        };

        let response_ms = self
            .asked_at
            .take()
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);
        let outcome = self.recorder.record_answer(guess, question.category);
        match outcome {
            Outcome::Correct => println!("Correct!"),
            Outcome::Incorrect => println!("Incorrect! The answer was {}.", question.category),
        }

        if let Some(ref db) = self.history {
            let record = AnswerRecord {
                guess,
                actual: question.category,
                was_correct: outcome == Outcome::Correct,
                response_ms,
                image: question.image,
                timestamp: chrono::Local::now(),
            };
            let _ = db.record_answer(&record);
        }
        self.session_response_ms.push(response_ms as f64);

        if self.recorder.is_complete() {
            self.finish_session();
        } else {
            self.next_question();
        }
    }

    fn finish_session(&mut self) {
        match self.recorder.finalize(self.stats_store.as_ref()) {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                println!("Could not save this session: {e}");
                println!("Your answers are still held in memory; quitting now would lose them.");
                return;
            }
        }

        let session = self.recorder.stats();
        println!(
            "\nSession complete: {}/{} correct ({})",
            session.total_correct,
            session.total_attempted,
            fmt_accuracy(session.accuracy_pct()),
        );
        let cumulative = self.stats_store.load();
        println!(
            "Cumulative: {}/{} correct ({})",
            cumulative.total_correct,
            cumulative.total_attempted,
            fmt_accuracy(cumulative.accuracy_pct()),
        );
        println!("Commands: 'stats' for the matrix, 'submit <name>' for the leaderboard, 'new' to go again.\n");

        if let Some(ref log) = self.results_log {
            let summary = SessionSummary {
                when: chrono::Local::now(),
                questions: session.total_attempted,
                correct: session.total_correct,
                accuracy_pct: session.accuracy_pct().unwrap_or(0.0),
                mean_response_ms: util::mean(&self.session_response_ms).unwrap_or(0.0),
            };
            let _ = log.append(&summary);
        }
        self.state = AppState::Results;
    }

    fn print_stats(&self) {
        let cumulative = self.stats_store.load();
        println!(
            "\nCumulative accuracy: {} ({}/{} correct)",
            fmt_accuracy(cumulative.accuracy_pct()),
            cumulative.total_correct,
            cumulative.total_attempted,
        );
        if !self.recorder.is_finalized() && self.recorder.answered() > 0 {
            println!(
                "This session so far: {}/{} (not yet counted)",
                self.recorder.correct(),
                self.recorder.answered()
            );
        }
        print_matrix(&cumulative.matrix);

        if let Some(ref db) = self.history {
            if let Ok(times) = db.response_times() {
                if let (Some(avg), Some(sd)) = (util::mean(&times), util::std_dev(&times)) {
                    println!("Response time: {avg:.0} ms avg, {sd:.0} ms sd");
                }
            }
            if let Ok(summary) = db.category_summary() {
                for row in summary {
                    println!(
                        "  {:>8}: {} shown, {:.0}% missed, {:.0} ms avg",
                        row.category.to_string(),
                        row.attempts,
                        row.miss_rate,
                        row.avg_response_ms
                    );
                }
            }
        }
        println!();
    }

    fn handle_reset(&mut self) {
        if let Err(e) = self.stats_store.reset() {
            println!("Could not reset stats: {e}");
            return;
        }
        if let Some(ref db) = self.history {
            let _ = db.clear_all();
        }
        println!("Cumulative stats cleared.");
    }

    fn handle_submit_request(&mut self, username: &str) {
        let stats = self.stats_store.load();
        match self.workflow.request(username, &stats) {
            Ok(pending) => {
                println!(
                    "Submit '{}' with accuracy {:.1}% ({}/{} correct)?",
                    pending.username,
                    pending.accuracy,
                    pending.snapshot.total_correct,
                    pending.snapshot.total_attempted,
                );
                println!("This uploads your score AND resets your local stats. [yes/no]");
            }
            Err(e) => println!("{e}"),
        }
    }

    fn handle_confirm(&mut self) {
        match self
            .workflow
            .confirm(self.client.store_mut(), self.stats_store.as_ref())
        {
            Ok(stored) => {
                println!(
                    "Score submitted: '{}' at {:.1}%. Local stats reset.",
                    stored.username, stored.accuracy
                );
                // A fresh write is only trusted to be visible after a
                // re-fetch.
                match self.client.refresh() {
                    Ok(()) => {
                        self.state = AppState::Leaderboard;
                        self.print_board();
                    }
                    Err(e) => println!("{e} — type 'board' to retry"),
                }
            }
            Err(e) => println!("{e}"),
        }
    }

    fn handle_export(&self, path: &str) {
        match self.history {
            Some(ref db) => match db.export_csv(path) {
                Ok(written) => println!("Exported {written} answers to {path}."),
                Err(e) => println!("{e}"),
            },
            None => println!("History is disabled (--no-history)."),
        }
    }

    fn print_board(&self) {
        if self.client.entries().is_empty() {
            println!("The leaderboard is empty — be the first to submit.");
            return;
        }
        println!(
            "\nLeaderboard — page {}/{} ({} entries)",
            self.client.page_index(),
            self.client.total_pages(),
            self.client.total_entries(),
        );
        for (offset, entry) in self.client.entries().iter().enumerate() {
            println!(
                "{:>4}. {:<30} {:>6.1}%  {:>4}/{:<4} {}",
                self.client.rank_of(offset),
                entry.username,
                entry.accuracy,
                entry.total_correct,
                entry.total_attempted,
                entry.created_at.format("%Y-%m-%d"),
            );
        }
        println!("Commands: 'next', 'prev'.\n");
    }
}

fn fmt_accuracy(accuracy: Option<f64>) -> String {
    match accuracy {
        Some(pct) => format!("{pct:.1}%"),
        None => "n/a".to_string(),
    }
}

/// Block-character intensity for one matrix cell relative to the largest
/// cell (`max` is floored at 1, so this never divides by zero).
fn shade_for(value: u32, max: u32) -> char {
    if value == 0 {
        return ' ';
    }
    let proportion = value as f64 / max as f64;
    if proportion <= 0.25 {
        '░'
    } else if proportion <= 0.5 {
        '▒'
    } else if proportion <= 0.75 {
        '▓'
    } else {
        '█'
    }
}

fn print_matrix(matrix: &ConfusionMatrix) {
    let max = matrix.max_cell();
    println!("guess \\ actual   Neutral     Soft     Hard");
    for &guess in &Category::ALL {
        let mut line = format!("{:>14}", guess.to_string());
        for &actual in &Category::ALL {
            let value = matrix.get(guess, actual);
            line.push_str(&format!("  {:>6} {}", value, shade_for(value, max)));
        }
        println!("{line}");
    }
}

fn print_help() {
    println!("Commands:");
    println!("  n / s / h            answer the current question");
    println!("  stats                cumulative confusion matrix and response times");
    println!("  reset                clear cumulative stats and answer history");
    println!("  submit <username>    put your accuracy on the shared leaderboard");
    println!("  yes / no             confirm or cancel a pending submission");
    println!("  board                show the leaderboard (first page)");
    println!("  next / prev          page through the leaderboard");
    println!("  new                  start a fresh session");
    println!("  export <file.csv>    dump the raw answer history");
    println!("  quit                 leave");
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = cli.effective_config(FileConfigStore::new().load());

    let stats_store = Box::new(FileStatsStore::new());
    let board_path = cli
        .leaderboard_db
        .clone()
        .or_else(AppDirs::leaderboard_db_path)
        .unwrap_or_else(|| PathBuf::from("sweepbench_leaderboard.db"));
    let ranked = SqliteRankedStore::new(&board_path)?;
    let client = LeaderboardClient::new(Box::new(ranked), config.page_size);

    let history = if cli.no_history {
        None
    } else {
        AnswerDb::new().ok()
    };
    let results_log = Some(ResultsLog::new());
    let picker = Box::new(RandomPicker::new(config.images_per_category));

    let mut app = App::new(config, picker, stats_store, client, history, results_log);
    app.greet();
    app.start_session();

    let mut source = StdinCommandSource;
    while let Some(command) = source.next_command() {
        if !app.handle(command) {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_defaults_and_overrides() {
        let cli = Cli::try_parse_from(["sweepbench"]).unwrap();
        assert_eq!(cli.questions, None);
        assert!(!cli.no_history);

        let cli = Cli::try_parse_from([
            "sweepbench",
            "-q",
            "5",
            "--page-size",
            "3",
            "--leaderboard-db",
            "/tmp/board.db",
            "--no-history",
        ])
        .unwrap();
        assert_eq!(cli.questions, Some(5));
        assert_eq!(cli.page_size, Some(3));
        assert_eq!(cli.leaderboard_db, Some(PathBuf::from("/tmp/board.db")));
        assert!(cli.no_history);
    }

    #[test]
    fn flags_override_config_file_values() {
        let base = Config {
            questions_per_session: 20,
            page_size: 7,
            min_attempts: 5,
            images_per_category: 4,
        };
        let cli = Cli::try_parse_from(["sweepbench", "-q", "3"]).unwrap();
        let effective = cli.effective_config(base.clone());
        assert_eq!(effective.questions_per_session, 3);
        assert_eq!(effective.page_size, 7);
        assert_eq!(effective.min_attempts, 5);
        assert_eq!(effective.images_per_category, 4);
    }

    #[test]
    fn zero_flags_are_clamped_to_one() {
        let cli = Cli::try_parse_from(["sweepbench", "-q", "0", "--page-size", "0"]).unwrap();
        let effective = cli.effective_config(Config::default());
        assert_eq!(effective.questions_per_session, 1);
        assert_eq!(effective.page_size, 1);
    }

    #[test]
    fn shade_scales_with_the_largest_cell() {
        assert_eq!(shade_for(0, 8), ' ');
        assert_eq!(shade_for(1, 8), '░');
        assert_eq!(shade_for(4, 8), '▒');
        assert_eq!(shade_for(6, 8), '▓');
        assert_eq!(shade_for(8, 8), '█');
        // Empty matrix: max is floored at 1.
        assert_eq!(shade_for(0, 1), ' ');
    }

    #[test]
    fn accuracy_formats_as_na_before_any_attempt() {
        assert_eq!(fmt_accuracy(None), "n/a");
        assert_eq!(fmt_accuracy(Some(66.666)), "66.7%");
    }
}
