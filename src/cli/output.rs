//! Handles all user-facing output for the CLI.
//!
//! The [`Reporter`] is an explicit context object threaded through the driver
//! and the execution engine - there is no global logging state, so repeated or
//! embedded runs cannot cross-talk. Channels are gated by a verbosity
//! threshold: a message prints when its level is at or above the configured
//! threshold (debug 0, info 1, log 2, warn 3, error 4).

use std::{collections::HashMap, io::Write, time::Instant};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

const DEBUG: u8 = 0;
const INFO: u8 = 1;
const LOG: u8 = 2;
const WARN: u8 = 3;
const ERROR: u8 = 4;

pub struct Reporter {
    threshold: u8,
    stdout: StandardStream,
    timers: HashMap<String, Instant>,
}

impl Reporter {
    pub fn new(threshold: u8) -> Self {
        let choice = if atty::is(atty::Stream::Stdout) {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        Self {
            threshold,
            stdout: StandardStream::stdout(choice),
            timers: HashMap::new(),
        }
    }

    /// A reporter that prints nothing; used by embedded and test callers.
    pub fn quiet() -> Self {
        Self {
            threshold: ERROR + 1,
            stdout: StandardStream::stdout(ColorChoice::Never),
            timers: HashMap::new(),
        }
    }

    // ========================================================================
    // LEVELED CHANNELS
    // ========================================================================

    pub fn debug(&mut self, msg: &str) {
        self.write(DEBUG, msg, None, false);
    }

    pub fn info(&mut self, msg: &str) {
        self.write(INFO, msg, None, false);
    }

    pub fn log(&mut self, msg: &str) {
        self.write(LOG, msg, None, false);
    }

    pub fn warn(&mut self, msg: &str) {
        self.write(WARN, msg, Some(Color::Yellow), false);
    }

    pub fn error(&mut self, msg: &str) {
        self.write(ERROR, msg, Some(Color::Red), false);
    }

    // ========================================================================
    // TIMERS
    // ========================================================================

    pub fn start_timer(&mut self, label: &str) {
        self.timers.insert(label.to_string(), Instant::now());
    }

    pub fn end_timer(&mut self, label: &str) {
        if let Some(started) = self.timers.remove(label) {
            let elapsed = started.elapsed().as_millis();
            self.log(&format!("took: {}ms", elapsed));
        }
    }

    // ========================================================================
    // HARNESS BANNERS
    // ========================================================================

    pub fn blank(&mut self) {
        self.log("");
    }

    pub fn file_banner(&mut self, path: &str) {
        self.tagged(LOG, "FILE", Color::Yellow, path);
    }

    pub fn test_banner(&mut self, code: &str) {
        self.blank();
        let indented = code
            .lines()
            .collect::<Vec<_>>()
            .join("\n  ");
        self.tagged(LOG, "TEST", Color::Magenta, &indented);
        self.blank();
    }

    pub fn case_pass(&mut self, number: usize, actual: &str, expected: &str) {
        if LOG < self.threshold {
            return;
        }
        let _ = self
            .stdout
            .set_color(ColorSpec::new().set_fg(Some(Color::Cyan)));
        let _ = write!(self.stdout, "case #{}", number);
        let _ = self.stdout.reset();
        let _ = write!(self.stdout, " assert ");
        let _ = self
            .stdout
            .set_color(ColorSpec::new().set_fg(Some(Color::Green)));
        let _ = writeln!(self.stdout, "{:<50}", actual);
        let _ = write!(self.stdout, "        is     {}", expected);
        let _ = self.stdout.reset();
        let _ = writeln!(self.stdout);
    }

    pub fn pass_banner(&mut self, passed: usize, total: usize) {
        self.colored(LOG, &format!("\nPASS ({}/{})", passed, total), Color::Green, true);
    }

    pub fn fail_banner(&mut self) {
        self.colored(LOG, "\nFAIL", Color::Red, true);
    }

    pub fn no_tests_banner(&mut self) {
        self.colored(LOG, "\nNO TESTS", Color::Red, false);
    }

    // ========================================================================
    // PRIVATE HELPERS
    // ========================================================================

    fn write(&mut self, level: u8, msg: &str, color: Option<Color>, bold: bool) {
        if level < self.threshold {
            return;
        }
        if let Some(color) = color {
            let _ = self
                .stdout
                .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold));
        }
        let _ = writeln!(self.stdout, "{}", msg);
        let _ = self.stdout.reset();
    }

    fn colored(&mut self, level: u8, msg: &str, color: Color, bold: bool) {
        self.write(level, msg, Some(color), bold);
    }

    fn tagged(&mut self, level: u8, tag: &str, color: Color, rest: &str) {
        if level < self.threshold {
            return;
        }
        let _ = self
            .stdout
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
        let _ = write!(self.stdout, "{}", tag);
        let _ = self.stdout.reset();
        let _ = writeln!(self.stdout, " {}", rest);
    }
}
