// src/prompt.rs

use std::io::{self, BufRead, Write};

use crate::combine::DEFAULT_THRESHOLD;
use crate::conditions::{LoadMode, Separator};
use crate::pipeline::IntersectScope;

/// Interactive questions asked when the command line leaves them open.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `question` and read one line, without its line ending. EOF reads as empty.
    fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    pub fn load_mode(&mut self) -> io::Result<LoadMode> {
        writeln!(self.output, "\nSelect condition separator:")?;
        writeln!(self.output, "1) New line (default)")?;
        writeln!(self.output, "2) Comma (,)")?;
        writeln!(self.output, "3) Semicolon (;)")?;
        writeln!(self.output, "4) Tab")?;
        writeln!(self.output, "5) Custom")?;
        writeln!(self.output, "6) Named brackets  name: ( ... )")?;

        let choice = self.ask("Enter choice [1-6]: ")?;
        Ok(match choice.trim() {
            "2" => LoadMode::Split(Separator::Comma),
            "3" => LoadMode::Split(Separator::Semicolon),
            "4" => LoadMode::Split(Separator::Tab),
            "5" => LoadMode::Split(Separator::Custom(self.custom_separator()?)),
            "6" => LoadMode::Brackets,
            _ => LoadMode::Split(Separator::Newline),
        })
    }

    /// Surrounding spaces are part of the separator.
    pub fn custom_separator(&mut self) -> io::Result<String> {
        self.ask("Enter custom separator: ")
    }

    /// Anything that is not a positive integer means the default.
    pub fn min_appearances(&mut self) -> io::Result<usize> {
        let answer = self.ask(&format!(
            "\nMinimum appearances? [default {}]: ",
            DEFAULT_THRESHOLD
        ))?;
        Ok(answer
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_THRESHOLD))
    }

    pub fn intersect_scope(&mut self) -> io::Result<IntersectScope> {
        let answer = self.ask("Count appearances across the last 7 days of runs? [y/N]: ")?;
        Ok(match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => IntersectScope::History,
            _ => IntersectScope::SingleRun,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(answers: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(answers.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn separator_menu() {
        assert_eq!(prompter("\n").load_mode().unwrap(), LoadMode::default());
        assert_eq!(
            prompter("3\n").load_mode().unwrap(),
            LoadMode::Split(Separator::Semicolon)
        );
        assert_eq!(prompter("6\n").load_mode().unwrap(), LoadMode::Brackets);
        assert_eq!(
            prompter("5\n | \n").load_mode().unwrap(),
            LoadMode::Split(Separator::Custom(" | ".into()))
        );
        assert_eq!(prompter("").load_mode().unwrap(), LoadMode::default());
    }

    #[test]
    fn menu_is_printed() {
        let mut p = prompter("1\n");
        p.load_mode().unwrap();
        let shown = String::from_utf8(p.output).unwrap();
        assert!(shown.contains("5) Custom"));
        assert!(shown.ends_with("Enter choice [1-6]: "));
    }

    #[test]
    fn min_appearances_defaults() {
        assert_eq!(prompter("3\n").min_appearances().unwrap(), 3);
        assert_eq!(prompter("\n").min_appearances().unwrap(), 2);
        assert_eq!(prompter("two\n").min_appearances().unwrap(), 2);
        assert_eq!(prompter("0\n").min_appearances().unwrap(), 2);
    }

    #[test]
    fn scope_answers() {
        assert_eq!(prompter("Y\n").intersect_scope().unwrap(), IntersectScope::History);
        assert_eq!(prompter("\n").intersect_scope().unwrap(), IntersectScope::SingleRun);
    }
}
