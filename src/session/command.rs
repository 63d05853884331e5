//! Commands typed at the review prompt

use super::Navigation;
use crate::rating::{Rating, ReviewerType};
use crate::{Error, Result};
use std::str::FromStr;

/// One line of reviewer input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewCommand {
    Navigate(Navigation),
    Rate(Option<Rating>),
    Remark(Option<String>),
    Save,
    Name(String),
    Type(Option<ReviewerType>),
    Show,
    Stats,
    Export,
    Help,
    Quit,
}

impl ReviewCommand {
    /// Prompt help, one line per command
    pub fn help() -> &'static [(&'static str, &'static str)] {
        &[
            ("n, next", "save and go to the next question"),
            ("p, prev", "save and go to the previous question"),
            ("j, jump <N>", "save and go to question N"),
            ("reset", "save and go back to question 1"),
            ("r, rate <1-5|name>", "set the rating (\"r -\" clears it)"),
            ("m, remark <text>", "set the remark (\"m\" alone clears it)"),
            ("s, save", "save without moving"),
            ("name <text>", "set the reviewer name"),
            ("type <payer|non-payer|officer>", "set the reviewer type"),
            ("show", "show the current question again"),
            ("stats", "show progress and rating statistics"),
            ("export", "write a timestamped copy of the reviews"),
            ("q, quit", "save and finish"),
        ]
    }
}

impl FromStr for ReviewCommand {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, arg) = match line.split_once(char::is_whitespace) {
            Some((word, arg)) => (word, arg.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "" | "show" | "l" => ReviewCommand::Show,
            "n" | "next" => ReviewCommand::Navigate(Navigation::Next),
            "p" | "prev" | "previous" => ReviewCommand::Navigate(Navigation::Previous),
            "reset" => ReviewCommand::Navigate(Navigation::ResetToFirst),
            "j" | "jump" | "goto" => {
                let n: usize = arg
                    .parse()
                    .map_err(|_| Error::InvalidCommand(format!("expected a question number, got '{}'", arg)))?;
                ReviewCommand::Navigate(Navigation::JumpTo(n.saturating_sub(1)))
            }
            "r" | "rate" => match arg {
                "" | "-" => ReviewCommand::Rate(None),
                other => ReviewCommand::Rate(Some(other.parse()?)),
            },
            "m" | "remark" => {
                if arg.is_empty() {
                    ReviewCommand::Remark(None)
                } else {
                    ReviewCommand::Remark(Some(arg.to_string()))
                }
            }
            "s" | "save" => ReviewCommand::Save,
            "name" => ReviewCommand::Name(arg.to_string()),
            "type" => ReviewCommand::Type(ReviewerType::parse_optional(arg)?),
            "stats" => ReviewCommand::Stats,
            "export" => ReviewCommand::Export,
            "h" | "help" | "?" => ReviewCommand::Help,
            "q" | "quit" | "exit" | "finish" => ReviewCommand::Quit,
            // A bare digit is a quick rating
            d if d.len() == 1 && d.chars().all(|c| c.is_ascii_digit()) => {
                ReviewCommand::Rate(Some(d.parse()?))
            }
            other => return Err(Error::InvalidCommand(format!("unknown command '{}' (try 'help')", other))),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ReviewCommand {
        line.parse().unwrap()
    }

    #[test]
    fn test_navigation_commands() {
        assert_eq!(parse("n"), ReviewCommand::Navigate(Navigation::Next));
        assert_eq!(parse("  prev "), ReviewCommand::Navigate(Navigation::Previous));
        assert_eq!(parse("reset"), ReviewCommand::Navigate(Navigation::ResetToFirst));
        assert_eq!(parse("j 12"), ReviewCommand::Navigate(Navigation::JumpTo(11)));
        assert_eq!(parse("jump 0"), ReviewCommand::Navigate(Navigation::JumpTo(0)));
        assert!("j twelve".parse::<ReviewCommand>().is_err());
    }

    #[test]
    fn test_rating_and_remark() {
        assert_eq!(parse("r 5"), ReviewCommand::Rate(Some(Rating::Excellent)));
        assert_eq!(parse("rate very poor"), ReviewCommand::Rate(Some(Rating::VeryPoor)));
        assert_eq!(parse("4"), ReviewCommand::Rate(Some(Rating::Good)));
        assert_eq!(parse("r -"), ReviewCommand::Rate(None));
        assert!("r 9".parse::<ReviewCommand>().is_err());
        assert_eq!(
            parse("m  The answer, sadly, omits the rebate.  "),
            ReviewCommand::Remark(Some("The answer, sadly, omits the rebate.".into()))
        );
        assert_eq!(parse("m"), ReviewCommand::Remark(None));
    }

    #[test]
    fn test_identity_and_misc() {
        assert_eq!(parse("name Abdul Karim"), ReviewCommand::Name("Abdul Karim".into()));
        assert_eq!(parse("type officer"), ReviewCommand::Type(Some(ReviewerType::TaxOfficer)));
        assert_eq!(parse("type Select Type"), ReviewCommand::Type(None));
        assert_eq!(parse(""), ReviewCommand::Show);
        assert_eq!(parse("Q"), ReviewCommand::Quit);
        assert!("frobnicate".parse::<ReviewCommand>().is_err());
    }
}
