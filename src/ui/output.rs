use crate::ui::{Icons, theme};
use owo_colors::OwoColorize;

const BAR_WIDTH: usize = 30;

pub fn header(text: &str) {
    println!("{} {}", Icons::CLIPBOARD, text.style(theme().header.clone()));
}

pub fn status(icon: &str, label: &str, value: &str) {
    println!("{} {}: {}", icon, label.style(theme().dim.clone()), value);
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn dim(text: &str) -> String {
    text.style(theme().dim.clone()).to_string()
}

pub fn muted(text: &str) -> String {
    text.style(theme().muted.clone()).to_string()
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().dim.clone()), value);
}

/// "Question 3 of 120" followed by the question text
pub fn question_card(position: usize, total: usize, question: &str) {
    println!();
    println!(
        "{} {}",
        Icons::QUESTION,
        format!("Question {} of {}", position, total).style(theme().header.clone())
    );
    println!("{}", question.style(theme().question.clone()));
}

/// Labelled answer body, indented two spaces
pub fn answer_block(icon: &str, label: &str, body: &str, gold: bool) {
    let style = if gold { theme().gold_answer.clone() } else { theme().model_answer.clone() };
    println!();
    println!("{} {}", icon, label.style(theme().dim.clone()));
    for line in body.lines() {
        println!("  {}", line.style(style.clone()));
    }
}

pub fn rating_line(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().dim.clone()), value.style(theme().rating.clone()));
}

/// Text progress bar, e.g. `[#########.....] 12/40 (30.0%)`
pub fn progress_bar(done: usize, total: usize) -> String {
    let filled = if total == 0 { 0 } else { (done.min(total) * BAR_WIDTH) / total };
    let percent = if total == 0 { 0.0 } else { done as f64 / total as f64 * 100.0 };
    format!(
        "[{}{}] {}/{} ({:.1}%)",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        done,
        total,
        percent
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 0), format!("[{}] 0/0 (0.0%)", ".".repeat(BAR_WIDTH)));
        let half = progress_bar(5, 10);
        assert!(half.starts_with(&format!("[{}{}]", "#".repeat(15), ".".repeat(15))));
        assert!(half.ends_with("5/10 (50.0%)"));
        assert!(progress_bar(12, 10).starts_with(&format!("[{}]", "#".repeat(BAR_WIDTH))));
    }
}
