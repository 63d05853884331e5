use qareview::config::{self, Settings};
use qareview::export::export_to_dir;
use qareview::output::{OutputMode, emit_success, is_quiet};
use qareview::session::{ReviewCommand, RowView};
use qareview::ui::{self, Icons, TableBuilder, histogram_table};
use qareview::{
    AnnotationPatch, AnnotationRow, AnnotationStore, Error, Progress, Rating, ReviewerIdentity,
    ReviewerType, SaveOutcome, Session, SourceRecord, SqliteStore, Statistics, Table,
    compute_progress, compute_statistics, load_source,
};
use owo_colors::OwoColorize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

pub fn run_version(output_mode: OutputMode) -> anyhow::Result<()> {
    if output_mode.is_human() {
        ui::header(&format!(
            "{} {}",
            "QA Review".bold().style(ui::theme().info.clone()),
            format!("Version {}", env!("CARGO_PKG_VERSION")).bold()
        ));
    } else {
        let data = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
        });
        emit_success(output_mode, "version", data)?;
    }
    Ok(())
}

pub fn run_init(path: &Path, force: bool) -> anyhow::Result<()> {
    config::write_config(path, &config::default_config(), force)?;
    ui::success(&format!("Wrote {}", path.display()));
    Ok(())
}

/// Arguments of the one-shot `save` command
pub struct SaveArgs {
    pub row: usize,
    pub rating: Option<String>,
    pub remark: Option<String>,
    pub name: String,
    pub reviewer_type: Option<String>,
}

pub fn run_save(settings: &Settings, args: SaveArgs) -> anyhow::Result<()> {
    let index = row_index(args.row)?;
    let rating = args.rating.as_deref().map(str::parse::<Rating>).transpose()?;
    let reviewer_type = match args.reviewer_type.as_deref() {
        Some(t) => ReviewerType::parse_optional(t)?,
        None => None,
    };

    let mut store = settings.open_store(load_source(&settings.input)?)?;
    let patch = AnnotationPatch::new(ReviewerIdentity::new(args.name, reviewer_type), settings.clock.review_date())
        .with_rating(rating)
        .with_remark(args.remark);

    match store.save_row(index, &patch)? {
        SaveOutcome::Saved => ui::success(&format!(
            "Review saved for question {} to {}",
            args.row,
            store.location().display()
        )),
        SaveOutcome::Skipped => ui::warn("Nothing to save (no rating or remark given)"),
    }
    Ok(())
}

pub fn run_show(settings: &Settings, row: usize) -> anyhow::Result<()> {
    let index = row_index(row)?;
    let store = settings.open_store(load_source(&settings.input)?)?;
    let total = store.source().len();
    let record = store
        .source()
        .get(index)
        .ok_or(Error::IndexOutOfRange { index, len: total })?;

    render_record(index, total, record);
    render_saved(&store.annotation(index));
    Ok(())
}

pub fn run_stats(settings: &Settings, output_mode: OutputMode) -> anyhow::Result<()> {
    let store = settings.open_store(load_source(&settings.input)?)?;
    let total = store.source().len();
    let annotations = store.load_annotations();
    let progress = annotations
        .as_ref()
        .map(|t| compute_progress(t, total))
        .unwrap_or(Progress { reviewed: 0, total });
    let stats = annotations.as_ref().map(compute_statistics);

    if output_mode.is_human() {
        render_stats(progress, stats.as_ref());
    } else {
        let data = serde_json::json!({
            "progress": progress,
            "percent": progress.percent(),
            "statistics": stats,
        });
        emit_success(output_mode, "stats", data)?;
    }
    Ok(())
}

pub fn run_export(settings: &Settings, dir: Option<PathBuf>) -> anyhow::Result<()> {
    let store = settings.open_store(load_source(&settings.input)?)?;
    let dir = dir.unwrap_or_else(|| settings.export_dir.clone());
    report_export(export_to_dir(store.as_ref(), &dir, &settings.clock)?);
    Ok(())
}

pub fn run_import(settings: &Settings, from: &Path) -> anyhow::Result<()> {
    let source = load_source(&settings.input)?;
    let table = Table::read_csv_path(from)?;
    let mut store = SqliteStore::open(&settings.database, source, settings.policy.clone())?;
    let imported = store.import_table(&table)?;
    ui::success(&format!(
        "Imported {} reviews from {} into {}",
        imported,
        from.display(),
        settings.database.display()
    ));
    Ok(())
}

pub fn run_review(settings: &Settings) -> anyhow::Result<()> {
    let store = settings.open_store(load_source(&settings.input)?)?;
    let mut session = Session::new(store, settings.clock)?;

    if !is_quiet() {
        ui::header("QA Review");
        ui::status(Icons::FILE, "Dataset", &settings.input.display().to_string());
        ui::status(
            Icons::DATABASE,
            "Reviews",
            &session.store().location().display().to_string(),
        );
        println!("  {}", ui::muted("Type 'help' for commands."));
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    if settings.policy.require_reviewer_identity {
        ask_identity(&mut session, &mut lines)?;
    }
    render_view(&session.current_view());

    loop {
        prompt(&format!(
            "[{}/{}]> ",
            session.cursor().index() + 1,
            session.cursor().len()
        ))?;
        let Some(line) = lines.next() else {
            println!();
            finish(&mut session);
            break;
        };

        let command: ReviewCommand = match line?.parse() {
            Ok(command) => command,
            Err(e) => {
                ui::warn(&e.to_string());
                continue;
            }
        };

        match command {
            ReviewCommand::Navigate(nav) => {
                let outcome = session.navigate(nav);
                match outcome.save {
                    Ok(SaveOutcome::Saved) => ui::success(&format!("Review saved for question {}", outcome.from + 1)),
                    Ok(SaveOutcome::Skipped) => {}
                    Err(e) if !e.is_recoverable() => return Err(e.into()),
                    Err(e) => ui::error(&e.to_string()),
                }
                render_view(&session.current_view());
            }
            ReviewCommand::Rate(rating) => {
                session.set_rating(rating);
                ui::rating_line("Rating:", rating.map(|r| r.label()).unwrap_or("(none)"));
            }
            ReviewCommand::Remark(remark) => {
                let shown = remark.clone().unwrap_or_else(|| "(none)".to_string());
                session.set_remark(remark);
                ui::summary_row("Remark:", &shown);
            }
            ReviewCommand::Save => match session.save() {
                Ok(SaveOutcome::Saved) => ui::success("Review saved successfully!"),
                Ok(SaveOutcome::Skipped) => ui::warn("Nothing to save"),
                Err(e) if !e.is_recoverable() => return Err(e.into()),
                Err(e) => ui::error(&e.to_string()),
            },
            ReviewCommand::Name(name) => {
                session.set_reviewer_name(name);
                ui::status(Icons::PERSON, "Reviewer", &describe_reviewer(session.reviewer()));
            }
            ReviewCommand::Type(reviewer_type) => {
                session.set_reviewer_type(reviewer_type);
                ui::status(Icons::PERSON, "Reviewer", &describe_reviewer(session.reviewer()));
            }
            ReviewCommand::Show => render_view(&session.current_view()),
            ReviewCommand::Stats => render_stats(session.progress(), session.statistics().as_ref()),
            ReviewCommand::Export => {
                match export_to_dir(session.store().as_ref(), &settings.export_dir, session.clock()) {
                    Ok(path) => report_export(path),
                    Err(e) => ui::error(&format!("Error exporting data: {}", e)),
                }
            }
            ReviewCommand::Help => render_help(),
            ReviewCommand::Quit => {
                finish(&mut session);
                break;
            }
        }
    }
    Ok(())
}

/// Save whatever is pending and print the final progress
fn finish<S: AnnotationStore>(session: &mut Session<S>) {
    match session.save() {
        Ok(SaveOutcome::Saved) => ui::success("Final review saved"),
        Ok(SaveOutcome::Skipped) => {}
        Err(e) => ui::error(&e.to_string()),
    }
    ui::status(Icons::STATS, "Progress", &session.progress().to_string());
}

fn ask_identity<S: AnnotationStore, I>(session: &mut Session<S>, lines: &mut I) -> anyhow::Result<()>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    prompt("Reviewer name: ")?;
    if let Some(line) = lines.next() {
        session.set_reviewer_name(line?.trim());
    }

    let choices: Vec<&str> = ReviewerType::all().iter().map(|t| t.as_str()).collect();
    prompt(&format!("Reviewer type ({}): ", choices.join(", ")))?;
    if let Some(line) = lines.next() {
        match ReviewerType::parse_optional(&line?) {
            Ok(t) => session.set_reviewer_type(t),
            Err(e) => ui::warn(&format!("{} (set it later with 'type')", e)),
        }
    }

    if !session.reviewer().is_complete() {
        ui::warn(&Error::IdentityMissing.to_string());
    }
    Ok(())
}

fn prompt(text: &str) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{}", text.style(ui::theme().header.clone()))?;
    stdout.flush()?;
    Ok(())
}

fn row_index(row: usize) -> anyhow::Result<usize> {
    row.checked_sub(1)
        .ok_or_else(|| anyhow::anyhow!("questions are numbered from 1"))
}

fn describe_reviewer(reviewer: &ReviewerIdentity) -> String {
    let name = if reviewer.name.trim().is_empty() {
        "(no name)"
    } else {
        reviewer.name.trim()
    };
    let kind = reviewer
        .reviewer_type
        .map(|t| t.as_str())
        .unwrap_or(ReviewerType::UNSET);
    format!("{} ({})", name, kind)
}

fn render_record(index: usize, total: usize, record: &SourceRecord) {
    ui::question_card(index + 1, total, &record.question);
    ui::answer_block(Icons::ROBOT, "Model Answer", &record.model_answer, false);
    ui::answer_block(Icons::GOLD, "Gold Answer", &record.gold_answer, true);
}

fn render_saved(saved: &AnnotationRow) {
    if saved.is_blank() {
        println!();
        println!("  {}", ui::muted("Not reviewed yet"));
        return;
    }

    ui::section("Saved review");
    if !saved.rating.is_empty() {
        ui::rating_line("Rating:", &saved.rating);
    }
    if !saved.remark.is_empty() {
        ui::summary_row("Remark:", &saved.remark);
    }
    if !saved.reviewer_name.is_empty() {
        ui::summary_row(
            "Reviewer:",
            &format!("{} ({})", saved.reviewer_name, saved.reviewer_type),
        );
    }
    if !saved.reviewed_at.is_empty() {
        ui::summary_row("Date:", &saved.reviewed_at);
    }
}

fn render_view(view: &RowView<'_>) {
    if console::Term::stdout().is_term() && !is_quiet() {
        if let Err(e) = console::Term::stdout().clear_screen() {
            tracing::debug!("Could not clear the screen: {}", e);
        }
    }
    render_record(view.index, view.total, view.record);
    render_saved(&view.saved);

    if !view.pending.is_empty() {
        ui::section("Unsaved");
        if let Some(rating) = view.pending.rating {
            ui::rating_line("Rating:", rating.label());
        }
        if let Some(remark) = &view.pending.remark {
            ui::summary_row("Remark:", remark);
        }
    }
    println!();
}

fn render_stats(progress: Progress, stats: Option<&Statistics>) {
    ui::section("Progress");
    println!("  {}", ui::progress_bar(progress.reviewed, progress.total));

    let Some(stats) = stats else {
        println!("  {}", ui::muted("No reviews saved yet"));
        return;
    };

    let average = stats
        .average_rating
        .map(|a| format!("{:.2}", a))
        .unwrap_or_else(|| "-".to_string());
    let mut builder = TableBuilder::new();
    builder.add_row("Reviewed", &progress.to_string());
    builder.add_row("Rated", &stats.rated_count.to_string());
    builder.add_row("Average rating", &average);
    for (kind, count) in &stats.reviewer_type_histogram {
        builder.add_row(kind, &count.to_string());
    }
    println!("{}", builder.build());

    let histogram = histogram_table(stats, progress.total);
    if !histogram.is_empty() {
        ui::section(&format!("{} Rating distribution", Icons::STAR));
        println!("{}", histogram);
    }
}

fn render_help() {
    ui::section("Commands");
    for (usage, description) in ReviewCommand::help() {
        println!("  {:<34} {}", usage, ui::dim(description));
    }
    println!("  {:<34} {}", "1-5", ui::dim("quick rating"));
}

fn report_export(path: Option<PathBuf>) {
    match path {
        Some(path) => ui::status(Icons::EXPORT, "Exported", &path.display().to_string()),
        None => ui::warn("No reviews saved yet"),
    }
}
