use crate::app::{App, SaveStatus, Screen};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute,
    style::{Color, Print, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use ledger_quiz_core::{AnswerOutcome, RankedScore};
use std::io;

/// Width of the main content column
const CONTENT_WIDTH: u16 = 72;

pub fn render(stdout: &mut io::Stdout, app: &App) -> io::Result<()> {
    let (term_width, term_height) = terminal::size()?;

    execute!(
        stdout,
        Hide,
        SetBackgroundColor(app.theme.bg),
        Clear(ClearType::All)
    )?;

    let x = term_width.saturating_sub(CONTENT_WIDTH) / 2;
    match app.screen {
        Screen::NameEntry => render_name_screen(stdout, app, x)?,
        Screen::Question => render_question_screen(stdout, app, x)?,
        Screen::GameOver => render_game_over_screen(stdout, app, x)?,
        Screen::Review => render_review_screen(stdout, app, x, term_height)?,
        Screen::Leaderboard => render_leaderboard_screen(stdout, app, x, term_height)?,
    }

    render_status_line(stdout, app, x, term_height)?;

    if let Some(ref msg) = app.message {
        render_message(stdout, app, msg, term_width)?;
    }

    if app.screen == Screen::NameEntry {
        // Leave the cursor at the end of the typed name
        let cx = x + 8 + app.name_input.chars().count() as u16;
        execute!(stdout, MoveTo(cx, 8), Show)?;
    }

    Ok(())
}

fn render_title(stdout: &mut io::Stdout, app: &App, x: u16, title: &str) -> io::Result<()> {
    let theme = &app.theme;
    let title_x = x + CONTENT_WIDTH.saturating_sub(title.chars().count() as u16) / 2;
    execute!(
        stdout,
        MoveTo(title_x, 1),
        SetForegroundColor(theme.key),
        Print(title),
        MoveTo(x, 2),
        SetForegroundColor(theme.border),
        Print("─".repeat(CONTENT_WIDTH as usize))
    )?;
    Ok(())
}

fn render_name_screen(stdout: &mut io::Stdout, app: &App, x: u16) -> io::Result<()> {
    let theme = &app.theme;
    render_title(stdout, app, x, "═══ DEBIT OR CREDIT CHALLENGE ═══")?;

    execute!(
        stdout,
        MoveTo(x, 4),
        SetForegroundColor(theme.fg),
        Print("Classify each account in a transaction as debited or credited."),
        MoveTo(x, 5),
        SetForegroundColor(theme.info),
        Print("Three correct answers in a row raise the points for the next one."),
        MoveTo(x, 8),
        SetForegroundColor(theme.info),
        Print("Name: "),
        SetForegroundColor(theme.key),
        Print("> "),
        SetForegroundColor(theme.fg),
        Print(&app.name_input)
    )?;

    let mut y = 11;
    if let Some(ref warning) = app.bank_warning {
        for line in wrap_text(warning, CONTENT_WIDTH as usize) {
            execute!(
                stdout,
                MoveTo(x, y),
                SetForegroundColor(theme.error),
                Print(line)
            )?;
            y += 1;
        }
        y += 1;
    }

    if let Some(ref url) = app.invite_url {
        render_invite(stdout, app, x, y, url)?;
    }

    render_controls(
        stdout,
        app,
        x,
        &[("Enter", "Start"), ("Tab", "Leaderboard"), ("Esc", "Quit")],
    )
}

fn render_question_screen(stdout: &mut io::Stdout, app: &App, x: u16) -> io::Result<()> {
    let theme = &app.theme;
    let session = &app.session;
    render_title(stdout, app, x, "═══ DEBIT OR CREDIT CHALLENGE ═══")?;

    // Progress and score
    execute!(
        stdout,
        MoveTo(x, 3),
        SetForegroundColor(theme.info),
        Print(format!(
            "{}  |  Attempt {}  |  Question {} of {}",
            session.username(),
            session.attempt(),
            session.question_number(),
            session.total_questions()
        )),
        MoveTo(x, 4),
        SetForegroundColor(theme.info),
        Print("Score "),
        SetForegroundColor(theme.key),
        Print(session.score()),
        SetForegroundColor(theme.info),
        Print("   Streak "),
        SetForegroundColor(theme.key),
        Print(session.streak()),
        SetForegroundColor(theme.info),
        Print(format!("   Next correct answer: +{}", session.next_award()))
    )?;

    let Some(question) = session.current_question() else {
        return Ok(());
    };

    let mut y = 6;
    for line in wrap_text(&question.transaction, CONTENT_WIDTH as usize) {
        execute!(
            stdout,
            MoveTo(x, y),
            SetForegroundColor(theme.fg),
            Print(line)
        )?;
        y += 1;
    }

    y += 1;
    execute!(
        stdout,
        MoveTo(x, y),
        SetForegroundColor(theme.key),
        Print(question.prompt())
    )?;
    y += 2;

    for (i, account) in session.current_options().iter().enumerate() {
        let selected = i == app.selection;
        let bg = if selected { theme.selected_bg } else { theme.bg };
        execute!(
            stdout,
            MoveTo(x + 2, y),
            SetBackgroundColor(bg),
            SetForegroundColor(theme.key),
            Print(format!(" {} ", i + 1)),
            SetForegroundColor(theme.fg),
            Print(format!(" {:<40}", account)),
            SetBackgroundColor(theme.bg)
        )?;
        y += 1;
    }

    if let Some(ref outcome) = app.last_outcome {
        y += 1;
        render_feedback(stdout, app, x, y, outcome)?;
    }

    render_controls(
        stdout,
        app,
        x,
        &[
            ("1-9", "Answer"),
            ("↑↓/jk", "Move"),
            ("Enter", "Submit"),
            ("t", "Theme"),
            ("q", "Quit"),
        ],
    )
}

fn render_feedback(
    stdout: &mut io::Stdout,
    app: &App,
    x: u16,
    y: u16,
    outcome: &AnswerOutcome,
) -> io::Result<()> {
    let theme = &app.theme;
    let (color, headline) = if outcome.correct {
        (theme.success, format!("Correct! +{} points", outcome.points))
    } else {
        (
            theme.error,
            format!("Not quite. The answer was {}.", outcome.correct_answer),
        )
    };

    execute!(
        stdout,
        MoveTo(x, y),
        SetForegroundColor(color),
        Print(headline)
    )?;
    for (i, line) in wrap_text(&outcome.explanation, CONTENT_WIDTH as usize)
        .into_iter()
        .enumerate()
    {
        execute!(
            stdout,
            MoveTo(x, y + 1 + i as u16),
            SetForegroundColor(theme.info),
            Print(line)
        )?;
    }
    Ok(())
}

fn render_game_over_screen(stdout: &mut io::Stdout, app: &App, x: u16) -> io::Result<()> {
    let theme = &app.theme;
    let session = &app.session;
    render_title(stdout, app, x, "═══ GAME OVER ═══")?;

    let correct = session.review().iter().filter(|r| r.was_correct()).count();
    execute!(
        stdout,
        MoveTo(x, 4),
        SetForegroundColor(theme.fg),
        Print(format!("Well done, {}!", session.username())),
        MoveTo(x, 6),
        SetForegroundColor(theme.info),
        Print("Final score   "),
        SetForegroundColor(theme.key),
        Print(session.score()),
        MoveTo(x, 7),
        SetForegroundColor(theme.info),
        Print(format!(
            "Correct       {} of {}",
            correct,
            session.total_questions()
        )),
        MoveTo(x, 8),
        SetForegroundColor(theme.info),
        Print(format!("Attempt       {}", session.attempt()))
    )?;

    if session.total_questions() == 0 {
        execute!(
            stdout,
            MoveTo(x, 10),
            SetForegroundColor(theme.error),
            Print("No questions were available for this attempt.")
        )?;
    }

    if let Some(ref outcome) = app.last_outcome {
        render_feedback(stdout, app, x, 12, outcome)?;
    }

    let (color, status) = match &app.save_status {
        SaveStatus::Pending => (theme.info, "Saving score...".to_string()),
        SaveStatus::Saved => (
            theme.success,
            format!("Score saved to {}", app.sheet_name()),
        ),
        SaveStatus::Failed(e) => (theme.error, format!("Score not saved: {}", e)),
        SaveStatus::Offline(_) => (
            theme.error,
            "Offline: your score was not saved".to_string(),
        ),
    };
    execute!(
        stdout,
        MoveTo(x, 16),
        SetForegroundColor(color),
        Print(truncate(&status, CONTENT_WIDTH as usize))
    )?;

    if let Some(ref url) = app.invite_url {
        render_invite(stdout, app, x, 18, url)?;
    }

    render_controls(
        stdout,
        app,
        x,
        &[
            ("Enter/p", "Play again"),
            ("r", "Review"),
            ("b", "Leaderboard"),
            ("t", "Theme"),
            ("q", "Quit"),
        ],
    )
}

fn render_review_screen(
    stdout: &mut io::Stdout,
    app: &App,
    x: u16,
    term_height: u16,
) -> io::Result<()> {
    let theme = &app.theme;
    render_title(stdout, app, x, "═══ REVIEW ═══")?;

    let entries = app.session.review();
    if entries.is_empty() {
        execute!(
            stdout,
            MoveTo(x, 4),
            SetForegroundColor(theme.border),
            Print("Nothing to review yet.")
        )?;
    }

    let bottom = term_height.saturating_sub(4);
    let mut y = 4;
    for (i, entry) in entries.iter().enumerate().skip(app.review_scroll) {
        if y + 3 > bottom {
            break;
        }
        let (mark, color) = if entry.was_correct() {
            ("✓", theme.success)
        } else {
            ("✗", theme.error)
        };

        execute!(
            stdout,
            MoveTo(x, y),
            SetForegroundColor(color),
            Print(format!("{} ", mark)),
            SetForegroundColor(theme.key),
            Print(format!("{:>2}. ", i + 1)),
            SetForegroundColor(theme.fg),
            Print(truncate(&entry.transaction, CONTENT_WIDTH as usize - 6)),
            MoveTo(x + 6, y + 1),
            SetForegroundColor(theme.info),
            Print(format!(
                "{} account: you chose {}, answer {} (+{})",
                entry.question_type,
                entry.chosen_answer,
                entry.correct_answer,
                entry.points_awarded
            ))
        )?;
        y += 2;

        for line in wrap_text(&entry.explanation, CONTENT_WIDTH as usize - 6) {
            if y >= bottom {
                break;
            }
            execute!(
                stdout,
                MoveTo(x + 6, y),
                SetForegroundColor(theme.border),
                Print(line)
            )?;
            y += 1;
        }
        y += 1;
    }

    render_controls(
        stdout,
        app,
        x,
        &[("↑↓/jk", "Scroll"), ("b", "Leaderboard"), ("Esc", "Back")],
    )
}

fn render_leaderboard_screen(
    stdout: &mut io::Stdout,
    app: &App,
    x: u16,
    term_height: u16,
) -> io::Result<()> {
    let theme = &app.theme;
    render_title(stdout, app, x, "═══ LEADERBOARD ═══")?;

    // Header
    let header_y = 4;
    execute!(
        stdout,
        MoveTo(x, header_y),
        SetForegroundColor(theme.fg),
        Print(format!(
            "{:>4}  {:<24} {:>7} {:>8}  {:<19}",
            "Rank", "Player", "Score", "Attempt", "Played"
        )),
        MoveTo(x, header_y + 1),
        SetForegroundColor(theme.border),
        Print("─".repeat(CONTENT_WIDTH as usize))
    )?;

    let entries: &[RankedScore] = match &app.leaderboard {
        Some(Ok(entries)) => entries.as_slice(),
        Some(Err(e)) => {
            execute!(
                stdout,
                MoveTo(x, header_y + 3),
                SetForegroundColor(theme.error),
                Print(truncate(
                    &format!("Leaderboard unavailable: {}", e),
                    CONTENT_WIDTH as usize
                ))
            )?;
            &[]
        }
        None => &[],
    };

    let max_entries = term_height.saturating_sub(header_y + 6) as usize;
    for (i, entry) in entries.iter().take(max_entries).enumerate() {
        let y = header_y + 2 + i as u16;
        let rank_color = match entry.rank {
            1 => Color::Yellow, // Gold
            2 => Color::Grey,   // Silver
            3 => Color::Rgb {
                r: 205,
                g: 127,
                b: 50,
            }, // Bronze
            _ => theme.info,
        };
        let highlight = entry.name == app.session.username();

        execute!(
            stdout,
            MoveTo(x, y),
            SetForegroundColor(rank_color),
            Print(format!("{:>4}", entry.rank)),
            SetForegroundColor(if highlight { theme.success } else { theme.fg }),
            Print(format!("  {:<24}", truncate(&entry.name, 24))),
            SetForegroundColor(theme.key),
            Print(format!(" {:>7}", entry.score)),
            SetForegroundColor(theme.info),
            Print(format!(
                " {:>8}",
                entry.attempt.map(|a| a.to_string()).unwrap_or_default()
            )),
            Print(format!("  {:<19}", entry.timestamp.as_deref().unwrap_or("")))
        )?;
    }

    if matches!(app.leaderboard, Some(Ok(ref e)) if e.is_empty()) {
        execute!(
            stdout,
            MoveTo(x, header_y + 3),
            SetForegroundColor(theme.border),
            Print("No scores yet. Be the first!")
        )?;
    }

    render_controls(stdout, app, x, &[("r", "Refresh"), ("Esc", "Back")])
}

fn render_invite(stdout: &mut io::Stdout, app: &App, x: u16, y: u16, url: &str) -> io::Result<()> {
    let theme = &app.theme;
    execute!(
        stdout,
        MoveTo(x, y),
        SetForegroundColor(theme.info),
        Print("Invite your classmates: "),
        SetForegroundColor(theme.key),
        Print(url)
    )?;
    Ok(())
}

fn render_controls(
    stdout: &mut io::Stdout,
    app: &App,
    x: u16,
    controls: &[(&str, &str)],
) -> io::Result<()> {
    let theme = &app.theme;
    let (_, term_height) = terminal::size()?;
    let y = term_height.saturating_sub(3);

    execute!(
        stdout,
        MoveTo(x, y),
        SetForegroundColor(theme.border),
        Print("─".repeat(CONTENT_WIDTH as usize)),
        MoveTo(x, y + 1)
    )?;

    for (key, desc) in controls {
        execute!(
            stdout,
            SetForegroundColor(theme.key),
            Print(key),
            SetForegroundColor(theme.info),
            Print(format!(" {}  ", desc))
        )?;
    }

    Ok(())
}

fn render_status_line(
    stdout: &mut io::Stdout,
    app: &App,
    x: u16,
    term_height: u16,
) -> io::Result<()> {
    let theme = &app.theme;
    execute!(
        stdout,
        MoveTo(x, term_height.saturating_sub(1)),
        SetForegroundColor(theme.border),
        Print(truncate(
            &format!("Scores: {}", app.sheet_status()),
            CONTENT_WIDTH as usize
        ))
    )?;
    Ok(())
}

fn render_message(
    stdout: &mut io::Stdout,
    app: &App,
    msg: &str,
    term_width: u16,
) -> io::Result<()> {
    let theme = &app.theme;
    let padded = format!("  {}  ", msg);
    let x = term_width.saturating_sub(padded.chars().count() as u16) / 2;

    execute!(
        stdout,
        MoveTo(x, 0),
        SetForegroundColor(theme.fg),
        SetBackgroundColor(theme.selected_bg),
        Print(&padded),
        SetBackgroundColor(theme.bg)
    )?;

    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let width = current.chars().count() + word.chars().count() + 1;
        if width > max_width && !current.is_empty() {
            lines.push(current);
            current = String::new();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("Cash increases because the business received money", 20);
        assert!(lines.iter().all(|l| l.len() <= 20));
        assert_eq!(lines.join(" "), "Cash increases because the business received money");
        assert!(wrap_text("", 10).is_empty());
    }

    #[test]
    fn test_wrap_text_counts_characters() {
        // 11 characters but 14 bytes per line
        let lines = wrap_text("Dépôt reçus Dépôt reçus", 11);
        assert_eq!(lines, vec!["Dépôt reçus", "Dépôt reçus"]);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Ada", 5), "Ada");
        assert_eq!(truncate("Accounts Receivable", 8), "Account…");
    }
}
