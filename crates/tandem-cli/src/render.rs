use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::fmt::Write;

use crate::aggregate::{CalendarIndex, DISPLAY_OFFSET, DayActivity, days_together, display_day};
use crate::config::YearMonth;
use crate::models::{Account, ContentItem};
use crate::notifications::badge_label;
use crate::pagination::{PageMarker, Paginator, View};
use crate::search::SearchHit;

const PREVIEW_CHARS: usize = 80;

/// "just now", "5 minutes ago" and so on for the last week, a calendar
/// date after that.
pub fn format_relative(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(date);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        plural(minutes, "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else if days < 7 {
        plural(days, "day")
    } else {
        date.with_timezone(&DISPLAY_OFFSET)
            .format("%Y-%m-%d")
            .to_string()
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

/// First line of `text`, cut to a readable length.
pub fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default().trim();
    if line.chars().count() <= PREVIEW_CHARS {
        return line.to_string();
    }
    let cut: String = line.chars().take(PREVIEW_CHARS).collect();
    format!("{cut}…")
}

/// Length of `text` with whitespace left out.
pub fn char_count(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

fn header(item: &ContentItem, now: DateTime<Utc>) -> String {
    format!(
        "{} {} #{} · {}",
        item.author().symbol(),
        item.kind().label(),
        item.id(),
        format_relative(item.date(), now)
    )
}

/// Two-line summary used in feeds.
pub fn render_item(item: &ContentItem, now: DateTime<Utc>) -> String {
    let mut out = header(item, now);
    let extra = match item {
        ContentItem::ShortPost(_) => String::new(),
        ContentItem::LongPost(post) => format!(" · {} chars", char_count(&post.content)),
        ContentItem::Album(album) => {
            let mut extra = format!(" · {} photos", album.photos.len());
            if let Some(description) = &album.description {
                let _ = write!(extra, " · {} chars", char_count(description));
            }
            extra
        }
    };
    let comments = item.comments().len();
    if comments > 0 {
        let _ = write!(out, "{extra} · {comments} comments");
    } else {
        out.push_str(&extra);
    }
    let _ = write!(out, "\n  {}", preview(item.headline()));
    out
}

/// The full item with its comments. `photo_link` turns a stored filename
/// into something the user can open.
pub fn render_detail(
    item: &ContentItem,
    now: DateTime<Utc>,
    photo_link: impl Fn(&str) -> String,
) -> String {
    let mut out = header(item, now);
    out.push('\n');
    match item {
        ContentItem::ShortPost(post) => {
            let _ = writeln!(out, "\n{}", post.content);
        }
        ContentItem::LongPost(post) => {
            let _ = writeln!(out, "\n{}\n", post.title);
            let _ = writeln!(out, "{}", post.content);
            let _ = writeln!(out, "\n{} chars", char_count(&post.content));
            if post.updated_at > post.date {
                let _ = writeln!(out, "\n(edited {})", format_relative(post.updated_at, now));
            }
        }
        ContentItem::Album(album) => {
            if let Some(description) = &album.description {
                let _ = writeln!(out, "\n{description}");
                let _ = writeln!(out, "\n{} chars", char_count(description));
            }
            out.push('\n');
            for photo in &album.photos {
                let _ = writeln!(out, "  {}", photo_link(&photo.filename));
            }
        }
    }

    let comments = item.comments();
    if !comments.is_empty() {
        let _ = writeln!(out, "\nComments ({})", comments.len());
        for comment in comments {
            let _ = writeln!(
                out,
                "  {} {} · {}",
                comment.author.symbol(),
                comment.content,
                format_relative(comment.date, now)
            );
        }
    }
    out
}

/// The page bar for a view, or `None` when everything fits on one page.
pub fn render_page_bar(paginator: &Paginator, view: View) -> Option<String> {
    let markers = paginator.markers(view);
    if markers.is_empty() {
        return None;
    }

    let mut parts = Vec::with_capacity(markers.len() + 2);
    parts.push(if paginator.has_prev(view) { "‹ prev" } else { "      " }.to_string());
    for marker in markers {
        parts.push(match marker {
            PageMarker::Page {
                number,
                current: true,
            } => format!("[{number}]"),
            PageMarker::Page { number, .. } => number.to_string(),
            PageMarker::Ellipsis => "…".to_string(),
        });
    }
    if paginator.has_next(view) {
        parts.push("next ›".to_string());
    }
    Some(parts.join(" ").trim_start().to_string())
}

pub fn render_hit(hit: &SearchHit, now: DateTime<Utc>) -> String {
    let mut out = format!(
        "{} {} #{} · {}",
        hit.item.author().symbol(),
        hit.label,
        hit.item.id(),
        format_relative(hit.item.date(), now)
    );
    if let Some(title) = &hit.title {
        let _ = write!(out, "\n  {}", title.wrap("[", "]"));
    }
    let snippet = hit.snippet.wrap("[", "]");
    if !snippet.is_empty() {
        let _ = write!(out, "\n  {}", preview(&snippet));
    }
    out
}

pub fn render_badge(unread: usize) -> String {
    match badge_label(unread) {
        Some(label) => format!("({label}) new"),
        None => "no new content".to_string(),
    }
}

/// Account symbols for the authors active on a day, padded to a fixed
/// width. An otherwise empty `today` is shown as a dot.
fn day_marks(activity: DayActivity, is_today: bool) -> String {
    if activity.count == 0 {
        return if is_today { ". " } else { "  " }.to_string();
    }
    Account::ALL
        .into_iter()
        .map(|account| {
            if activity.has(account) {
                account.symbol()
            } else {
                " "
            }
        })
        .collect()
}

/// A month grid starting on Monday. Each day carries a mark for every
/// account that posted on it, followed by the number of items per
/// active day.
pub fn render_month(index: &CalendarIndex, month: YearMonth, today: NaiveDate) -> String {
    let mut out = String::new();
    let Some(first) = NaiveDate::from_ymd_opt(month.year, month.month, 1) else {
        return out;
    };

    let _ = writeln!(out, "{}", first.format("%B %Y"));
    out.push_str("  Mo   Tu   We   Th   Fr   Sa   Su\n");
    let lead = first.weekday().num_days_from_monday() as usize;
    out.push_str(&"     ".repeat(lead));

    let mut column = lead;
    let mut day = first;
    while day.month() == month.month {
        let marks = day_marks(index.activity_on(day), day == today);
        let _ = write!(out, "{:>3}{marks}", day.day());
        column += 1;
        if column == 7 {
            out.truncate(out.trim_end().len());
            out.push('\n');
            column = 0;
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    if column != 0 {
        out.truncate(out.trim_end().len());
        out.push('\n');
    }

    let active = index.active_days_in_month(month.year, month.month);
    if !active.is_empty() {
        out.push('\n');
    }
    for number in active {
        let Some(day) = first.with_day(number) else {
            continue;
        };
        let activity = index.activity_on(day);
        let noun = if activity.count == 1 { "item" } else { "items" };
        let marks = day_marks(activity, false);
        let _ = writeln!(out, "{number:>3} {marks} {} {noun}", activity.count);
    }
    out
}

/// Header line for the calendar: which day of the journal it is.
pub fn render_day_counter(now: DateTime<Utc>) -> String {
    format!("Day {} together", days_together(now))
}

/// Everything posted on one UTC+8 day, oldest first.
pub fn render_day(index: &CalendarIndex, day: NaiveDate, now: DateTime<Utc>) -> String {
    let mut items: Vec<&ContentItem> = index.items_on(day).iter().collect();
    if items.is_empty() {
        return format!("Nothing was posted on {day}.\n");
    }
    items.sort_by_key(|item| item.date());

    let mut out = format!("{day}\n");
    for item in items {
        let _ = writeln!(out, "{}", render_item(item, now));
    }
    out
}

pub fn today() -> NaiveDate {
    display_day(Utc::now())
}
