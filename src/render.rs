use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::Datelike;
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::event::Event;
use crate::temporal::{extract_dates, MONTHS};

/// Placeholder replaced by the rendered cards.
pub const PLACEHOLDER: &str = "{{EVENTOS_HTML}}";

/// Heading for events without an explicit date.
pub const UNDATED_GROUP: &str = "Outros";

/// Page used when no template file is configured.
pub const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Agenda Cultural de Porto Velho</title>
</head>
<body>
<main>
<h1>Agenda Cultural de Porto Velho</h1>
{{EVENTOS_HTML}}
</main>
</body>
</html>
"#;

/// Month buckets, newest first; `None` is the undated bucket and sorts last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey(std::cmp::Reverse<Option<(i32, u32)>>);

fn group_key(event: &Event) -> GroupKey {
    let month = extract_dates(&event.displayed_date)
        .first()
        .map(|d| (d.year(), d.month()));
    GroupKey(std::cmp::Reverse(month))
}

fn group_title(key: GroupKey) -> String {
    match key.0 .0 {
        Some((year, month)) => {
            let name = MONTHS[month as usize - 1];
            let mut chars = name.chars();
            let capitalized: String = chars
                .next()
                .map(|c| c.to_uppercase().chain(chars).collect())
                .unwrap_or_default();
            format!("{capitalized} {year}")
        }
        None => UNDATED_GROUP.to_string(),
    }
}

fn render_card(out: &mut String, event: &Event) {
    let _ = writeln!(out, "<article class=\"evento-card\">");
    if !event.banner_image_url.is_empty() {
        let _ = writeln!(
            out,
            "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
            encode_double_quoted_attribute(&event.banner_image_url),
            encode_double_quoted_attribute(&event.title),
        );
    }
    let _ = writeln!(out, "<h3>{}</h3>", encode_text(&event.title));
    if !event.tag.is_empty() {
        let _ = writeln!(out, "<span class=\"tag\">{}</span>", encode_text(&event.tag));
    }
    let _ = writeln!(
        out,
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">Ver detalhes</a>",
        encode_double_quoted_attribute(&event.link),
    );
    let _ = writeln!(out, "</article>");
}

/// Event cards grouped under month headings, newest month first.
///
/// The month comes from the first explicit date in the displayed date.
/// Undated events go under "Outros" at the end. Order within a group is
/// the collection order.
pub fn render_cards(events: &[Event]) -> String {
    let mut groups: BTreeMap<GroupKey, Vec<&Event>> = BTreeMap::new();
    for event in events {
        groups.entry(group_key(event)).or_default().push(event);
    }

    let mut out = String::new();
    for (key, members) in groups {
        let _ = writeln!(out, "<section class=\"mes\">");
        let _ = writeln!(out, "<h2>{}</h2>", encode_text(&group_title(key)));
        for event in members {
            render_card(&mut out, event);
        }
        let _ = writeln!(out, "</section>");
    }
    out
}

/// Fill `template` (or [`DEFAULT_TEMPLATE`]) with the rendered cards.
pub fn render_page(template: Option<&str>, events: &[Event]) -> String {
    let template = template.unwrap_or(DEFAULT_TEMPLATE);
    if !template.contains(PLACEHOLDER) {
        tracing::warn!("template has no {PLACEHOLDER} placeholder, cards not inserted");
    }
    template.replace(PLACEHOLDER, &render_cards(events))
}
