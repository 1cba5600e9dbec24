/*!
`format.rs`

Terminal rendering for `list` and `get`: a boxed title line and
left-aligned tables. Only human output goes through here; `--json` never
does.

`NO_COLOR` and `NO_EMOJI` switch the decorations off, `COLUMNS` sets the
width budget.
*/

/// Column gap in tables.
const GAP: &str = "  ";
/// Columns are never shrunk below this.
const MIN_COLUMN: usize = 4;

#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub use_color: bool,
    pub use_emoji: bool,
    pub term_width: usize,
}

impl StyleOptions {
    pub fn detect() -> Self {
        let term_width = std::env::var("COLUMNS")
            .ok()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|w| *w > 0)
            .map_or(100, |w| w.clamp(40, 240));
        Self {
            use_color: std::env::var_os("NO_COLOR").is_none(),
            use_emoji: std::env::var_os("NO_EMOJI").is_none(),
            term_width,
        }
    }

    /// No color, no emoji, fixed width.
    pub fn plain(term_width: usize) -> Self {
        Self {
            use_color: false,
            use_emoji: false,
            term_width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Secondary,
    Accent,
    Warning,
    Dim,
}

impl Role {
    fn sgr(self) -> &'static str {
        match self {
            Role::Primary => "1;36",
            Role::Secondary => "37",
            Role::Accent => "1;35",
            Role::Warning => "33",
            Role::Dim => "2",
        }
    }
}

pub fn color(role: Role, text: impl AsRef<str>, style: &StyleOptions) -> String {
    let text = text.as_ref();
    if style.use_color {
        format!("\x1b[{}m{text}\x1b[0m", role.sgr())
    } else {
        text.to_string()
    }
}

const GLYPHS: &[(&str, &str)] = &[
    ("list", "📜"),
    ("service", "🛠"),
    ("message", "✉"),
    ("gov", "🏛"),
    ("signer", "✍"),
];

/// Glyph for `tag`, or nothing when emoji are off or the tag is unknown.
pub fn emoji(tag: &str, style: &StyleOptions) -> &'static str {
    if !style.use_emoji {
        return "";
    }
    GLYPHS
        .iter()
        .find(|(t, _)| *t == tag)
        .map_or("", |(_, g)| *g)
}

/// `title  subtitle` in a light box, cut to the terminal width.
pub fn box_header(
    title: impl AsRef<str>,
    subtitle: Option<impl AsRef<str>>,
    style: &StyleOptions,
) -> String {
    let mut inner = color(Role::Primary, title.as_ref(), style);
    if let Some(sub) = subtitle {
        inner.push_str(GAP);
        inner.push_str(&color(Role::Secondary, sub.as_ref(), style));
    }
    let room = style.term_width.saturating_sub(4).max(MIN_COLUMN);
    if visible_width(&inner) > room {
        inner = fit(&inner, room);
    }
    let width = visible_width(&inner);
    let rule = "─".repeat(width + 2);
    format!("┌{rule}┐\n│ {inner} │\n└{rule}┘")
}

/// Render `rows` under `headers`. Cells past the header count are ignored;
/// missing cells are blank. The widest column gives way first when the table
/// does not fit the terminal.
pub fn table(headers: &[&str], rows: &[Vec<String>], style: &StyleOptions) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let widths = column_widths(headers, rows, style.term_width);

    let mut lines = Vec::with_capacity(rows.len() + 2);
    let head: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    lines.push(color(Role::Accent, render_row(&head, &widths), style));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    lines.push(color(Role::Dim, rule.join(GAP), style));
    for row in rows {
        lines.push(render_row(row, &widths));
    }
    lines.join("\n")
}

fn column_widths(headers: &[&str], rows: &[Vec<String>], limit: usize) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| visible_width(h)).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(visible_width(cell));
        }
    }
    let gaps = GAP.len() * (widths.len() - 1);
    while widths.iter().sum::<usize>() + gaps > limit {
        let Some(widest) = widths
            .iter_mut()
            .filter(|w| **w > MIN_COLUMN)
            .max_by_key(|w| **w)
        else {
            break;
        };
        *widest -= 1;
    }
    widths
}

fn render_row(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let cell = cells.get(i).map_or("", String::as_str);
            let cell = if visible_width(cell) > *w { fit(cell, *w) } else { cell.to_string() };
            let pad = w - visible_width(&cell);
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    padded.join(GAP).trim_end().to_string()
}

/// Cut `s` to `width` visible characters, ending in an ellipsis. Styling is
/// dropped.
fn fit(s: &str, width: usize) -> String {
    let mut out: String = visible(s).chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// `s` without SGR escape sequences.
fn visible(s: &str) -> String {
    let mut parts = s.split('\x1b');
    let mut out = parts.next().unwrap_or_default().to_string();
    for part in parts {
        match part.strip_prefix('[') {
            Some(seq) => {
                let end = seq.find(|c: char| c.is_ascii_alphabetic()).map_or(seq.len(), |i| i + 1);
                out.push_str(&seq[end..]);
            }
            None => out.push_str(part),
        }
    }
    out
}

fn visible_width(s: &str) -> usize {
    if s.contains('\x1b') {
        visible(s).chars().count()
    } else {
        s.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_header_is_aligned() {
        let style = StyleOptions::plain(80);
        let b = box_header("Services (3)", Some("<embedded>"), &style);
        let widths: Vec<usize> = b.lines().map(|l| l.chars().count()).collect();
        assert_eq!(widths.len(), 3);
        assert!(widths.iter().all(|w| *w == widths[0]));
        assert!(b.contains("Services (3)  <embedded>"));
    }

    #[test]
    fn long_header_is_cut() {
        let style = StyleOptions::plain(40);
        let b = box_header("x".repeat(100), None::<&str>, &style);
        assert!(b.lines().all(|l| l.chars().count() <= 40));
        assert!(b.contains('…'));
    }

    #[test]
    fn table_aligns_and_truncates() {
        let style = StyleOptions::plain(24);
        let t = table(
            &["NAME", "TYPE"],
            &[
                vec!["amount".into(), "repeated cosmos.base.v1beta1.Coin".into()],
                vec!["to".into(), "string".into()],
            ],
            &style,
        );
        let lines: Vec<&str> = t.lines().collect();
        assert_eq!(lines[0], "NAME    TYPE");
        assert!(lines[2].ends_with('…'));
        assert!(lines.iter().all(|l| l.chars().count() <= 24));
        assert_eq!(lines[3], "to      string");
    }

    #[test]
    fn short_rows_are_padded() {
        let t = table(&["A", "B"], &[vec!["x".into()]], &StyleOptions::plain(80));
        assert_eq!(t.lines().nth(2), Some("x"));
    }

    #[test]
    fn escapes_do_not_count_toward_width() {
        let style = StyleOptions {
            use_color: true,
            use_emoji: false,
            term_width: 80,
        };
        let colored = color(Role::Warning, "ok", &style);
        assert_eq!(visible(&colored), "ok");
        assert_eq!(visible_width(&colored), 2);
        assert_eq!(emoji("gov", &style), "");
    }
}
