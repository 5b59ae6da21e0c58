// src/extractors/fallback.rs

// --- Imports ---
use crate::extractors::locate::RawTideRow;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Node};
use tracing::debug;

// --- Regex Patterns (Lazy Static) ---
// A tide phrase in running text: a state word, then a clock time, then a
// height with an explicit unit, all within short reach of each other. The
// unit is mandatory here; in free-running prose a bare number after a time
// is more often a countdown ("in 3 hr 47 min") than a height.
static FALLBACK_EVENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(high|low)(?:\s+(?:tide|water))?\b.{0,40}?\b(\d{1,2}:\d{2})(?:\s*([ap])\.?m\.?)?.{0,40}?(\d+(?:[.,]\d+)?)\s*(meters?|metres?|feet|foot|ft|m)\b",
    )
    .expect("Failed to compile FALLBACK_EVENT_RE")
});

/// Flattens a document to its visible text with whitespace collapsed to
/// single spaces. Script, style and noscript subtrees are excluded so the
/// scan never reads times out of embedded code.
pub fn collapsed_text(document: &Html) -> String {
    let mut pieces: Vec<&str> = Vec::new();
    let mut stack = vec![document.tree.root()];

    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(text) => {
                pieces.push(&*text.text);
                continue;
            }
            Node::Element(element) => {
                let name = element.name();
                if name == "script" || name == "style" || name == "noscript" {
                    continue;
                }
            }
            _ => {}
        }
        // Children pushed in reverse so the pop order is document order.
        let children: Vec<_> = node.children().collect();
        stack.extend(children.into_iter().rev());
    }

    let joined = pieces.join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Scans flattened page text for tide phrases and returns them as raw rows,
/// capped at `cap` matches in document order.
pub fn scan_events(text: &str, cap: usize) -> Vec<RawTideRow> {
    let rows: Vec<RawTideRow> = FALLBACK_EVENT_RE
        .captures_iter(text)
        .take(cap)
        .map(|caps| {
            let time = match caps.get(3) {
                Some(meridiem) => format!("{} {}m", &caps[2], meridiem.as_str().to_lowercase()),
                None => caps[2].to_string(),
            };
            RawTideRow {
                kind: caps[1].to_string(),
                time,
                height: format!("{} {}", &caps[4], &caps[5]),
            }
        })
        .collect();

    debug!("Text scan matched {} tide phrase(s)", rows.len());
    rows
}
