//! Restricts model output to the Telegram HTML subset recipes may use.
//!
//! `<b>`, `<i>`, `<u>`, `<s>` and already-escaped entities pass through;
//! every other `<`, `>` or `&` is escaped. Tags are balanced: stray closing
//! tags are dropped and anything left open is closed at the end, because
//! Telegram rejects the whole message on malformed markup.

use std::sync::OnceLock;

use regex::Regex;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)<(/?)([bius])>|&(?:amp|lt|gt|quot|#[0-9]+|#x[0-9a-f]+);").unwrap()
    })
}

pub fn sanitize(raw: &str) -> String {
    let raw = raw.trim();
    let mut out = String::with_capacity(raw.len());
    let mut open: Vec<char> = Vec::new();
    let mut last = 0;

    for caps in token_pattern().captures_iter(raw) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        escape_into(&raw[last..whole.start()], &mut out);
        last = whole.end();

        let Some(tag) = caps.get(2).and_then(|m| m.as_str().chars().next()) else {
            // Pre-escaped entity
            out.push_str(whole.as_str());
            continue;
        };
        let tag = tag.to_ascii_lowercase();
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());

        if !closing {
            open.push(tag);
            push_tag(&mut out, tag, false);
        } else if open.last() == Some(&tag) {
            open.pop();
            push_tag(&mut out, tag, true);
        }
    }
    escape_into(&raw[last..], &mut out);

    while let Some(tag) = open.pop() {
        push_tag(&mut out, tag, true);
    }
    out
}

fn push_tag(out: &mut String, tag: char, closing: bool) {
    out.push('<');
    if closing {
        out.push('/');
    }
    out.push(tag);
    out.push('>');
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            c => out.push(c),
        }
    }
}
