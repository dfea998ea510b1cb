//! Search highlights arrive as HTML fragments such as
//! `use <em>tokio</em>::select!`. The terminal has no markup, so fragments
//! are split into plain and highlighted segments for styling.

const MARK_TAGS: [&str; 4] = ["em", "mark", "b", "strong"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub highlighted: bool,
}

fn push(segments: &mut Vec<Segment>, text: &str, highlighted: bool) {
    if text.is_empty() {
        return;
    }
    let text = decode_entities(text);
    match segments.last_mut() {
        Some(last) if last.highlighted == highlighted => last.text.push_str(&text),
        _ => segments.push(Segment { text, highlighted }),
    }
}

/// Splits a highlight fragment into segments. Marking tags nest; any other
/// tag is dropped and its text kept.
pub fn segments(fragment: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut rest = fragment;

    while let Some(open) = rest.find('<') {
        push(&mut segments, &rest[..open], depth > 0);
        let after = &rest[open..];
        let Some(close) = after.find('>') else {
            // Unterminated tag: keep it as text.
            push(&mut segments, after, depth > 0);
            return segments;
        };
        let tag = after[1..close].trim();
        let (closing, name) = match tag.strip_prefix('/') {
            Some(name) => (true, name),
            None => (false, tag),
        };
        let name = name
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        if MARK_TAGS.contains(&name.as_str()) {
            if closing {
                depth = depth.saturating_sub(1);
            } else {
                depth += 1;
            }
        }
        rest = &after[close + 1..];
    }
    push(&mut segments, rest, depth > 0);
    segments
}

/// Plain text of a fragment with all markup removed.
pub fn plain_text(fragment: &str) -> String {
    segments(fragment).into_iter().map(|s| s.text).collect()
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];
        let decoded = after.find(';').and_then(|end| {
            let entity = &after[1..end];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => numeric_entity(entity),
            }?;
            Some((c, end + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &after[len..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn numeric_entity(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    char::from_u32(code)
}
