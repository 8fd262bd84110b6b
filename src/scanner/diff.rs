//! Unified diff reader
//!
//! Only the lines a diff adds can introduce a secret, so this walks a patch
//! and yields each added line with its file and new-side line number.

use std::borrow::Cow;

/// A line introduced by a diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedLine<'a> {
    /// Path on the new side; owned only when git had to quote it
    pub filename: Cow<'a, str>,
    pub line_number: usize,
    pub text: &'a str,
}

#[derive(Default)]
struct Hunk {
    old_left: usize,
    new_left: usize,
    next_line: usize,
}

impl Hunk {
    fn is_open(&self) -> bool {
        self.old_left > 0 || self.new_left > 0
    }
}

/// Collect the added lines of a unified diff.
///
/// Hunk headers are trusted for line counts, so hunk content that happens to
/// start with `+++` or `diff --git` is still read as content. Lines of deleted
/// files are never yielded.
pub fn added_lines(diff: &str) -> Vec<AddedLine<'_>> {
    let mut out = Vec::new();
    let mut filename: Option<Cow<'_, str>> = None;
    let mut hunk = Hunk::default();

    for line in diff.lines() {
        if hunk.is_open() {
            match line.as_bytes().first() {
                Some(b'+') => {
                    if let Some(filename) = &filename {
                        out.push(AddedLine {
                            filename: filename.clone(),
                            line_number: hunk.next_line,
                            text: &line[1..],
                        });
                    }
                    hunk.next_line += 1;
                    hunk.new_left = hunk.new_left.saturating_sub(1);
                }
                Some(b'-') => hunk.old_left = hunk.old_left.saturating_sub(1),
                // "\ No newline at end of file"
                Some(b'\\') => {}
                _ => {
                    hunk.next_line += 1;
                    hunk.old_left = hunk.old_left.saturating_sub(1);
                    hunk.new_left = hunk.new_left.saturating_sub(1);
                }
            }
            continue;
        }

        if line.starts_with("diff --git ") {
            filename = None;
        } else if let Some(target) = line.strip_prefix("+++ ") {
            filename = parse_target(target);
        } else if line.starts_with("@@") {
            if let Some(parsed) = parse_hunk_header(line) {
                hunk = parsed;
            }
        }
    }

    out
}

fn parse_target(target: &str) -> Option<Cow<'_, str>> {
    let target = target.split('\t').next().unwrap_or(target).trim_end();
    if target == "/dev/null" {
        return None;
    }

    // Paths with special or non-ASCII bytes come C-quoted: "b/caf\303\251.py"
    match target.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        Some(quoted) => Some(Cow::Owned(unquote_c_style(
            quoted.strip_prefix("b/").unwrap_or(quoted),
        ))),
        None => Some(Cow::Borrowed(target.strip_prefix("b/").unwrap_or(target))),
    }
}

/// Undo git's C-style path quoting; octal escapes are raw bytes
fn unquote_c_style(quoted: &str) -> String {
    let mut bytes = Vec::with_capacity(quoted.len());
    let mut input = quoted.bytes().peekable();

    while let Some(byte) = input.next() {
        if byte != b'\\' {
            bytes.push(byte);
            continue;
        }
        match input.next() {
            Some(digit @ b'0'..=b'7') => {
                let mut value = u32::from(digit - b'0');
                for _ in 0..2 {
                    match input.peek() {
                        Some(&digit @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(digit - b'0');
                            input.next();
                        }
                        _ => break,
                    }
                }
                bytes.push(value as u8);
            }
            Some(b'a') => bytes.push(0x07),
            Some(b'b') => bytes.push(0x08),
            Some(b't') => bytes.push(b'\t'),
            Some(b'n') => bytes.push(b'\n'),
            Some(b'v') => bytes.push(0x0b),
            Some(b'f') => bytes.push(0x0c),
            Some(b'r') => bytes.push(b'\r'),
            Some(other) => bytes.push(other),
            None => bytes.push(b'\\'),
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

/// `@@ -old_start[,old_count] +new_start[,new_count] @@ ...`
fn parse_hunk_header(line: &str) -> Option<Hunk> {
    let mut parts = line.split_whitespace().skip(1);
    let old = parts.next()?.strip_prefix('-')?;
    let new = parts.next()?.strip_prefix('+')?;

    let (_, old_count) = parse_range(old)?;
    let (new_start, new_count) = parse_range(new)?;

    Some(Hunk {
        old_left: old_count,
        new_left: new_count,
        next_line: new_start,
    })
}

fn parse_range(range: &str) -> Option<(usize, usize)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}
