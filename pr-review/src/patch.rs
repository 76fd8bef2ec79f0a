//! Unified-diff fragment handling for GitHub `patch` fields.
//!
//! The files listing returns per-file unified diff fragments without
//! `---`/`+++` headers, so the parser only requires `@@` hunk headers and
//! tolerates `\ No newline at end of file` markers. Parsed hunks feed
//! [`reconstruct_base`], which reverse-applies them to the fetched head
//! content to recover the pre-change file.

/// One line inside a hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchLine {
    Added(String),
    Removed(String),
    Context(String),
}

/// A contiguous block of changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    pub lines: Vec<PatchLine>,
}

/// Parses a unified diff fragment into hunks.
///
/// Lines before the first `@@` header are ignored; an input without any
/// hunk header yields an empty vec.
pub fn parse_patch(patch: &str) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let mut cur_old_start = 0u32;
    let mut cur_old_lines = 0u32;
    let mut cur_new_start = 0u32;
    let mut cur_new_lines = 0u32;
    let mut lines_buf: Vec<PatchLine> = Vec::new();
    let mut in_hunk = false;

    for line in patch.lines() {
        if line.starts_with("@@") {
            if in_hunk && !lines_buf.is_empty() {
                hunks.push(Hunk {
                    old_start: cur_old_start,
                    old_lines: cur_old_lines,
                    new_start: cur_new_start,
                    new_lines: cur_new_lines,
                    lines: std::mem::take(&mut lines_buf),
                });
            }
            // "@@ -3,4 +3,5 @@ optional section heading"
            let ranges = line
                .trim_start_matches('@')
                .split("@@")
                .next()
                .unwrap_or_default()
                .trim();
            if let Some((left, right)) = ranges.split_once('+') {
                let (o_start, o_len) = split_range(left.trim().trim_start_matches('-'));
                let (n_start, n_len) = split_range(right.trim());
                cur_old_start = o_start;
                cur_old_lines = o_len;
                cur_new_start = n_start;
                cur_new_lines = n_len;
                in_hunk = true;
            }
            continue;
        }

        // "\ No newline at end of file" markers are not diff content.
        if line.starts_with('\\') {
            continue;
        }

        if !in_hunk {
            continue;
        }

        if let Some(rest) = line.strip_prefix('+') {
            lines_buf.push(PatchLine::Added(rest.to_string()));
        } else if let Some(rest) = line.strip_prefix('-') {
            lines_buf.push(PatchLine::Removed(rest.to_string()));
        } else if let Some(rest) = line.strip_prefix(' ') {
            lines_buf.push(PatchLine::Context(rest.to_string()));
        } else {
            // Tolerate lines with a stripped leading space.
            lines_buf.push(PatchLine::Context(line.to_string()));
        }
    }

    if in_hunk && !lines_buf.is_empty() {
        hunks.push(Hunk {
            old_start: cur_old_start,
            old_lines: cur_old_lines,
            new_start: cur_new_start,
            new_lines: cur_new_lines,
            lines: lines_buf,
        });
    }
    hunks
}

/// Splits "12,7" or "12" into (start, len). A missing length means 1.
fn split_range(s: &str) -> (u32, u32) {
    let s = s.trim();
    if let Some((start, len)) = s.split_once(',') {
        (start.parse().unwrap_or(0), len.parse().unwrap_or(0))
    } else {
        (s.parse().unwrap_or(0), 1)
    }
}

/// Reconstructs the pre-change content by reverse-applying `hunks` to the
/// post-change (head) content.
///
/// Added lines are dropped, removed lines are restored, context and
/// untouched regions are copied through. Hunks must be in ascending
/// `new_start` order, which is how GitHub emits them.
pub fn reconstruct_base(head: &str, hunks: &[Hunk]) -> String {
    let new_lines: Vec<&str> = head.lines().collect();
    let mut old_lines: Vec<String> = Vec::with_capacity(new_lines.len());
    let mut cursor = 0usize;

    for hunk in hunks {
        let hunk_start = (hunk.new_start.max(1) as usize) - 1;
        while cursor < hunk_start && cursor < new_lines.len() {
            old_lines.push(new_lines[cursor].to_string());
            cursor += 1;
        }
        for line in &hunk.lines {
            match line {
                PatchLine::Context(text) => {
                    old_lines.push(text.clone());
                    cursor += 1;
                }
                PatchLine::Added(_) => {
                    cursor += 1;
                }
                PatchLine::Removed(text) => {
                    old_lines.push(text.clone());
                }
            }
        }
    }
    while cursor < new_lines.len() {
        old_lines.push(new_lines[cursor].to_string());
        cursor += 1;
    }

    let mut out = old_lines.join("\n");
    if head.ends_with('\n') && !out.is_empty() {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hunk_header_with_lengths() {
        let hunks = parse_patch("@@ -3,4 +3,5 @@ fn context()\n line\n-old\n+new\n+extra\n line2\n");
        assert_eq!(hunks.len(), 1);
        let h = &hunks[0];
        assert_eq!((h.old_start, h.old_lines, h.new_start, h.new_lines), (3, 4, 3, 5));
        assert_eq!(h.lines.len(), 5);
    }

    #[test]
    fn missing_range_length_defaults_to_one() {
        let hunks = parse_patch("@@ -1 +1 @@\n-a\n+b\n");
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].old_lines, 1);
        assert_eq!(hunks[0].new_lines, 1);
    }

    #[test]
    fn ignores_no_newline_markers() {
        let hunks = parse_patch("@@ -1 +1 @@\n-a\n\\ No newline at end of file\n+b\n");
        assert_eq!(hunks[0].lines.len(), 2);
    }

    #[test]
    fn input_without_hunks_is_empty() {
        assert!(parse_patch("not a diff at all").is_empty());
    }

    #[test]
    fn reconstructs_base_for_a_modification() {
        let head = "fn main() {\n    println!(\"new\");\n}\n";
        let patch = "@@ -1,3 +1,3 @@\n fn main() {\n-    println!(\"old\");\n+    println!(\"new\");\n }\n";
        let base = reconstruct_base(head, &parse_patch(patch));
        assert_eq!(base, "fn main() {\n    println!(\"old\");\n}\n");
    }

    #[test]
    fn reconstructs_base_for_pure_addition() {
        let head = "a\nb\nc\n";
        let patch = "@@ -1,2 +1,3 @@\n a\n+b\n c\n";
        let base = reconstruct_base(head, &parse_patch(patch));
        assert_eq!(base, "a\nc\n");
    }

    #[test]
    fn reconstructs_base_for_pure_deletion() {
        let head = "a\nc\n";
        let patch = "@@ -1,3 +1,2 @@\n a\n-b\n c\n";
        let base = reconstruct_base(head, &parse_patch(patch));
        assert_eq!(base, "a\nb\nc\n");
    }

    #[test]
    fn untouched_tail_is_copied_through() {
        let head = "one\ntwo\nthree\nfour\n";
        let patch = "@@ -1,2 +1,2 @@\n one\n-TWO\n+two\n";
        let base = reconstruct_base(head, &parse_patch(patch));
        assert_eq!(base, "one\nTWO\nthree\nfour\n");
    }

    #[test]
    fn new_file_patch_reconstructs_empty_base() {
        let head = "only\nlines\n";
        let patch = "@@ -0,0 +1,2 @@\n+only\n+lines\n";
        let base = reconstruct_base(head, &parse_patch(patch));
        assert_eq!(base, "");
    }
}
