//! Markdown assembly for the structural review summary.

use similar::TextDiff;

use crate::github::ChangedFile;
use crate::patch;

const SUMMARY_HEADER: &str = "## Automated PR review\n\n";
const REVIEW_PROMPT: &str =
    "Please review the changes above for correctness, clarity, and potential issues.";

/// Builds the markdown section for one changed file, or `None` when there
/// is nothing to show (empty patch/content or a no-op diff).
///
/// The emitted diff compares the reconstructed pre-change content against
/// the fetched head content, so it reflects the actual change rather than
/// echoing the file back.
pub fn build_file_section(filename: &str, patch_text: &str, head_content: &str) -> Option<String> {
    if patch_text.is_empty() || head_content.is_empty() {
        return None;
    }

    let hunks = patch::parse_patch(patch_text);
    if hunks.is_empty() {
        return None;
    }

    let base = patch::reconstruct_base(head_content, &hunks);
    let diff = TextDiff::from_lines(base.as_str(), head_content)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{filename}"), &format!("b/{filename}"))
        .to_string();
    if diff.is_empty() {
        return None;
    }

    let mut section = format!("### Changes in {filename}\n\n```diff\n{diff}");
    if !section.ends_with('\n') {
        section.push('\n');
    }
    section.push_str("```\n\n");
    section.push_str(REVIEW_PROMPT);
    section.push('\n');
    Some(section)
}

/// One-line note for a file carrying no patch (binary or rename-only).
pub fn build_change_bullet(file: &ChangedFile) -> String {
    match file.status.as_str() {
        "added" => format!("- `{}` was added (no textual diff available)", file.filename),
        "removed" => format!("- `{}` was removed (no textual diff available)", file.filename),
        "renamed" => format!("- `{}` was renamed (no textual diff available)", file.filename),
        _ => format!("- `{}` changed (no textual diff available)", file.filename),
    }
}

/// Bullet for a file whose content could not be fetched at the head commit.
pub fn build_skipped_bullet(filename: &str) -> String {
    format!("- `{filename}` could not be inspected (content fetch failed); skipped")
}

/// Concatenates the fixed summary header, per-file sections in file order,
/// and trailing bullets for files without a section.
pub fn assemble_summary(sections: &[String], bullets: &[String]) -> String {
    let mut body = String::from(SUMMARY_HEADER);
    if sections.is_empty() && bullets.is_empty() {
        body.push_str("No reviewable changes were found in this pull request.\n");
        return body;
    }
    for section in sections {
        body.push_str(section);
        body.push('\n');
    }
    if !bullets.is_empty() {
        body.push_str("### Other changes\n\n");
        for bullet in bullets {
            body.push_str(bullet);
            body.push('\n');
        }
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(filename: &str, status: &str, patch: Option<&str>) -> ChangedFile {
        ChangedFile {
            filename: filename.into(),
            status: status.into(),
            patch: patch.map(String::from),
        }
    }

    #[test]
    fn section_contains_heading_fence_and_prompt() {
        let head = "fn main() {\n    println!(\"new\");\n}\n";
        let patch =
            "@@ -1,3 +1,3 @@\n fn main() {\n-    println!(\"old\");\n+    println!(\"new\");\n }\n";
        let section = build_file_section("src/main.rs", patch, head).unwrap();

        assert!(section.starts_with("### Changes in src/main.rs\n"));
        assert!(section.contains("```diff\n"));
        assert!(section.contains("--- a/src/main.rs"));
        assert!(section.contains("+++ b/src/main.rs"));
        assert!(section.contains("-    println!(\"old\");"));
        assert!(section.contains("+    println!(\"new\");"));
        assert!(section.trim_end().ends_with(REVIEW_PROMPT));
    }

    #[test]
    fn empty_patch_or_content_yields_no_section() {
        assert!(build_file_section("a.rs", "", "content\n").is_none());
        assert!(build_file_section("a.rs", "@@ -1 +1 @@\n-a\n+b\n", "").is_none());
    }

    #[test]
    fn patch_without_hunks_yields_no_section() {
        assert!(build_file_section("a.rs", "Binary files differ", "content\n").is_none());
    }

    #[test]
    fn bullets_reflect_file_status() {
        assert!(build_change_bullet(&changed("logo.png", "added", None)).contains("was added"));
        assert!(build_change_bullet(&changed("old.bin", "removed", None)).contains("was removed"));
        assert!(build_change_bullet(&changed("a.bin", "renamed", None)).contains("was renamed"));
        assert!(build_change_bullet(&changed("x.bin", "modified", None)).contains("changed"));
    }

    #[test]
    fn summary_keeps_section_order_and_appends_bullets() {
        let sections = vec!["### Changes in a.rs\nS1\n".to_string(), "### Changes in b.rs\nS2\n".to_string()];
        let bullets = vec!["- `c.png` was added (no textual diff available)".to_string()];
        let body = assemble_summary(&sections, &bullets);

        let a = body.find("### Changes in a.rs").unwrap();
        let b = body.find("### Changes in b.rs").unwrap();
        let c = body.find("- `c.png`").unwrap();
        assert!(body.starts_with(SUMMARY_HEADER));
        assert!(a < b && b < c);
        assert!(body.contains("### Other changes"));
    }

    #[test]
    fn empty_summary_still_has_a_body() {
        let body = assemble_summary(&[], &[]);
        assert!(body.contains("No reviewable changes"));
    }
}
