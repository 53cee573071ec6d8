//! Bot reply formatting.
//!
//! Turns the light markdown that automation flows tend to emit (`**bold**`,
//! `*italic*`, `* ` bullet lines, newlines) into HTML markup. This is not a
//! markdown parser: unterminated markers are left as-is or paired
//! best-effort, and nothing else in the text is escaped, so the output is
//! only as trustworthy as the upstream that produced the text.

use regex::Regex;
use std::sync::LazyLock;

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern is valid"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("italic pattern is valid"));
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\*\s+(.+)$").expect("bullet pattern is valid"));
static LIST_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<li>.*?</li>(?:(?:<br>)?<li>.*?</li>)*").expect("list run pattern is valid")
});
static ADJACENT_LISTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</ul>\s*<ul>").expect("adjacent list pattern is valid"));

/// Formats raw bot text into HTML markup.
///
/// Passes run in a fixed order. Bold goes first so the italic pass never
/// splits a `**` span, and bullets are matched only after both, on lines that
/// still start with `* `. Each run of consecutive items gets its own `<ul>`;
/// the break after a run's last item stays outside the list.
pub fn format_message(text: &str) -> String {
    let formatted = BOLD.replace_all(text, "<strong>${1}</strong>");
    let formatted = ITALIC.replace_all(&formatted, "<em>${1}</em>");
    let formatted = BULLET.replace_all(&formatted, "<li>${1}</li>");
    let mut formatted = formatted.replace('\n', "<br>");

    if formatted.contains("<li>") {
        formatted = LIST_RUN.replace_all(&formatted, "<ul>${0}</ul>").into_owned();
        formatted = ADJACENT_LISTS.replace_all(&formatted, "").into_owned();
    }

    formatted
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Admissions open in June.")]
    #[case("Fees are 1,20,000 INR per year (approx).")]
    #[case("")]
    #[case("a < b and c > d")]
    fn test_plain_prose_is_unchanged(#[case] text: &str) {
        assert_eq!(format_message(text), text);
    }

    #[test]
    fn test_bold_and_italic() {
        let out = format_message("**bold** and *italic*");
        assert_eq!(out, "<strong>bold</strong> and <em>italic</em>");
    }

    #[test]
    fn test_bold_is_not_split_by_italic_pass() {
        let out = format_message("Deadline: **31 July** *tentative*");
        assert!(out.contains("<strong>31 July</strong>"));
        assert!(out.contains("<em>tentative</em>"));
        assert!(!out.contains("<em></em>"));
    }

    #[test]
    fn test_consecutive_bullets_share_one_list() {
        let out = format_message("* a\n* b");
        assert_eq!(out.matches("<ul>").count(), 1);
        assert_eq!(out.matches("</ul>").count(), 1);
        assert_eq!(out.matches("<li>").count(), 2);
        assert_eq!(out, "<ul><li>a</li><br><li>b</li></ul>");
    }

    #[test]
    fn test_list_after_intro_line() {
        let out = format_message("Branches:\n* CSE\n* ECE\n* Mechanical");
        assert!(out.starts_with("Branches:<br><ul><li>CSE</li>"));
        assert!(out.ends_with("<li>Mechanical</li></ul>"));
        assert_eq!(out.matches("<ul>").count(), 1);
    }

    #[test]
    fn test_prose_between_bullet_runs_stays_outside_lists() {
        let out = format_message("Intro\n* a\n* b\nOutro paragraph\n* c");
        assert_eq!(
            out,
            "Intro<br><ul><li>a</li><br><li>b</li></ul><br>Outro paragraph<br><ul><li>c</li></ul>"
        );
    }

    #[test]
    fn test_blank_line_splits_bullet_runs() {
        let out = format_message("* a\n\n* b");
        assert_eq!(out, "<ul><li>a</li></ul><br><br><ul><li>b</li></ul>");
    }

    #[test]
    fn test_newlines_become_breaks() {
        assert_eq!(format_message("line one\nline two"), "line one<br>line two");
    }

    #[test]
    fn test_bold_inside_bullet() {
        let out = format_message("* **CSE**: 120 seats");
        assert_eq!(out, "<ul><li><strong>CSE</strong>: 120 seats</li></ul>");
    }

    #[test]
    fn test_unterminated_markers_are_best_effort() {
        assert_eq!(format_message("5 * 3 = 15"), "5 * 3 = 15");
        assert_eq!(format_message("*open"), "*open");
        assert_eq!(format_message("**open"), "<em></em>open");
    }

    #[test]
    fn test_markup_is_not_escaped() {
        let out = format_message("<b>raw</b> **x**");
        assert_eq!(out, "<b>raw</b> <strong>x</strong>");
    }
}
