/// Characters kept per line in the paginated text rendering.
pub const PAGE_WIDTH: usize = 120;
/// Lines per page before a form-feed break.
pub const PAGE_LINES: usize = 50;

/// Renders Markdown into a plain-text paginated document: every line is
/// hard-truncated to `width` characters and pages of `lines_per_page`
/// lines are separated by form feeds.
pub fn paginate(markdown: &str, width: usize, lines_per_page: usize) -> String {
    let lines_per_page = lines_per_page.max(1);
    let lines: Vec<&str> = markdown.lines().map(|line| head_chars(line, width)).collect();

    lines
        .chunks(lines_per_page)
        .map(|page| page.join("\n"))
        .collect::<Vec<_>>()
        .join("\n\u{0c}\n")
}

fn head_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
