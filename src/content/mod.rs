/**
 * Content Module
 * Publishing rules shared by the admin API and the public pages
 */
pub mod forms;
pub mod icon;
pub mod publish;
pub mod slug;

/// Sanitize HTML content using ammonia
pub fn sanitize_html(html: &str) -> String {
    ammonia::clean(html)
}

/// Strips every tag and decodes entities. Escape before embedding.
pub fn plain_text(html: &str) -> String {
    let escaped = ammonia::Builder::empty().clean(html).to_string();
    // the serializer escapes text; callers escape again for their own format
    escaped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

/// Plain-text excerpt of at most `max_chars` characters, cut on a word boundary.
pub fn excerpt_of(html: &str, max_chars: usize) -> String {
    let text = plain_text(html);
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() <= max_chars {
        return text;
    }
    let window: String = text.chars().take(max_chars + 1).collect();
    let mut cut = match window.rfind(' ') {
        Some(space) => window[..space].to_string(),
        None => text.chars().take(max_chars).collect(),
    };
    cut.push('…');
    cut
}

/// Service descriptions double as feature lists, one feature per line.
pub fn feature_lines(description: &str) -> Vec<String> {
    plain_text(&description.replace("<br>", "\n").replace("</p>", "\n"))
        .lines()
        .map(|line| line.trim().trim_start_matches(['-', '•', '*']).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
