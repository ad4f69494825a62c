use regex::Regex;
use uuid::Uuid;

lazy_static::lazy_static! {
    /// Lowercase letters (Arabic letters count: they have no case), digits, single hyphens.
    static ref SLUG_REGEX: Regex =
        Regex::new(r"^[\p{Ll}\p{Lo}\p{Nd}]+(?:-[\p{Ll}\p{Lo}\p{Nd}]+)*$").unwrap();

    static ref NON_SLUG_RUN: Regex = Regex::new(r"[^\p{Ll}\p{Lo}\p{Nd}]+").unwrap();
}

// limits count chars, not bytes
const MAX_SLUG_CHARS: usize = 200;
const DERIVED_SLUG_CHARS: usize = 120;

pub fn is_valid_slug(slug: &str) -> bool {
    slug.chars().count() <= MAX_SLUG_CHARS && SLUG_REGEX.is_match(slug)
}

/// Derives a slug from a title. Titles with no usable characters get a
/// random `post-xxxxxxxx` slug.
pub fn slugify(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let slug = NON_SLUG_RUN.replace_all(&lowered, "-");
    let slug: String = slug.trim_matches('-').chars().take(DERIVED_SLUG_CHARS).collect();
    let slug = slug.trim_end_matches('-').to_string();

    if slug.is_empty() {
        let id = Uuid::new_v4().simple().to_string();
        format!("post-{}", &id[..8])
    } else {
        slug
    }
}
