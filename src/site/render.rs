//! Server-rendered public pages.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use super::i18n::Lang;
use crate::content::{excerpt_of, feature_lines, icon::ServiceIcon};
use crate::db::models::{BlogPost, Service};

const EXCERPT_CHARS: usize = 180;

/// Site identity shown in the layout.
#[derive(Debug, Clone)]
pub struct SiteMeta {
    pub title: String,
    pub title_ar: String,
    pub url: String,
}

impl SiteMeta {
    pub fn title(&self, lang: Lang) -> &str {
        match lang {
            Lang::Ar => &self.title_ar,
            Lang::En => &self.title,
        }
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn date(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

fn layout(lang: Lang, site: &SiteMeta, path: &str, page_title: Option<&str>, main: &str) -> String {
    let s = lang.strings();
    let site_title = escape_html(site.title(lang));
    let title = match page_title {
        Some(t) => format!("{} | {}", escape_html(t), site_title),
        None => site_title.clone(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="{code}" dir="{dir}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="alternate" type="application/rss+xml" href="/rss.xml">
</head>
<body>
<header>
<a class="brand" href="{home}">{site_title}</a>
<nav>
<a href="{home}">{nav_home}</a>
<a href="{blog}">{nav_blog}</a>
<a href="{services}">{nav_services}</a>
<a href="{switch}" hreflang="{other}">{switch_label}</a>
</nav>
</header>
<main>
{main}
</main>
<footer>&copy; {site_title}. {rights}.</footer>
</body>
</html>
"#,
        code = lang.code(),
        dir = lang.dir(),
        home = lang.href("/"),
        blog = lang.href("/blog"),
        services = lang.href("/services"),
        switch = escape_html(&lang.other().href(path)),
        other = lang.other().code(),
        nav_home = s.nav_home,
        nav_blog = s.nav_blog,
        nav_services = s.nav_services,
        switch_label = s.switch_lang,
        rights = s.rights,
    )
}

fn post_card(lang: Lang, post: &BlogPost) -> String {
    let s = lang.strings();
    let href = lang.href(&format!("/blog/{}", post.slug));
    let summary = match &post.excerpt {
        Some(excerpt) => escape_html(excerpt),
        None => escape_html(&excerpt_of(&post.content, EXCERPT_CHARS)),
    };

    let mut card = String::from("<article class=\"post-card\">");
    if let Some(image) = &post.featured_image {
        let _ = write!(
            card,
            "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
            escape_html(image),
            escape_html(&post.title)
        );
    }
    let _ = write!(
        card,
        "<h3><a href=\"{href}\">{title}</a></h3>",
        title = escape_html(&post.title)
    );
    if let Some(at) = &post.published_at {
        let _ = write!(card, "<time datetime=\"{}\">{}</time>", at.to_rfc3339(), date(at));
    }
    let _ = write!(
        card,
        "<p>{summary}</p><a class=\"more\" href=\"{href}\">{}</a></article>",
        s.read_more
    );
    card
}

fn service_card(service: &Service) -> String {
    let icon = ServiceIcon::resolve(&service.icon);
    let mut card = format!(
        "<article class=\"service-card\">{}<h3>{}</h3>",
        icon.svg(),
        escape_html(&service.title)
    );
    if let Some(image) = &service.image {
        let _ = write!(
            card,
            "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
            escape_html(image),
            escape_html(&service.title)
        );
    }
    let features = feature_lines(&service.description);
    if !features.is_empty() {
        card.push_str("<ul>");
        for feature in features {
            let _ = write!(card, "<li>{}</li>", escape_html(&feature));
        }
        card.push_str("</ul>");
    }
    card.push_str("</article>");
    card
}

pub fn home(lang: Lang, site: &SiteMeta, posts: &[BlogPost], services: &[Service]) -> String {
    let s = lang.strings();
    let mut main = format!(
        "<section class=\"hero\"><h1>{}</h1><p>{}</p></section>",
        s.hero_title, s.hero_body
    );

    let _ = write!(main, "<section><h2>{}</h2>", s.our_services);
    if services.is_empty() {
        let _ = write!(main, "<p class=\"empty\">{}</p>", s.no_services);
    }
    for service in services {
        main.push_str(&service_card(service));
    }
    main.push_str("</section>");

    let _ = write!(main, "<section><h2>{}</h2>", s.latest_posts);
    if posts.is_empty() {
        let _ = write!(main, "<p class=\"empty\">{}</p>", s.no_posts);
    }
    for post in posts {
        main.push_str(&post_card(lang, post));
    }
    main.push_str("</section>");

    layout(lang, site, "/", None, &main)
}

pub fn blog_index(lang: Lang, site: &SiteMeta, posts: &[BlogPost]) -> String {
    let s = lang.strings();
    let mut main = format!("<h1>{}</h1>", s.nav_blog);
    if posts.is_empty() {
        let _ = write!(main, "<p class=\"empty\">{}</p>", s.no_posts);
    }
    for post in posts {
        main.push_str(&post_card(lang, post));
    }
    layout(lang, site, "/blog", Some(s.nav_blog), &main)
}

pub fn blog_post(lang: Lang, site: &SiteMeta, post: &BlogPost) -> String {
    let s = lang.strings();
    let mut main = format!(
        "<article class=\"post\" dir=\"auto\"><h1>{}</h1>",
        escape_html(&post.title)
    );
    if let Some(at) = &post.published_at {
        let _ = write!(
            main,
            "<p class=\"meta\">{} <time datetime=\"{}\">{}</time></p>",
            s.published_on,
            at.to_rfc3339(),
            date(at)
        );
    }
    if let Some(image) = &post.featured_image {
        let _ = write!(
            main,
            "<img class=\"featured\" src=\"{}\" alt=\"{}\">",
            escape_html(image),
            escape_html(&post.title)
        );
    }
    // content is sanitized when written
    let _ = write!(
        main,
        "<div class=\"content\">{}</div></article><a href=\"{}\">{}</a>",
        post.content,
        lang.href("/blog"),
        s.back_to_blog
    );
    layout(
        lang,
        site,
        &format!("/blog/{}", post.slug),
        Some(&post.title),
        &main,
    )
}

pub fn services(lang: Lang, site: &SiteMeta, services: &[Service]) -> String {
    let s = lang.strings();
    let mut main = format!("<h1>{}</h1>", s.our_services);
    if services.is_empty() {
        let _ = write!(main, "<p class=\"empty\">{}</p>", s.no_services);
    }
    for service in services {
        main.push_str(&service_card(service));
    }
    layout(lang, site, "/services", Some(s.our_services), &main)
}

pub fn not_found(lang: Lang, site: &SiteMeta, path: &str) -> String {
    let s = lang.strings();
    let main = format!(
        "<section class=\"not-found\"><h1>404</h1><h2>{}</h2><p>{}</p><a href=\"{}\">{}</a></section>",
        s.not_found_title,
        s.not_found_body,
        lang.href("/"),
        s.nav_home
    );
    layout(lang, site, path, Some(s.not_found_title), &main)
}
