use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use crate::{
    content::excerpt_of,
    error::AppError,
    site::Lang,
    state::SharedState,
    store::{ListQuery, PostSort, SortOrder},
};

const FEED_PATH: &str = "/rss.xml";
const FEED_ITEMS: u32 = 50;

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn rfc822(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S +0000").to_string()
}

fn feed_response(xml: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/rss+xml; charset=utf-8"),
            (
                header::CACHE_CONTROL,
                "public, max-age=3600, stale-while-revalidate=600",
            ),
        ],
        xml,
    )
        .into_response()
}

/// GET /rss.xml
pub async fn rss_feed(State(state): State<SharedState>) -> Result<Response, AppError> {
    if let Some(xml) = state.pages.get(FEED_PATH, Lang::Ar).await {
        return Ok(feed_response(xml));
    }
    let seen = state.pages.generation();

    let query = ListQuery {
        filter: Some(true),
        sort: PostSort::PublishedAt,
        order: SortOrder::Desc,
        page: 1,
        limit: FEED_ITEMS,
    };
    let posts = state.store.store().list_posts(&query).await?.items;

    let base_url = &state.site.url;
    let mut items = String::new();
    for post in &posts {
        let post_url = format!("{}/blog/{}", base_url, post.slug);
        let desc = match &post.excerpt {
            Some(excerpt) => escape_xml(excerpt),
            None => escape_xml(&excerpt_of(&post.content, 300)),
        };
        let published = post.published_at.unwrap_or(post.created_at);
        items.push_str(&format!(
            "    <item>\n\
                   <title>{}</title>\n\
                   <link>{}</link>\n\
                   <description>{}</description>\n\
                   <pubDate>{}</pubDate>\n\
                   <guid isPermaLink=\"true\">{}</guid>\n\
                 </item>\n",
            escape_xml(&post.title),
            escape_xml(&post_url),
            desc,
            rfc822(&published),
            escape_xml(&post_url),
        ));
    }

    let feed_url = format!("{}{}", base_url, FEED_PATH);
    let blog_url = format!("{}/blog", base_url);

    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>{}</title>
    <link>{}</link>
    <description>{}</description>
    <language>ar</language>
    <atom:link href="{}" rel="self" type="application/rss+xml"/>
    <lastBuildDate>{}</lastBuildDate>
{}  </channel>
</rss>"#,
        escape_xml(&state.site.title_ar),
        escape_xml(&blog_url),
        escape_xml(&state.site.title),
        escape_xml(&feed_url),
        posts
            .first()
            .map(|p| rfc822(&p.published_at.unwrap_or(p.updated_at)))
            .unwrap_or_default(),
        items,
    );

    state.pages.insert(FEED_PATH, Lang::Ar, xml.clone(), seen).await;
    Ok(feed_response(xml))
}
