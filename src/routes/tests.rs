//! Router tests against the in-memory store.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::test_support::{
    multipart_body, public, TestApp, ADMIN_EMAIL, ADMIN_PASSWORD, BOUNDARY, PNG_BYTES,
};

fn timestamp(value: &Value) -> DateTime<Utc> {
    value.as_str().unwrap().parse().unwrap()
}

async fn create_post(app: &TestApp, body: Value) -> Value {
    let (status, post) = app
        .json(app.admin(Method::POST, "/api/admin/blog-posts", Some(body)))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{post}");
    post
}

async fn submit_contact(app: &TestApp, subject: &str) {
    let (status, _) = app
        .json(public(
            Method::POST,
            "/api/contact",
            Some(json!({
                "name": "Sara Ahmed",
                "email": "sara@example.com",
                "subject": subject,
                "message": "Please schedule an external penetration test."
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
}

fn upload_request(app: &TestApp, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/upload")
        .header(header::COOKIE, app.session_cookie())
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn files_under(dir: &std::path::Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|e| {
            let path = e.path();
            if path.is_dir() {
                files_under(&path)
            } else {
                1
            }
        })
        .sum()
}

#[tokio::test]
async fn test_admin_routes_require_session() {
    // the failing store proves the handler never reached storage
    let app = TestApp::failing();
    for (method, uri) in [
        (Method::GET, "/api/admin/blog-posts"),
        (Method::GET, "/api/admin/services"),
        (Method::GET, "/api/admin/messages"),
        (Method::POST, "/api/revalidate?path=/blog"),
    ] {
        let (status, body) = app.json(public(method, uri, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"], "Authentication required");
    }
}

#[tokio::test]
async fn test_bearer_token_is_accepted() {
    let app = TestApp::new();
    let token = app
        .session_cookie()
        .split_once('=')
        .map(|(_, t)| t.to_string())
        .unwrap();
    let request = Request::builder()
        .uri("/api/auth/session")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.json(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], ADMIN_EMAIL);
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = TestApp::new();
    let request = public(
        Method::POST,
        "/api/auth/login",
        Some(json!({ "email": "Admin@Example.com", "password": ADMIN_PASSWORD })),
    );
    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let app = TestApp::new();
    let (status, body) = app
        .json(public(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": ADMIN_EMAIL, "password": "guess" })),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("accessToken").is_none());
}

#[tokio::test]
async fn test_publishing_draft_stamps_published_at() {
    let app = TestApp::new();
    let draft = create_post(
        &app,
        json!({ "title": "Threat Modeling Basics", "content": "<p>Start with assets.</p>" }),
    )
    .await;
    assert_eq!(draft["published"], false);
    assert!(draft["published_at"].is_null());
    assert_eq!(draft["slug"], "threat-modeling-basics");

    let id = draft["id"].as_str().unwrap();
    let (status, published) = app
        .json(app.admin(
            Method::PATCH,
            &format!("/api/admin/blog-posts/{id}"),
            Some(json!({ "published": true })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(published["published"], true);
    assert!(timestamp(&published["published_at"]) >= timestamp(&published["created_at"]));
    assert_eq!(published["title"], "Threat Modeling Basics");
}

#[tokio::test]
async fn test_toggle_publish_flips_state() {
    let app = TestApp::new();
    let post = create_post(
        &app,
        json!({ "title": "Zero Trust", "content": "Never trust, verify.", "published": true }),
    )
    .await;
    let id = post["id"].as_str().unwrap();

    let (status, toggled) = app
        .json(app.admin(
            Method::POST,
            &format!("/api/admin/blog-posts/{id}/toggle-publish"),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["published"], false);
}

#[tokio::test]
async fn test_duplicate_slug_conflicts() {
    let app = TestApp::new();
    let body = json!({ "title": "SOC Playbooks", "content": "Runbooks for analysts." });
    create_post(&app, body.clone()).await;
    let (status, _) = app
        .json(app.admin(Method::POST, "/api/admin/blog-posts", Some(body)))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_post_requires_title_and_content() {
    let app = TestApp::new();
    let (status, body) = app
        .json(app.admin(Method::POST, "/api/admin/blog-posts", Some(json!({}))))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["title"].is_array());
    assert!(body["details"]["content"].is_array());
}

#[tokio::test]
async fn test_delete_post_verifies_removal() {
    let app = TestApp::new();
    let post = create_post(&app, json!({ "title": "Old News", "content": "Outdated." })).await;
    let uri = format!("/api/admin/blog-posts/{}", post["id"].as_str().unwrap());

    let (status, body) = app.json(app.admin(Method::DELETE, &uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = app.json(app.admin(Method::GET, &uri, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.json(app.admin(Method::DELETE, &uri, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_service_image_patch_keeps_other_fields() {
    let app = TestApp::new();
    let (status, service) = app
        .json(app.admin(
            Method::POST,
            "/api/admin/services",
            Some(json!({
                "title": "Penetration Testing",
                "description": "External and internal testing\nDetailed report",
                "icon": "lock"
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(service["icon"], "Lock");

    let uri = format!("/api/admin/services/{}", service["id"].as_str().unwrap());
    let (status, patched) = app
        .json(app.admin(
            Method::PATCH,
            &uri,
            Some(json!({ "image": "/uploads/services/cover.png" })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["image"], "/uploads/services/cover.png");
    assert_eq!(patched["title"], service["title"]);
    assert_eq!(patched["description"], service["description"]);
    assert_eq!(patched["icon"], service["icon"]);
    assert_eq!(patched["created_at"], service["created_at"]);
}

#[tokio::test]
async fn test_service_icon_defaults_to_shield() {
    let app = TestApp::new();
    let (status, service) = app
        .json(app.admin(
            Method::POST,
            "/api/admin/services",
            Some(json!({ "title": "Monitoring", "description": "24/7 SOC" })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(service["icon"], "Shield");
}

#[tokio::test]
async fn test_contact_rejects_short_message() {
    let app = TestApp::new();
    let (status, body) = app
        .json(public(
            Method::POST,
            "/api/contact",
            Some(json!({ "name": "Sara", "email": "sara@example.com", "message": "hi" })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let messages = body["details"]["message"].as_array().unwrap();
    assert!(messages[0].as_str().unwrap().contains("10"));
}

#[tokio::test]
async fn test_contact_store_failure_still_succeeds() {
    let app = TestApp::failing();
    submit_contact(&app, "Audit").await;
    assert_eq!(app.state.ops.snapshot().contact_store_failures, 1);

    let (_, health) = app.json(public(Method::GET, "/health/detailed", None)).await;
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["alerts"]["contactStoreFailures"], 1);
}

#[tokio::test]
async fn test_message_read_filter_partitions_inbox() {
    let app = TestApp::new();
    for subject in ["one", "two", "three"] {
        submit_contact(&app, subject).await;
    }

    let (_, all) = app
        .json(app.admin(Method::GET, "/api/admin/messages", None))
        .await;
    assert_eq!(all["total"], 3);
    let first = all["items"][0]["id"].as_str().unwrap().to_string();

    let (status, updated) = app
        .json(app.admin(
            Method::PATCH,
            &format!("/api/admin/messages?id={first}"),
            Some(json!({ "read": true })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["read"], true);

    let (_, read) = app
        .json(app.admin(Method::GET, "/api/admin/messages?read=true", None))
        .await;
    let (_, unread) = app
        .json(app.admin(Method::GET, "/api/admin/messages?read=false", None))
        .await;
    assert_eq!(read["total"], 1);
    assert_eq!(unread["total"], 2);
    assert_eq!(read["items"][0]["id"], first.as_str());
}

#[tokio::test]
async fn test_reply_emails_then_marks_replied() {
    let app = TestApp::new();
    submit_contact(&app, "Quote").await;
    let (_, inbox) = app
        .json(app.admin(Method::GET, "/api/admin/messages", None))
        .await;
    let id = inbox["items"][0]["id"].as_str().unwrap().to_string();

    let (status, replied) = app
        .json(app.admin(
            Method::POST,
            "/api/admin/messages/reply",
            Some(json!({ "messageId": id, "replyContent": "We will call you tomorrow." })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replied["replied"], true);
    assert_eq!(replied["read"], true);
    assert!(replied["replied_at"].is_string());

    let sent = app.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["sara@example.com".to_string()]);
    assert_eq!(sent[0].subject, "Re: Quote");
}

#[tokio::test]
async fn test_delete_message_requires_id() {
    let app = TestApp::new();
    let (status, body) = app
        .json(app.admin(Method::DELETE, "/api/admin/messages", None))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["id"].is_array());
}

#[tokio::test]
async fn test_newsletter_unconfigured_is_unavailable() {
    let app = TestApp::new();
    let (status, _) = app
        .json(public(
            Method::POST,
            "/api/newsletter",
            Some(json!({ "email": "reader@example.com" })),
        ))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected_before_writing() {
    let app = TestApp::new();
    let mut bytes = PNG_BYTES.to_vec();
    bytes.resize(5 * 1024 * 1024 + 1, 0);
    let body = multipart_body(Some("blog"), "big.png", "image/png", &bytes);

    let (status, body) = app.json(upload_request(&app, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("5MB"));
    assert_eq!(files_under(app.uploads.path()), 0);
}

#[tokio::test]
async fn test_upload_then_serve_image() {
    let app = TestApp::new();
    let body = multipart_body(Some("services"), "logo.png", "image/png", PNG_BYTES);

    let (status, stored) = app.json(upload_request(&app, body)).await;
    assert_eq!(status, StatusCode::CREATED);
    let url = stored["url"].as_str().unwrap();
    assert!(url.starts_with("/uploads/services/"));
    assert!(url.ends_with(".png"));

    let served_path = url.trim_start_matches("/uploads/");
    let (status, bytes) = app
        .send(public(Method::GET, &format!("/api/image/{served_path}"), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&bytes[..], PNG_BYTES);
}

#[tokio::test]
async fn test_upload_rejects_non_image() {
    let app = TestApp::new();
    let body = multipart_body(None, "notes.txt", "text/plain", b"plain text");
    let (status, _) = app.json(upload_request(&app, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(files_under(app.uploads.path()), 0);
}

#[tokio::test]
async fn test_missing_images() {
    let app = TestApp::new();

    let (status, body) = app
        .send(public(Method::GET, "/api/image/blog/missing.png", None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8_lossy(&body).contains("<svg"));

    let (status, _) = app
        .send(public(Method::GET, "/api/blog-image/missing.png", None))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_zero_byte_stored_image_is_server_error() {
    let app = TestApp::new();
    let dir = app.uploads.path().join("blog");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("broken.png"), b"").unwrap();

    let (status, _) = app
        .send(public(Method::GET, "/api/blog-image/broken.png", None))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_pages_render_rtl_and_hide_drafts() {
    let app = TestApp::new();
    create_post(
        &app,
        json!({ "title": "Live Post", "content": "Visible.", "published": true }),
    )
    .await;
    create_post(&app, json!({ "title": "Hidden Draft", "content": "Not yet." })).await;

    let (status, html) = app.send(public(Method::GET, "/blog", None)).await;
    let html = String::from_utf8_lossy(&html).to_string();
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(r#"<html lang="ar" dir="rtl">"#));
    assert!(html.contains("Live Post"));
    assert!(!html.contains("Hidden Draft"));

    let (status, _) = app
        .send(public(Method::GET, "/blog/hidden-draft", None))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, html) = app
        .send(public(Method::GET, "/blog/live-post?lang=en", None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8_lossy(&html).contains(r#"dir="ltr""#));
}

#[tokio::test]
async fn test_admin_write_refreshes_cached_pages() {
    let app = TestApp::new();
    let post = create_post(
        &app,
        json!({ "title": "First Title", "content": "Body.", "published": true }),
    )
    .await;

    let (_, before) = app.send(public(Method::GET, "/blog", None)).await;
    assert!(String::from_utf8_lossy(&before).contains("First Title"));
    assert!(app.state.pages.len().await >= 1);

    let id = post["id"].as_str().unwrap();
    app.json(app.admin(
        Method::PATCH,
        &format!("/api/admin/blog-posts/{id}"),
        Some(json!({ "title": "Second Title" })),
    ))
    .await;

    let (_, after) = app.send(public(Method::GET, "/blog", None)).await;
    let after = String::from_utf8_lossy(&after).to_string();
    assert!(after.contains("Second Title"));
    assert!(!after.contains("First Title"));
}

#[tokio::test]
async fn test_revalidate_endpoint() {
    let app = TestApp::new();
    app.send(public(Method::GET, "/services", None)).await;

    let (status, body) = app
        .json(app.admin(Method::POST, "/api/revalidate?path=/admin/services", None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revalidated"], true);
    assert_eq!(body["dropped"], 1);

    let (status, _) = app
        .json(app.admin(Method::POST, "/api/revalidate?path=blog", None))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.state.ops.snapshot().revalidation_failures, 1);

    let (status, body) = app
        .json(app.admin(Method::POST, "/api/revalidate", None))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["path"].is_array());
}

#[tokio::test]
async fn test_unknown_routes() {
    let app = TestApp::new();
    let (status, body) = app.json(public(Method::GET, "/api/nope", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found");

    let (status, html) = app.send(public(Method::GET, "/nope", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(String::from_utf8_lossy(&html).contains("<html"));
}

#[tokio::test]
async fn test_health_reports_memory_mode() {
    let app = TestApp::new();
    let (status, body) = app.json(public(Method::GET, "/health/detailed", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"]["mode"], "memory");

    let (status, _) = app.json(public(Method::GET, "/health/ready", None)).await;
    assert_eq!(status, StatusCode::OK);

    let failing = TestApp::failing();
    let (status, body) = failing.json(public(Method::GET, "/health/ready", None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["reason"].is_string());
}

#[tokio::test]
async fn test_rss_lists_published_posts() {
    let app = TestApp::new();
    create_post(
        &app,
        json!({ "title": "Feed Entry", "content": "In the feed.", "published": true }),
    )
    .await;
    let (status, body) = app.send(public(Method::GET, "/rss.xml", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8_lossy(&body).contains("Feed Entry"));
}

#[tokio::test]
async fn test_not_found_page_escapes_requested_slug() {
    let app = TestApp::new();
    let (status, html) = app
        .send(public(
            Method::GET,
            "/blog/%22%3E%3Cscript%3Ealert(1)%3C%2Fscript%3E",
            None,
        ))
        .await;
    let html = String::from_utf8_lossy(&html).to_string();
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
}

#[tokio::test]
async fn test_rss_description_has_no_html_entities() {
    let app = TestApp::new();
    create_post(
        &app,
        json!({
            "title": "Zero Trust",
            "content": "<p>Zero&nbsp;Trust basics &amp; more</p>",
            "published": true
        }),
    )
    .await;
    let (_, body) = app.send(public(Method::GET, "/rss.xml", None)).await;
    let xml = String::from_utf8_lossy(&body).to_string();
    assert!(!xml.contains("&nbsp;"));
    assert!(xml.contains("<description>Zero Trust basics &amp; more</description>"));
}

#[tokio::test]
async fn test_long_arabic_slug_survives_resubmission() {
    let app = TestApp::new();
    let post = create_post(
        &app,
        json!({ "title": "أمن ".repeat(40), "content": "محتوى المقال" }),
    )
    .await;
    let slug = post["slug"].as_str().unwrap().to_string();
    assert!(slug.len() > 200);

    let (status, body) = app
        .json(app.admin(
            Method::PATCH,
            &format!("/api/admin/blog-posts/{}", post["id"].as_str().unwrap()),
            Some(json!({ "slug": slug })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["slug"], post["slug"]);
}

#[tokio::test]
async fn test_login_limit_ignores_spoofed_forwarded_for() {
    use axum::extract::ConnectInfo;
    use std::net::SocketAddr;

    let app = TestApp::configured(crate::store::StoreAccess::memory(), |config| {
        config.login_max_attempts = 2;
    });
    let peer: SocketAddr = "203.0.113.9:52000".parse().unwrap();

    let mut statuses = Vec::new();
    for i in 0..4 {
        let mut request = public(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": ADMIN_EMAIL, "password": "wrong" })),
        );
        request
            .headers_mut()
            .insert("x-forwarded-for", format!("10.0.0.{i}").parse().unwrap());
        request.extensions_mut().insert(ConnectInfo(peer));
        let (status, _) = app.json(request).await;
        statuses.push(status);
    }
    assert_eq!(
        statuses,
        vec![
            StatusCode::UNAUTHORIZED,
            StatusCode::UNAUTHORIZED,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
        ]
    );
}
