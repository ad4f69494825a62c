//! Admin form submissions: normalization, defaults and validation before any
//! store access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use super::{
    icon::{normalize_icon_name, ServiceIcon},
    publish::{resolve_published_at, StampRequest, Transition},
    sanitize_html,
    slug::{is_valid_slug, slugify},
};
use crate::db::models::{BlogPost, NewBlogPost, NewService, Service};
use crate::error::{AppError, FieldErrors};

const INVALID_SLUG: &str = "Slug must contain only lowercase letters, numbers, and single hyphens";

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require(errors: &mut FieldErrors, field: &str, value: Option<String>) -> String {
    match non_empty(value) {
        Some(v) => v,
        None => {
            errors
                .entry(field.to_string())
                .or_default()
                .push(format!("{field} is required"));
            String::new()
        }
    }
}

fn finish(errors: FieldErrors) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

fn resolve_slug(errors: &mut FieldErrors, requested: Option<String>, title: &str) -> String {
    match non_empty(requested) {
        Some(slug) if is_valid_slug(&slug) => slug,
        Some(_) => {
            errors.insert("slug".into(), vec![INVALID_SLUG.into()]);
            String::new()
        }
        None => slugify(title),
    }
}

// ============================================================================
// Blog posts
// ============================================================================

/// Request body for POST /api/admin/blog-posts
#[derive(Debug, Default, Deserialize)]
pub struct BlogPostForm {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub published: Option<bool>,
    pub published_at: Option<DateTime<Utc>>,
}

impl BlogPostForm {
    pub fn into_new(self, now: DateTime<Utc>) -> Result<NewBlogPost, AppError> {
        let mut errors = FieldErrors::new();
        let title = require(&mut errors, "title", self.title);
        let content = require(&mut errors, "content", self.content);
        let slug = resolve_slug(&mut errors, self.slug, &title);
        finish(errors)?;

        let published = self.published.unwrap_or(false);
        let stamp = self.published_at.map_or(StampRequest::Keep, StampRequest::Set);

        Ok(NewBlogPost {
            title,
            slug,
            content: sanitize_html(&content),
            excerpt: non_empty(self.excerpt),
            featured_image: non_empty(self.featured_image),
            published,
            published_at: resolve_published_at(published, None, stamp, now),
        })
    }
}

/// Request body for PATCH /api/admin/blog-posts/:id
#[derive(Debug, Default, Deserialize)]
pub struct BlogPostPatch {
    pub title: Option<String>,
    /// Empty string re-derives the slug from the title.
    pub slug: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub excerpt: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub featured_image: Option<Option<String>>,
    pub published: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub published_at: Option<Option<DateTime<Utc>>>,
}

impl BlogPostPatch {
    /// Applies the supplied fields to `post` and returns the publish
    /// transition that took place.
    pub fn apply(self, post: &mut BlogPost, now: DateTime<Utc>) -> Result<Transition, AppError> {
        let mut errors = FieldErrors::new();

        let title = match self.title {
            Some(raw) => Some(require(&mut errors, "title", Some(raw))),
            None => None,
        };
        let content = match self.content {
            Some(raw) => Some(require(&mut errors, "content", Some(raw))),
            None => None,
        };
        let slug = match self.slug {
            Some(raw) => Some(resolve_slug(
                &mut errors,
                Some(raw),
                title.as_deref().unwrap_or(&post.title),
            )),
            None => None,
        };
        finish(errors)?;

        if let Some(title) = title {
            post.title = title;
        }
        if let Some(slug) = slug {
            post.slug = slug;
        }
        if let Some(content) = content {
            post.content = sanitize_html(&content);
        }
        if let Some(excerpt) = self.excerpt {
            post.excerpt = non_empty(excerpt);
        }
        if let Some(image) = self.featured_image {
            post.featured_image = non_empty(image);
        }

        let before = post.published.into();
        if let Some(published) = self.published {
            post.published = published;
        }
        post.published_at = resolve_published_at(
            post.published,
            post.published_at,
            self.published_at.into(),
            now,
        );
        post.updated_at = now;

        Ok(Transition::between(before, post.published.into()))
    }
}

// ============================================================================
// Services
// ============================================================================

/// Request body for POST /api/admin/services
#[derive(Debug, Default, Deserialize)]
pub struct ServiceForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub image: Option<String>,
}

impl ServiceForm {
    pub fn into_new(self) -> Result<NewService, AppError> {
        let mut errors = FieldErrors::new();
        let title = require(&mut errors, "title", self.title);
        let description = require(&mut errors, "description", self.description);
        finish(errors)?;

        Ok(NewService {
            title,
            description: sanitize_html(&description),
            icon: non_empty(self.icon)
                .map(|name| normalize_icon_name(&name))
                .unwrap_or_else(|| ServiceIcon::default().name().to_string()),
            image: non_empty(self.image),
        })
    }
}

/// Request body for PATCH /api/admin/services/:id
#[derive(Debug, Default, Deserialize)]
pub struct ServicePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub image: Option<Option<String>>,
}

impl ServicePatch {
    pub fn apply(self, service: &mut Service, now: DateTime<Utc>) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        let title = self.title.map(|raw| require(&mut errors, "title", Some(raw)));
        let description = self
            .description
            .map(|raw| require(&mut errors, "description", Some(raw)));
        finish(errors)?;

        if let Some(title) = title {
            service.title = title;
        }
        if let Some(description) = description {
            service.description = sanitize_html(&description);
        }
        if let Some(icon) = self.icon {
            service.icon = non_empty(Some(icon))
                .map(|name| normalize_icon_name(&name))
                .unwrap_or_else(|| ServiceIcon::default().name().to_string());
        }
        if let Some(image) = self.image {
            service.image = non_empty(image);
        }
        service.updated_at = now;
        Ok(())
    }
}
