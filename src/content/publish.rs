//! Draft/published lifecycle of blog posts.
//!
//! Two states only. Moving to `Published` stamps `published_at` when the post
//! has never carried one; moving back to `Draft` keeps the stamp, so it reads
//! as "first published at".

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishState {
    Draft,
    Published,
}

impl From<bool> for PublishState {
    fn from(published: bool) -> Self {
        if published {
            PublishState::Published
        } else {
            PublishState::Draft
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Publish,
    Unpublish,
    Unchanged,
}

impl Transition {
    pub fn between(from: PublishState, to: PublishState) -> Self {
        match (from, to) {
            (PublishState::Draft, PublishState::Published) => Transition::Publish,
            (PublishState::Published, PublishState::Draft) => Transition::Unpublish,
            _ => Transition::Unchanged,
        }
    }
}

/// Caller's intent for `published_at` in a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StampRequest {
    /// Field absent from the request.
    #[default]
    Keep,
    /// Explicit `null`.
    Clear,
    Set(DateTime<Utc>),
}

impl From<Option<Option<DateTime<Utc>>>> for StampRequest {
    fn from(value: Option<Option<DateTime<Utc>>>) -> Self {
        match value {
            None => StampRequest::Keep,
            Some(None) => StampRequest::Clear,
            Some(Some(at)) => StampRequest::Set(at),
        }
    }
}

/// Resolves `published_at` after a write. A published post always ends up
/// with a timestamp; a clear request only takes effect on drafts.
pub fn resolve_published_at(
    published: bool,
    current: Option<DateTime<Utc>>,
    request: StampRequest,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match request {
        StampRequest::Set(at) => Some(at),
        StampRequest::Clear if published => Some(now),
        StampRequest::Clear => None,
        StampRequest::Keep if published => current.or(Some(now)),
        StampRequest::Keep => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_transition_between_states() {
        assert_eq!(
            Transition::between(false.into(), true.into()),
            Transition::Publish
        );
        assert_eq!(
            Transition::between(true.into(), false.into()),
            Transition::Unpublish
        );
        assert_eq!(
            Transition::between(true.into(), true.into()),
            Transition::Unchanged
        );
    }

    #[test]
    fn test_publishing_stamps_now_when_absent() {
        let now = Utc::now();
        assert_eq!(
            resolve_published_at(true, None, StampRequest::Keep, now),
            Some(now)
        );
    }

    #[test]
    fn test_explicit_timestamp_wins() {
        let now = Utc::now();
        let earlier = now - Duration::days(3);
        assert_eq!(
            resolve_published_at(true, None, StampRequest::Set(earlier), now),
            Some(earlier)
        );
    }

    #[test]
    fn test_unpublish_retains_stamp_and_republish_keeps_it() {
        let now = Utc::now();
        let first = now - Duration::days(30);
        let after_unpublish = resolve_published_at(false, Some(first), StampRequest::Keep, now);
        assert_eq!(after_unpublish, Some(first));
        let after_republish = resolve_published_at(true, after_unpublish, StampRequest::Keep, now);
        assert_eq!(after_republish, Some(first));
    }

    #[test]
    fn test_clear_on_published_post_is_restamped() {
        let now = Utc::now();
        assert_eq!(
            resolve_published_at(true, Some(now - Duration::hours(1)), StampRequest::Clear, now),
            Some(now)
        );
        assert_eq!(
            resolve_published_at(false, Some(now), StampRequest::Clear, now),
            None
        );
    }

    #[test]
    fn test_draft_without_stamp_stays_null() {
        assert_eq!(
            resolve_published_at(false, None, StampRequest::Keep, Utc::now()),
            None
        );
    }
}
