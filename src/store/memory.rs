//! In-process content store used when no database is configured, and by tests.

use std::{cmp::Ordering, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ContentStore, ListQuery, MessageSort, Page, PostSort, ServiceSort, SortKey, SortOrder,
    StoreError,
};
use crate::db::models::{
    BlogPost, ContactMessage, NewBlogPost, NewContactMessage, NewService, Service,
};

#[derive(Default)]
struct Tables {
    posts: Vec<BlogPost>,
    services: Vec<Service>,
    messages: Vec<ContactMessage>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

fn slug_conflict(slug: &str) -> StoreError {
    StoreError::Conflict(format!(
        "duplicate key value violates unique constraint \"blog_posts_slug_key\" (slug={slug})"
    ))
}

/// Mirrors `ORDER BY <column> <dir> NULLS LAST, id` on the Postgres side.
fn paginate<T: Clone, S: SortKey>(
    mut rows: Vec<T>,
    query: &ListQuery<S>,
    compare: impl Fn(&T, &T, SortOrder) -> Ordering,
    id: impl Fn(&T) -> Uuid,
) -> Page<T> {
    rows.sort_by(|a, b| compare(a, b, query.order).then_with(|| id(a).cmp(&id(b))));
    let total = rows.len() as i64;
    let items = rows
        .into_iter()
        .skip(query.offset() as usize)
        .take(query.limit as usize)
        .collect();
    Page::new(items, total, query)
}

fn directed<K: Ord>(a: K, b: K, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => a.cmp(&b),
        SortOrder::Desc => b.cmp(&a),
    }
}

fn nulls_last<K: Ord>(a: Option<K>, b: Option<K>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => directed(a, b, order),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
    }
}

fn compare_posts(sort: PostSort) -> impl Fn(&BlogPost, &BlogPost, SortOrder) -> Ordering {
    move |a, b, order| match sort {
        PostSort::CreatedAt => directed(a.created_at, b.created_at, order),
        PostSort::UpdatedAt => directed(a.updated_at, b.updated_at, order),
        PostSort::PublishedAt => nulls_last(a.published_at, b.published_at, order),
        PostSort::Title => directed(&a.title, &b.title, order),
    }
}

fn compare_services(sort: ServiceSort) -> impl Fn(&Service, &Service, SortOrder) -> Ordering {
    move |a, b, order| match sort {
        ServiceSort::CreatedAt => directed(a.created_at, b.created_at, order),
        ServiceSort::UpdatedAt => directed(a.updated_at, b.updated_at, order),
        ServiceSort::Title => directed(&a.title, &b.title, order),
    }
}

fn compare_messages(
    sort: MessageSort,
) -> impl Fn(&ContactMessage, &ContactMessage, SortOrder) -> Ordering {
    move |a, b, order| match sort {
        MessageSort::CreatedAt => directed(a.created_at, b.created_at, order),
        MessageSort::Name => directed(&a.name, &b.name, order),
        MessageSort::Email => directed(&a.email, &b.email, order),
        MessageSort::Read => directed(a.read, b.read, order),
        MessageSort::Replied => directed(a.replied, b.replied, order),
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn ping(&self) -> Result<Duration, StoreError> {
        let start = std::time::Instant::now();
        let _guard = self.tables.read().await;
        Ok(start.elapsed())
    }

    async fn list_posts(&self, query: &ListQuery<PostSort>) -> Result<Page<BlogPost>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables
            .posts
            .iter()
            .filter(|p| query.filter.map_or(true, |published| p.published == published))
            .cloned()
            .collect();
        Ok(paginate(rows, query, compare_posts(query.sort), |p| p.id))
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<BlogPost>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.slug == slug).cloned())
    }

    async fn insert_post(&self, post: NewBlogPost) -> Result<BlogPost, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.posts.iter().any(|p| p.slug == post.slug) {
            return Err(slug_conflict(&post.slug));
        }
        let now = Utc::now();
        let row = BlogPost {
            id: Uuid::new_v4(),
            title: post.title,
            slug: post.slug,
            content: post.content,
            excerpt: post.excerpt,
            featured_image: post.featured_image,
            published: post.published,
            published_at: post.published_at,
            created_at: now,
            updated_at: now,
        };
        tables.posts.push(row.clone());
        Ok(row)
    }

    async fn save_post(&self, post: &BlogPost) -> Result<BlogPost, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == post.id) {
            return Err(StoreError::NotFound);
        }
        if tables
            .posts
            .iter()
            .any(|p| p.slug == post.slug && p.id != post.id)
        {
            return Err(slug_conflict(&post.slug));
        }
        let row = tables
            .posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or(StoreError::NotFound)?;
        let created_at = row.created_at;
        *row = BlogPost {
            created_at,
            ..post.clone()
        };
        Ok(row.clone())
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        Ok(tables.posts.len() < before)
    }

    async fn list_services(&self, query: &ListQuery<ServiceSort>) -> Result<Page<Service>, StoreError> {
        let tables = self.tables.read().await;
        Ok(paginate(
            tables.services.clone(),
            query,
            compare_services(query.sort),
            |s| s.id,
        ))
    }

    async fn find_service(&self, id: Uuid) -> Result<Option<Service>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.services.iter().find(|s| s.id == id).cloned())
    }

    async fn insert_service(&self, service: NewService) -> Result<Service, StoreError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let row = Service {
            id: Uuid::new_v4(),
            title: service.title,
            description: service.description,
            icon: service.icon,
            image: service.image,
            created_at: now,
            updated_at: now,
        };
        tables.services.push(row.clone());
        Ok(row)
    }

    async fn save_service(&self, service: &Service) -> Result<Service, StoreError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .services
            .iter_mut()
            .find(|s| s.id == service.id)
            .ok_or(StoreError::NotFound)?;
        let created_at = row.created_at;
        *row = Service {
            created_at,
            ..service.clone()
        };
        Ok(row.clone())
    }

    async fn delete_service(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.services.len();
        tables.services.retain(|s| s.id != id);
        Ok(tables.services.len() < before)
    }

    async fn list_messages(
        &self,
        query: &ListQuery<MessageSort>,
    ) -> Result<Page<ContactMessage>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables
            .messages
            .iter()
            .filter(|m| query.filter.map_or(true, |read| m.read == read))
            .cloned()
            .collect();
        Ok(paginate(rows, query, compare_messages(query.sort), |m| m.id))
    }

    async fn find_message(&self, id: Uuid) -> Result<Option<ContactMessage>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn insert_message(&self, message: NewContactMessage) -> Result<ContactMessage, StoreError> {
        let mut tables = self.tables.write().await;
        let row = ContactMessage {
            id: Uuid::new_v4(),
            name: message.name,
            email: message.email,
            phone: message.phone,
            subject: message.subject,
            message: message.message,
            created_at: Utc::now(),
            read: false,
            replied: false,
            reply_content: None,
            replied_at: None,
        };
        tables.messages.push(row.clone());
        Ok(row)
    }

    async fn save_message(&self, message: &ContactMessage) -> Result<ContactMessage, StoreError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .messages
            .iter_mut()
            .find(|m| m.id == message.id)
            .ok_or(StoreError::NotFound)?;
        row.read = message.read;
        row.replied = message.replied;
        row.reply_content = message.reply_content.clone();
        row.replied_at = message.replied_at;
        Ok(row.clone())
    }

    async fn delete_message(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.messages.len();
        tables.messages.retain(|m| m.id != id);
        Ok(tables.messages.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_post(slug: &str, published: bool) -> NewBlogPost {
        NewBlogPost {
            title: format!("Post {slug}"),
            slug: slug.to_string(),
            content: "<p>body</p>".to_string(),
            excerpt: None,
            featured_image: None,
            published,
            published_at: published.then(Utc::now),
        }
    }

    fn new_message(name: &str) -> NewContactMessage {
        NewContactMessage {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            subject: None,
            message: "Please call me back about an audit".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_post_rejects_duplicate_slug() {
        let store = MemoryStore::default();
        store.insert_post(new_post("hello", false)).await.unwrap();
        let err = store.insert_post(new_post("hello", true)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(msg) if msg.contains("slug")));
    }

    #[tokio::test]
    async fn test_save_post_missing_row_is_not_found() {
        let store = MemoryStore::default();
        let mut post = store.insert_post(new_post("a", false)).await.unwrap();
        post.id = Uuid::new_v4();
        assert!(matches!(store.save_post(&post).await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_posts_filters_and_paginates() {
        let store = MemoryStore::default();
        for i in 0..5 {
            store.insert_post(new_post(&format!("p{i}"), i % 2 == 0)).await.unwrap();
        }
        let q = ListQuery::<PostSort>::from_params(Some(true), Some("title"), Some("asc"), Some(1), Some(2));
        let page = store.list_posts(&q).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|p| p.published));
        assert_eq!(page.items[0].slug, "p0");
    }

    #[tokio::test]
    async fn test_read_filters_partition_messages() {
        let store = MemoryStore::default();
        for name in ["Ali", "Huda", "Omar", "Lina"] {
            let mut msg = store.insert_message(new_message(name)).await.unwrap();
            if name.len() == 4 {
                msg.read = true;
                store.save_message(&msg).await.unwrap();
            }
        }
        let all = ListQuery::<MessageSort>::from_params(None, None, None, None, Some(100));
        let read = ListQuery::<MessageSort> { filter: Some(true), ..all.clone() };
        let unread = ListQuery::<MessageSort> { filter: Some(false), ..all.clone() };

        let all = store.list_messages(&all).await.unwrap().items;
        let read = store.list_messages(&read).await.unwrap().items;
        let unread = store.list_messages(&unread).await.unwrap().items;

        assert!(read.iter().all(|m| m.read));
        assert!(unread.iter().all(|m| !m.read));
        let mut union: Vec<Uuid> = read.iter().chain(unread.iter()).map(|m| m.id).collect();
        let mut everything: Vec<Uuid> = all.iter().map(|m| m.id).collect();
        union.sort();
        everything.sort();
        assert_eq!(union, everything);
    }

    #[tokio::test]
    async fn test_delete_reports_absence() {
        let store = MemoryStore::default();
        let svc = store
            .insert_service(NewService {
                title: "SOC".into(),
                description: "24/7 monitoring".into(),
                icon: "Eye".into(),
                image: None,
            })
            .await
            .unwrap();
        assert!(store.delete_service(svc.id).await.unwrap());
        assert!(!store.delete_service(svc.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_published_at_sort_puts_drafts_last_both_ways() {
        let store = MemoryStore::default();
        store.insert_post(new_post("draft", false)).await.unwrap();
        store.insert_post(new_post("first", true)).await.unwrap();
        store.insert_post(new_post("second", true)).await.unwrap();

        for order in ["asc", "desc"] {
            let q = ListQuery::<PostSort>::from_params(None, Some("published_at"), Some(order), None, None);
            let page = store.list_posts(&q).await.unwrap();
            assert_eq!(page.items.last().unwrap().slug, "draft", "{order}");
        }
    }

    #[tokio::test]
    async fn test_save_post_checks_row_before_slug() {
        let store = MemoryStore::default();
        store.insert_post(new_post("taken", false)).await.unwrap();
        let mut ghost = store.insert_post(new_post("ghost", false)).await.unwrap();
        ghost.id = Uuid::new_v4();
        ghost.slug = "taken".to_string();
        assert!(matches!(store.save_post(&ghost).await, Err(StoreError::NotFound)));
    }
}
