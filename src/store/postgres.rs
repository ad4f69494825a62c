//! Postgres-backed content store.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgRow, FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    AccessMode, ContentStore, ListQuery, MessageSort, Page, PostSort, ServiceSort, SortKey,
    StoreError,
};
use crate::db::{
    self,
    models::{BlogPost, ContactMessage, NewBlogPost, NewContactMessage, NewService, Service},
};

const POST_COLUMNS: &str = "id, title, slug, content, excerpt, featured_image, published, \
                            published_at, created_at, updated_at";
const SERVICE_COLUMNS: &str = "id, title, description, icon, image, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, name, email, phone, subject, message, created_at, read, \
                               replied, reply_content, replied_at";

pub struct PgStore {
    pool: PgPool,
    mode: AccessMode,
}

impl PgStore {
    pub fn new(pool: PgPool, mode: AccessMode) -> Self {
        Self { pool, mode }
    }

    fn map_err(&self, err: sqlx::Error) -> StoreError {
        let err = StoreError::from(err);
        if let StoreError::PermissionDenied(msg) = &err {
            tracing::warn!(
                mode = %self.mode,
                error = %msg,
                "store rejected operation; row policies apply to the scoped client"
            );
        }
        err
    }

    async fn page<T, S>(
        &self,
        table: &str,
        columns: &str,
        filter_column: Option<&str>,
        query: &ListQuery<S>,
    ) -> Result<Page<T>, StoreError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
        S: SortKey,
    {
        let filter = filter_column.zip(query.filter);

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {columns} FROM {table}"));
        if let Some((column, value)) = filter {
            select.push(format!(" WHERE {column} = ")).push_bind(value);
        }
        select.push(format!(
            " ORDER BY {} {} NULLS LAST, id",
            query.sort.column(),
            query.order.sql()
        ));
        select
            .push(" LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(query.offset());

        let items = select
            .build_query_as::<T>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| self.map_err(e))?;

        let mut count = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {table}"));
        if let Some((column, value)) = filter {
            count.push(format!(" WHERE {column} = ")).push_bind(value);
        }
        let (total,): (i64,) = count
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| self.map_err(e))?;

        Ok(Page::new(items, total, query))
    }

    async fn delete_by_id(&self, table: &str, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| self.map_err(e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn ping(&self) -> Result<Duration, StoreError> {
        db::health_check(&self.pool).await.map_err(|e| self.map_err(e))
    }

    async fn list_posts(&self, query: &ListQuery<PostSort>) -> Result<Page<BlogPost>, StoreError> {
        self.page("blog_posts", POST_COLUMNS, Some("published"), query).await
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<BlogPost>, StoreError> {
        sqlx::query_as::<_, BlogPost>(&format!("SELECT {POST_COLUMNS} FROM blog_posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| self.map_err(e))
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, StoreError> {
        sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| self.map_err(e))
    }

    async fn insert_post(&self, post: NewBlogPost) -> Result<BlogPost, StoreError> {
        sqlx::query_as::<_, BlogPost>(&format!(
            r#"
            INSERT INTO blog_posts (title, slug, content, excerpt, featured_image, published, published_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, now(), now())
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.featured_image)
        .bind(post.published)
        .bind(post.published_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| self.map_err(e))
    }

    async fn save_post(&self, post: &BlogPost) -> Result<BlogPost, StoreError> {
        sqlx::query_as::<_, BlogPost>(&format!(
            r#"
            UPDATE blog_posts
            SET title = $2, slug = $3, content = $4, excerpt = $5, featured_image = $6,
                published = $7, published_at = $8, updated_at = $9
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.featured_image)
        .bind(post.published)
        .bind(post.published_at)
        .bind(post.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| self.map_err(e))?
        .ok_or(StoreError::NotFound)
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, StoreError> {
        self.delete_by_id("blog_posts", id).await
    }

    async fn list_services(&self, query: &ListQuery<ServiceSort>) -> Result<Page<Service>, StoreError> {
        self.page("services", SERVICE_COLUMNS, None, query).await
    }

    async fn find_service(&self, id: Uuid) -> Result<Option<Service>, StoreError> {
        sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| self.map_err(e))
    }

    async fn insert_service(&self, service: NewService) -> Result<Service, StoreError> {
        sqlx::query_as::<_, Service>(&format!(
            r#"
            INSERT INTO services (title, description, icon, image, created_at, updated_at)
            VALUES ($1, $2, $3, $4, now(), now())
            RETURNING {SERVICE_COLUMNS}
            "#
        ))
        .bind(&service.title)
        .bind(&service.description)
        .bind(&service.icon)
        .bind(&service.image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| self.map_err(e))
    }

    async fn save_service(&self, service: &Service) -> Result<Service, StoreError> {
        sqlx::query_as::<_, Service>(&format!(
            r#"
            UPDATE services
            SET title = $2, description = $3, icon = $4, image = $5, updated_at = $6
            WHERE id = $1
            RETURNING {SERVICE_COLUMNS}
            "#
        ))
        .bind(service.id)
        .bind(&service.title)
        .bind(&service.description)
        .bind(&service.icon)
        .bind(&service.image)
        .bind(service.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| self.map_err(e))?
        .ok_or(StoreError::NotFound)
    }

    async fn delete_service(&self, id: Uuid) -> Result<bool, StoreError> {
        self.delete_by_id("services", id).await
    }

    async fn list_messages(
        &self,
        query: &ListQuery<MessageSort>,
    ) -> Result<Page<ContactMessage>, StoreError> {
        self.page("contact_messages", MESSAGE_COLUMNS, Some("read"), query).await
    }

    async fn find_message(&self, id: Uuid) -> Result<Option<ContactMessage>, StoreError> {
        sqlx::query_as::<_, ContactMessage>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM contact_messages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| self.map_err(e))
    }

    async fn insert_message(&self, message: NewContactMessage) -> Result<ContactMessage, StoreError> {
        sqlx::query_as::<_, ContactMessage>(&format!(
            r#"
            INSERT INTO contact_messages (name, email, phone, subject, message, created_at)
            VALUES ($1, $2, $3, $4, $5, now())
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.phone)
        .bind(&message.subject)
        .bind(&message.message)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| self.map_err(e))
    }

    async fn save_message(&self, message: &ContactMessage) -> Result<ContactMessage, StoreError> {
        sqlx::query_as::<_, ContactMessage>(&format!(
            r#"
            UPDATE contact_messages
            SET read = $2, replied = $3, reply_content = $4, replied_at = $5
            WHERE id = $1
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(message.id)
        .bind(message.read)
        .bind(message.replied)
        .bind(&message.reply_content)
        .bind(message.replied_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| self.map_err(e))?
        .ok_or(StoreError::NotFound)
    }

    async fn delete_message(&self, id: Uuid) -> Result<bool, StoreError> {
        self.delete_by_id("contact_messages", id).await
    }
}
