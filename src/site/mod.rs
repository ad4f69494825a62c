/**
 * Site Module
 * Public page rendering, languages and the render cache
 */
pub mod cache;
pub mod i18n;
pub mod render;

pub use cache::{PageCache, RevalidateError};
pub use i18n::Lang;
pub use render::SiteMeta;
