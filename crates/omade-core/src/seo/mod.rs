//! SEO utilities for the public pages.
//!
//! - `meta`: page metadata merge and `<head>` tag rendering
//! - `structured`: schema.org JSON-LD documents
//! - `sitemap`: `sitemap.xml` and `robots.txt`

pub mod meta;
pub mod sitemap;
pub mod structured;

pub use meta::{
    default_seo, generate_seo, meta_tags, render_head, MetaTag, SeoConfig, SeoOverrides,
    SiteConfig, TwitterCard,
};
pub use sitemap::{generate_robots_txt, generate_sitemap, static_urls, ChangeFreq, SitemapUrl};
