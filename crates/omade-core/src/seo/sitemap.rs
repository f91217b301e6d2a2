//! `sitemap.xml` and `robots.txt` generation.

use chrono::NaiveDate;

use super::meta::{escape_html, SiteConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFreq::Always => "always",
            ChangeFreq::Hourly => "hourly",
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
            ChangeFreq::Yearly => "yearly",
            ChangeFreq::Never => "never",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapUrl {
    pub loc: String,
    pub lastmod: Option<NaiveDate>,
    pub changefreq: Option<ChangeFreq>,
    pub priority: Option<f32>,
}

pub fn generate_sitemap(urls: &[SitemapUrl]) -> String {
    let entries: Vec<String> = urls
        .iter()
        .map(|url| {
            let mut entry = format!("  <url>\n    <loc>{}</loc>", escape_html(&url.loc));
            if let Some(lastmod) = url.lastmod {
                entry.push_str(&format!("\n    <lastmod>{}</lastmod>", lastmod.format("%Y-%m-%d")));
            }
            if let Some(changefreq) = url.changefreq {
                entry.push_str(&format!("\n    <changefreq>{}</changefreq>", changefreq.as_str()));
            }
            if let Some(priority) = url.priority {
                entry.push_str(&format!("\n    <priority>{}</priority>", priority));
            }
            entry.push_str("\n  </url>");
            entry
        })
        .collect();

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}\n</urlset>",
        entries.join("\n")
    )
}

/// Public pages: the landing page and the login page
pub fn static_urls(site: &SiteConfig, today: NaiveDate) -> Vec<SitemapUrl> {
    vec![
        SitemapUrl {
            loc: site.site_url.clone(),
            lastmod: Some(today),
            changefreq: Some(ChangeFreq::Weekly),
            priority: Some(1.0),
        },
        SitemapUrl {
            loc: format!("{}/auth/login", site.site_url),
            lastmod: Some(today),
            changefreq: Some(ChangeFreq::Monthly),
            priority: Some(0.3),
        },
    ]
}

pub fn generate_robots_txt(site: &SiteConfig) -> String {
    format!(
        "User-agent: *
Allow: /

# Main sitemap
Sitemap: {}/sitemap.xml

# Disallow auth pages and admin areas
Disallow: /auth/
Disallow: /dashboard
Disallow: /_authenticated/
Disallow: /_unauthenticated/

# Allow specific pages
Allow: /

# Crawl delay (optional - adjust based on server capacity)
Crawl-delay: 1",
        site.site_url
    )
}
