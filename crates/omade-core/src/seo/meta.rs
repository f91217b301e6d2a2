use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_SITE_URL;

const THEME_COLOR: &str = "#8B5CF6";
const VIEWPORT: &str = "width=device-width, initial-scale=1.0";

/// Site-wide SEO settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub site_name: String,
    pub site_url: String,
    pub default_image: String,
    pub default_keywords: Vec<String>,
    pub twitter_handle: Option<String>,
    pub locale: String,
    pub default_title: String,
    pub default_description: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: "Omade Cravings".to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
            default_image:
                "https://res.cloudinary.com/appnet/image/upload/v1765399940/loaf_tcnxv5.png"
                    .to_string(),
            default_keywords: [
                "artisan bread",
                "fresh baked goods",
                "bakery",
                "sourdough",
                "pastries",
                "organic ingredients",
                "handcrafted bread",
                "local bakery",
                "premium baking",
                "artisanal food",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            twitter_handle: Some("@omadecravings".to_string()),
            locale: "en_US".to_string(),
            default_title: "Omade Cravings - Artisanal Breads & Fresh Baked Goods".to_string(),
            default_description: "Experience the finest artisanal breads and fresh baked goods at Omade Cravings. We craft premium sourdough, pastries, and specialty items using organic ingredients and traditional techniques.".to_string(),
        }
    }
}

impl SiteConfig {
    pub fn with_site_url(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = site_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TwitterCard {
    Summary,
    #[default]
    SummaryLargeImage,
}

impl TwitterCard {
    pub fn as_str(&self) -> &'static str {
        match self {
            TwitterCard::Summary => "summary",
            TwitterCard::SummaryLargeImage => "summary_large_image",
        }
    }
}

/// Metadata for one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoConfig {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub og_image: Option<String>,
    pub og_type: Option<String>,
    pub twitter_card: Option<TwitterCard>,
    pub canonical: Option<String>,
    pub no_index: bool,
    pub structured_data: Option<serde_json::Value>,
}

/// Page-level overrides; keywords are appended to the site defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoOverrides {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub og_image: Option<String>,
    pub og_type: Option<String>,
    pub twitter_card: Option<TwitterCard>,
    pub canonical: Option<String>,
    pub no_index: Option<bool>,
    pub structured_data: Option<serde_json::Value>,
}

pub fn default_seo(site: &SiteConfig) -> SeoConfig {
    SeoConfig {
        title: site.default_title.clone(),
        description: site.default_description.clone(),
        keywords: site.default_keywords.clone(),
        og_image: Some(site.default_image.clone()),
        og_type: Some("website".to_string()),
        twitter_card: Some(TwitterCard::SummaryLargeImage),
        canonical: None,
        no_index: false,
        structured_data: None,
    }
}

pub fn generate_seo(site: &SiteConfig, overrides: SeoOverrides) -> SeoConfig {
    let defaults = default_seo(site);
    let mut keywords = defaults.keywords;
    if let Some(extra) = overrides.keywords {
        keywords.extend(extra);
    }
    SeoConfig {
        title: overrides.title.unwrap_or(defaults.title),
        description: overrides.description.unwrap_or(defaults.description),
        keywords,
        og_image: overrides.og_image.or(defaults.og_image),
        og_type: overrides.og_type.or(defaults.og_type),
        twitter_card: overrides.twitter_card.or(defaults.twitter_card),
        canonical: overrides.canonical,
        no_index: overrides.no_index.unwrap_or(defaults.no_index),
        structured_data: overrides.structured_data,
    }
}

/// One element of the document head
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaTag {
    Title(String),
    Name { name: String, content: String },
    Property { property: String, content: String },
    Canonical(String),
    JsonLd(String),
}

impl MetaTag {
    fn name(name: &str, content: impl Into<String>) -> Self {
        MetaTag::Name {
            name: name.to_string(),
            content: content.into(),
        }
    }

    fn property(property: &str, content: impl Into<String>) -> Self {
        MetaTag::Property {
            property: property.to_string(),
            content: content.into(),
        }
    }

    pub fn to_html(&self) -> String {
        match self {
            MetaTag::Title(title) => format!("<title>{}</title>", escape_html(title)),
            MetaTag::Name { name, content } => format!(
                r#"<meta name="{}" content="{}">"#,
                escape_html(name),
                escape_html(content)
            ),
            MetaTag::Property { property, content } => format!(
                r#"<meta property="{}" content="{}">"#,
                escape_html(property),
                escape_html(content)
            ),
            MetaTag::Canonical(href) => {
                format!(r#"<link rel="canonical" href="{}">"#, escape_html(href))
            }
            // `</` would close the script element early
            MetaTag::JsonLd(json) => format!(
                r#"<script type="application/ld+json">{}</script>"#,
                json.replace("</", "<\\/")
            ),
        }
    }
}

/// Head elements for a page, in document order
pub fn meta_tags(seo: &SeoConfig, site: &SiteConfig) -> Vec<MetaTag> {
    let mut tags = vec![
        MetaTag::Title(seo.title.clone()),
        MetaTag::name("description", &seo.description),
    ];
    if !seo.keywords.is_empty() {
        tags.push(MetaTag::name("keywords", seo.keywords.join(", ")));
    }

    tags.push(MetaTag::property("og:site_name", &site.site_name));
    tags.push(MetaTag::property("og:title", &seo.title));
    tags.push(MetaTag::property("og:description", &seo.description));
    tags.push(MetaTag::property(
        "og:type",
        seo.og_type.as_deref().unwrap_or("website"),
    ));
    tags.push(MetaTag::property("og:locale", &site.locale));

    let image_alt = format!("{} - {}", site.site_name, seo.title);
    if let Some(image) = &seo.og_image {
        tags.push(MetaTag::property("og:image", image));
        tags.push(MetaTag::property("og:image:alt", &image_alt));
    }

    if let Some(canonical) = &seo.canonical {
        tags.push(MetaTag::property("og:url", canonical));
        tags.push(MetaTag::Canonical(canonical.clone()));
    }

    tags.push(MetaTag::name(
        "twitter:card",
        seo.twitter_card.unwrap_or_default().as_str(),
    ));
    tags.push(MetaTag::name("twitter:title", &seo.title));
    tags.push(MetaTag::name("twitter:description", &seo.description));
    if let Some(handle) = &site.twitter_handle {
        tags.push(MetaTag::name("twitter:site", handle));
        tags.push(MetaTag::name("twitter:creator", handle));
    }
    if let Some(image) = &seo.og_image {
        tags.push(MetaTag::name("twitter:image", image));
        tags.push(MetaTag::name("twitter:image:alt", &image_alt));
    }

    let robots = if seo.no_index {
        "noindex, nofollow"
    } else {
        "index, follow"
    };
    tags.push(MetaTag::name("robots", robots));
    tags.push(MetaTag::name("author", &site.site_name));
    tags.push(MetaTag::name("viewport", VIEWPORT));
    tags.push(MetaTag::name("theme-color", THEME_COLOR));

    if let Some(data) = &seo.structured_data {
        tags.push(MetaTag::JsonLd(data.to_string()));
    }
    tags
}

/// Render the head elements, one per line
pub fn render_head(seo: &SeoConfig, site: &SiteConfig) -> String {
    meta_tags(seo, site)
        .iter()
        .map(MetaTag::to_html)
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_seo_appends_keywords() {
        let site = SiteConfig::default();
        let seo = generate_seo(
            &site,
            SeoOverrides {
                title: Some("Menu".to_string()),
                keywords: Some(vec!["croissants".to_string()]),
                ..Default::default()
            },
        );
        assert_eq!(seo.title, "Menu");
        assert_eq!(seo.description, site.default_description);
        assert_eq!(seo.keywords.len(), site.default_keywords.len() + 1);
        assert_eq!(seo.keywords.last().map(String::as_str), Some("croissants"));
    }

    #[test]
    fn test_meta_tags_robots() {
        let site = SiteConfig::default();
        let mut seo = default_seo(&site);
        assert!(meta_tags(&seo, &site).contains(&MetaTag::name("robots", "index, follow")));

        seo.no_index = true;
        assert!(meta_tags(&seo, &site).contains(&MetaTag::name("robots", "noindex, nofollow")));
    }

    #[test]
    fn test_meta_tags_canonical_only_when_set() {
        let site = SiteConfig::default();
        let mut seo = default_seo(&site);
        assert!(!meta_tags(&seo, &site)
            .iter()
            .any(|t| matches!(t, MetaTag::Canonical(_))));

        seo.canonical = Some("https://omadecravings.com/".to_string());
        let tags = meta_tags(&seo, &site);
        assert!(tags.contains(&MetaTag::Canonical("https://omadecravings.com/".to_string())));
        assert!(tags.contains(&MetaTag::property("og:url", "https://omadecravings.com/")));
    }

    #[test]
    fn test_image_alt_text() {
        let site = SiteConfig::default();
        let seo = default_seo(&site);
        let expected = format!("Omade Cravings - {}", seo.title);
        assert!(meta_tags(&seo, &site).contains(&MetaTag::property("og:image:alt", expected)));
    }

    #[test]
    fn test_render_escapes_content() {
        let tag = MetaTag::name("description", r#"Bread & "butter" <b>"#);
        assert_eq!(
            tag.to_html(),
            r#"<meta name="description" content="Bread &amp; &quot;butter&quot; &lt;b&gt;">"#
        );
        assert_eq!(
            MetaTag::JsonLd(r#"{"a":"</script>"}"#.to_string()).to_html(),
            r#"<script type="application/ld+json">{"a":"<\/script>"}</script>"#
        );
    }

    #[test]
    fn test_render_head_starts_with_title() {
        let site = SiteConfig::default();
        let head = render_head(&default_seo(&site), &site);
        assert!(head.starts_with("<title>Omade Cravings - Artisanal Breads &amp; Fresh Baked Goods</title>"));
        assert!(head.contains(r##"<meta name="theme-color" content="#8B5CF6">"##));
    }
}
