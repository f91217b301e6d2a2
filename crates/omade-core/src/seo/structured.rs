//! schema.org JSON-LD documents for the site.

use serde_json::{json, Value};

use super::meta::SiteConfig;

const CONTACT_EMAIL: &str = "hello@omadecravings.com";
const CONTACT_PHONE: &str = "+1-XXX-XXX-XXXX";
const LOGO_WIDTH: u32 = 600;
const LOGO_HEIGHT: u32 = 400;

fn social_profiles() -> Value {
    json!([
        "https://facebook.com/omadecravings",
        "https://instagram.com/omadecravings",
        "https://twitter.com/omadecravings"
    ])
}

fn logo(site: &SiteConfig) -> Value {
    json!({
        "@type": "ImageObject",
        "url": site.default_image,
        "width": LOGO_WIDTH,
        "height": LOGO_HEIGHT
    })
}

pub fn business(site: &SiteConfig) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "Bakery",
        "name": site.site_name,
        "description": site.default_description,
        "url": site.site_url,
        "logo": site.default_image,
        "image": site.default_image,
        "servesCuisine": "Bakery",
        "priceRange": "$$",
        "paymentAccepted": "Cash, Credit Card",
        "currenciesAccepted": "USD",
        "openingHours": ["Mo-Fr 06:00-18:00", "Sa-Su 07:00-17:00"],
        "address": {
            "@type": "PostalAddress",
            "addressLocality": "Your City",
            "addressRegion": "Your State",
            "addressCountry": "US"
        },
        "telephone": CONTACT_PHONE,
        "email": CONTACT_EMAIL,
        "sameAs": social_profiles()
    })
}

pub fn website(site: &SiteConfig) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "WebSite",
        "name": site.site_name,
        "description": site.default_description,
        "url": site.site_url,
        "potentialAction": {
            "@type": "SearchAction",
            "target": {
                "@type": "EntryPoint",
                "urlTemplate": format!("{}/search?q={{search_term_string}}", site.site_url)
            },
            "query-input": "required name=search_term_string"
        },
        "publisher": {
            "@type": "Organization",
            "name": site.site_name,
            "logo": logo(site)
        }
    })
}

pub fn organization(site: &SiteConfig) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "Organization",
        "name": site.site_name,
        "url": site.site_url,
        "logo": logo(site),
        "description": site.default_description,
        "foundingDate": "2024",
        "contactPoint": {
            "@type": "ContactPoint",
            "telephone": CONTACT_PHONE,
            "contactType": "customer service",
            "email": CONTACT_EMAIL,
            "availableLanguage": ["English"]
        },
        "sameAs": social_profiles()
    })
}

/// `(name, url)` pairs, positions numbered from 1
pub fn breadcrumbs(items: &[(&str, &str)]) -> Value {
    let elements: Vec<Value> = items
        .iter()
        .enumerate()
        .map(|(index, (name, url))| {
            json!({
                "@type": "ListItem",
                "position": index + 1,
                "name": name,
                "item": url
            })
        })
        .collect();
    json!({
        "@context": "https://schema.org",
        "@type": "BreadcrumbList",
        "itemListElement": elements
    })
}

/// `(question, answer)` pairs
pub fn faq(entries: &[(&str, &str)]) -> Value {
    let questions: Vec<Value> = entries
        .iter()
        .map(|(question, answer)| {
            json!({
                "@type": "Question",
                "name": question,
                "acceptedAnswer": {"@type": "Answer", "text": answer}
            })
        })
        .collect();
    json!({
        "@context": "https://schema.org",
        "@type": "FAQPage",
        "mainEntity": questions
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_document() {
        let doc = business(&SiteConfig::default());
        assert_eq!(doc["@type"], "Bakery");
        assert_eq!(doc["url"], "https://omadecravings.com");
        assert_eq!(doc["sameAs"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_website_search_template() {
        let doc = website(&SiteConfig::default());
        assert_eq!(
            doc["potentialAction"]["target"]["urlTemplate"],
            "https://omadecravings.com/search?q={search_term_string}"
        );
        assert_eq!(doc["publisher"]["logo"]["width"], 600);
    }

    #[test]
    fn test_breadcrumb_positions() {
        let doc = breadcrumbs(&[("Home", "https://omadecravings.com"), ("Menu", "https://omadecravings.com/menu")]);
        let items = doc["itemListElement"].as_array().unwrap();
        assert_eq!(items[0]["position"], 1);
        assert_eq!(items[1]["position"], 2);
        assert_eq!(items[1]["name"], "Menu");
    }

    #[test]
    fn test_faq_entries() {
        let doc = faq(&[("Open Sundays?", "Yes, 7am to 5pm.")]);
        assert_eq!(doc["mainEntity"][0]["acceptedAnswer"]["text"], "Yes, 7am to 5pm.");
        assert_eq!(organization(&SiteConfig::default())["foundingDate"], "2024");
    }
}
