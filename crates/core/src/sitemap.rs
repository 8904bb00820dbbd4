//! sitemap.xml and robots.txt.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::post::Post;

struct Entry<'a> {
    loc: String,
    lastmod: DateTime<Utc>,
    changefreq: &'a str,
    priority: &'a str,
}

/// Home page plus one entry per published post, addressed by slug.
pub fn sitemap_xml(site_url: &str, posts: &[Post], now: DateTime<Utc>) -> String {
    let base = site_url.trim_end_matches('/');
    let mut entries = vec![Entry {
        loc: base.to_string(),
        lastmod: now,
        changefreq: "daily",
        priority: "1.0",
    }];
    entries.extend(
        posts
            .iter()
            .filter(|post| post.is_published() && !post.slug.trim().is_empty())
            .map(|post| Entry {
                loc: format!("{base}/{}", post.slug.trim()),
                lastmod: post.last_modified(),
                changefreq: "weekly",
                priority: "0.8",
            }),
    );

    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in entries {
        xml.push_str(&format!(
            "  <url><loc>{}</loc><lastmod>{}</lastmod><changefreq>{}</changefreq><priority>{}</priority></url>\n",
            escape_xml(&entry.loc),
            entry.lastmod.to_rfc3339_opts(SecondsFormat::Secs, true),
            entry.changefreq,
            entry.priority,
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

pub fn robots_txt(site_url: &str) -> String {
    let base = site_url.trim_end_matches('/');
    format!("User-agent: *\nAllow: /\nSitemap: {base}/sitemap.xml\n")
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
