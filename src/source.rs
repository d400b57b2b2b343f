// src/source.rs
//! Per-site HTML adapters. The only code that knows what a source page looks
//! like; everything downstream works on `RawScrapedRecord`.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::MIN_NAME_LEN;
use crate::error::{Result, ScraperError};
use crate::model::RawScrapedRecord;

lazy_static! {
    static ref CODE_RE: Regex = Regex::new(r"^[A-Z]{1,3}\d{3,4}$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLink {
    pub label: String,
    pub url: String,
}

pub trait CatalogSource {
    fn name(&self) -> &str;
    fn index_url(&self) -> String;
    fn parse_categories(&self, html: &str) -> Vec<CategoryLink>;
    fn parse_listing(&self, html: &str, category: &str, max: usize) -> Vec<RawScrapedRecord>;
}

/// Selectors and URL patterns describing one site's listing layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProfile {
    pub name: String,
    pub base_url: String,
    pub index_path: String,
    /// An `<a href>` on the index page containing one of these is a category.
    pub category_link_patterns: Vec<String>,
    pub product_container: String,
    pub product_link: String,
    pub name_selectors: Vec<String>,
    /// Images whose URL contains one of these are not product shots.
    pub skip_image_markers: Vec<String>,
}

impl SourceProfile {
    pub fn catalogos_promocionales() -> Self {
        Self {
            name: "catalogospromocionales".to_string(),
            base_url: "https://www.catalogospromocionales.com".to_string(),
            index_path: "/seccion/subcategorias.html".to_string(),
            category_link_patterns: vec!["/promocionales/".to_string(), "/seccion/".to_string()],
            product_container: "div[class*=product], article[class*=product], div[class*=item], div[class*=card]".to_string(),
            product_link: "a[href*='/p/'], a[href*='/catalogo/producto']".to_string(),
            name_selectors: vec![
                "[class*=title]".to_string(),
                "[class*=name]".to_string(),
                "[class*=nombre]".to_string(),
                "h2, h3, h4".to_string(),
            ],
            skip_image_markers: vec!["placeholder".to_string(), "logo".to_string()],
        }
    }

    pub fn cdo() -> Self {
        Self {
            name: "cdo".to_string(),
            base_url: "https://www.cdopromocionales.com".to_string(),
            index_path: "/products".to_string(),
            category_link_patterns: vec!["/products?categoria=".to_string()],
            product_container: "div[class*=product], article[class*=product], div[class*=item]".to_string(),
            product_link: "a[href*='/products/']".to_string(),
            name_selectors: vec!["h1, h2, h3, h4, h5".to_string(), "p".to_string()],
            skip_image_markers: vec!["placeholder".to_string(), "logo".to_string()],
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "catalogospromocionales" => Some(Self::catalogos_promocionales()),
            "cdo" => Some(Self::cdo()),
            _ => None,
        }
    }

    pub fn preset_names() -> &'static [&'static str] {
        &["catalogospromocionales", "cdo"]
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| ScraperError::Selector(format!("{s} ({e})")))
}

/// `SourceProfile` with its selectors compiled.
pub struct SelectorSource {
    profile: SourceProfile,
    base: Url,
    container: Selector,
    link: Selector,
    names: Vec<Selector>,
    anchor: Selector,
    img: Selector,
}

impl SelectorSource {
    pub fn new(profile: SourceProfile) -> Result<Self> {
        Ok(Self {
            base: Url::parse(&profile.base_url)?,
            container: parse_selector(&profile.product_container)?,
            link: parse_selector(&profile.product_link)?,
            names: profile
                .name_selectors
                .iter()
                .map(|s| parse_selector(s))
                .collect::<Result<Vec<_>>>()?,
            anchor: parse_selector("a[href]")?,
            img: parse_selector("img")?,
            profile,
        })
    }

    fn absolute(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        self.base.join(href).ok().map(String::from)
    }

    fn image_of(&self, el: &ElementRef) -> Option<(String, Option<String>)> {
        let img = el.select(&self.img).next()?;
        let v = img.value();
        let src = ["src", "data-src", "data-original", "data-lazy-src"]
            .iter()
            .filter_map(|a| v.attr(a))
            .map(str::trim)
            .find(|s| !s.is_empty() && !s.starts_with("data:"))?;

        let lower = src.to_lowercase();
        if self.profile.skip_image_markers.iter().any(|m| lower.contains(m.as_str())) {
            return None;
        }
        let alt = v.attr("alt").map(clean_text).filter(|a| !a.is_empty());
        Some((self.absolute(src)?, alt))
    }

    fn name_of(&self, container: &ElementRef, link: &ElementRef) -> Option<String> {
        for sel in &self.names {
            if let Some(text) = container
                .select(sel)
                .map(|e| clean_text(&e.text().collect::<String>()))
                .find(|t| t.chars().count() >= MIN_NAME_LEN)
            {
                return Some(text);
            }
        }
        if let Some(title) = link.value().attr("title").map(clean_text) {
            if title.chars().count() >= MIN_NAME_LEN {
                return Some(title);
            }
        }
        let text = clean_text(&link.text().collect::<String>());
        (text.chars().count() >= MIN_NAME_LEN).then_some(text)
    }

    fn containers<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        let found: Vec<_> = doc.select(&self.container).collect();
        if !found.is_empty() {
            return found;
        }
        // no recognizable cards: fall back to the parent of every product link
        let mut seen = HashSet::new();
        doc.select(&self.link)
            .filter_map(|a| a.parent().and_then(ElementRef::wrap))
            .filter(|p| seen.insert(p.id()))
            .collect()
    }
}

fn clean_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl CatalogSource for SelectorSource {
    fn name(&self) -> &str {
        &self.profile.name
    }

    fn index_url(&self) -> String {
        self.absolute(&self.profile.index_path)
            .unwrap_or_else(|| self.profile.base_url.clone())
    }

    fn parse_categories(&self, html: &str) -> Vec<CategoryLink> {
        let doc = Html::parse_document(html);
        let index = self.index_url();
        let mut seen = HashSet::new();

        doc.select(&self.anchor)
            .filter_map(|a| {
                let href = a.value().attr("href")?;
                if !self.profile.category_link_patterns.iter().any(|p| href.contains(p.as_str())) {
                    return None;
                }
                let label = clean_text(&a.text().collect::<String>());
                if label.chars().count() < MIN_NAME_LEN {
                    return None;
                }
                let url = self.absolute(href)?;
                if url == index || !seen.insert(url.clone()) {
                    return None;
                }
                Some(CategoryLink { label, url })
            })
            .collect()
    }

    fn parse_listing(&self, html: &str, category: &str, max: usize) -> Vec<RawScrapedRecord> {
        let doc = Html::parse_document(html);
        let mut seen_urls = HashSet::new();
        let mut seen_keys = HashSet::new();
        let mut out = Vec::new();

        for container in self.containers(&doc) {
            if out.len() >= max {
                break;
            }
            let Some(link) = container.select(&self.link).next() else {
                continue;
            };
            let Some(source_url) = link.value().attr("href").and_then(|h| self.absolute(h)) else {
                continue;
            };
            if !seen_urls.insert(source_url.clone()) {
                continue;
            }

            let image = self.image_of(&container);
            let name = self
                .name_of(&container, &link)
                .or_else(|| image.as_ref().and_then(|(_, alt)| alt.clone()));
            let Some(name) = name else {
                debug!("no name for {}", source_url);
                continue;
            };
            let image_url = image.map(|(src, _)| src).unwrap_or_default();

            if !seen_keys.insert(format!("{name}-{image_url}")) {
                continue;
            }

            let code = container
                .text()
                .map(str::trim)
                .find(|t| CODE_RE.is_match(t))
                .map(str::to_string);

            out.push(RawScrapedRecord {
                name,
                category: category.to_string(),
                image_url,
                source_url,
                code,
            });
        }
        out
    }
}
