// src/crawl.rs
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{CATEGORY_DELAY, MAX_PRODUCTS_PER_CATEGORY};
use crate::error::{Result, ScraperError};
use crate::fetch::Fetcher;
use crate::model::RawScrapedRecord;
use crate::source::CatalogSource;

/// Anything that turns a URL into page HTML.
pub trait PageFetch {
    fn fetch_page(&self, url: &str) -> impl Future<Output = Result<String>>;
}

impl PageFetch for Fetcher {
    fn fetch_page(&self, url: &str) -> impl Future<Output = Result<String>> {
        self.fetch_text(url)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrawlLimits {
    /// `None` walks every category found on the index.
    pub max_categories: Option<usize>,
    pub max_products_per_category: usize,
    pub delay: Duration,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            max_categories: None,
            max_products_per_category: MAX_PRODUCTS_PER_CATEGORY,
            delay: CATEGORY_DELAY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub categories_found: usize,
    pub categories_scraped: usize,
    pub categories_failed: Vec<String>,
    pub records: usize,
}

/// Walks the source's categories one at a time. A category page that cannot
/// be fetched is logged and skipped; an unreachable index aborts the crawl.
pub async fn crawl<F, S>(
    fetcher: &F,
    source: &S,
    limits: &CrawlLimits,
) -> Result<(Vec<RawScrapedRecord>, CrawlSummary)>
where
    F: PageFetch,
    S: CatalogSource,
{
    let index_url = source.index_url();
    info!("Fetching category index for {} from {}", source.name(), index_url);
    let index = fetcher.fetch_page(&index_url).await?;

    let mut categories = source.parse_categories(&index);
    if categories.is_empty() {
        return Err(ScraperError::DataNotFound(format!(
            "no category links on {index_url}"
        )));
    }

    let mut summary = CrawlSummary {
        categories_found: categories.len(),
        ..Default::default()
    };
    if let Some(max) = limits.max_categories {
        categories.truncate(max);
    }
    info!("Found {} categories, scraping {}", summary.categories_found, categories.len());

    let mut records = Vec::new();
    let total = categories.len();
    for (i, cat) in categories.iter().enumerate() {
        info!("[{}/{}] {}", i + 1, total, cat.label);

        match fetcher.fetch_page(&cat.url).await {
            Ok(html) => {
                let found = source.parse_listing(&html, &cat.label, limits.max_products_per_category);
                info!("  -> {} products", found.len());
                summary.categories_scraped += 1;
                records.extend(found);
            }
            Err(e) => {
                warn!("Skipping category {}: {}", cat.label, e);
                summary.categories_failed.push(cat.label.clone());
            }
        }

        if i + 1 < total && !limits.delay.is_zero() {
            sleep(limits.delay).await;
        }
    }

    summary.records = records.len();
    Ok((records, summary))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::source::{SelectorSource, SourceProfile};

    struct StaticPages(HashMap<String, String>);

    impl PageFetch for StaticPages {
        fn fetch_page(&self, url: &str) -> impl Future<Output = Result<String>> {
            let page = self
                .0
                .get(url)
                .cloned()
                .ok_or_else(|| ScraperError::MaxRetriesExceeded(url.to_string()));
            async move { page }
        }
    }

    const BASE: &str = "https://www.catalogospromocionales.com";

    fn site() -> StaticPages {
        let mut pages = HashMap::new();
        pages.insert(
            format!("{BASE}/seccion/subcategorias.html"),
            r#"<a href="/promocionales/mugs.html">Mugs</a>
               <a href="/promocionales/gorras.html">Gorras</a>
               <a href="/promocionales/llaveros.html">Llaveros</a>"#
                .to_string(),
        );
        pages.insert(
            format!("{BASE}/promocionales/mugs.html"),
            r#"<div class="product"><a href="/p/1">Mug Cerámica</a><img src="/m.jpg"></div>
               <div class="product"><a href="/p/2">Mug Térmico</a></div>"#
                .to_string(),
        );
        pages.insert(
            format!("{BASE}/promocionales/llaveros.html"),
            r#"<div class="product"><a href="/p/3">Llavero Metálico</a></div>"#.to_string(),
        );
        StaticPages(pages)
    }

    fn limits() -> CrawlLimits {
        CrawlLimits { delay: Duration::ZERO, ..Default::default() }
    }

    #[tokio::test]
    async fn failed_category_is_skipped() {
        let source = SelectorSource::new(SourceProfile::catalogos_promocionales()).unwrap();
        let (records, summary) = crawl(&site(), &source, &limits()).await.unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].category, "Mugs");
        assert_eq!(records[2].category, "Llaveros");
        assert_eq!(summary.categories_found, 3);
        assert_eq!(summary.categories_scraped, 2);
        assert_eq!(summary.categories_failed, vec!["Gorras".to_string()]);
        assert_eq!(summary.records, 3);
    }

    #[tokio::test]
    async fn limits_are_applied() {
        let source = SelectorSource::new(SourceProfile::catalogos_promocionales()).unwrap();
        let limits = CrawlLimits {
            max_categories: Some(1),
            max_products_per_category: 1,
            delay: Duration::ZERO,
        };
        let (records, summary) = crawl(&site(), &source, &limits).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(summary.categories_scraped, 1);
    }

    #[tokio::test]
    async fn empty_index_is_an_error() {
        let source = SelectorSource::new(SourceProfile::catalogos_promocionales()).unwrap();
        let mut pages = HashMap::new();
        pages.insert(format!("{BASE}/seccion/subcategorias.html"), "<p>nada</p>".to_string());
        let err = crawl(&StaticPages(pages), &source, &limits()).await.unwrap_err();
        assert!(matches!(err, ScraperError::DataNotFound(_)));
    }
}
