// src/images.rs
use std::path::Path;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::IMAGE_URL_PREFIX;
use crate::fetch::Fetcher;
use crate::model::NormalizedProduct;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadStats {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Local file name for a remote image: `{slug}.png` for PNGs, `{slug}.jpg`
/// for everything else.
pub fn local_file_name(slug: &str, url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
    let ext = if path.ends_with(".png") { "png" } else { "jpg" };
    format!("{slug}.{ext}")
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Saves the first image of every product whose image is still remote and
/// points the product at the local copy. Failed downloads keep the remote URL.
pub async fn download_images(
    fetcher: &Fetcher,
    products: &mut [NormalizedProduct],
    dir: &Path,
    delay: Duration,
) -> DownloadStats {
    let mut stats = DownloadStats::default();

    for product in products.iter_mut() {
        let Some(url) = product.images.first().filter(|u| is_remote(u)).cloned() else {
            stats.skipped += 1;
            continue;
        };

        let file = local_file_name(&product.slug, &url);
        let dest = dir.join(&file);
        let local = format!("{IMAGE_URL_PREFIX}/{file}");

        if dest.exists() {
            product.images[0] = local;
            stats.skipped += 1;
            continue;
        }

        match fetcher.download(&url, &dest).await {
            Ok(()) => {
                info!("[IMG] {} -> {}", product.slug, dest.display());
                product.images[0] = local;
                stats.downloaded += 1;
            }
            Err(e) => {
                warn!("Image for {} not saved: {}", product.slug, e);
                stats.failed += 1;
            }
        }

        if !delay.is_zero() {
            sleep(delay).await;
        }
    }

    stats
}
