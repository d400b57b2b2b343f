use std::fs;
use std::path::Path;

use promo_scraper::catalog::{read_catalog, read_json, write_catalog, write_json};
use promo_scraper::model::Category;
use promo_scraper::{
    run_normalize, NormalizeContext, NormalizePaths, NormalizedProduct, RawScrapedRecord, ScraperError,
};
use tempfile::tempdir;

fn raw(name: &str, cat: &str, img: &str) -> RawScrapedRecord {
    RawScrapedRecord {
        name: name.into(),
        category: cat.into(),
        image_url: img.into(),
        source_url: format!("https://example.com/p/{}", name.len()),
        code: None,
    }
}

fn paths(dir: &Path) -> NormalizePaths {
    NormalizePaths {
        raw: dir.join("productos_scraped.json"),
        catalog: dir.join("products.json"),
        categories: dir.join("categories.json"),
        backup_dir: None,
    }
}

fn ctx() -> NormalizeContext {
    NormalizeContext { seed: Some(42), ..Default::default() }
}

#[test]
fn end_to_end_single_record() {
    let dir = tempdir().unwrap();
    let p = paths(dir.path());
    write_json(
        &p.raw,
        &[raw("Bolígrafo Metálico (Ref. BZ-09)", "Escritura", "http://x/a.jpg")],
    )
    .unwrap();

    run_normalize(&p, &ctx()).unwrap();

    let products = read_catalog(&p.catalog).unwrap();
    assert_eq!(products.len(), 1);
    let b = &products[0];
    assert_eq!(b.name, "Bolígrafo Metálico");
    assert_eq!(b.slug, "boligrafo-metalico");
    assert_eq!(b.category_id, "articulos-escritura");
    assert!(!b.features.is_empty() && b.features.len() <= 6);
    assert_eq!(b.images, vec!["http://x/a.jpg".to_string()]);
    assert!(b.seo_title.chars().count() <= 60);
    assert!(b.seo_description.chars().count() <= 155);
    assert!(b.whatsapp_message.contains("Bolígrafo Metálico"));

    let categories: Vec<Category> = read_json(&p.categories).unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].id, "articulos-escritura");
    assert_eq!(categories[0].product_count, 1);
    assert_eq!(categories[0].image, "http://x/a.jpg");
}

#[test]
fn raw_dump_uses_source_field_names() {
    let dir = tempdir().unwrap();
    let p = paths(dir.path());
    fs::write(
        &p.raw,
        r#"[{"nombre": "Llavero Metálico Redondo", "categoria": "Llaveros",
             "imagen_url": "https://cdn.example.com/l.jpg", "producto_url": "https://example.com/p/1"},
            {"name": "Gorra Drill Bordada"}]"#,
    )
    .unwrap();

    let outcome = run_normalize(&p, &ctx()).unwrap();
    assert_eq!(outcome.stats.inserted, 2);
    assert_eq!(outcome.products[0].category_id, "llaveros");
    assert_eq!(outcome.products[1].category_id, "textiles");
    assert!(outcome.products[1].images.is_empty());
}

#[test]
fn second_run_adds_nothing() {
    let dir = tempdir().unwrap();
    let p = paths(dir.path());
    write_json(
        &p.raw,
        &[
            raw("Mug Cerámica 11oz Azul", "Mugs", "http://x/mug.jpg"),
            raw("Termo Acero Inoxidable 500ml", "Termos", ""),
            raw("Cuaderno Ecológico Argollado", "Oficina", "http://x/c.jpg"),
        ],
    )
    .unwrap();

    let first = run_normalize(&p, &ctx()).unwrap();
    assert_eq!(first.stats.inserted, 3);
    let after_first = read_catalog(&p.catalog).unwrap();

    let second = run_normalize(&p, &NormalizeContext { seed: Some(1), ..Default::default() }).unwrap();
    assert_eq!(second.stats.inserted, 0);
    assert_eq!(second.stats.merged, 3);
    assert_eq!(read_catalog(&p.catalog).unwrap(), after_first);
}

#[test]
fn curated_records_survive_a_merge() {
    let dir = tempdir().unwrap();
    let p = paths(dir.path());

    let mut curated = NormalizedProduct {
        id: "mugs-mug-ceramica-11oz-azul".into(),
        name: "Mug Cerámica 11oz Azul".into(),
        slug: "mug-ceramica-11oz-azul".into(),
        category_id: "mugs-vasos-termos".into(),
        short_description: "Escrita a mano".into(),
        features: vec!["Apto microondas".into(), "Caja individual".into()],
        featured: true,
        ..Default::default()
    };
    curated
        .extra
        .insert("price".into(), serde_json::json!(4.5));
    write_catalog(&p.catalog, &[curated.clone()]).unwrap();
    write_json(&p.raw, &[raw("Mug Cerámica 11oz Rojo", "Mugs", "http://x/rojo.jpg")]).unwrap();

    let outcome = run_normalize(&p, &ctx()).unwrap();
    assert_eq!(outcome.stats.merged, 1);

    let products = read_catalog(&p.catalog).unwrap();
    assert_eq!(products.len(), 1);
    let m = &products[0];
    assert_eq!(m.features, curated.features);
    assert_eq!(m.short_description, "Escrita a mano");
    assert!(m.featured);
    assert_eq!(m.images, vec!["http://x/rojo.jpg".to_string()]);
    assert_eq!(m.extra.get("price"), Some(&serde_json::json!(4.5)));
}

#[test]
fn categories_sorted_by_count() {
    let dir = tempdir().unwrap();
    let p = paths(dir.path());
    write_json(
        &p.raw,
        &[
            raw("Llavero Metálico Redondo", "Llaveros", ""),
            raw("Paraguas Automático Grande", "Paraguas", ""),
            raw("Paraguas Plegable Mini", "Paraguas", ""),
            raw("Sombrilla Golf Doble Capa", "Paraguas", ""),
            raw("Llavero Destapador Acero", "Llaveros", ""),
            raw("Artículo Misterioso Sorpresa", "", ""),
        ],
    )
    .unwrap();

    run_normalize(&p, &ctx()).unwrap();
    let categories: Vec<Category> = read_json(&p.categories).unwrap();
    let counts: Vec<_> = categories.iter().map(|c| (c.id.as_str(), c.product_count)).collect();
    assert_eq!(counts, [("paraguas", 3), ("llaveros", 2), ("variedades", 1)]);
}

#[test]
fn ids_and_slugs_unique() {
    let dir = tempdir().unwrap();
    let p = paths(dir.path());
    // same cleaned name family, different enough not to merge
    write_json(
        &p.raw,
        &[
            raw("Gorra Drill", "Textiles", ""),
            raw("Gorra Drill (Ref. G1)", "Textiles", "http://x/g.jpg"),
            raw("Gorra Drill Bordada Premium", "Textiles", ""),
        ],
    )
    .unwrap();

    let outcome = run_normalize(&p, &ctx()).unwrap();
    let products = outcome.products;
    assert_eq!(outcome.stats.merged, 1);
    let mut ids: Vec<_> = products.iter().map(|p| p.id.clone()).collect();
    let mut slugs: Vec<_> = products.iter().map(|p| p.slug.clone()).collect();
    ids.sort();
    ids.dedup();
    slugs.sort();
    slugs.dedup();
    assert_eq!(ids.len(), products.len());
    assert_eq!(slugs.len(), products.len());
}

#[test]
fn missing_raw_dump_is_an_error() {
    let dir = tempdir().unwrap();
    let p = paths(dir.path());
    let err = run_normalize(&p, &ctx()).unwrap_err();
    assert!(matches!(err, ScraperError::MissingInput(_)));
    assert!(!p.catalog.exists());
}

#[test]
fn backup_taken_before_overwrite() {
    let dir = tempdir().unwrap();
    let mut p = paths(dir.path());
    p.backup_dir = Some(dir.path().join("backups"));

    write_json(&p.raw, &[raw("Llavero Metálico Redondo", "Llaveros", "")]).unwrap();
    run_normalize(&p, &ctx()).unwrap();
    // nothing to back up on the first run
    assert!(!dir.path().join("backups").exists() || fs::read_dir(dir.path().join("backups")).unwrap().count() == 0);

    run_normalize(&p, &ctx()).unwrap();
    let names: Vec<String> = fs::read_dir(dir.path().join("backups"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.iter().any(|n| n.starts_with("products_backup_")));
    assert!(names.iter().any(|n| n.starts_with("categories_backup_")));
}
