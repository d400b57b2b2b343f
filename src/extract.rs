// src/extract.rs
use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::classify::{capitalize, Taxonomy};
use crate::config::{MAX_ID_LEN, MIN_NAME_LEN};
use crate::model::{NormalizedProduct, RawScrapedRecord};
use crate::slug::{slugify, truncate_slug};

lazy_static! {
    static ref PARENS_RE: Regex = Regex::new(r"\([^)]*\)").unwrap();
    static ref BRACKETS_RE: Regex = Regex::new(r"\[[^\]]*\]").unwrap();
    // "BZ-09 Bolígrafo", "T800: Termo"
    static ref LEADING_CODE_RE: Regex = Regex::new(r"^\s*[A-Z]{1,4}-?\d+[A-Z]?\b\s*[-:]?\s*").unwrap();
    static ref QUOTES_RE: Regex = Regex::new(r#"["'“”‘’]"#).unwrap();
}

/// Words up to this many characters are treated as connectors and lowercased.
const CONNECTOR_MAX_LEN: usize = 2;

pub fn clean_name(raw: &str, code: Option<&str>) -> String {
    let mut name = raw.to_string();
    if let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) {
        // whole tokens only: code "MG12" must not split "MG123"
        if let Ok(re) = Regex::new(&format!(r"\b{}\b", regex::escape(code))) {
            name = re.replace_all(&name, " ").into_owned();
        }
    }
    let name = PARENS_RE.replace_all(&name, " ");
    let name = BRACKETS_RE.replace_all(&name, " ");
    let name = LEADING_CODE_RE.replace(&name, "");
    let name = QUOTES_RE.replace_all(&name, "");

    name.split_whitespace()
        .map(|word| {
            if word.chars().count() > CONNECTOR_MAX_LEN {
                capitalize(word)
            } else {
                word.to_lowercase()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Why a raw record did not make it into the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discard {
    NameTooShort(String),
    EmptySlug(String),
}

/// Ids and slugs already handed out in the catalog being built.
#[derive(Debug, Default)]
pub struct SlugRegistry {
    ids: HashSet<String>,
    slugs: HashSet<String>,
}

impl SlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded<'a>(products: impl IntoIterator<Item = &'a NormalizedProduct>) -> Self {
        let mut reg = Self::new();
        for p in products {
            reg.ids.insert(p.id.clone());
            reg.slugs.insert(p.slug.clone());
        }
        reg
    }

    pub fn claim_id(&mut self, base: &str) -> String {
        claim(&mut self.ids, base, MAX_ID_LEN)
    }

    pub fn claim_slug(&mut self, base: &str) -> String {
        claim(&mut self.slugs, base, usize::MAX)
    }

    pub fn contains_slug(&self, slug: &str) -> bool {
        self.slugs.contains(slug)
    }
}

/// Takes `base` if free, otherwise `base-N` where N starts at one past the
/// number of taken values sharing the prefix.
fn claim(taken: &mut HashSet<String>, base: &str, max_len: usize) -> String {
    if taken.insert(base.to_string()) {
        return base.to_string();
    }

    let prefix = format!("{base}-");
    let mut n = taken
        .iter()
        .filter(|s| s.as_str() == base || s.starts_with(&prefix))
        .count()
        + 1;

    loop {
        let suffix = format!("-{n}");
        let room = max_len.saturating_sub(suffix.len());
        let candidate = format!("{}{}", truncate_slug(base, room), suffix);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

pub struct Extractor<'a> {
    taxonomy: &'a Taxonomy,
}

impl<'a> Extractor<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self { taxonomy }
    }

    /// Builds the skeleton product (identity, category, image) for one raw
    /// record. Copy fields are left empty for the SEO stage.
    pub fn extract(
        &self,
        raw: &RawScrapedRecord,
        registry: &mut SlugRegistry,
    ) -> Result<NormalizedProduct, Discard> {
        let name = clean_name(&raw.name, raw.code.as_deref());
        if name.chars().count() < MIN_NAME_LEN {
            return Err(Discard::NameTooShort(raw.name.clone()));
        }

        let base_slug = slugify(&name);
        if base_slug.is_empty() {
            return Err(Discard::EmptySlug(raw.name.clone()));
        }

        let label = raw.category.trim();
        let base_id = if label.is_empty() {
            truncate_slug(&base_slug, MAX_ID_LEN)
        } else {
            truncate_slug(&slugify(&format!("{label}-{name}")), MAX_ID_LEN)
        };

        let category = if label.is_empty() { None } else { Some(label) };
        let category_id = self.taxonomy.classify(&name, category).to_string();

        let image = raw.image_url.trim();
        let images = if image.is_empty() { Vec::new() } else { vec![image.to_string()] };

        Ok(NormalizedProduct {
            id: registry.claim_id(&base_id),
            slug: registry.claim_slug(&base_slug),
            name,
            category_id,
            images,
            ..NormalizedProduct::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, cat: &str, img: &str) -> RawScrapedRecord {
        RawScrapedRecord {
            name: name.into(),
            category: cat.into(),
            image_url: img.into(),
            ..Default::default()
        }
    }

    #[test]
    fn cleans_annotations_and_codes() {
        assert_eq!(clean_name("Bolígrafo Metálico (Ref. BZ-09)", None), "Bolígrafo Metálico");
        assert_eq!(clean_name("BZ-09 bolígrafo metálico", None), "Bolígrafo Metálico");
        assert_eq!(clean_name("T800: TERMO acero [NUEVO]", None), "Termo Acero");
        assert_eq!(clean_name("Mug \"Clásico\" MG123", Some("MG123")), "Mug Clásico");
    }

    #[test]
    fn source_code_removed_only_as_a_whole_token() {
        assert_eq!(clean_name("Mug MG123 Azul", Some("MG12")), "Mug Mg123 Azul");
        assert_eq!(clean_name("Mug Azul MG12", Some("MG12")), "Mug Azul");
    }

    #[test]
    fn short_words_are_lowercased() {
        assert_eq!(clean_name("SET DE   BOLÍGRAFOS EN ESTUCHE", None), "Set de Bolígrafos en Estuche");
        assert_eq!(clean_name("mug 11oz azul", None), "Mug 11oz Azul");
    }

    #[test]
    fn extracts_identity_fields() {
        let tax = Taxonomy::default();
        let mut reg = SlugRegistry::new();
        let p = Extractor::new(&tax)
            .extract(&raw("Bolígrafo Metálico (Ref. BZ-09)", "Escritura", "http://x/a.jpg"), &mut reg)
            .unwrap();

        assert_eq!(p.name, "Bolígrafo Metálico");
        assert_eq!(p.slug, "boligrafo-metalico");
        assert_eq!(p.id, "escritura-boligrafo-metalico");
        assert_eq!(p.category_id, "articulos-escritura");
        assert_eq!(p.images, vec!["http://x/a.jpg".to_string()]);
        assert!(p.features.is_empty());
    }

    #[test]
    fn id_is_bounded() {
        let tax = Taxonomy::default();
        let mut reg = SlugRegistry::new();
        let long = "Termo Acero Inoxidable Doble Pared Con Tapa Hermética Y Colgador Extra Largo";
        let p = Extractor::new(&tax).extract(&raw(long, "Termos y Botellas", ""), &mut reg).unwrap();
        assert!(p.id.len() <= MAX_ID_LEN);
        assert!(!p.id.ends_with('-'));
        assert!(p.images.is_empty());
    }

    #[test]
    fn too_short_names_are_discarded() {
        let tax = Taxonomy::default();
        let mut reg = SlugRegistry::new();
        let ex = Extractor::new(&tax);
        assert_eq!(
            ex.extract(&raw("(AB12)", "X", ""), &mut reg),
            Err(Discard::NameTooShort("(AB12)".into()))
        );
        assert!(matches!(ex.extract(&raw("¿?!", "X", ""), &mut reg), Err(Discard::EmptySlug(_))));
    }

    #[test]
    fn collisions_get_numeric_suffix() {
        let tax = Taxonomy::default();
        let mut reg = SlugRegistry::new();
        let ex = Extractor::new(&tax);
        let a = ex.extract(&raw("Mug Azul", "Mugs", ""), &mut reg).unwrap();
        let b = ex.extract(&raw("Mug Azul", "Mugs", ""), &mut reg).unwrap();
        let c = ex.extract(&raw("mug  azul", "Mugs", ""), &mut reg).unwrap();
        assert_eq!(a.slug, "mug-azul");
        assert_eq!(b.slug, "mug-azul-2");
        assert_eq!(c.slug, "mug-azul-3");
        assert_eq!(b.id, "mugs-mug-azul-2");
    }

    #[test]
    fn registry_seeded_from_catalog() {
        let existing = NormalizedProduct {
            id: "mugs-mug-azul".into(),
            slug: "mug-azul".into(),
            ..Default::default()
        };
        let mut reg = SlugRegistry::seeded([&existing]);
        assert!(reg.contains_slug("mug-azul"));
        assert_eq!(reg.claim_slug("mug-azul"), "mug-azul-2");
        assert_eq!(reg.claim_id("mugs-mug-azul"), "mugs-mug-azul-2");
    }

    #[test]
    fn suffixed_id_stays_within_limit() {
        let mut taken = HashSet::new();
        let base = "a".repeat(MAX_ID_LEN);
        claim(&mut taken, &base, MAX_ID_LEN);
        let second = claim(&mut taken, &base, MAX_ID_LEN);
        assert_eq!(second.len(), MAX_ID_LEN);
        assert!(second.ends_with("-2"));
    }
}
