// src/model.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// --- Structs for the JSON files ---

/// One product as seen on a source site, before any cleanup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawScrapedRecord {
    #[serde(rename = "nombre", alias = "name")]
    pub name: String,
    #[serde(rename = "categoria", alias = "category", default)]
    pub category: String,
    #[serde(rename = "imagen_url", alias = "image_url", default)]
    pub image_url: String,
    #[serde(rename = "producto_url", alias = "source_url", default)]
    pub source_url: String,
    #[serde(
        rename = "codigo",
        alias = "code",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedProduct {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub category_id: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub story: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub whatsapp_message: String,
    #[serde(default)]
    pub seo_title: String,
    #[serde(default)]
    pub seo_description: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub use_cases: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub bestseller: bool,
    /// Hand-added fields we don't model; written back as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NormalizedProduct {
    pub fn has_images(&self) -> bool {
        self.images.iter().any(|i| !i.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub story: String,
    pub seo_title: String,
    pub seo_description: String,
    pub benefits: Vec<String>,
    pub image: String,
    pub product_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_record_accepts_both_field_spellings() {
        let es: RawScrapedRecord = serde_json::from_str(
            r#"{"nombre":"Mug","categoria":"Mugs","imagen_url":"/a.jpg","producto_url":"/p/1","codigo":"MG01"}"#,
        )
        .unwrap();
        let en: RawScrapedRecord = serde_json::from_str(
            r#"{"name":"Mug","category":"Mugs","image_url":"/a.jpg","source_url":"/p/1","code":"MG01"}"#,
        )
        .unwrap();
        assert_eq!(es, en);
        assert_eq!(es.code.as_deref(), Some("MG01"));
    }

    #[test]
    fn raw_record_optional_fields_default() {
        let r: RawScrapedRecord =
            serde_json::from_str(r#"{"name":"Bolígrafo","categoria":"Escritura"}"#).unwrap();
        assert!(r.image_url.is_empty());
        assert!(r.code.is_none());
    }

    #[test]
    fn product_keeps_unknown_fields() {
        let json = r#"{
            "id":"x","name":"X","slug":"x","categoryId":"oficina",
            "price":"12.50","featured":true
        }"#;
        let p: NormalizedProduct = serde_json::from_str(json).unwrap();
        assert!(p.featured);
        assert_eq!(p.extra.get("price"), Some(&Value::String("12.50".into())));

        let back = serde_json::to_value(&p).unwrap();
        assert_eq!(back["price"], "12.50");
        assert_eq!(back["categoryId"], "oficina");
        assert!(back.get("category_id").is_none());
    }
}
