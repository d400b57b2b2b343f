// src/classify.rs
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_CATEGORY_ID;
use crate::slug::fold;

/// One canonical category and the substrings that select it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub id: String,
    pub name: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_icon() -> String {
    "Package".to_string()
}

fn default_color() -> String {
    "#64748b".to_string()
}

/// Ordered keyword table. The first rule with a hit wins, so specific rules
/// have to come before broad ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub rules: Vec<CategoryRule>,
    #[serde(default = "default_id")]
    pub default_id: String,
    #[serde(default = "default_name")]
    pub default_name: String,
}

fn default_id() -> String {
    DEFAULT_CATEGORY_ID.to_string()
}

fn default_name() -> String {
    "Variedades".to_string()
}

impl Taxonomy {
    /// Returns the canonical id for a product name and its raw source label.
    pub fn classify(&self, name: &str, raw_category: Option<&str>) -> &str {
        let haystack = match raw_category {
            Some(cat) => fold(&format!("{name} {cat}")),
            None => fold(name),
        };

        self.rules
            .iter()
            .find(|rule| {
                rule.keywords
                    .iter()
                    .map(|k| fold(k))
                    .any(|k| !k.is_empty() && haystack.contains(&k))
            })
            .map(|rule| rule.id.as_str())
            .unwrap_or(&self.default_id)
    }

    pub fn rule(&self, id: &str) -> Option<&CategoryRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn is_known(&self, id: &str) -> bool {
        id == self.default_id || self.rule(id).is_some()
    }

    /// Display name for a category id; unknown ids are title-cased.
    pub fn display_name(&self, id: &str) -> String {
        if let Some(rule) = self.rule(id) {
            return rule.name.clone();
        }
        if id == self.default_id {
            return self.default_name.clone();
        }
        id.split('-')
            .filter(|w| !w.is_empty())
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn rule(id: &str, name: &str, icon: &str, color: &str, keywords: &[&str]) -> CategoryRule {
    CategoryRule {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
        color: color.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self {
            rules: vec![
                rule("memorias-usb", "Memorias USB", "HardDrive", "#0ea5e9", &[
                    "memoria usb", "memorias usb", "memoria", "usb", "pendrive", "flash drive",
                ]),
                rule("articulos-escritura", "Artículos de Escritura", "PenTool", "#2563eb", &[
                    "boligrafo", "lapicero", "lapiz", "pluma", "marcador", "resaltador",
                    "portaminas", "stylus", "roller", "escritura",
                ]),
                rule("mugs-vasos-termos", "Mugs, Vasos y Termos", "Coffee", "#b45309", &[
                    "termo", "mug", "vaso", "botilito", "taza", "jarra", "cantimplora",
                    "botella", "tritan", "drinkware",
                ]),
                rule("llaveros", "Llaveros", "Key", "#ca8a04", &["llavero", "keychain"]),
                rule("tecnologia", "Tecnología", "Laptop", "#7c3aed", &[
                    "power bank", "powerbank", "auricular", "audifono", "mouse", "teclado",
                    "cable", "cargador", "adaptador", "speaker", "parlante", "bluetooth",
                    "tecnologia", "electronica", "tech",
                ]),
                rule("bolsos-mochilas", "Bolsos y Mochilas", "Backpack", "#0f766e", &[
                    "bolso", "mochila", "morral", "backpack", "maleta", "maletin", "neceser",
                    "canguro", "tote", "nevera", "cooler", "tula", "trolley",
                ]),
                rule("oficina", "Artículos de Oficina", "Briefcase", "#475569", &[
                    "cuaderno", "libreta", "agenda", "carpeta", "archivador", "portadocumento",
                    "tarjetero", "memo", "sticky", "oficina",
                ]),
                rule("textiles", "Textiles", "Shirt", "#db2777", &[
                    "camiseta", "polo", "gorra", "chaleco", "chaqueta", "sudadera", "bufanda",
                    "delantal", "impermeable", "poncho", "textil", "confeccion",
                ]),
                rule("pharma-cuidado-personal", "Cuidado Personal", "Heart", "#dc2626", &[
                    "tapabocas", "mascarilla", "antibacterial", "desinfectante", "kit medico",
                    "pastillero", "pharma", "salud", "cuidado personal", "belleza",
                ]),
                rule("herramientas", "Herramientas", "Wrench", "#57534e", &[
                    "herramienta", "destornillador", "martillo", "multiuso", "navaja",
                    "linterna", "flexometro",
                ]),
                rule("hogar", "Hogar y Cocina", "Home", "#16a34a", &[
                    "hogar", "cocina", "vino", "destapador", "bbq", "portacomida", "reloj",
                    "portaretrato", "cobija",
                ]),
                rule("ecologicos", "Productos Ecológicos", "Leaf", "#65a30d", &[
                    "ecologico", "reciclado", "biodegradable", "bambu", "bamboo", "rpet", "trigo",
                ]),
                rule("paraguas", "Paraguas", "Umbrella", "#1d4ed8", &["paraguas", "sombrilla"]),
                // after paraguas: "auto" also matches "automatico"
                rule("accesorios-auto", "Accesorios para Auto", "Car", "#334155", &[
                    "automovil", "auto", "rastal", "vehiculo",
                ]),
                rule("novedades", "Novedades", "Sparkles", "#f59e0b", &["novedades", "nuevo"]),
            ],
            default_id: default_id(),
            default_name: default_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_label_alone_can_decide() {
        let t = Taxonomy::default();
        assert_eq!(t.classify("Bolígrafo Metálico", Some("Escritura")), "articulos-escritura");
        assert_eq!(t.classify("Set Ejecutivo", Some("ESCRITURA")), "articulos-escritura");
    }

    #[test]
    fn name_keywords_match_without_label() {
        let t = Taxonomy::default();
        assert_eq!(t.classify("Mug Cerámica 11oz Azul", None), "mugs-vasos-termos");
        assert_eq!(t.classify("Gorra Drill Bordada", None), "textiles");
        assert_eq!(t.classify("Sombrilla Playera", None), "paraguas");
    }

    #[test]
    fn earlier_rule_wins_on_overlap() {
        let t = Taxonomy::default();
        // "usb" (memorias-usb) and "cable" (tecnologia) both hit.
        assert_eq!(t.classify("Cable USB Tipo C", None), "memorias-usb");
        // "termo" before "bambu".
        assert_eq!(t.classify("Termo Bambú 500ml", None), "mugs-vasos-termos");
    }

    #[test]
    fn each_rule_reachable_by_its_own_keyword() {
        let t = Taxonomy::default();
        for (idx, r) in t.rules.iter().enumerate() {
            let kw = &r.keywords[0];
            let hits_earlier = t.rules[..idx]
                .iter()
                .any(|e| e.keywords.iter().any(|k| fold(kw).contains(&fold(k))));
            if !hits_earlier {
                assert_eq!(t.classify(kw, None), r.id, "keyword {kw}");
            }
        }
    }

    #[test]
    fn bare_memoria_is_usb_not_office() {
        let t = Taxonomy::default();
        assert_eq!(t.classify("Memoria Giratoria 16GB", Some("Memorias")), "memorias-usb");
        assert_eq!(t.classify("Memo Pad Adhesivo", None), "oficina");
    }

    #[test]
    fn auto_and_novelty_rules() {
        let t = Taxonomy::default();
        assert_eq!(t.classify("Parasol para Automóvil", None), "accesorios-auto");
        assert_eq!(t.classify("Organizador Rastal", Some("Auto")), "accesorios-auto");
        assert_eq!(t.classify("Paraguas Automático Grande", None), "paraguas");
        assert_eq!(t.classify("Spinner Led", Some("Novedades")), "novedades");
        assert_eq!(t.rule("novedades").map(|r| r.icon.as_str()), Some("Sparkles"));
    }

    #[test]
    fn unknown_text_goes_to_default() {
        let t = Taxonomy::default();
        assert_eq!(t.classify("Zzz Qqq", Some("Marca Xindao")), DEFAULT_CATEGORY_ID);
        assert_eq!(t.classify("", None), DEFAULT_CATEGORY_ID);
    }

    #[test]
    fn multi_word_keyword_must_be_contiguous() {
        let t = Taxonomy {
            rules: vec![rule("a", "A", "X", "#000", &["power bank"])],
            ..Taxonomy::default()
        };
        assert_eq!(t.classify("Power Bank 5000", None), "a");
        assert_eq!(t.classify("Bank of Power", None), DEFAULT_CATEGORY_ID);
    }

    #[test]
    fn display_names() {
        let t = Taxonomy::default();
        assert_eq!(t.display_name("tecnologia"), "Tecnología");
        assert_eq!(t.display_name(DEFAULT_CATEGORY_ID), "Variedades");
        assert_eq!(t.display_name("accesorios-auto"), "Accesorios para Auto");
        assert_eq!(t.display_name("kits-ejecutivos"), "Kits Ejecutivos");
        assert!(t.is_known("oficina"));
        assert!(!t.is_known("kits-ejecutivos"));
    }

    #[test]
    fn loads_from_json_with_defaults() {
        let t: Taxonomy = serde_json::from_str(
            r#"{"rules":[{"id":"x","name":"X","keywords":["equis"]}]}"#,
        )
        .unwrap();
        assert_eq!(t.default_id, DEFAULT_CATEGORY_ID);
        assert_eq!(t.rules[0].icon, "Package");
        assert_eq!(t.classify("Equis Grande", None), "x");
    }
}
