// src/seo.rs
//! Templated storefront copy. Every field is a random pick from a small
//! category-keyed table, so thousands of near-identical products don't all
//! read the same. Pass a seeded generator when output has to be repeatable.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::classify::{capitalize, Taxonomy};
use crate::config::{BrandConfig, MAX_FEATURES, SEO_DESCRIPTION_MAX, SEO_TITLE_MAX};
use crate::model::NormalizedProduct;

lazy_static! {
    static ref PLACEHOLDER_RE: Regex = Regex::new(r"\{([A-Za-z_]+)\}").unwrap();
}

const ELLIPSIS: &str = "...";
const FEATURE_GENERIC_PICKS: usize = 4;
const FEATURE_SPECIFIC_PICKS: usize = 2;
const USE_CASE_PICKS: usize = 4;
const MAX_KEYWORDS: usize = 8;

/// Word pools for `{trust}`, `{custom}`, `{use_case}`, `{benefit}`, `{city}`.
/// Writing the placeholder capitalized (`{Trust}`) capitalizes the pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermPools {
    pub trust: Vec<String>,
    pub custom: Vec<String>,
    pub use_case: Vec<String>,
    pub benefit: Vec<String>,
    pub city: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryTemplates {
    pub short_descriptions: Vec<String>,
    pub stories: Vec<String>,
    pub meta_descriptions: Vec<String>,
    pub features: Vec<String>,
    pub use_cases: Vec<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoTemplates {
    pub short_descriptions: Vec<String>,
    pub stories: Vec<String>,
    pub meta_descriptions: Vec<String>,
    pub title_suffixes: Vec<String>,
    pub generic_features: Vec<String>,
    pub generic_use_cases: Vec<String>,
    pub base_keywords: Vec<String>,
    pub terms: TermPools,
    pub by_category: BTreeMap<String, CategoryTemplates>,
}

/// Generated copy for one product.
#[derive(Debug, Clone, PartialEq)]
pub struct SeoContent {
    pub short_description: String,
    pub story: String,
    pub seo_title: String,
    pub seo_description: String,
    pub keywords: Vec<String>,
    pub features: Vec<String>,
    pub use_cases: Vec<String>,
}

impl SeoContent {
    pub fn apply(self, p: &mut NormalizedProduct) {
        p.short_description = self.short_description;
        p.story = self.story;
        p.seo_title = self.seo_title;
        p.seo_description = self.seo_description;
        p.keywords = self.keywords.join(", ");
        p.features = self.features;
        p.use_cases = self.use_cases;
    }
}

/// Cuts to `max` characters, ending in `...` when anything was dropped.
pub fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let head: String = s.chars().take(keep).collect();
    format!("{}{}", head.trim_end(), ELLIPSIS)
}

pub struct SeoGenerator<'a, R: Rng> {
    templates: &'a SeoTemplates,
    brand: &'a BrandConfig,
    taxonomy: &'a Taxonomy,
    rng: R,
}

impl<'a> SeoGenerator<'a, ChaCha8Rng> {
    pub fn seeded(
        templates: &'a SeoTemplates,
        brand: &'a BrandConfig,
        taxonomy: &'a Taxonomy,
        seed: u64,
    ) -> Self {
        Self::with_rng(templates, brand, taxonomy, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy(
        templates: &'a SeoTemplates,
        brand: &'a BrandConfig,
        taxonomy: &'a Taxonomy,
    ) -> Self {
        Self::with_rng(templates, brand, taxonomy, ChaCha8Rng::from_entropy())
    }
}

impl<'a, R: Rng> SeoGenerator<'a, R> {
    pub fn with_rng(
        templates: &'a SeoTemplates,
        brand: &'a BrandConfig,
        taxonomy: &'a Taxonomy,
        rng: R,
    ) -> Self {
        Self { templates, brand, taxonomy, rng }
    }

    pub fn generate(&mut self, name: &str, category_id: &str) -> SeoContent {
        let t = self.templates;
        let cat = t.by_category.get(category_id);
        let pick_pool = |own: Option<&'a Vec<String>>, generic: &'a Vec<String>| match own {
            Some(v) if !v.is_empty() => v,
            _ => generic,
        };
        let ctx = Context {
            name,
            category: self.taxonomy.display_name(category_id),
            brand: self.brand,
            terms: &t.terms,
        };

        let short_description = self.render_one(pick_pool(cat.map(|c| &c.short_descriptions), &t.short_descriptions), &ctx);
        let story = self.render_one(pick_pool(cat.map(|c| &c.stories), &t.stories), &ctx);
        let meta = self.render_one(pick_pool(cat.map(|c| &c.meta_descriptions), &t.meta_descriptions), &ctx);
        let seo_description = truncate_with_ellipsis(&meta, SEO_DESCRIPTION_MAX);
        let seo_title = self.title(&ctx);

        SeoContent {
            short_description,
            story,
            seo_title,
            seo_description,
            keywords: self.keywords(&ctx, cat),
            features: self.features(cat),
            use_cases: self.use_cases(cat),
        }
    }

    /// Generates copy for a freshly extracted product and sets its contact
    /// message. Identity fields are left alone.
    pub fn fill(&mut self, product: &mut NormalizedProduct) {
        let content = self.generate(&product.name, &product.category_id);
        content.apply(product);
        product.whatsapp_message = self.brand.contact_message(&product.name);
    }

    fn render_one(&mut self, pool: &[String], ctx: &Context<'_>) -> String {
        match pool.choose(&mut self.rng) {
            Some(tpl) => render(tpl, ctx, &mut self.rng),
            None => ctx.name.to_string(),
        }
    }

    fn title(&mut self, ctx: &Context<'_>) -> String {
        let suffix = match self.templates.title_suffixes.choose(&mut self.rng) {
            Some(s) => render(s, ctx, &mut self.rng),
            None => self.brand.short_name.clone(),
        };
        let title = format!("{} {}", ctx.name, suffix);
        if title.chars().count() <= SEO_TITLE_MAX {
            return title;
        }
        let shorter = format!("{} | {} {}", ctx.name, self.brand.short_name, self.brand.region);
        truncate_with_ellipsis(&shorter, SEO_TITLE_MAX)
    }

    fn keywords(&mut self, ctx: &Context<'_>, cat: Option<&CategoryTemplates>) -> Vec<String> {
        let name = ctx.name.to_lowercase();
        let region = self.brand.region.to_lowercase();
        let mut out = vec![
            name.clone(),
            format!("{name} personalizado"),
            format!("{name} {region}"),
            ctx.category.to_lowercase(),
        ];
        if let Some(c) = cat {
            out.extend(c.keywords.iter().cloned());
        }
        out.extend(self.templates.base_keywords.iter().cloned());

        let mut seen = std::collections::HashSet::new();
        out.retain(|k| !k.trim().is_empty() && seen.insert(k.clone()));
        out.truncate(MAX_KEYWORDS);
        out
    }

    fn features(&mut self, cat: Option<&CategoryTemplates>) -> Vec<String> {
        let mut out: Vec<String> = self
            .templates
            .generic_features
            .choose_multiple(&mut self.rng, FEATURE_GENERIC_PICKS)
            .cloned()
            .collect();
        if let Some(c) = cat {
            out.extend(
                c.features
                    .choose_multiple(&mut self.rng, FEATURE_SPECIFIC_PICKS)
                    .cloned(),
            );
        }
        out.truncate(MAX_FEATURES);
        out
    }

    fn use_cases(&mut self, cat: Option<&CategoryTemplates>) -> Vec<String> {
        match cat {
            Some(c) if !c.use_cases.is_empty() => c.use_cases.clone(),
            _ => self
                .templates
                .generic_use_cases
                .choose_multiple(&mut self.rng, USE_CASE_PICKS)
                .cloned()
                .collect(),
        }
    }
}

struct Context<'a> {
    name: &'a str,
    category: String,
    brand: &'a BrandConfig,
    terms: &'a TermPools,
}

fn render<R: Rng>(template: &str, ctx: &Context<'_>, rng: &mut R) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            let upper = key.starts_with(|c: char| c.is_ascii_uppercase());
            let value = match key.to_ascii_lowercase().as_str() {
                "name" => return ctx.name.to_string(),
                "category" => ctx.category.to_lowercase(),
                "region" => return ctx.brand.region.clone(),
                "store" => return ctx.brand.store_name.clone(),
                "short" => return ctx.brand.short_name.clone(),
                "trust" => pick(&ctx.terms.trust, rng),
                "custom" => pick(&ctx.terms.custom, rng),
                "use_case" => pick(&ctx.terms.use_case, rng),
                "benefit" => pick(&ctx.terms.benefit, rng),
                "city" => pick(&ctx.terms.city, rng),
                _ => return caps[0].to_string(),
            };
            if upper { capitalize_first(&value) } else { value }
        })
        .into_owned()
}

fn pick<R: Rng>(pool: &[String], rng: &mut R) -> String {
    pool.choose(rng).cloned().unwrap_or_default()
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for TermPools {
    fn default() -> Self {
        Self {
            trust: strings(&[
                "calidad premium",
                "materiales de primera",
                "durabilidad garantizada",
                "acabado profesional",
                "resistente y funcional",
                "diseño moderno",
                "alta calidad",
            ]),
            custom: strings(&[
                "personalizado con tu logo",
                "impresión de alta calidad",
                "personalizable a tu medida",
                "con tu marca",
                "diseño exclusivo",
                "personalización profesional",
                "grabado láser disponible",
                "serigrafía de calidad",
            ]),
            use_case: strings(&[
                "eventos corporativos",
                "ferias comerciales",
                "campañas publicitarias",
                "regalos empresariales",
                "merchandising de marca",
                "activaciones de marca",
                "convenciones",
                "lanzamientos de producto",
            ]),
            benefit: strings(&[
                "aumenta el reconocimiento de tu marca",
                "genera recordación en tus clientes",
                "fortalece tu imagen corporativa",
                "destaca en eventos",
                "fideliza a tus clientes",
            ]),
            city: strings(&["Quito", "Guayaquil", "Cuenca", "todo Ecuador"]),
        }
    }
}

fn category(
    short: &[&str],
    meta: &[&str],
    features: &[&str],
    use_cases: &[&str],
    keywords: &[&str],
) -> CategoryTemplates {
    CategoryTemplates {
        short_descriptions: strings(short),
        stories: Vec::new(),
        meta_descriptions: strings(meta),
        features: strings(features),
        use_cases: strings(use_cases),
        keywords: strings(keywords),
    }
}

impl Default for SeoTemplates {
    fn default() -> Self {
        let mut by_category = BTreeMap::new();
        by_category.insert(
            "articulos-escritura".to_string(),
            category(
                &[
                    "{name} {custom}. Escritura suave para {use_case} en {region}.",
                    "Bolígrafo promocional {name}: {trust} y tu logo siempre a la vista.",
                ],
                &["{name} con logo. Escritura suave y tinta duradera. Envíos en {region}. ¡Cotiza!"],
                &["Tinta de secado rápido", "Grip ergonómico", "Punta fina", "Recargable"],
                &["Regalos corporativos", "Eventos empresariales", "Ferias comerciales", "Detalles ejecutivos"],
                &["boligrafos personalizados"],
            ),
        );
        by_category.insert(
            "mugs-vasos-termos".to_string(),
            category(
                &["{name} {custom}. Mantiene tus bebidas y tu marca presentes en {city}."],
                &["{name} personalizado. {Trust}. Ideal para oficinas y eventos en {region}. ¡Cotiza!"],
                &["Mantiene temperatura por 12h", "Acero inoxidable", "Libre de BPA", "Tapa hermética"],
                &[],
                &["termos personalizados", "mugs con logo"],
            ),
        );
        by_category.insert(
            "tecnologia".to_string(),
            category(
                &["{name} {custom}. Tecnología útil que {benefit}."],
                &[],
                &["Compatible con múltiples dispositivos", "Incluye cable USB", "Batería de larga duración", "Diseño ergonómico"],
                &["Eventos tech", "Regalos premium", "Campañas digitales", "Fidelización"],
                &["gadgets corporativos"],
            ),
        );
        by_category.insert(
            "memorias-usb".to_string(),
            category(
                &[],
                &[],
                &["USB 2.0/3.0", "Capacidades desde 4GB", "Carga de archivos corporativos"],
                &["Eventos tech", "Entrega de catálogos", "Ferias comerciales", "Fidelización"],
                &["memorias usb personalizadas"],
            ),
        );
        by_category.insert(
            "oficina".to_string(),
            category(
                &[],
                &[],
                &["Papel de alta calidad", "Hojas rayadas/cuadriculadas", "Espiral resistente", "Tamaño A4/A5"],
                &["Merchandising corporativo", "Onboarding empleados", "Material de oficina", "Eventos"],
                &["articulos de oficina promocionales"],
            ),
        );
        by_category.insert(
            "textiles".to_string(),
            category(
                &[],
                &[],
                &["100% algodón", "Tallas disponibles: S a XXL", "Lavable en máquina", "Colores variados"],
                &[],
                &["camisetas personalizadas"],
            ),
        );
        by_category.insert(
            "bolsos-mochilas".to_string(),
            category(
                &[],
                &[],
                &["Múltiples compartimentos", "Correas ajustables", "Cierre de seguridad", "Resistente al agua"],
                &[],
                &["mochilas personalizadas"],
            ),
        );
        by_category.insert(
            "llaveros".to_string(),
            category(
                &[],
                &[],
                &["Anilla de metal resistente", "Diseño compacto", "Grabado láser disponible", "Variedad de formas"],
                &[],
                &[],
            ),
        );
        by_category.insert(
            "ecologicos".to_string(),
            category(
                &["{name} ecológico {custom}. Una forma responsable de que tu marca {benefit}."],
                &[],
                &["Material reciclado", "Biodegradable", "Libre de plásticos", "Certificación ecológica"],
                &[],
                &["productos ecologicos promocionales"],
            ),
        );

        Self {
            short_descriptions: strings(&[
                "{name} {custom}. {Trust} ideal para {use_case}.",
                "Descubre {name}, {trust}. {Custom} para {use_case} en {region}.",
                "{name} promocional que {benefit}. {Custom}.",
                "Compra {name} {custom}. Perfecto para {use_case} y {use_case}.",
                "{name} de {trust} con {custom}. Ideal para empresas en {city}.",
            ]),
            stories: strings(&[
                "{name} es la elección perfecta para empresas que buscan algo que {benefit}. Su {trust} lo convierte en un regalo memorable que tus clientes apreciarán y usarán constantemente.",
                "Con {name}, tu marca estará presente en el día a día de tus clientes. Este producto combina funcionalidad y estilo, con {custom} que garantiza máxima visibilidad para tu empresa.",
                "Diseñado para {use_case}, {name} destaca por su {trust} y versatilidad. La personalización asegura que tu logo luzca impecable en cada uso.",
                "{name} transforma cada interacción en una oportunidad de marca. Su diseño cuidadosamente pensado y {trust} lo hacen ideal para empresas que valoran la calidad en sus regalos promocionales.",
                "Más que un artículo promocional, {name} es una inversión en la recordación de tu marca. Fabricado con {trust}, ofrece {custom} que impacta y perdura.",
            ]),
            meta_descriptions: strings(&[
                "{name} personalizado con logo en {region}. {Trust}. ¡Cotiza por WhatsApp!",
                "{name} {custom}. Ideal para empresas. Envíos en {region}. ¡Cotiza ya!",
                "Compra {name} promocional. {Trust}. Envíos en {region}. ¡Cotiza ahora!",
                "{name} con tu logo. {Benefit}. ¡Pide cotización por WhatsApp!",
                "{name} personalizado {region}. {Trust}. Envíos rápidos. ¡Cotiza!",
            ]),
            title_suffixes: strings(&[
                "Personalizado | {short} {region}",
                "con Logo | {short} {region}",
                "{region} | {store}",
                "Promocional | {short}",
                "{region} | {short}",
            ]),
            generic_features: strings(&[
                "Impresión de alta calidad",
                "Personalización con tu logo",
                "Diseño moderno y funcional",
                "Materiales de calidad premium",
                "Múltiples opciones de personalización",
                "Uso prolongado y duradero",
                "Acabado profesional",
                "Disponible en varios colores",
            ]),
            generic_use_cases: strings(&[
                "Regalos corporativos",
                "Eventos de networking",
                "Ferias comerciales",
                "Campañas publicitarias",
                "Activaciones de marca",
                "Convenciones",
                "Lanzamientos de producto",
            ]),
            base_keywords: strings(&[
                "regalo corporativo",
                "articulo promocional",
                "merchandising",
                "personalizado con logo",
            ]),
            terms: TermPools::default(),
            by_category,
        }
    }
}
