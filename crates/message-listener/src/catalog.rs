//! Parsing of structured backend replies and validation against the catalog.

use database::{product, Database, DatabaseError, Product};
use serde::{Deserialize, Deserializer};

/// Reply sent when the backend names a product the catalog does not have.
pub const PRODUCT_NOT_FOUND_TEXT: &str =
    "No encontramos ese producto en nuestro catálogo. ¿Quieres probar con otro?";

/// Words that confirm a pending product as an order.
pub const AFFIRMATIONS: &[&str] = &["si", "sí", "yes", "confirm", "confirmo"];

/// A product suggestion as the backend writes it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductReply {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "tamano", alias = "tamaño", default)]
    pub size: String,
    #[serde(rename = "precio", default, deserialize_with = "lenient_price")]
    pub price: Option<f64>,
    #[serde(rename = "descripcion", alias = "descripción", default)]
    pub description: Option<String>,
    #[serde(rename = "foto", default)]
    pub photo_url: Option<String>,
    /// Free text the backend wants shown to the customer.
    #[serde(rename = "mensaje", default)]
    pub message: Option<String>,
}

fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Price {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Price>::deserialize(deserializer)? {
        Some(Price::Number(n)) => Some(n),
        Some(Price::Text(s)) => s.trim().trim_start_matches('$').parse().ok(),
        None => None,
    })
}

/// Extract a product suggestion from a backend reply.
///
/// Accepts a fenced json block, a bare object, or an object embedded in
/// surrounding prose. Returns `None` for anything else.
pub fn parse_product_reply(reply: &str) -> Option<ProductReply> {
    candidates(reply)
        .into_iter()
        .filter_map(|candidate| serde_json::from_str::<ProductReply>(candidate).ok())
        .find(|product| !product.name.trim().is_empty())
}

fn candidates(reply: &str) -> Vec<&str> {
    let mut found = Vec::new();

    if let Some(start) = reply.find("```") {
        let after = &reply[start + 3..];
        let body = after.strip_prefix("json").unwrap_or(after);
        if let Some(end) = body.find("```") {
            found.push(body[..end].trim());
        }
    }

    let trimmed = reply.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        found.push(trimmed);
    }

    if let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) {
        if start < end {
            found.push(&reply[start..=end]);
        }
    }

    found
}

/// Result of checking a backend reply against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogOutcome {
    /// The reply carried no product; send it as is.
    Unstructured,
    /// The product exists. Values come from the catalog.
    Validated {
        product: Product,
        /// Whether the backend's price, description or photo disagreed.
        corrected: bool,
        message: Option<String>,
    },
    /// The backend named a product the catalog does not have.
    NotFound { name: String, size: String },
}

impl CatalogOutcome {
    /// Text to send to the customer for this outcome.
    pub fn reply_text(&self, raw: &str) -> String {
        match self {
            CatalogOutcome::Unstructured => raw.to_string(),
            CatalogOutcome::NotFound { .. } => PRODUCT_NOT_FOUND_TEXT.to_string(),
            CatalogOutcome::Validated {
                product,
                corrected,
                message,
            } => match message {
                Some(message) if !corrected && !message.trim().is_empty() => message.clone(),
                _ => format_summary(product),
            },
        }
    }
}

/// Validate a backend reply against the catalog by exact name and size.
pub async fn validate(db: &Database, reply: &str) -> Result<CatalogOutcome, DatabaseError> {
    let Some(suggested) = parse_product_reply(reply) else {
        return Ok(CatalogOutcome::Unstructured);
    };

    let name = suggested.name.trim();
    let size = suggested.size.trim();

    let Some(product) = product::find_product(db.pool(), name, size).await? else {
        tracing::info!(name, size, "Backend suggested a product missing from the catalog");
        return Ok(CatalogOutcome::NotFound {
            name: name.to_string(),
            size: size.to_string(),
        });
    };

    let corrected = differs(suggested.price, Some(product.price), |a, b| {
        (a - b).abs() > f64::EPSILON
    }) || differs(
        suggested.description.as_deref(),
        product.description.as_deref(),
        |a, b| a.trim() != b.trim(),
    ) || differs(
        suggested.photo_url.as_deref(),
        product.photo_url.as_deref(),
        |a, b| a.trim() != b.trim(),
    );

    if corrected {
        tracing::info!(product_id = product.id, "Corrected backend product details from catalog");
    }

    Ok(CatalogOutcome::Validated {
        product,
        corrected,
        message: suggested.message,
    })
}

// A value the backend left out is not a disagreement.
fn differs<T: Copy>(suggested: Option<T>, actual: Option<T>, ne: impl Fn(T, T) -> bool) -> bool {
    match (suggested, actual) {
        (Some(s), Some(a)) => ne(s, a),
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Customer-facing summary of a catalog product.
pub fn format_summary(product: &Product) -> String {
    let mut summary = format!("{} ({}): ${:.2}", product.name, product.size, product.price);
    if let Some(description) = product.description.as_deref().filter(|d| !d.is_empty()) {
        summary.push('\n');
        summary.push_str(description);
    }
    summary
}

/// Whether the customer's text confirms a pending product.
pub fn is_affirmation(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    let first = lowered
        .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .find(|word| !word.is_empty())
        .unwrap_or_default();
    AFFIRMATIONS.contains(&first)
}
