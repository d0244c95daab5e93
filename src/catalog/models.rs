use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use utoipa::ToSchema;
use uuid::Uuid;

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerSize {
    Small,
    #[default]
    Medium,
    Large,
    ExtraLarge,
    Custom,
}

impl ContainerSize {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Small => "SMALL",
            Self::Medium => "MEDIUM",
            Self::Large => "LARGE",
            Self::ExtraLarge => "EXTRA_LARGE",
            Self::Custom => "CUSTOM",
        }
    }

    pub(crate) fn from_db(value: &str) -> Result<Self, sqlx::Error> {
        match value {
            "SMALL" => Ok(Self::Small),
            "MEDIUM" => Ok(Self::Medium),
            "LARGE" => Ok(Self::Large),
            "EXTRA_LARGE" => Ok(Self::ExtraLarge),
            "CUSTOM" => Ok(Self::Custom),
            _ => Err(sqlx::Error::Decode(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid containers.size value: {value}"),
            )))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Specification {
    pub name: String,
    pub value: String,
}

/// A container listing as stored and served.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(rename = "price", serialize_with = "serialize_cents")]
    #[schema(value_type = f64)]
    pub price_cents: i64,
    pub images: Vec<String>,
    pub size: ContainerSize,
    pub condition: String,
    pub location: String,
    pub is_available: bool,
    pub supplier_id: Option<String>,
    pub manufacturer_info: Option<String>,
    pub year_manufactured: Option<i32>,
    pub specifications: Vec<Specification>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload as the admin dashboard sends it.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContainerInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub size: ContainerSize,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub location: String,
    pub is_available: Option<bool>,
    pub supplier_id: Option<String>,
    pub manufacturer_info: Option<String>,
    pub year_manufactured: Option<i32>,
    #[serde(default)]
    pub specifications: Vec<Specification>,
}

/// Validated field set ready for the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerFields {
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub images: Vec<String>,
    pub size: ContainerSize,
    pub condition: String,
    pub location: String,
    pub is_available: bool,
    pub supplier_id: Option<String>,
    pub manufacturer_info: Option<String>,
    pub year_manufactured: Option<i32>,
    pub specifications: Vec<Specification>,
}

impl ContainerInput {
    /// Check the payload and convert it into storable fields.
    ///
    /// # Errors
    /// Returns a message suitable for a `400` response.
    pub fn validate(self) -> Result<ContainerFields, String> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err("Title is required".to_string());
        }

        let price_cents = price_to_cents(self.price)?;

        if let Some(year) = self.year_manufactured {
            if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                return Err(format!(
                    "Year manufactured must be between {MIN_YEAR} and {MAX_YEAR}"
                ));
            }
        }

        let mut specifications = Vec::with_capacity(self.specifications.len());
        for spec in self.specifications {
            let name = spec.name.trim();
            let value = spec.value.trim();
            if name.is_empty() || value.is_empty() {
                return Err("Specification name and value are required".to_string());
            }
            specifications.push(Specification {
                name: name.to_string(),
                value: value.to_string(),
            });
        }

        Ok(ContainerFields {
            title,
            description: self.description.trim().to_string(),
            price_cents,
            images: self
                .images
                .into_iter()
                .map(|image| image.trim().to_string())
                .filter(|image| !image.is_empty())
                .collect(),
            size: self.size,
            condition: self.condition.trim().to_string(),
            location: self.location.trim().to_string(),
            is_available: self.is_available.unwrap_or(true),
            supplier_id: non_empty(self.supplier_id),
            manufacturer_info: non_empty(self.manufacturer_info),
            year_manufactured: self.year_manufactured,
            specifications,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Convert a decimal amount into whole cents.
///
/// # Errors
/// Rejects negative, non-finite and out-of-range amounts.
#[allow(clippy::cast_possible_truncation)]
pub fn price_to_cents(price: f64) -> Result<i64, String> {
    if !price.is_finite() || price < 0.0 {
        return Err("Price must be a non-negative number".to_string());
    }
    let cents = (price * 100.0).round();
    // f64 can represent every cent value we accept exactly below 2^53.
    if cents > 9_007_199_254_740_992.0 {
        return Err("Price is too large".to_string());
    }
    Ok(cents as i64)
}

#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn cents_to_price(cents: i64) -> f64 {
    cents as f64 / 100.0
}

pub(crate) fn serialize_cents<S: Serializer>(cents: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(cents_to_price(*cents))
}
