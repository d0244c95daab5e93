//! Admin table search over container listings.

use uuid::Uuid;

use super::models::{Container, price_to_cents};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    All,
    Id(Uuid),
    Price(i64),
    Text(String),
}

impl SearchTerm {
    /// Classify a raw query: ids first, then prices, then free text.
    ///
    /// Only a whole term that is a non-negative finite number is a price, so
    /// `20ft` and `-5` search as text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let term = raw.trim();
        if term.is_empty() {
            return Self::All;
        }
        if let Ok(id) = Uuid::parse_str(term) {
            return Self::Id(id);
        }
        if let Some(cents) = term
            .parse::<f64>()
            .ok()
            .and_then(|price| price_to_cents(price).ok())
        {
            return Self::Price(cents);
        }
        Self::Text(term.to_lowercase())
    }

    #[must_use]
    pub fn matches(&self, container: &Container) -> bool {
        match self {
            Self::All => true,
            Self::Id(id) => container.id == *id,
            Self::Price(cents) => container.price_cents == *cents,
            Self::Text(needle) => {
                container.title.to_lowercase().contains(needle)
                    || container.size.as_str().to_lowercase().contains(needle)
            }
        }
    }
}

#[must_use]
pub fn search(containers: Vec<Container>, raw: &str) -> Vec<Container> {
    let term = SearchTerm::parse(raw);
    containers
        .into_iter()
        .filter(|container| term.matches(container))
        .collect()
}
