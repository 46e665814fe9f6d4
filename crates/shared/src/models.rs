use serde::{Deserialize, Serialize};

/// A product record as extracted from a listing page, before it has an id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapedToy {
    pub name: String,
    pub price: f64,
    /// Label of the category page the record was scraped from.
    pub category: String,
    pub age_range: Option<String>,
    pub brand: Option<String>,
    pub url: String,
    pub image_url: Option<String>,
}

/// A stored catalog row. Everything except name and price is nullable in the
/// table, so the optional fields stay optional here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Toy {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub category: Option<String>,
    pub age_range: Option<String>,
    pub brand: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

/// Flat filter set for catalog searches. `None` means "don't filter on this".
#[derive(Debug, Clone, Default)]
pub struct ToyFilter {
    pub category: Option<String>,
    pub age_range: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// Sort orders the catalog form can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

impl SortOrder {
    /// Parse the form parameter value. Unknown values fall back to the
    /// default ordering rather than erroring.
    pub fn from_param(s: &str) -> Self {
        match s {
            "price_desc" => SortOrder::PriceDesc,
            "name_asc" => SortOrder::NameAsc,
            "name_desc" => SortOrder::NameDesc,
            _ => SortOrder::PriceAsc,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::PriceAsc => "price_asc",
            SortOrder::PriceDesc => "price_desc",
            SortOrder::NameAsc => "name_asc",
            SortOrder::NameDesc => "name_desc",
        }
    }

    pub(crate) fn sql(&self) -> &'static str {
        match self {
            SortOrder::PriceAsc => "price ASC",
            SortOrder::PriceDesc => "price DESC",
            SortOrder::NameAsc => "name ASC",
            SortOrder::NameDesc => "name DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_order_round_trips_through_params() {
        for order in [
            SortOrder::PriceAsc,
            SortOrder::PriceDesc,
            SortOrder::NameAsc,
            SortOrder::NameDesc,
        ] {
            assert_eq!(SortOrder::from_param(order.as_param()), order);
        }
    }

    #[test]
    fn unknown_sort_param_falls_back_to_price_asc() {
        assert_eq!(SortOrder::from_param("bogus"), SortOrder::PriceAsc);
        assert_eq!(SortOrder::from_param(""), SortOrder::PriceAsc);
    }
}
