use super::types::Product;

/// Criteria for narrowing the product list. Every present field must match;
/// an empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
  pub company: Option<String>,
  pub min_price: Option<f64>,
  pub max_price: Option<f64>,
  pub in_stock: bool,
  /// Any-of match: the product needs at least one of these tags.
  pub tags: Vec<String>,
}

impl ProductFilter {
  pub fn matches(&self, product: &Product) -> bool {
    if let Some(company) = &self.company {
      if &product.company != company {
        return false;
      }
    }
    if let Some(min) = self.min_price {
      if product.price < min {
        return false;
      }
    }
    if let Some(max) = self.max_price {
      if product.price > max {
        return false;
      }
    }
    if self.in_stock && product.stock <= 0 {
      return false;
    }
    if !self.tags.is_empty() && !self.tags.iter().any(|t| product.tags.contains(t)) {
      return false;
    }
    true
  }
}

/// Case-insensitive substring search over name, description and tags.
pub fn matches_search(product: &Product, query: &str) -> bool {
  let query = query.to_lowercase();
  product.name.to_lowercase().contains(&query)
    || product.description.to_lowercase().contains(&query)
    || product.tags.iter().any(|t| t.to_lowercase().contains(&query))
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn product(name: &str, company: &str, price: f64, stock: i64, tags: &[&str]) -> Product {
    Product {
      id: format!("id_{name}"),
      name: name.into(),
      company: company.into(),
      price,
      stock,
      description: String::new(),
      photos: Vec::new(),
      tags: tags.iter().map(|t| t.to_string()).collect(),
      specs: Default::default(),
      created_at: Utc::now(),
      updated_at: None,
    }
  }

  #[test]
  fn test_empty_filter_matches_everything() {
    let p = product("widget", "c1", 10.0, 0, &[]);
    assert!(ProductFilter::default().matches(&p));
  }

  #[test]
  fn test_price_bounds_are_inclusive() {
    let p = product("widget", "c1", 10.0, 1, &[]);
    let filter = ProductFilter {
      min_price: Some(10.0),
      max_price: Some(10.0),
      ..Default::default()
    };
    assert!(filter.matches(&p));
    assert!(!ProductFilter { min_price: Some(10.01), ..Default::default() }.matches(&p));
    assert!(!ProductFilter { max_price: Some(9.99), ..Default::default() }.matches(&p));
  }

  #[test]
  fn test_in_stock_requires_positive_stock() {
    let filter = ProductFilter { in_stock: true, ..Default::default() };
    assert!(!filter.matches(&product("gone", "c1", 5.0, 0, &[])));
    // negative stock can arrive through an imported bundle or a foreign row
    assert!(!filter.matches(&product("owed", "c1", 5.0, -2, &[])));
    assert!(filter.matches(&product("left", "c1", 5.0, 2, &[])));
  }

  #[test]
  fn test_tags_match_any() {
    let p = product("widget", "c1", 10.0, 1, &["audio", "portable"]);
    let filter = ProductFilter { tags: vec!["portable".into(), "video".into()], ..Default::default() };
    assert!(filter.matches(&p));
    let filter = ProductFilter { tags: vec!["video".into()], ..Default::default() };
    assert!(!filter.matches(&p));
  }

  #[test]
  fn test_search_is_case_insensitive_across_fields() {
    let mut p = product("Smart Speaker", "c1", 10.0, 1, &["Audio"]);
    p.description = "Voice controlled".into();
    assert!(matches_search(&p, "speaker"));
    assert!(matches_search(&p, "VOICE"));
    assert!(matches_search(&p, "audio"));
    assert!(!matches_search(&p, "camera"));
  }
}
