//! Sample catalog data for bootstrapping a fresh deployment.

use tracing::{info, warn};

use crate::catalog::{CatalogStore, CompanyDraft, ProductDraft};

/// Outcome of a populate run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
  pub companies: usize,
  pub products: usize,
}

struct SeedCompany {
  name: &'static str,
  description: &'static str,
}

struct SeedProduct {
  name: &'static str,
  /// Index into [`COMPANIES`].
  company: usize,
  price: &'static str,
  stock: &'static str,
  description: &'static str,
  photo: &'static str,
}

const COMPANIES: &[SeedCompany] = &[
  SeedCompany {
    name: "TechCorp",
    description: "Leading technology solutions provider specializing in innovative software and hardware products.",
  },
  SeedCompany {
    name: "StyleHub",
    description: "Premium fashion and lifestyle brand offering contemporary clothing and accessories.",
  },
  SeedCompany {
    name: "HomeComfort",
    description: "Quality home and living products designed to enhance your everyday comfort and style.",
  },
  SeedCompany {
    name: "SportMax",
    description: "Professional sports equipment and athletic wear for all fitness levels and activities.",
  },
  SeedCompany {
    name: "GreenLife",
    description: "Eco-friendly products and sustainable solutions for environmentally conscious consumers.",
  },
];

const PRODUCTS: &[SeedProduct] = &[
  SeedProduct {
    name: "Wireless Bluetooth Headphones",
    company: 0,
    price: "89.99",
    stock: "25",
    description: "Premium wireless headphones with noise cancellation and 30-hour battery life.",
    photo: "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=400&h=300&fit=crop",
  },
  SeedProduct {
    name: "Smart Fitness Watch",
    company: 0,
    price: "199.99",
    stock: "15",
    description: "Advanced fitness tracker with heart rate monitoring, GPS, and smartphone integration.",
    photo: "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=400&h=300&fit=crop",
  },
  SeedProduct {
    name: "Portable Power Bank",
    company: 0,
    price: "34.99",
    stock: "50",
    description: "High-capacity 20,000mAh power bank with fast charging and multiple USB ports.",
    photo: "https://images.unsplash.com/photo-1609592806596-b43dafe50b4d?w=400&h=300&fit=crop",
  },
  SeedProduct {
    name: "Classic Leather Jacket",
    company: 1,
    price: "249.99",
    stock: "12",
    description: "Genuine leather jacket with modern cut and premium finishing details.",
    photo: "https://images.unsplash.com/photo-1551028719-00167b16eac5?w=400&h=300&fit=crop",
  },
  SeedProduct {
    name: "Designer Sunglasses",
    company: 1,
    price: "129.99",
    stock: "30",
    description: "Stylish sunglasses with UV protection and polarized lenses.",
    photo: "https://images.unsplash.com/photo-1572635196237-14b3f281503f?w=400&h=300&fit=crop",
  },
  SeedProduct {
    name: "Premium Canvas Backpack",
    company: 1,
    price: "79.99",
    stock: "20",
    description: "Durable canvas backpack with laptop compartment and multiple pockets.",
    photo: "https://images.unsplash.com/photo-1553062407-98eeb64c6a62?w=400&h=300&fit=crop",
  },
  SeedProduct {
    name: "Ceramic Coffee Mug Set",
    company: 2,
    price: "39.99",
    stock: "40",
    description: "Set of 4 handcrafted ceramic mugs perfect for your morning coffee routine.",
    photo: "https://images.unsplash.com/photo-1514228742587-6b1558fcf93a?w=400&h=300&fit=crop",
  },
  SeedProduct {
    name: "Scented Candle Collection",
    company: 2,
    price: "24.99",
    stock: "35",
    description: "Set of 3 premium scented candles with relaxing lavender, vanilla, and eucalyptus fragrances.",
    photo: "https://images.unsplash.com/photo-1602874801006-e26c1c1e3f3d?w=400&h=300&fit=crop",
  },
  SeedProduct {
    name: "Soft Throw Blanket",
    company: 2,
    price: "49.99",
    stock: "18",
    description: "Ultra-soft fleece throw blanket perfect for cozy evenings and home decoration.",
    photo: "https://images.unsplash.com/photo-1586023492125-27b2c045efd7?w=400&h=300&fit=crop",
  },
  SeedProduct {
    name: "Yoga Mat Premium",
    company: 3,
    price: "59.99",
    stock: "22",
    description: "Non-slip premium yoga mat with extra cushioning and carrying strap.",
    photo: "https://images.unsplash.com/photo-1544367567-0f2fcb009e0b?w=400&h=300&fit=crop",
  },
  SeedProduct {
    name: "Resistance Bands Set",
    company: 3,
    price: "29.99",
    stock: "45",
    description: "Complete set of resistance bands with different resistance levels and accessories.",
    photo: "https://images.unsplash.com/photo-1598300042247-d088f8ab3a91?w=400&h=300&fit=crop",
  },
  SeedProduct {
    name: "Water Bottle Insulated",
    company: 3,
    price: "24.99",
    stock: "60",
    description: "Stainless steel insulated water bottle that keeps drinks cold for 24 hours.",
    photo: "https://images.unsplash.com/photo-1602143407151-7111542de6e8?w=400&h=300&fit=crop",
  },
  SeedProduct {
    name: "Bamboo Utensil Set",
    company: 4,
    price: "19.99",
    stock: "55",
    description: "Eco-friendly bamboo utensil set with carrying case, perfect for sustainable dining.",
    photo: "https://images.unsplash.com/photo-1578662996442-48f60103fc96?w=400&h=300&fit=crop",
  },
  SeedProduct {
    name: "Reusable Shopping Bags",
    company: 4,
    price: "14.99",
    stock: "75",
    description: "Set of 3 durable reusable shopping bags made from recycled materials.",
    photo: "https://images.unsplash.com/photo-1573821663912-6df460f9c684?w=400&h=300&fit=crop",
  },
  SeedProduct {
    name: "Solar Phone Charger",
    company: 4,
    price: "69.99",
    stock: "8",
    description: "Portable solar-powered phone charger for eco-friendly mobile charging on the go.",
    photo: "https://images.unsplash.com/photo-1593642532973-d31b6557fa68?w=400&h=300&fit=crop",
  },
];

/// Add the sample companies and products through the normal mutation path,
/// so seeding behaves exactly like admin input (validation, queueing and
/// snapshots included).
///
/// Individual failures are logged and skipped; products whose company could
/// not be created are not attempted.
pub async fn populate(store: &CatalogStore) -> SeedSummary {
  let mut company_ids: Vec<Option<String>> = Vec::with_capacity(COMPANIES.len());
  for company in COMPANIES {
    let draft = CompanyDraft {
      name: company.name.to_string(),
      description: company.description.to_string(),
      logo: None,
    };
    match store.add_company(draft).await {
      Ok(created) => {
        info!(name = company.name, id = %created.id, "seeded company");
        company_ids.push(Some(created.id));
      }
      Err(e) => {
        warn!(name = company.name, error = %e, "failed to seed company");
        company_ids.push(None);
      }
    }
  }

  let mut products = 0usize;
  for product in PRODUCTS {
    let Some(Some(company_id)) = company_ids.get(product.company) else {
      continue;
    };
    let draft = ProductDraft {
      name: product.name.to_string(),
      company: company_id.clone(),
      price: Some(product.price.to_string()),
      stock: Some(product.stock.to_string()),
      description: product.description.to_string(),
      photos: vec![product.photo.to_string()],
      ..Default::default()
    };
    match store.add_product(draft).await {
      Ok(_) => {
        info!(name = product.name, "seeded product");
        products += 1;
      }
      Err(e) => warn!(name = product.name, error = %e, "failed to seed product"),
    }
  }

  SeedSummary {
    companies: company_ids.iter().flatten().count(),
    products,
  }
}
