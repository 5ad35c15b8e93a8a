//! Admin command-line surface over the catalog store.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::eyre;
use color_eyre::Result;

use crate::cache::{SnapshotCache, SqliteLocal};
use crate::catalog::{
  CatalogStore, Company, CompanyDraft, CompanyPatch, Product, ProductDraft, ProductFilter,
  ProductPatch,
};
use crate::config::Config;
use crate::connectivity;
use crate::remote::SupabaseRemote;
use crate::seed;

#[derive(Parser, Debug)]
#[command(name = "vitrina")]
#[command(about = "Offline-first admin CLI for the vitrina storefront catalog")]
#[command(version)]
pub struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/vitrina/config.yaml)
  #[arg(short, long)]
  pub config: Option<PathBuf>,

  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// List companies
  Companies,
  /// Show one company and its products
  Company { id: String },
  /// Add a company
  AddCompany {
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    logo: Option<String>,
  },
  /// Update fields of a company
  UpdateCompany {
    id: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    logo: Option<String>,
    /// Clear the stored logo
    #[arg(long, conflicts_with = "logo")]
    clear_logo: bool,
  },
  /// Delete a company (refused while products reference it)
  DeleteCompany { id: String },
  /// List products, optionally filtered
  Products {
    #[arg(long)]
    company: Option<String>,
    /// Only products with stock remaining
    #[arg(long)]
    in_stock: bool,
    /// Keep products carrying at least one of these tags
    #[arg(long)]
    tag: Vec<String>,
    #[arg(long)]
    min_price: Option<f64>,
    #[arg(long)]
    max_price: Option<f64>,
    /// Free-text search over name, description and tags
    #[arg(long)]
    search: Option<String>,
  },
  /// Show one product
  Product { id: String },
  /// Add a product
  AddProduct {
    #[arg(long)]
    name: String,
    /// Id of the owning company
    #[arg(long)]
    company: String,
    #[arg(long)]
    price: String,
    #[arg(long)]
    stock: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    photo: Vec<String>,
    #[arg(long)]
    tag: Vec<String>,
    /// Spec entries as name=value
    #[arg(long, value_parser = parse_spec_entry)]
    spec: Vec<(String, String)>,
  },
  /// Update fields of a product
  UpdateProduct {
    id: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    company: Option<String>,
    #[arg(long)]
    price: Option<String>,
    #[arg(long)]
    stock: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// Replace the photo list
    #[arg(long)]
    photo: Option<Vec<String>>,
    /// Replace the tag list
    #[arg(long)]
    tag: Option<Vec<String>>,
    /// Replace the spec table with name=value entries
    #[arg(long, value_parser = parse_spec_entry)]
    spec: Option<Vec<(String, String)>>,
  },
  /// Delete a product
  DeleteProduct { id: String },
  /// Catalog statistics
  Stats,
  /// Replay queued offline writes
  Sync {
    /// Keep running and reconcile whenever connectivity returns
    #[arg(long)]
    watch: bool,
  },
  /// Clear the local cache and reload from the remote store
  Refresh,
  /// Populate sample companies and products
  Seed,
  /// Export the catalog as JSON
  Export {
    /// Write to a file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
  },
  /// Import a JSON bundle (local only; the next refresh reconciles)
  Import { file: PathBuf },
  /// Drop the local snapshots
  Reset,
}

fn parse_spec_entry(raw: &str) -> Result<(String, String), String> {
  raw
    .split_once('=')
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .ok_or_else(|| format!("expected name=value, got `{raw}`"))
}

/// Wire up the store from configuration and dispatch one subcommand.
pub async fn run(args: Args) -> Result<()> {
  let config = Config::load(args.config.as_deref())?;
  let api_key = Config::api_key()?;

  let remote = Arc::new(SupabaseRemote::new(&config.remote.url, &api_key)?);
  let local = match config.local_db_path() {
    Some(path) => SqliteLocal::open_at(&path)?,
    None => SqliteLocal::open()?,
  };
  let cache = SnapshotCache::new(Arc::new(local));
  let store = Arc::new(CatalogStore::new(remote, cache));

  // Establish connectivity before loading, then flush anything a previous
  // offline session left queued.
  let online = connectivity::probe(&config.remote.url).await;
  if !online {
    store.go_offline();
  }
  store.init().await;
  if online {
    store.sync_pending().await;
  }

  dispatch(args.command, &config, store).await
}

async fn dispatch(command: Command, config: &Config, store: Arc<CatalogStore>) -> Result<()> {
  match command {
    Command::Companies => {
      for company in store.companies() {
        print_company_line(&company, store.products_by_company(&company.id).len());
      }
    }

    Command::Company { id } => {
      let Some(company) = store.company_by_id(&id) else {
        return Err(eyre!("No company with id {id}"));
      };
      println!("{}  {}", company.id, company.name);
      if !company.description.is_empty() {
        println!("  {}", company.description);
      }
      if let Some(logo) = &company.logo {
        println!("  logo: {logo}");
      }
      for product in store.products_by_company(&id) {
        print_product_line(&store, &product);
      }
    }

    Command::AddCompany { name, description, logo } => {
      let company = store.add_company(CompanyDraft { name, description, logo }).await?;
      println!("Added company {} ({})", company.name, company.id);
    }

    Command::UpdateCompany { id, name, description, logo, clear_logo } => {
      let patch = CompanyPatch {
        name,
        description,
        logo: if clear_logo { Some(None) } else { logo.map(Some) },
      };
      match store.update_company(&id, patch).await? {
        Some(company) => println!("Updated company {} ({})", company.name, company.id),
        None => return Err(eyre!("No company with id {id}")),
      }
    }

    Command::DeleteCompany { id } => {
      if store.delete_company(&id).await? {
        println!("Deleted company {id}");
      } else {
        return Err(eyre!("No company with id {id}"));
      }
    }

    Command::Products { company, in_stock, tag, min_price, max_price, search } => {
      let filter = ProductFilter {
        company,
        min_price,
        max_price,
        in_stock,
        tags: tag,
      };
      let mut products = store.filter_products(&filter);
      if let Some(query) = search {
        products.retain(|p| crate::catalog::matches_search(p, &query));
      }
      for product in products {
        print_product_line(&store, &product);
      }
    }

    Command::Product { id } => {
      let Some(product) = store.product_by_id(&id) else {
        return Err(eyre!("No product with id {id}"));
      };
      print_product_line(&store, &product);
      if !product.description.is_empty() {
        println!("  {}", product.description);
      }
      for photo in &product.photos {
        println!("  photo: {photo}");
      }
      if !product.tags.is_empty() {
        println!("  tags: {}", product.tags.join(", "));
      }
      for (key, value) in &product.specs {
        println!("  {key}: {value}");
      }
    }

    Command::AddProduct { name, company, price, stock, description, photo, tag, spec } => {
      let draft = ProductDraft {
        name,
        company,
        price: Some(price),
        stock: Some(stock),
        description,
        photos: photo,
        tags: tag,
        specs: spec.into_iter().collect(),
      };
      let product = store.add_product(draft).await?;
      println!("Added product {} ({})", product.name, product.id);
    }

    Command::UpdateProduct { id, name, company, price, stock, description, photo, tag, spec } => {
      let patch = ProductPatch {
        name,
        company,
        price,
        stock,
        description,
        photos: photo,
        tags: tag,
        specs: spec.map(|entries| entries.into_iter().collect()),
      };
      match store.update_product(&id, patch).await? {
        Some(product) => println!("Updated product {} ({})", product.name, product.id),
        None => return Err(eyre!("No product with id {id}")),
      }
    }

    Command::DeleteProduct { id } => {
      if store.delete_product(&id).await? {
        println!("Deleted product {id}");
      } else {
        return Err(eyre!("No product with id {id}"));
      }
    }

    Command::Stats => {
      let stats = store.stats();
      println!("Products:     {}", stats.total_products);
      println!("Companies:    {}", stats.total_companies);
      println!("In stock:     {}", stats.in_stock_products);
      println!("Out of stock: {}", stats.out_of_stock_products);
      println!("Total value:  {}", stats.total_value);
      let pending = store.pending_ops();
      if pending > 0 {
        println!("Pending sync: {pending}");
      }
    }

    Command::Sync { watch } => {
      store.sync_pending().await;
      let pending = store.pending_ops();
      if pending > 0 {
        println!("{pending} operation(s) still pending");
      } else {
        println!("Sync queue empty");
      }
      if watch {
        connectivity::run_monitor(config.remote.url.clone(), store).await;
      }
    }

    Command::Refresh => {
      store.flag_force_refresh()?;
      store.init().await;
      println!(
        "Reloaded {} companies and {} products",
        store.companies().len(),
        store.products().len()
      );
    }

    Command::Seed => {
      let summary = seed::populate(&store).await;
      println!("Seeded {} companies and {} products", summary.companies, summary.products);
    }

    Command::Export { out } => {
      let bundle = store.export_bundle();
      let json = serde_json::to_string_pretty(&bundle)?;
      match out {
        Some(path) => {
          std::fs::write(&path, json)?;
          println!(
            "Exported {} companies and {} products to {}",
            bundle.companies.len(),
            bundle.products.len(),
            path.display()
          );
        }
        None => println!("{json}"),
      }
    }

    Command::Import { file } => {
      let contents = std::fs::read_to_string(&file)
        .map_err(|e| eyre!("Failed to read bundle {}: {}", file.display(), e))?;
      let bundle = serde_json::from_str(&contents)
        .map_err(|e| eyre!("Failed to parse bundle {}: {}", file.display(), e))?;
      store.import_bundle(bundle);
      println!(
        "Imported {} companies and {} products",
        store.companies().len(),
        store.products().len()
      );
    }

    Command::Reset => {
      store.reset_local();
      println!("Local snapshots dropped");
    }
  }

  Ok(())
}

fn print_company_line(company: &Company, product_count: usize) {
  println!("{}  {}  ({} products)", company.id, company.name, product_count);
}

fn print_product_line(store: &CatalogStore, product: &Product) {
  // fall back to the raw id when the referenced company is unknown
  let company = store
    .company_by_id(&product.company)
    .map(|c| c.name)
    .unwrap_or_else(|| product.company.clone());
  println!(
    "{}  {}  {:.2}  stock {}  [{}]",
    product.id, product.name, product.price, product.stock, company
  );
}
