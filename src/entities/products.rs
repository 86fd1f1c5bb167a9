use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use super::{first_row, row_range, total_of};
use crate::catalog::{FilterOptions, Page};
use crate::error::Error;
use crate::models::{NewProduct, Product, ProductUpdate, Validate};
use crate::postgrest::Counted;
use crate::search_params::SearchState;
use crate::storage::{unique_object_path, FileOptions, StoredFile};
use crate::Marketplace;

pub const PRODUCTS_TABLE: &str = "products";

/// Product columns with the supplier card embedded
pub const PRODUCT_WITH_SUPPLIER: &str =
    "*,supplier:users!supplier_id(id,business_name,full_name,phone,whatsapp,email,city,logo_url,is_verified)";

const INCREMENT_VIEWS: &str = "increment_product_views";

/// Repository for the `products` table
pub struct Products<'a> {
    market: &'a Marketplace,
}

impl<'a> Products<'a> {
    pub(crate) fn new(market: &'a Marketplace) -> Self {
        Self { market }
    }

    /// Every active product, newest first
    pub async fn list_active(&self) -> Result<Vec<Product>, Error> {
        self.market
            .from(PRODUCTS_TABLE)
            .await?
            .select(PRODUCT_WITH_SUPPLIER)
            .eq("is_active", true)
            .order("created_at", false)
            .execute()
            .await
    }

    /// A supplier's products; hidden ones only for the supplier's own dashboard
    pub async fn by_supplier(
        &self,
        supplier_id: &str,
        include_hidden: bool,
    ) -> Result<Vec<Product>, Error> {
        let mut query = self
            .market
            .from(PRODUCTS_TABLE)
            .await?
            .select(PRODUCT_WITH_SUPPLIER)
            .eq("supplier_id", supplier_id);
        if !include_hidden {
            query = query.eq("is_active", true);
        }
        query.order("created_at", false).execute().await
    }

    /// Products by id, in no particular order; used for the favorites page
    pub async fn by_ids(&self, ids: &[String]) -> Result<Vec<Product>, Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.market
            .from(PRODUCTS_TABLE)
            .await?
            .select(PRODUCT_WITH_SUPPLIER)
            .in_list("id", ids)
            .execute()
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Product, Error> {
        self.market
            .from(PRODUCTS_TABLE)
            .await?
            .select(PRODUCT_WITH_SUPPLIER)
            .eq("id", id)
            .maybe_single()
            .await?
            .ok_or_else(|| Error::not_found(format!("product {id}")))
    }

    /// One server-side page for the admin list, with the exact total
    pub async fn admin_page(&self, page: usize, page_size: usize) -> Result<Page<Product>, Error> {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let (from, to) = row_range(page, page_size);

        let counted: Counted<Product> = self
            .market
            .from(PRODUCTS_TABLE)
            .await?
            .select(PRODUCT_WITH_SUPPLIER)
            .order("created_at", false)
            .range(from, to)
            .execute_counted()
            .await?;

        let total_items = total_of(&counted);
        Ok(Page {
            items: counted.rows,
            page,
            page_size,
            total_items,
            total_pages: crate::catalog::total_pages(total_items, page_size),
        })
    }

    /// The browse/search screen: fetch active products and run the catalog pipeline
    pub async fn search(
        &self,
        state: &SearchState,
        options: &FilterOptions,
        now: DateTime<Utc>,
    ) -> Result<Page<Product>, Error> {
        let products = self.list_active().await?;
        Ok(self.market.catalog().products_for(&products, state, options, now))
    }

    pub async fn create(&self, product: &NewProduct) -> Result<Product, Error> {
        product.validate()?;
        let rows = self
            .market
            .from(PRODUCTS_TABLE)
            .await?
            .insert(product)
            .execute()
            .await?;
        let created: Product = first_row(rows, "product insert")?;
        info!(product = %created.id, supplier = %created.supplier_id, "product created");
        Ok(created)
    }

    pub async fn update(&self, id: &str, changes: &ProductUpdate) -> Result<Product, Error> {
        changes.validate()?;
        let rows = self
            .market
            .from(PRODUCTS_TABLE)
            .await?
            .update(changes)
            .eq("id", id)
            .execute()
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("product {id}")))
    }

    /// Hide or show a product without deleting it
    pub async fn set_active(&self, id: &str, active: bool) -> Result<Product, Error> {
        let changes = ProductUpdate {
            is_active: Some(active),
            ..Default::default()
        };
        self.update(id, &changes).await
    }

    /// Delete the row, then its pictures
    pub async fn delete(&self, product: &Product) -> Result<(), Error> {
        self.market
            .from(PRODUCTS_TABLE)
            .await?
            .delete()
            .eq("id", &product.id)
            .execute()
            .await?;
        info!(product = %product.id, "product deleted");

        if let Err(e) = self.remove_images(&product.images).await {
            warn!(product = %product.id, "could not remove product images: {e}");
        }
        Ok(())
    }

    /// Upload a picture under the owner's folder and return its public URL
    pub async fn upload_image(
        &self,
        owner_id: &str,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<StoredFile, Error> {
        let path = unique_object_path(owner_id, file_name);
        let storage = self.market.storage().await?;
        storage
            .from(&self.market.options.product_images_bucket)
            .upload(&path, data, FileOptions::default())
            .await
    }

    /// Remove pictures given by public URL; URLs from elsewhere are skipped
    pub async fn remove_images(&self, urls: &[String]) -> Result<(), Error> {
        let storage = self.market.storage().await?;
        let bucket = storage.from(&self.market.options.product_images_bucket);
        let paths: Vec<String> = urls
            .iter()
            .filter_map(|url| bucket.path_from_public_url(url))
            .collect();
        if paths.is_empty() {
            return Ok(());
        }
        let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
        bucket.remove(&paths).await?;
        debug!(count = paths.len(), "removed product images");
        Ok(())
    }

    /// Count a product page view
    pub async fn record_view(&self, id: &str) -> Result<(), Error> {
        self.market
            .from(PRODUCTS_TABLE)
            .await?
            .rpc(INCREMENT_VIEWS, json!({ "product_id": id }))
            .execute_no_return()
            .await
    }
}
