use serde_json::json;
use tracing::info;

use super::{first_row, row_range, total_of};
use crate::auth::AuthUser;
use crate::catalog::{FilterOptions, Page};
use crate::error::Error;
use crate::models::{AdminUserUpdate, ProfileUpdate, User, Validate};
use crate::postgrest::Counted;
use crate::storage::{unique_object_path, FileOptions, StoredFile};
use crate::Marketplace;

pub const USERS_TABLE: &str = "users";

/// Repository for the `users` table, which holds suppliers and buyers alike
pub struct Users<'a> {
    market: &'a Marketplace,
}

impl<'a> Users<'a> {
    pub(crate) fn new(market: &'a Marketplace) -> Self {
        Self { market }
    }

    pub async fn get(&self, id: &str) -> Result<User, Error> {
        self.market
            .from(USERS_TABLE)
            .await?
            .select("*")
            .eq("id", id)
            .maybe_single()
            .await?
            .ok_or_else(|| Error::not_found(format!("user {id}")))
    }

    /// The signed-in user's profile row
    pub async fn current(&self) -> Result<User, Error> {
        let id = self.market.require_user_id()?;
        self.get(&id).await
    }

    /// Create the profile row for a fresh sign-up if it is not there yet
    pub async fn ensure_profile(&self, auth_user: &AuthUser) -> Result<User, Error> {
        match self.get(&auth_user.id).await {
            Ok(existing) => return Ok(existing),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let meta = |key: &str| {
            auth_user
                .user_metadata
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        let profile = json!({
            "id": auth_user.id,
            "email": auth_user.email,
            "full_name": meta("full_name"),
            "business_name": meta("business_name"),
            "phone": meta("phone"),
            "is_supplier": auth_user.is_supplier(),
            "is_buyer": auth_user.metadata_flag("is_buyer"),
        });

        let rows = self
            .market
            .from(USERS_TABLE)
            .await?
            .insert(profile)
            .execute()
            .await?;
        info!(user = %auth_user.id, "profile created");
        first_row(rows, "profile insert")
    }

    /// Every supplier, newest first
    pub async fn suppliers(&self) -> Result<Vec<User>, Error> {
        self.market
            .from(USERS_TABLE)
            .await?
            .select("*")
            .eq("is_supplier", true)
            .order("created_at", false)
            .execute()
            .await
    }

    /// The supplier tab of the search screen
    pub async fn search_suppliers(
        &self,
        text: &str,
        options: &FilterOptions,
        page: usize,
    ) -> Result<Page<User>, Error> {
        let suppliers = self.suppliers().await?;
        Ok(self.market.catalog().suppliers(&suppliers, text, options, page))
    }

    /// Admin user list, one server-side page at a time
    pub async fn admin_page(&self, page: usize, page_size: usize) -> Result<Page<User>, Error> {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let (from, to) = row_range(page, page_size);

        let counted: Counted<User> = self
            .market
            .from(USERS_TABLE)
            .await?
            .select("*")
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

    pub async fn update_profile(&self, id: &str, changes: &ProfileUpdate) -> Result<User, Error> {
        changes.validate()?;
        let rows = self
            .market
            .from(USERS_TABLE)
            .await?
            .update(changes)
            .eq("id", id)
            .execute()
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("user {id}")))
    }

    /// Verification and role flags; the backend's row policies decide who may do this
    pub async fn admin_update(&self, id: &str, changes: &AdminUserUpdate) -> Result<User, Error> {
        let rows = self
            .market
            .from(USERS_TABLE)
            .await?
            .update(changes)
            .eq("id", id)
            .execute()
            .await?;
        let user: User = rows
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("user {id}")))?;
        info!(user = %id, verified = user.is_verified, admin = user.is_admin, "user flags changed");
        Ok(user)
    }

    /// Upload an avatar or logo into the avatars bucket
    pub async fn upload_avatar(
        &self,
        user_id: &str,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<StoredFile, Error> {
        let path = unique_object_path(user_id, file_name);
        let storage = self.market.storage().await?;
        storage
            .from(&self.market.options.avatars_bucket)
            .upload(&path, data, FileOptions::default().with_upsert(true))
            .await
    }
}
