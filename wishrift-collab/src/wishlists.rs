use log::info;

use crate::{
    errors::require_text, util::share_id, CollabContext, CollabError, CollabResult, DatabaseError,
    ItemData, NewSharedAccess, NewWishlist, PrimaryKey, SharedAccessData, UpdatedWishlist,
    WishlistData,
};

/// Manages wishlists and who they are shared with
pub struct WishlistManager {
    context: CollabContext,
}

/// A wishlist resolved through its share id, along with its items
#[derive(Debug, Clone)]
pub struct SharedWishlist {
    pub wishlist: WishlistData,
    pub items: Vec<ItemData>,
}

impl WishlistManager {
    pub fn new(context: &CollabContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Creates a wishlist with a freshly generated share id
    pub async fn create_wishlist(
        &self,
        owner_id: &str,
        title: &str,
        description: Option<String>,
    ) -> CollabResult<WishlistData> {
        require_text("title", title)?;

        let wishlist = self
            .context
            .database
            .create_wishlist(NewWishlist {
                user_id: owner_id.to_string(),
                title: title.trim().to_string(),
                description,
                share_id: share_id(),
            })
            .await?;

        info!("Wishlist {} created by {}", wishlist.id, owner_id);
        Ok(wishlist)
    }

    pub async fn list_wishlists(&self, owner_id: &str) -> CollabResult<Vec<WishlistData>> {
        Ok(self.context.database.list_wishlists(owner_id).await?)
    }

    pub async fn wishlist(&self, wishlist_id: PrimaryKey) -> CollabResult<WishlistData> {
        Ok(self.context.database.wishlist_by_id(wishlist_id).await?)
    }

    /// Returns the wishlist only if the user owns it
    pub async fn owned(&self, user_id: &str, wishlist_id: PrimaryKey) -> CollabResult<WishlistData> {
        let wishlist = self.wishlist(wishlist_id).await?;

        if wishlist.user_id != user_id {
            return Err(CollabError::NotFound {
                resource: "wishlist",
            });
        }

        Ok(wishlist)
    }

    /// Returns the wishlist if the user owns it or has been granted access to it
    pub async fn readable(
        &self,
        user_id: &str,
        wishlist_id: PrimaryKey,
    ) -> CollabResult<WishlistData> {
        let wishlist = self.wishlist(wishlist_id).await?;

        if wishlist.user_id == user_id {
            return Ok(wishlist);
        }

        match self
            .context
            .database
            .shared_access(wishlist_id, user_id)
            .await
        {
            Ok(_) => Ok(wishlist),
            Err(DatabaseError::NotFound { .. }) => Err(CollabError::NotFound {
                resource: "wishlist",
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update_wishlist(
        &self,
        wishlist_id: PrimaryKey,
        title: Option<String>,
        description: Option<String>,
    ) -> CollabResult<WishlistData> {
        if let Some(title) = &title {
            require_text("title", title)?;
        }

        Ok(self
            .context
            .database
            .update_wishlist(UpdatedWishlist {
                id: wishlist_id,
                title: title.map(|t| t.trim().to_string()),
                description,
            })
            .await?)
    }

    /// Deletes the wishlist along with everything on it
    pub async fn delete_wishlist(&self, wishlist_id: PrimaryKey) -> CollabResult<bool> {
        let deleted = self.context.database.delete_wishlist(wishlist_id).await?;

        if deleted {
            info!("Wishlist {} deleted", wishlist_id);
        }

        Ok(deleted)
    }

    /// Resolves a wishlist by its share id, the only way to view a list without an account
    pub async fn wishlist_by_share_id(&self, share_id: &str) -> CollabResult<SharedWishlist> {
        let wishlist = self.context.database.wishlist_by_share_id(share_id).await?;
        let items = self.context.database.list_items(wishlist.id).await?;

        Ok(SharedWishlist { wishlist, items })
    }

    /// Grants the user with the given username read access to the wishlist
    pub async fn share_wishlist(
        &self,
        wishlist_id: PrimaryKey,
        username: &str,
    ) -> CollabResult<SharedAccessData> {
        let wishlist = self.wishlist(wishlist_id).await?;
        let user = self.context.database.user_by_username(username).await?;

        if user.id == wishlist.user_id {
            return Err(CollabError::validation(
                "username",
                "cannot share a wishlist with its owner",
            ));
        }

        let access = self
            .context
            .database
            .create_shared_access(NewSharedAccess {
                wishlist_id,
                user_id: user.id,
            })
            .await?;

        info!("Wishlist {} shared with {}", wishlist_id, username);
        Ok(access)
    }

    pub async fn list_shares(&self, wishlist_id: PrimaryKey) -> CollabResult<Vec<SharedAccessData>> {
        Ok(self
            .context
            .database
            .list_shared_access(wishlist_id)
            .await?)
    }

    pub async fn remove_shared_access(
        &self,
        wishlist_id: PrimaryKey,
        user_id: &str,
    ) -> CollabResult<bool> {
        Ok(self
            .context
            .database
            .delete_shared_access(wishlist_id, user_id)
            .await?)
    }

    /// Every wishlist other users have shared with this user
    pub async fn shared_with(&self, user_id: &str) -> CollabResult<Vec<WishlistData>> {
        Ok(self.context.database.list_shared_with(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::{
        testing::{collab, identity, item_fields},
        CollabError,
    };

    #[tokio::test]
    async fn share_id_round_trip() {
        let collab = collab();
        let owner = collab.auth.login(identity("owner")).await.unwrap().user;

        let created = collab
            .wishlists
            .create_wishlist(&owner.id, "Birthday", Some("Things I want".to_string()))
            .await
            .unwrap();

        collab
            .items
            .create_item(created.id, item_fields("Switch", 29999))
            .await
            .unwrap();

        let shared = collab
            .wishlists
            .wishlist_by_share_id(&created.share_id)
            .await
            .unwrap();

        assert_eq!(shared.wishlist.title, "Birthday");
        assert_eq!(shared.wishlist.description.as_deref(), Some("Things I want"));
        assert_eq!(shared.items.len(), 1);
    }

    #[tokio::test]
    async fn share_ids_are_unique() {
        let collab = collab();
        let owner = collab.auth.login(identity("owner")).await.unwrap().user;

        let mut ids = HashSet::new();
        for n in 0..200 {
            let wishlist = collab
                .wishlists
                .create_wishlist(&owner.id, &format!("List {}", n), None)
                .await
                .unwrap();

            ids.insert(wishlist.share_id);
        }

        assert_eq!(ids.len(), 200);
    }

    #[tokio::test]
    async fn empty_titles_are_rejected() {
        let collab = collab();

        let result = collab.wishlists.create_wishlist("owner", "   ", None).await;

        assert!(matches!(
            result,
            Err(CollabError::Validation { field: "title", .. })
        ));
    }

    #[tokio::test]
    async fn strangers_cannot_see_a_wishlist() {
        let collab = collab();
        let owner = collab.auth.login(identity("owner")).await.unwrap().user;
        let stranger = collab.auth.login(identity("stranger")).await.unwrap().user;

        let wishlist = collab
            .wishlists
            .create_wishlist(&owner.id, "Private", None)
            .await
            .unwrap();

        assert!(matches!(
            collab.wishlists.owned(&stranger.id, wishlist.id).await,
            Err(CollabError::NotFound { .. })
        ));
        assert!(matches!(
            collab.wishlists.readable(&stranger.id, wishlist.id).await,
            Err(CollabError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn sharing_grants_read_access() {
        let collab = collab();
        let owner = collab.auth.login(identity("owner")).await.unwrap().user;
        let friend = collab.auth.login(identity("friend")).await.unwrap().user;

        let wishlist = collab
            .wishlists
            .create_wishlist(&owner.id, "Holidays", None)
            .await
            .unwrap();

        collab
            .wishlists
            .share_wishlist(wishlist.id, &friend.username)
            .await
            .unwrap();

        assert!(collab.wishlists.readable(&friend.id, wishlist.id).await.is_ok());
        assert!(collab.wishlists.owned(&friend.id, wishlist.id).await.is_err());

        let shared = collab.wishlists.shared_with(&friend.id).await.unwrap();
        assert_eq!(shared, vec![wishlist.clone()]);

        let again = collab
            .wishlists
            .share_wishlist(wishlist.id, &friend.username)
            .await;
        assert!(matches!(again, Err(CollabError::Conflict { .. })));

        assert!(collab
            .wishlists
            .remove_shared_access(wishlist.id, &friend.id)
            .await
            .unwrap());
        assert!(collab.wishlists.readable(&friend.id, wishlist.id).await.is_err());
    }

    #[tokio::test]
    async fn sharing_with_the_owner_is_rejected() {
        let collab = collab();
        let owner = collab.auth.login(identity("owner")).await.unwrap().user;

        let wishlist = collab
            .wishlists
            .create_wishlist(&owner.id, "Mine", None)
            .await
            .unwrap();

        let result = collab
            .wishlists
            .share_wishlist(wishlist.id, &owner.username)
            .await;

        assert!(matches!(result, Err(CollabError::Validation { .. })));
    }

    #[tokio::test]
    async fn deleting_a_wishlist_removes_its_items() {
        let collab = collab();
        let owner = collab.auth.login(identity("owner")).await.unwrap().user;

        let wishlist = collab
            .wishlists
            .create_wishlist(&owner.id, "Temporary", None)
            .await
            .unwrap();
        let item = collab
            .items
            .create_item(wishlist.id, item_fields("Xbox", 49999))
            .await
            .unwrap();

        assert!(collab.wishlists.delete_wishlist(wishlist.id).await.unwrap());
        assert!(!collab.wishlists.delete_wishlist(wishlist.id).await.unwrap());
        assert!(matches!(
            collab.items.item(item.id).await,
            Err(CollabError::NotFound { .. })
        ));
    }
}
