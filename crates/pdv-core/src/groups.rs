//! # Product Groups
//!
//! Named groups for the catalog (the `groups` collection). Products carry
//! the group *name* as a label, so renaming a group relabels its products in
//! the same batch write. Deleting a group leaves existing labels alone.

use std::sync::Arc;

use tracing::debug;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ids;
use crate::store::{self, Collection, CollectionStore};
use crate::types::{Product, ProductGroup};
use crate::validation::validate_group_name;

pub struct GroupBook<S> {
    store: Arc<S>,
}

impl<S> Clone for GroupBook<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: CollectionStore> GroupBook<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> CoreResult<Vec<ProductGroup>> {
        Ok(store::load_records(&*self.store, Collection::Groups).await?)
    }

    /// Creates a group. Names are unique, ignoring case.
    pub async fn add(&self, name: &str) -> CoreResult<ProductGroup> {
        validate_group_name(name)?;
        let name = name.trim();

        let mut groups = self.list().await?;
        ensure_unique(&groups, name, None)?;

        let group = ProductGroup {
            id: ids::new_id(),
            name: name.to_string(),
        };
        groups.push(group.clone());
        store::save_records(&*self.store, Collection::Groups, &groups).await?;

        debug!(group_id = %group.id, name = %group.name, "Group added");
        Ok(group)
    }

    /// Returns the group named `name`, creating it when missing.
    pub async fn ensure(&self, name: &str) -> CoreResult<ProductGroup> {
        let existing = self
            .list()
            .await?
            .into_iter()
            .find(|g| same_name(&g.name, name));
        match existing {
            Some(group) => Ok(group),
            None => self.add(name).await,
        }
    }

    /// Renames a group and relabels every product that carried the old name.
    pub async fn rename(&self, id: &str, name: &str) -> CoreResult<ProductGroup> {
        validate_group_name(name)?;
        let name = name.trim();

        let mut groups = self.list().await?;
        ensure_unique(&groups, name, Some(id))?;
        let group = groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| {
                CoreError::Validation(ValidationError::InvalidFormat {
                    field: "group".to_string(),
                    reason: format!("no group with id '{}'", id),
                })
            })?;
        let old_name = std::mem::replace(&mut group.name, name.to_string());
        let renamed = group.clone();

        let mut products: Vec<Product> =
            store::load_records(&*self.store, Collection::Products).await?;
        let mut relabeled = 0usize;
        for product in products.iter_mut().filter(|p| p.group == old_name) {
            product.group = renamed.name.clone();
            relabeled += 1;
        }

        let batch = vec![
            (Collection::Groups, store::encode_records(Collection::Groups, &groups)?),
            (Collection::Products, store::encode_records(Collection::Products, &products)?),
        ];
        self.store.save_collections(batch).await?;

        debug!(group_id = %id, from = %old_name, to = %renamed.name, relabeled, "Group renamed");
        Ok(renamed)
    }

    /// Removes a group. Returns false when the id is unknown.
    pub async fn delete(&self, id: &str) -> CoreResult<bool> {
        let mut groups = self.list().await?;
        let before = groups.len();
        groups.retain(|g| g.id != id);
        if groups.len() == before {
            return Ok(false);
        }
        store::save_records(&*self.store, Collection::Groups, &groups).await?;
        debug!(group_id = %id, "Group deleted");
        Ok(true)
    }
}

fn ensure_unique(groups: &[ProductGroup], name: &str, except_id: Option<&str>) -> CoreResult<()> {
    let taken = groups
        .iter()
        .any(|g| same_name(&g.name, name) && Some(g.id.as_str()) != except_id);
    if taken {
        return Err(ValidationError::Duplicate {
            field: "group".to_string(),
            value: name.to_string(),
        }
        .into());
    }
    Ok(())
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::Inventory;
    use crate::store::MemoryStore;
    use crate::types::ProductInput;

    #[tokio::test]
    async fn test_add_and_list() {
        let groups = GroupBook::new(Arc::new(MemoryStore::new()));
        groups.add("Bebidas").await.unwrap();
        groups.add("Limpeza").await.unwrap();

        let names: Vec<String> = groups.list().await.unwrap().into_iter().map(|g| g.name).collect();
        assert_eq!(names, ["Bebidas", "Limpeza"]);
    }

    #[tokio::test]
    async fn test_add_rejects_duplicates_and_blank() {
        let groups = GroupBook::new(Arc::new(MemoryStore::new()));
        groups.add("Bebidas").await.unwrap();

        assert!(matches!(
            groups.add("bebidas").await.unwrap_err(),
            CoreError::Validation(ValidationError::Duplicate { .. })
        ));
        assert!(groups.add("  ").await.is_err());
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let groups = GroupBook::new(Arc::new(MemoryStore::new()));
        let a = groups.ensure("Padaria").await.unwrap();
        let b = groups.ensure("padaria").await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(groups.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rename_relabels_products() {
        let store = Arc::new(MemoryStore::new());
        let groups = GroupBook::new(Arc::clone(&store));
        let inventory = Inventory::new(Arc::clone(&store));

        let g = groups.add("Bebida").await.unwrap();
        let p = inventory
            .upsert(ProductInput::new("Suco", 500, 3).with_group("Bebida"))
            .await
            .unwrap();
        let other = inventory
            .upsert(ProductInput::new("Pão", 100, 3).with_group("Padaria"))
            .await
            .unwrap();

        groups.rename(&g.id, "Bebidas").await.unwrap();
        assert_eq!(inventory.require(&p.id).await.unwrap().group, "Bebidas");
        assert_eq!(inventory.require(&other.id).await.unwrap().group, "Padaria");
    }

    #[tokio::test]
    async fn test_rename_unknown_and_delete() {
        let groups = GroupBook::new(Arc::new(MemoryStore::new()));
        assert!(groups.rename("missing", "X").await.is_err());

        let g = groups.add("Frios").await.unwrap();
        assert!(groups.delete(&g.id).await.unwrap());
        assert!(!groups.delete(&g.id).await.unwrap());
    }
}
