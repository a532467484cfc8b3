//! # Customer Book
//!
//! Customer records (the `customers` collection).
//!
//! Deleting a customer never touches the ledger: sales keep the id of a
//! customer that no longer exists.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ids;
use crate::store::{self, Collection, CollectionStore};
use crate::types::{Customer, CustomerInput};
use crate::validation::{normalize_document, validate_customer_name, validate_email};

pub struct CustomerBook<S> {
    store: Arc<S>,
}

impl<S> Clone for CustomerBook<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: CollectionStore> CustomerBook<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> CoreResult<Vec<Customer>> {
        Ok(store::load_records(&*self.store, Collection::Customers).await?)
    }

    /// Finds a customer by id or by document digits.
    pub async fn get(&self, key: &str) -> CoreResult<Option<Customer>> {
        let key = key.trim();
        if key.is_empty() {
            return Ok(None);
        }
        let customers = self.list().await?;
        Ok(customers
            .iter()
            .find(|c| c.id == key)
            .or_else(|| customers.iter().find(|c| c.document == key))
            .cloned())
    }

    /// Like [`CustomerBook::get`] but fails with `CustomerNotFound`.
    pub async fn require(&self, key: &str) -> CoreResult<Customer> {
        self.get(key)
            .await?
            .ok_or_else(|| CoreError::CustomerNotFound(key.trim().to_string()))
    }

    /// Creates or overwrites a customer, preserving `id` and `created_at`.
    ///
    /// Documents are stored as digits only and must be unique.
    pub async fn upsert(&self, input: CustomerInput) -> CoreResult<Customer> {
        validate_customer_name(&input.name)?;
        let document = normalize_document(&input.document)?;
        let email = non_blank(input.email);
        if let Some(email) = &email {
            validate_email(email)?;
        }

        let mut customers = self.list().await?;
        let existing = input
            .id
            .as_deref()
            .and_then(|id| customers.iter().position(|c| c.id == id));
        let id = match (&input.id, existing) {
            (_, Some(index)) => customers[index].id.clone(),
            (Some(id), None) if !id.trim().is_empty() => id.trim().to_string(),
            _ => ids::new_id(),
        };

        if customers.iter().any(|c| c.document == document && c.id != id) {
            return Err(ValidationError::Duplicate {
                field: "document".to_string(),
                value: document,
            }
            .into());
        }

        let customer = Customer {
            id,
            name: input.name.trim().to_string(),
            document,
            phone: non_blank(input.phone),
            email,
            address: non_blank(input.address),
            created_at: existing
                .map(|i| customers[i].created_at)
                .unwrap_or_else(Utc::now),
        };

        match existing {
            Some(index) => customers[index] = customer.clone(),
            None => customers.push(customer.clone()),
        }
        store::save_records(&*self.store, Collection::Customers, &customers).await?;

        debug!(customer_id = %customer.id, created = existing.is_none(), "Customer saved");
        Ok(customer)
    }

    /// Removes a customer. Sales referencing it are left as they are.
    pub async fn delete(&self, id: &str) -> CoreResult<bool> {
        let mut customers = self.list().await?;
        let before = customers.len();
        customers.retain(|c| c.id != id);
        if customers.len() == before {
            return Ok(false);
        }

        store::save_records(&*self.store, Collection::Customers, &customers).await?;
        info!(customer_id = %id, "Customer deleted");
        Ok(true)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn book() -> CustomerBook<MemoryStore> {
        CustomerBook::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_upsert_normalizes_document() {
        let book = book();
        let c = book
            .upsert(CustomerInput::new("Ana Souza", "123.456.789-09"))
            .await
            .unwrap();
        assert_eq!(c.document, "12345678909");
        assert_eq!(book.require("12345678909").await.unwrap().id, c.id);
    }

    #[tokio::test]
    async fn test_upsert_preserves_identity() {
        let book = book();
        let c = book
            .upsert(CustomerInput::new("Ana", "12345678909"))
            .await
            .unwrap();

        let mut edit = CustomerInput::new("Ana Souza", "12345678909");
        edit.id = Some(c.id.clone());
        edit.phone = Some(" (11) 99999-0000 ".to_string());
        edit.email = Some("  ".to_string());
        let updated = book.upsert(edit).await.unwrap();

        assert_eq!(updated.id, c.id);
        assert_eq!(updated.created_at, c.created_at);
        assert_eq!(updated.phone.as_deref(), Some("(11) 99999-0000"));
        assert!(updated.email.is_none());
        assert_eq!(book.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_rejects_invalid() {
        let book = book();
        assert!(book.upsert(CustomerInput::new("", "12345678909")).await.is_err());
        assert!(book.upsert(CustomerInput::new("Ana", "123")).await.is_err());

        let mut bad_email = CustomerInput::new("Ana", "12345678909");
        bad_email.email = Some("ana-at-example".to_string());
        assert!(book.upsert(bad_email).await.is_err());

        book.upsert(CustomerInput::new("Ana", "12345678909")).await.unwrap();
        let err = book
            .upsert(CustomerInput::new("Outra", "123.456.789-09"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Duplicate { .. })));
    }

    #[tokio::test]
    async fn test_require_and_delete() {
        let book = book();
        let c = book
            .upsert(CustomerInput::new("Ana", "12345678909"))
            .await
            .unwrap();

        assert!(book.delete(&c.id).await.unwrap());
        assert!(!book.delete(&c.id).await.unwrap());
        assert!(matches!(
            book.require(&c.id).await.unwrap_err(),
            CoreError::CustomerNotFound(_)
        ));
    }
}
