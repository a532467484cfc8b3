//! # Session State
//!
//! One operator session: the collections opened over a store, the live
//! cart, and the checkout details collected before `:pay`.

use std::sync::Arc;

use pdv_core::{
    CartEngine, CollectionStore, CoreResult, GroupBook, Inventory, SaleCommitter, Settings,
};
use tracing::info;

use crate::state::TerminalConfig;

/// Checkout details gathered by `:customer`, `:note` and `:total`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingCheckout {
    pub customer: Option<String>,
    pub note: Option<String>,
    pub discount_percent: f64,
}

/// Live session over a collection store.
pub struct Session<S> {
    store: Arc<S>,
    inventory: Inventory<S>,
    cart: CartEngine<S>,
    committer: SaleCommitter<S>,
    groups: GroupBook<S>,
    settings: Settings,
    config: TerminalConfig,
    pending: PendingCheckout,
}

impl<S: CollectionStore> Session<S> {
    /// Opens every collection the console needs and restores the saved cart.
    pub async fn open(store: Arc<S>, config: TerminalConfig) -> CoreResult<Self> {
        let inventory = Inventory::new(Arc::clone(&store)).with_policy(config.stock_policy);
        let cart = CartEngine::open(inventory.clone()).await?;
        let committer = SaleCommitter::new(inventory.clone());
        let groups = GroupBook::new(Arc::clone(&store));
        let settings = Settings::load(store.as_ref()).await?;

        info!(
            cashier = %config.cashier_name,
            policy = ?config.stock_policy,
            restored_lines = cart.len(),
            "Session opened"
        );

        Ok(Session {
            store,
            inventory,
            cart,
            committer,
            groups,
            settings,
            config,
            pending: PendingCheckout::default(),
        })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn inventory(&self) -> &Inventory<S> {
        &self.inventory
    }

    pub fn cart(&self) -> &CartEngine<S> {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut CartEngine<S> {
        &mut self.cart
    }

    pub fn committer(&self) -> &SaleCommitter<S> {
        &self.committer
    }

    /// Committer and cart together, for checkout.
    pub fn checkout_parts(&mut self) -> (&SaleCommitter<S>, &mut CartEngine<S>) {
        (&self.committer, &mut self.cart)
    }

    pub fn groups(&self) -> &GroupBook<S> {
        &self.groups
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Validates and persists new store settings.
    pub async fn update_settings(&mut self, settings: Settings) -> CoreResult<()> {
        settings.save(self.store.as_ref()).await?;
        self.settings = settings;
        Ok(())
    }

    /// Re-reads settings and the cart after a restore replaced collections.
    pub async fn reload(&mut self) -> CoreResult<()> {
        self.settings = Settings::load(self.store.as_ref()).await?;
        self.cart = CartEngine::open(self.inventory.clone()).await?;
        self.pending = PendingCheckout::default();
        Ok(())
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    pub fn pending(&self) -> &PendingCheckout {
        &self.pending
    }

    pub fn pending_mut(&mut self) -> &mut PendingCheckout {
        &mut self.pending
    }

    /// Forgets customer, note and discount after a sale.
    pub fn reset_pending(&mut self) {
        self.pending = PendingCheckout::default();
    }
}
