//! Runtime state shared between the event loop, the sweep and the HTTP API.

use std::collections::HashMap;
use std::time::Duration;

use database::Product;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::dedup::DedupSet;

/// How long an offered product waits for the customer's confirmation.
pub const PENDING_PRODUCT_WINDOW: Duration = Duration::from_secs(60 * 60);

/// State built once at startup and shared through an `Arc`.
#[derive(Debug, Default)]
pub struct SessionContext {
    dedup: DedupSet,
    pending_products: Mutex<HashMap<String, (Product, Instant)>>,
    qr: RwLock<Option<String>>,
    own_number: RwLock<Option<String>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dedup(dedup: DedupSet) -> Self {
        Self {
            dedup,
            ..Self::default()
        }
    }

    pub fn dedup(&self) -> &DedupSet {
        &self.dedup
    }

    /// Remember the last validated product offered to a client.
    pub async fn set_pending_product(&self, client: &str, product: Product) {
        let now = Instant::now();
        let mut pending = self.pending_products.lock().await;
        purge_pending(&mut pending, now);
        pending.insert(client.to_string(), (product, now));
    }

    /// Take the pending product for a client, if one was offered within
    /// [`PENDING_PRODUCT_WINDOW`].
    pub async fn take_pending_product(&self, client: &str) -> Option<Product> {
        let mut pending = self.pending_products.lock().await;
        purge_pending(&mut pending, Instant::now());
        pending.remove(client).map(|(product, _)| product)
    }

    pub async fn pending_product(&self, client: &str) -> Option<Product> {
        let mut pending = self.pending_products.lock().await;
        purge_pending(&mut pending, Instant::now());
        pending.get(client).map(|(product, _)| product.clone())
    }

    /// Number of offers still awaiting confirmation.
    pub async fn pending_count(&self) -> usize {
        let mut pending = self.pending_products.lock().await;
        purge_pending(&mut pending, Instant::now());
        pending.len()
    }

    /// Latest login QR payload, cleared once the connection opens.
    pub async fn qr(&self) -> Option<String> {
        self.qr.read().await.clone()
    }

    pub async fn set_qr(&self, qr: Option<String>) {
        *self.qr.write().await = qr;
    }

    /// Bare number of the business account.
    pub async fn own_number(&self) -> Option<String> {
        self.own_number.read().await.clone()
    }

    pub async fn set_own_number(&self, number: Option<String>) {
        *self.own_number.write().await = number;
    }
}

fn purge_pending(pending: &mut HashMap<String, (Product, Instant)>, now: Instant) {
    pending.retain(|_, (_, offered_at)| now.duration_since(*offered_at) < PENDING_PRODUCT_WINDOW);
}
