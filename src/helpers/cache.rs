use common::ReceiptDto;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Read-through cache of receipts.
///
/// Every write bumps a generation counter before invalidating. A read that
/// raced a write sees the counter move and drops what it just stored, so a
/// balance read before a payment committed never outlives that payment.
#[derive(Clone, Debug)]
pub struct ReceiptCache {
    entries: Cache<i32, ReceiptDto>,
    generation: Arc<AtomicU64>,
}

impl ReceiptCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).time_to_live(ttl).build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn get(&self, receipt_id: i32) -> Option<ReceiptDto> {
        self.entries.get(&receipt_id).await
    }

    /// Generation to hand back to [`ReceiptCache::store_read`]. Take it before
    /// reading the database.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Cache a receipt read from the database at `read_generation`.
    pub async fn store_read(&self, receipt: ReceiptDto, read_generation: u64) {
        let receipt_id = receipt.id;
        self.entries.insert(receipt_id, receipt).await;
        if self.generation() != read_generation {
            self.entries.invalidate(&receipt_id).await;
        }
    }

    /// Drop a receipt after a committed write.
    pub async fn invalidate(&self, receipt_id: i32) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.invalidate(&receipt_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn receipt(id: i32, pending: rust_decimal::Decimal) -> ReceiptDto {
        ReceiptDto {
            id,
            condominium_id: 1,
            property_id: 1,
            period: "2024-03".to_string(),
            amount: dec!(100.00),
            pending_amount: Some(pending),
            outstanding: pending,
            credit_balance: dec!(0.00),
            opening_credit: dec!(0.00),
            status: "partial".to_string(),
            created_at: Default::default(),
            updated_at: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_read_is_cached_until_invalidated() {
        let cache = ReceiptCache::new(10, Duration::from_secs(60));
        let generation = cache.generation();
        cache.store_read(receipt(1, dec!(60.00)), generation).await;
        assert_eq!(cache.get(1).await, Some(receipt(1, dec!(60.00))));

        cache.invalidate(1).await;
        assert_eq!(cache.get(1).await, None);
    }

    #[tokio::test]
    async fn test_read_racing_a_write_is_not_kept() {
        let cache = ReceiptCache::new(10, Duration::from_secs(60));

        // The read starts, then a payment commits and invalidates before the
        // read gets to store its now stale balance.
        let generation = cache.generation();
        cache.invalidate(1).await;
        cache.store_read(receipt(1, dec!(100.00)), generation).await;

        assert_eq!(cache.get(1).await, None);

        let generation = cache.generation();
        cache.store_read(receipt(1, dec!(60.00)), generation).await;
        assert_eq!(cache.get(1).await, Some(receipt(1, dec!(60.00))));
    }
}
