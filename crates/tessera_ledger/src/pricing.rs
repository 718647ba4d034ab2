//! Request pricing.

use tessera_core::BackendBinding;
use tessera_routing::TierPrice;

/// Credits for a workload at a tier's price: `max(floor, ceil(words / words_per_credit))`.
///
/// # Examples
///
/// ```
/// use tessera_ledger::workload_cost;
/// use tessera_routing::TierPrice;
///
/// let fast = TierPrice::new(3, 1000);
/// assert_eq!(workload_cost(fast, 1000), 3);
/// assert_eq!(workload_cost(fast, 4500), 5);
/// ```
pub fn workload_cost(price: TierPrice, words: u32) -> u32 {
    if price.words_per_credit == 0 {
        return price.floor;
    }
    words.div_ceil(price.words_per_credit).max(price.floor)
}

/// Metered cost of a request against a binding.
///
/// A binding with a fixed per-request cost ignores workload.
pub fn request_cost(binding: &BackendBinding, price: TierPrice, words: u32) -> u32 {
    binding
        .credit_cost_per_request
        .unwrap_or_else(|| workload_cost(price, words))
}
