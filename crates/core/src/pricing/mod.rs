pub mod engine;
pub mod rates;

use crate::domain::bid::BidInput;
use crate::errors::PricingError;

use self::{
    engine::{price_bid_with, BidSummary},
    rates::RateTable,
};

pub trait PricingEngine: Send + Sync {
    fn price(&self, input: &BidInput) -> Result<BidSummary, PricingError>;
}

pub struct DeterministicPricingEngine {
    rates: &'static RateTable,
}

impl DeterministicPricingEngine {
    pub fn new(rates: &'static RateTable) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &RateTable {
        self.rates
    }
}

impl Default for DeterministicPricingEngine {
    fn default() -> Self {
        Self::new(RateTable::standard())
    }
}

impl PricingEngine for DeterministicPricingEngine {
    fn price(&self, input: &BidInput) -> Result<BidSummary, PricingError> {
        price_bid_with(self.rates, &input.items, &input.bid_type, input.tax_percent)
    }
}
