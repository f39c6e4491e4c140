/// STORAGE PRICING
///
/// Storing a value costs an up-front payment that buys perpetual storage. The
/// price of a new slot decays geometrically from `storage_cost` at
/// `start_time`, because a slot bought later has less of the (discounted)
/// future to pay for.
///
/// Design: the decay factor is Q128.128 fixed point (`1.0 == 2^128`) and is
/// raised to integer powers by square-and-multiply, truncating every product.
/// The truncation is part of the pricing rule; results must match bit for bit.

use log::debug;
use primitive_types::{U256, U512};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 1.0 in Q128.128
pub const Q128_ONE: U256 = U256([0, 0, 1, 0]);

const Q128_BITS: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("decay factor {0} exceeds 1.0 in Q128.128")]
    FactorAboveOne(U256),
}

fn mul_q128(a: U256, b: U256) -> U256 {
    let product: U512 = a.full_mul(b) >> Q128_BITS;
    U256::try_from(product).unwrap_or(U256::MAX)
}

/// `fp^n` in Q128.128, truncating after every multiplication.
///
/// Saturates at `U256::MAX` if `fp > 1.0` overflows; callers that keep
/// `fp <= 1.0` never hit that.
pub fn pow_q128(fp: U256, n: u64) -> U256 {
    let mut value = Q128_ONE;
    let mut base = fp;
    let mut n = n;
    while n != 0 {
        if n & 1 == 1 {
            value = mul_q128(base, value);
        }
        base = mul_q128(base, base);
        n >>= 1;
    }
    value
}

/// Decaying price schedule for new storage slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecayCurve {
    pub storage_cost: U256,
    pub dcf_factor: U256,
    pub start_time: u64,
}

impl DecayCurve {
    pub fn new(storage_cost: U256, dcf_factor: U256, start_time: u64) -> Result<Self, PricingError> {
        if dcf_factor > Q128_ONE {
            return Err(PricingError::FactorAboveOne(dcf_factor));
        }
        Ok(Self {
            storage_cost,
            dcf_factor,
            start_time,
        })
    }

    /// `amount * dcf_factor^elapsed`
    pub fn decay(&self, amount: U256, elapsed: u64) -> U256 {
        mul_q128(amount, pow_q128(self.dcf_factor, elapsed))
    }

    /// Price of one new slot at `now`. Times before `start_time` pay the
    /// full `storage_cost`.
    pub fn upfront_payment(&self, now: u64) -> U256 {
        let elapsed = now.saturating_sub(self.start_time);
        let payment = self.decay(self.storage_cost, elapsed);
        debug!("upfront payment at t={} (elapsed {}): {}", now, elapsed, payment);
        payment
    }

    /// Portion of `amount` that decays away over `[from, to]`.
    pub fn released(&self, amount: U256, from: u64, to: u64) -> U256 {
        let remaining = self.decay(amount, to.saturating_sub(from));
        amount.saturating_sub(remaining)
    }
}
