//! # Currency Rates
//!
//! Exchange-rate refresh is an explicit transition: [`Currency::with_exchange_rate`]
//! returns a new record with `last_updated` stamped instead of mutating the
//! rate in place. [`convert_amount`] converts through the most recent
//! direct rate, or the inverse of the most recent reverse rate.
//!
//! Rounding is half-up (away from zero on ties): inverse rates at 6 decimal
//! places, converted amounts at 2.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ecompta_core::{CoreError, CurrencyCode, Timestamp};

use crate::error::TransitionError;

const ENTITY: &str = "currency";

/// Decimal places kept on an inverted rate.
pub const INVERSE_RATE_SCALE: u32 = 6;

/// Decimal places kept on a converted amount.
pub const AMOUNT_SCALE: u32 = 2;

/// Errors from amount conversion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    /// No direct or inverse rate is known for the pair.
    #[error("no exchange rate found for {from} -> {to}")]
    RateNotFound {
        /// Source currency.
        from: CurrencyCode,
        /// Target currency.
        to: CurrencyCode,
    },

    /// A rate was zero or negative.
    #[error("exchange rate {rate} for {from} -> {to} is not positive")]
    InvalidRate {
        /// Source currency.
        from: CurrencyCode,
        /// Target currency.
        to: CurrencyCode,
        /// Offending rate.
        rate: Decimal,
    },

    /// The converted amount does not fit in a `Decimal`.
    #[error("conversion overflow")]
    Overflow,
}

/// A currency known to the platform, with its rate against the base currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// ISO 4217 code.
    pub code: CurrencyCode,
    /// Display name.
    pub name: String,
    /// Display symbol (e.g. `FCFA`).
    pub symbol: String,
    /// Units of this currency per unit of the base currency.
    pub exchange_rate: Decimal,
    /// Whether this is the tenant's base currency (rate fixed at 1).
    pub is_base: bool,
    /// When the rate was last refreshed.
    pub last_updated: Timestamp,
}

impl Currency {
    /// Create a currency record.
    ///
    /// A base currency always has rate 1; other currencies need a positive rate.
    pub fn new(
        code: CurrencyCode,
        name: impl Into<String>,
        symbol: impl Into<String>,
        exchange_rate: Decimal,
        is_base: bool,
        now: Timestamp,
    ) -> Result<Self, CoreError> {
        if is_base && exchange_rate != Decimal::ONE {
            return Err(CoreError::Validation(format!(
                "base currency {code} must have rate 1, got {exchange_rate}"
            )));
        }
        if exchange_rate <= Decimal::ZERO {
            return Err(CoreError::Validation(format!(
                "exchange rate for {code} must be positive, got {exchange_rate}"
            )));
        }
        Ok(Self {
            code,
            name: name.into(),
            symbol: symbol.into(),
            exchange_rate,
            is_base,
            last_updated: now,
        })
    }

    /// Return a copy with a refreshed rate and `last_updated = now`.
    pub fn with_exchange_rate(&self, rate: Decimal, now: Timestamp) -> Result<Self, TransitionError> {
        if self.is_base {
            return Err(TransitionError::rejected(
                ENTITY,
                self.code.as_str(),
                self.code.as_str(),
                "the base currency rate is fixed at 1",
            ));
        }
        if rate <= Decimal::ZERO {
            return Err(TransitionError::rejected(
                ENTITY,
                self.code.as_str(),
                self.code.as_str(),
                format!("exchange rate must be positive, got {rate}"),
            ));
        }
        tracing::debug!(currency = %self.code, old = %self.exchange_rate, new = %rate, "exchange rate refreshed");
        Ok(Self {
            exchange_rate: rate,
            last_updated: now,
            ..self.clone()
        })
    }
}

/// A dated quote: one unit of `from` buys `rate` units of `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Source currency.
    pub from: CurrencyCode,
    /// Target currency.
    pub to: CurrencyCode,
    /// Quote.
    pub rate: Decimal,
    /// Quote date.
    pub date: NaiveDate,
}

/// Most recent quote for `from -> to`, if any.
fn latest<'a>(rates: &'a [ExchangeRate], from: &CurrencyCode, to: &CurrencyCode) -> Option<&'a ExchangeRate> {
    rates
        .iter()
        .filter(|r| &r.from == from && &r.to == to)
        .max_by_key(|r| r.date)
}

/// Convert `amount` from one currency to another.
///
/// Same currency returns `amount` unchanged. Otherwise the latest direct
/// quote is used; failing that, the latest reverse quote is inverted.
pub fn convert_amount(
    amount: Decimal,
    from: &CurrencyCode,
    to: &CurrencyCode,
    rates: &[ExchangeRate],
) -> Result<Decimal, CurrencyError> {
    if from == to {
        return Ok(amount);
    }

    let rate = if let Some(direct) = latest(rates, from, to) {
        ensure_positive(direct)?;
        direct.rate
    } else if let Some(reverse) = latest(rates, to, from) {
        ensure_positive(reverse)?;
        Decimal::ONE
            .checked_div(reverse.rate)
            .ok_or(CurrencyError::Overflow)?
            .round_dp_with_strategy(INVERSE_RATE_SCALE, RoundingStrategy::MidpointAwayFromZero)
    } else {
        return Err(CurrencyError::RateNotFound {
            from: from.clone(),
            to: to.clone(),
        });
    };

    Ok(amount
        .checked_mul(rate)
        .ok_or(CurrencyError::Overflow)?
        .round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero))
}

fn ensure_positive(quote: &ExchangeRate) -> Result<(), CurrencyError> {
    if quote.rate <= Decimal::ZERO {
        return Err(CurrencyError::InvalidRate {
            from: quote.from.clone(),
            to: quote.to.clone(),
            rate: quote.rate,
        });
    }
    Ok(())
}
