//! Spending-control evaluation
//!
//! Pure functions over a card's `ControlSet`. Allow/block lists share one
//! precedence policy:
//!
//! 1. a value on the allow-list is permitted, whatever the block-list says
//! 2. otherwise a value on the block-list is refused
//! 3. otherwise the value is permitted only if the allow-list is empty
//!
//! Spending limits compare the attempted `amount + fees`, plus whatever the
//! card already spent in the limit's interval, against the limit. Aggregating
//! that spend is the ledger's job; the evaluator receives the totals.

use std::collections::HashMap;
use std::fmt;

use crate::types::{ControlSet, LimitInterval, SpendingLimit};

/// Spend already recorded for a card, per limit interval
pub type SpendTotals = HashMap<LimitInterval, i64>;

/// The parts of an authorization that controls look at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendAttempt<'a> {
    pub channel: &'a str,
    pub merchant: Option<&'a str>,
    pub category: Option<&'a str>,
    /// `amount + fees` in minor units
    pub total: i64,
}

/// The first control an attempt fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlViolation {
    Channel(String),
    Merchant(String),
    Category(String),
    SpendingLimit {
        interval: LimitInterval,
        limit: i64,
        spent: i64,
        attempted: i64,
    },
}

impl fmt::Display for ControlViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlViolation::Channel(channel) => write!(f, "channel '{}' not allowed", channel),
            ControlViolation::Merchant(merchant) => {
                write!(f, "merchant '{}' not allowed", merchant)
            }
            ControlViolation::Category(category) => {
                write!(f, "category '{}' not allowed", category)
            }
            ControlViolation::SpendingLimit {
                interval,
                limit,
                spent,
                attempted,
            } => write!(
                f,
                "{} limit {} exceeded: spent {}, attempted {}",
                interval.as_str(),
                limit,
                spent,
                attempted
            ),
        }
    }
}

fn is_listed(list: &[String], value: &str) -> bool {
    list.iter().any(|entry| entry == value)
}

/// Allow/block precedence shared by channels, merchants and categories
pub fn is_allowed(allowed: &[String], blocked: &[String], value: &str) -> bool {
    if is_listed(allowed, value) {
        return true;
    }
    if is_listed(blocked, value) {
        return false;
    }
    allowed.is_empty()
}

pub fn is_channel_allowed(controls: &ControlSet, channel: &str) -> bool {
    is_allowed(&controls.allowed_channels, &controls.blocked_channels, channel)
}

pub fn is_merchant_allowed(controls: &ControlSet, merchant: &str) -> bool {
    is_allowed(&controls.allowed_merchants, &controls.blocked_merchants, merchant)
}

pub fn is_category_allowed(controls: &ControlSet, category: &str) -> bool {
    is_allowed(
        &controls.allowed_categories,
        &controls.blocked_categories,
        category,
    )
}

/// Check every limit against the attempt plus the interval's recorded spend
///
/// Intervals missing from `spent` count as no prior spend.
pub fn check_spending_limits(
    limits: &[SpendingLimit],
    attempted: i64,
    spent: &SpendTotals,
) -> Result<(), ControlViolation> {
    for limit in limits {
        let prior = match limit.interval {
            LimitInterval::PerAuthorization => 0,
            interval => spent.get(&interval).copied().unwrap_or(0),
        };
        if prior.saturating_add(attempted) > limit.amount {
            return Err(ControlViolation::SpendingLimit {
                interval: limit.interval,
                limit: limit.amount,
                spent: prior,
                attempted,
            });
        }
    }
    Ok(())
}

/// Evaluate all controls in order: channel, merchant, category, limits
///
/// Merchant and category lists are skipped when the attempt carries none.
pub fn evaluate(
    controls: &ControlSet,
    attempt: &SpendAttempt<'_>,
    spent: &SpendTotals,
) -> Result<(), ControlViolation> {
    if !is_channel_allowed(controls, attempt.channel) {
        return Err(ControlViolation::Channel(attempt.channel.to_string()));
    }
    if let Some(merchant) = attempt.merchant {
        if !is_merchant_allowed(controls, merchant) {
            return Err(ControlViolation::Merchant(merchant.to_string()));
        }
    }
    if let Some(category) = attempt.category {
        if !is_category_allowed(controls, category) {
            return Err(ControlViolation::Category(category.to_string()));
        }
    }
    check_spending_limits(&controls.spending_limits, attempt.total, spent)
}
