use std::time::Duration;

use crate::config::Config;

/// Price list for the XP actions. Extend-time is dearer and longer while
/// accessibility is active; reveal is flat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionCosts {
    pub xp_per_hit: u32,
    pub extend_cost: u32,
    pub extend_cost_accessible: u32,
    pub extend_time: Duration,
    pub extend_time_accessible: Duration,
    pub reveal_cost: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtendOffer {
    pub cost: u32,
    pub amount: Duration,
}

impl ActionCosts {
    pub fn from_config(config: &Config) -> Self {
        Self {
            xp_per_hit: config.xp_per_hit,
            extend_cost: config.extend_cost,
            extend_cost_accessible: config.extend_cost_accessible,
            extend_time: Duration::from_secs(config.extend_secs),
            extend_time_accessible: Duration::from_secs(config.extend_secs_accessible),
            reveal_cost: config.reveal_cost,
        }
    }

    pub fn extend_offer(&self, accessibility_active: bool) -> ExtendOffer {
        if accessibility_active {
            ExtendOffer {
                cost: self.extend_cost_accessible,
                amount: self.extend_time_accessible,
            }
        } else {
            ExtendOffer {
                cost: self.extend_cost,
                amount: self.extend_time,
            }
        }
    }
}

impl Default for ActionCosts {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Deduct `cost` from `balance` if it is covered. No partial spends: on
/// failure the balance is untouched.
pub fn try_spend(balance: &mut u32, cost: u32) -> bool {
    match balance.checked_sub(cost) {
        Some(rest) => {
            *balance = rest;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_insufficient_leaves_balance() {
        let mut xp = 80;
        assert!(!try_spend(&mut xp, 250));
        assert_eq!(xp, 80);
    }

    #[test]
    fn test_spend_exact_and_surplus() {
        let mut xp = 300;
        assert!(try_spend(&mut xp, 100));
        assert_eq!(xp, 200);
        assert!(try_spend(&mut xp, 200));
        assert_eq!(xp, 0);
        assert!(!try_spend(&mut xp, 1));
        assert_eq!(xp, 0);
    }

    #[test]
    fn test_extend_offer_depends_on_accessibility() {
        let costs = ActionCosts::default();
        let normal = costs.extend_offer(false);
        let access = costs.extend_offer(true);
        assert_eq!(normal.cost, 100);
        assert_eq!(normal.amount, Duration::from_secs(5));
        assert_eq!(access.cost, 150);
        assert_eq!(access.amount, Duration::from_secs(10));
        assert_eq!(costs.reveal_cost, 250);
    }
}
