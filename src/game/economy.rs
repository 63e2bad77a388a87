//! Policy-Driven Economy
//!
//! Applied once per enactment, and only when the rules enable it.

use crate::game::rules::EconomyRules;
use crate::game::state::Economy;

/// Economy after enacting a proposal titled `title`.
///
/// Base drift first, then every keyword effect whose keyword appears in the
/// lowercased title. Treasury and unemployment are floored at zero, inflation
/// is floored at zero after the base drift.
pub fn apply_enactment(economy: Economy, title: &str, rules: &EconomyRules) -> Economy {
    let mut treasury = economy.treasury.saturating_add(rules.base_income);
    let mut inflation_rate = (economy.inflation_rate + rules.base_inflation_drift).max(0.0);
    let mut unemployment_rate = (economy.unemployment_rate + rules.base_unemployment_drift).max(0.0);

    let title = title.to_lowercase();
    for effect in &rules.policy_effects {
        if title.contains(&effect.keyword) {
            treasury = treasury.saturating_add(effect.treasury);
            inflation_rate += effect.inflation;
            unemployment_rate += effect.unemployment;
        }
    }

    Economy {
        treasury: treasury.max(0),
        inflation_rate,
        unemployment_rate: unemployment_rate.max(0.0),
    }
}
