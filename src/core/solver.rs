use super::types::{EconomicAssumptions, Goal, GoalCategory};

// Annual return rates for one goal as fractions, resolved once per pass.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRates {
    pub lump_sum: f64,
    pub periodic: f64,
}

pub fn resolve_rates(goal: &Goal, assumptions: &EconomicAssumptions) -> ResolvedRates {
    let fallback = assumptions.expected_return_rate;
    ResolvedRates {
        lump_sum: goal.lump_sum_return_rate.unwrap_or(fallback) / 100.0,
        periodic: goal.periodic_return_rate.unwrap_or(fallback) / 100.0,
    }
}

pub fn holding_period(goal: &Goal) -> i32 {
    goal.timing as i32 - goal.saving_start as i32 - goal.saving_period as i32
}

pub fn level_loan_payment(principal: f64, monthly_rate: f64, months: u32) -> f64 {
    if months == 0 {
        return 0.0;
    }
    if monthly_rate <= 0.0 {
        return principal / months as f64;
    }
    let growth = (1.0 + monthly_rate).powi(months as i32);
    principal * monthly_rate * growth / (growth - 1.0)
}

pub fn sinking_fund_payment(target: f64, monthly_rate: f64, months: u32) -> f64 {
    if months == 0 {
        return 0.0;
    }
    if monthly_rate <= 0.0 {
        return target / months as f64;
    }
    let growth = (1.0 + monthly_rate).powi(months as i32);
    target * monthly_rate / (growth - 1.0)
}

pub fn required_monthly_payment(
    goal: &Goal,
    shortfall: f64,
    assumptions: &EconomicAssumptions,
    rates: ResolvedRates,
) -> f64 {
    let months = goal.saving_period.saturating_mul(12);
    match goal.category {
        GoalCategory::LoanRepayment => {
            // The loan principal is amortized directly, not the shortfall.
            let monthly_rate = assumptions.loan_interest_rate / 100.0 / 12.0;
            level_loan_payment(goal.required_funds, monthly_rate, months)
        }
        GoalCategory::Generic(_) | GoalCategory::Retirement => {
            // Discount the shortfall from the target year back to the end of
            // the saving window. A negative holding period amplifies instead
            // of discounting.
            let target = shortfall / (1.0 + rates.lump_sum).powi(holding_period(goal));
            sinking_fund_payment(target, rates.periodic / 12.0, months)
        }
    }
}
