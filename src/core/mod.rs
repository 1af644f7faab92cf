mod engine;
mod migrate;
mod solver;
mod types;

pub use engine::{
    build_schedule, derive_goal, expected_total_income, income_years, project_required_funds,
    project_savings_growth, run_plan, shortfall_amount,
};
pub use migrate::category_from_name;
pub use solver::{
    ResolvedRates, holding_period, level_loan_payment, required_monthly_payment, resolve_rates,
    sinking_fund_payment,
};
pub use types::{
    Dependent, DerivedGoal, Earner, EconomicAssumptions, GOAL_COLORS, Goal, GoalCategory,
    GoalContribution, InflationTrack, PersonalInfo, PlanResult, Schedule, YearlyCashFlow,
};
