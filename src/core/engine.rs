use std::collections::BTreeMap;

use super::solver::{holding_period, required_monthly_payment, resolve_rates};
use super::types::{
    DerivedGoal, Earner, EconomicAssumptions, GOAL_COLORS, Goal, GoalCategory, GoalContribution,
    InflationTrack, PersonalInfo, PlanResult, Schedule, YearlyCashFlow,
};

pub fn run_plan(
    goals: &[Goal],
    assumptions: &EconomicAssumptions,
    info: &PersonalInfo,
) -> PlanResult {
    let assumptions = sanitized_assumptions(assumptions);
    let info = sanitized_personal_info(info);

    let derived: Vec<DerivedGoal> = goals
        .iter()
        .enumerate()
        .map(|(index, goal)| derive_goal(&sanitized_goal(goal), index, &assumptions, &info))
        .collect();
    let schedule = build_schedule(&derived, &info);

    PlanResult {
        goals: derived,
        schedule,
        client_expected_income: expected_total_income(&info.client),
        spouse_expected_income: expected_total_income(&info.spouse),
    }
}

pub fn derive_goal(
    goal: &Goal,
    index: usize,
    assumptions: &EconomicAssumptions,
    info: &PersonalInfo,
) -> DerivedGoal {
    let rates = resolve_rates(goal, assumptions);
    let future_value_required = project_required_funds(goal, assumptions, info);
    let future_value_current = project_savings_growth(goal, rates.lump_sum);
    let shortfall = shortfall_amount(future_value_required, future_value_current);
    let monthly_payment = required_monthly_payment(goal, shortfall, assumptions, rates);

    DerivedGoal {
        id: goal.id,
        name: goal.name.clone(),
        timing: goal.timing,
        required_funds: goal.required_funds,
        current_savings: goal.current_savings,
        saving_start: goal.saving_start,
        saving_period: goal.saving_period,
        future_value_required,
        future_value_current,
        shortfall,
        holding_period: holding_period(goal),
        monthly_payment,
        color: GOAL_COLORS[index % GOAL_COLORS.len()].to_string(),
    }
}

pub fn project_required_funds(
    goal: &Goal,
    assumptions: &EconomicAssumptions,
    info: &PersonalInfo,
) -> f64 {
    match goal.category {
        GoalCategory::Generic(track) => {
            let annual_inflation = match track {
                InflationTrack::General => assumptions.inflation_rate,
                InflationTrack::Education => assumptions.education_inflation_rate,
            };
            goal.required_funds * (1.0 + annual_inflation / 100.0).powi(goal.timing as i32)
        }
        GoalCategory::Retirement => {
            // required_funds is a monthly figure here. A year of it, inflated
            // out to the retirement date, seeds the growing payout annuity.
            let annual_cost = goal.required_funds * 12.0;
            let first_year_cost =
                annual_cost * (1.0 + assumptions.inflation_rate / 100.0).powi(goal.timing as i32);
            let payout_years = info
                .client
                .life_expectancy
                .saturating_sub(info.client.retirement_age);
            growing_annuity_value(
                first_year_cost,
                assumptions.post_retirement_return_rate / 100.0,
                assumptions.post_retirement_inflation_rate / 100.0,
                payout_years,
            )
        }
        GoalCategory::LoanRepayment => goal.required_funds,
    }
}

fn growing_annuity_value(first_year_cost: f64, r: f64, g: f64, years: u32) -> f64 {
    if years == 0 {
        return 0.0;
    }
    // When returns do not beat inflation the stream is funded at face value.
    if r <= g {
        return first_year_cost * years as f64;
    }
    let ratio = (1.0 + g) / (1.0 + r);
    first_year_cost * (1.0 - ratio.powi(years as i32)) / (r - g)
}

pub fn project_savings_growth(goal: &Goal, lump_sum_rate: f64) -> f64 {
    goal.current_savings * (1.0 + lump_sum_rate).powi(goal.timing as i32)
}

pub fn shortfall_amount(future_value_required: f64, future_value_current: f64) -> f64 {
    (future_value_required - future_value_current).max(0.0)
}

pub fn income_years(earner: &Earner) -> impl Iterator<Item = f64> {
    let annual = earner.monthly_income * 12.0;
    let growth = 1.0 + earner.salary_increase_rate / 100.0;
    let working_years = earner.retirement_age.saturating_sub(earner.age);
    (0..working_years).map(move |year| annual * growth.powi(year as i32))
}

pub fn expected_total_income(earner: &Earner) -> f64 {
    income_years(earner).sum()
}

pub fn build_schedule(goals: &[DerivedGoal], info: &PersonalInfo) -> Schedule {
    let horizon = goals
        .iter()
        .map(|goal| {
            goal.timing
                .max(goal.saving_start.saturating_add(goal.saving_period))
        })
        .max()
        .unwrap_or(0);

    // Year 1 is one year from now; formulas below work on the 0-based index.
    let mut years = Vec::with_capacity(horizon as usize);
    for index in 0..horizon {
        let mut contributions: BTreeMap<u64, GoalContribution> = BTreeMap::new();
        let mut total_payment = 0.0;
        for (position, goal) in goals.iter().enumerate() {
            let window_end = goal.saving_start.saturating_add(goal.saving_period);
            if index < goal.saving_start || index >= window_end {
                continue;
            }
            // Goals sharing an id stack into one slice.
            let slice = contributions
                .entry(goal.id)
                .or_insert_with(|| GoalContribution {
                    name: display_name(goal, position),
                    payment: 0.0,
                    color: goal.color.clone(),
                });
            slice.payment += goal.monthly_payment;
            total_payment += goal.monthly_payment;
        }

        years.push(YearlyCashFlow {
            year: index + 1,
            total_payment,
            goals: contributions,
            income: earner_monthly_income(&info.client, index)
                + earner_monthly_income(&info.spouse, index),
        });
    }

    let axis_max = years
        .iter()
        .map(|cash_flow| cash_flow.total_payment.max(cash_flow.income))
        .fold(0.0, f64::max);

    Schedule { years, axis_max }
}

fn display_name(goal: &DerivedGoal, index: usize) -> String {
    if goal.name.is_empty() {
        format!("목표 {}", index + 1)
    } else {
        goal.name.clone()
    }
}

fn earner_monthly_income(earner: &Earner, year: u32) -> f64 {
    if earner.age.saturating_add(year).saturating_add(1) > earner.retirement_age {
        return 0.0;
    }
    let growth = 1.0 + earner.salary_increase_rate / 100.0;
    earner.monthly_income * growth.powi(year as i32)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn sanitized_goal(goal: &Goal) -> Goal {
    Goal {
        required_funds: finite_or_zero(goal.required_funds),
        current_savings: finite_or_zero(goal.current_savings),
        lump_sum_return_rate: goal.lump_sum_return_rate.filter(|rate| rate.is_finite()),
        periodic_return_rate: goal.periodic_return_rate.filter(|rate| rate.is_finite()),
        ..goal.clone()
    }
}

fn sanitized_assumptions(assumptions: &EconomicAssumptions) -> EconomicAssumptions {
    EconomicAssumptions {
        inflation_rate: finite_or_zero(assumptions.inflation_rate),
        education_inflation_rate: finite_or_zero(assumptions.education_inflation_rate),
        loan_interest_rate: finite_or_zero(assumptions.loan_interest_rate),
        expected_return_rate: finite_or_zero(assumptions.expected_return_rate),
        post_retirement_inflation_rate: finite_or_zero(assumptions.post_retirement_inflation_rate),
        post_retirement_return_rate: finite_or_zero(assumptions.post_retirement_return_rate),
    }
}

fn sanitized_earner(earner: &Earner) -> Earner {
    Earner {
        monthly_income: finite_or_zero(earner.monthly_income),
        pension: finite_or_zero(earner.pension),
        salary_increase_rate: finite_or_zero(earner.salary_increase_rate),
        ..*earner
    }
}

fn sanitized_personal_info(info: &PersonalInfo) -> PersonalInfo {
    PersonalInfo {
        client: sanitized_earner(&info.client),
        spouse: sanitized_earner(&info.spouse),
        dependents: info.dependents.clone(),
    }
}
