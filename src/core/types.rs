use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InflationTrack {
    General,
    Education,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GoalCategory {
    Generic(InflationTrack),
    Retirement,
    LoanRepayment,
}

#[derive(Debug, Clone, Copy)]
pub struct EconomicAssumptions {
    pub inflation_rate: f64,
    pub education_inflation_rate: f64,
    pub loan_interest_rate: f64,
    pub expected_return_rate: f64,
    pub post_retirement_inflation_rate: f64,
    pub post_retirement_return_rate: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Earner {
    pub age: u32,
    pub monthly_income: f64,
    pub pension: f64,
    pub retirement_age: u32,
    pub life_expectancy: u32,
    pub salary_increase_rate: f64,
}

// A negative age counts years until birth.
#[derive(Debug, Clone, Copy)]
pub struct Dependent {
    pub age: i32,
}

#[derive(Debug, Clone)]
pub struct PersonalInfo {
    pub client: Earner,
    pub spouse: Earner,
    pub dependents: Vec<Dependent>,
}

#[derive(Debug, Clone)]
pub struct Goal {
    pub id: u64,
    pub name: String,
    pub category: GoalCategory,
    pub timing: u32,
    pub required_funds: f64,
    pub current_savings: f64,
    pub saving_start: u32,
    pub saving_period: u32,
    pub lump_sum_return_rate: Option<f64>,
    pub periodic_return_rate: Option<f64>,
}

pub const GOAL_COLORS: [&str; 16] = [
    "#ffadad", // pastel red
    "#ffd6a5", // pastel orange
    "#fdffb6", // pastel yellow
    "#caffbf", // pastel green
    "#9bf6ff", // pastel cyan
    "#a0c4ff", // pastel blue
    "#bdb2ff", // pastel purple
    "#ffc6ff", // pastel magenta
    "#f0e68c", // khaki
    "#ffdab9", // peach
    "#e6e6fa", // lavender
    "#b0e0e6", // powder blue
    "#d8bfd8", // thistle
    "#c1e1c1", // mint
    "#f5e3e6", // soft pink
    "#e2d2f2", // light lavender
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedGoal {
    pub id: u64,
    pub name: String,
    pub timing: u32,
    pub required_funds: f64,
    pub current_savings: f64,
    pub saving_start: u32,
    pub saving_period: u32,
    pub future_value_required: f64,
    pub future_value_current: f64,
    pub shortfall: f64,
    pub holding_period: i32,
    pub monthly_payment: f64,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalContribution {
    pub name: String,
    pub payment: f64,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyCashFlow {
    pub year: u32,
    pub total_payment: f64,
    pub goals: BTreeMap<u64, GoalContribution>,
    pub income: f64,
}

#[derive(Debug, Clone)]
pub struct Schedule {
    pub years: Vec<YearlyCashFlow>,
    pub axis_max: f64,
}

#[derive(Debug, Clone)]
pub struct PlanResult {
    pub goals: Vec<DerivedGoal>,
    pub schedule: Schedule,
    pub client_expected_income: f64,
    pub spouse_expected_income: f64,
}
