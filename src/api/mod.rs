use axum::{
    Router,
    extract::Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use tokio::net::TcpListener;

use crate::core::{
    Dependent, DerivedGoal, Earner, EconomicAssumptions, Goal, GoalCategory, InflationTrack,
    PersonalInfo, PlanResult, YearlyCashFlow, category_from_name, run_plan,
};

const MAX_GOALS: usize = 200;
const MAX_PLAN_YEARS: u32 = 600;
const MAX_AGE_YEARS: u32 = 150;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiGoalCategory {
    Generic,
    Education,
    Retirement,
    #[serde(alias = "loanRepayment", alias = "loan_repayment", alias = "loan")]
    LoanRepayment,
}

impl From<ApiGoalCategory> for GoalCategory {
    fn from(value: ApiGoalCategory) -> Self {
        match value {
            ApiGoalCategory::Generic => GoalCategory::Generic(InflationTrack::General),
            ApiGoalCategory::Education => GoalCategory::Generic(InflationTrack::Education),
            ApiGoalCategory::Retirement => GoalCategory::Retirement,
            ApiGoalCategory::LoanRepayment => GoalCategory::LoanRepayment,
        }
    }
}

// Legacy snapshot shape: every section and field optional, unknown keys
// (such as a stored totalSavingsPrincipal) ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    economic_assumptions: Option<AssumptionsPayload>,
    personal_info: Option<PersonalInfoPayload>,
    goals: Option<Vec<GoalPayload>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AssumptionsPayload {
    inflation_rate: Option<f64>,
    education_inflation_rate: Option<f64>,
    loan_interest_rate: Option<f64>,
    expected_return_rate: Option<f64>,
    post_retirement_inflation_rate: Option<f64>,
    #[serde(alias = "postRetirementReturnRate")]
    post_retirement_expected_return_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PersonalInfoPayload {
    client_age: Option<u32>,
    client_income: Option<f64>,
    client_pension: Option<f64>,
    client_retirement_age: Option<u32>,
    client_life_expectancy: Option<u32>,
    client_salary_increase_rate: Option<f64>,
    spouse_age: Option<u32>,
    spouse_income: Option<f64>,
    spouse_pension: Option<f64>,
    spouse_retirement_age: Option<u32>,
    spouse_life_expectancy: Option<u32>,
    spouse_salary_increase_rate: Option<f64>,
    children: Option<Vec<DependentPayload>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DependentPayload {
    age: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GoalPayload {
    id: Option<u64>,
    name: Option<String>,
    category: Option<ApiGoalCategory>,
    timing: Option<u32>,
    required_funds: Option<f64>,
    current_savings: Option<f64>,
    saving_start: Option<u32>,
    saving_period: Option<u32>,
    lump_sum_return_rate: Option<f64>,
    periodic_return_rate: Option<f64>,
}

#[derive(Debug)]
struct PlanRequest {
    assumptions: EconomicAssumptions,
    personal_info: PersonalInfo,
    goals: Vec<Goal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanResponse {
    goals: Vec<DerivedGoal>,
    schedule: Vec<YearlyCashFlow>,
    chart_axis_max: f64,
    client_expected_income: f64,
    spouse_expected_income: f64,
    total_current_savings: f64,
    total_monthly_payment: f64,
    total_savings_principal: f64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/plan", get(plan_get_handler).post(plan_post_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("Goal plan HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/plan");

    axum::serve(listener, app).await
}

pub fn run_plan_file(input: Option<&Path>, pretty: bool) -> Result<(), String> {
    let payload = match input {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
            serde_json::from_str::<PlanPayload>(&raw)
                .map_err(|e| format!("invalid plan JSON in {}: {e}", path.display()))?
        }
        None => PlanPayload::default(),
    };

    let request = plan_request_from_payload(payload)?;
    let response = build_plan_response(&request);
    let json = if pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    }
    .map_err(|e| format!("failed to serialize response: {e}"))?;
    println!("{json}");
    Ok(())
}

async fn plan_get_handler() -> Response {
    plan_handler_impl(PlanPayload::default()).await
}

async fn plan_post_handler(Json(payload): Json<PlanPayload>) -> Response {
    plan_handler_impl(payload).await
}

async fn plan_handler_impl(payload: PlanPayload) -> Response {
    let request = match plan_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    json_response(StatusCode::OK, build_plan_response(&request))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn plan_request_from_json(json: &str) -> Result<PlanRequest, String> {
    let payload = serde_json::from_str::<PlanPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    plan_request_from_payload(payload)
}

fn plan_request_from_payload(payload: PlanPayload) -> Result<PlanRequest, String> {
    let mut request = default_plan();

    if let Some(assumptions) = payload.economic_assumptions {
        if let Some(v) = assumptions.inflation_rate {
            request.assumptions.inflation_rate = v;
        }
        if let Some(v) = assumptions.education_inflation_rate {
            request.assumptions.education_inflation_rate = v;
        }
        if let Some(v) = assumptions.loan_interest_rate {
            request.assumptions.loan_interest_rate = v;
        }
        if let Some(v) = assumptions.expected_return_rate {
            request.assumptions.expected_return_rate = v;
        }
        if let Some(v) = assumptions.post_retirement_inflation_rate {
            request.assumptions.post_retirement_inflation_rate = v;
        }
        if let Some(v) = assumptions.post_retirement_expected_return_rate {
            request.assumptions.post_retirement_return_rate = v;
        }
    }

    if let Some(info) = payload.personal_info {
        if let Some(v) = info.client_age {
            request.personal_info.client.age = v;
        }
        if let Some(v) = info.client_income {
            request.personal_info.client.monthly_income = v;
        }
        if let Some(v) = info.client_pension {
            request.personal_info.client.pension = v;
        }
        if let Some(v) = info.client_retirement_age {
            request.personal_info.client.retirement_age = v;
        }
        if let Some(v) = info.client_life_expectancy {
            request.personal_info.client.life_expectancy = v;
        }
        if let Some(v) = info.client_salary_increase_rate {
            request.personal_info.client.salary_increase_rate = v;
        }
        if let Some(v) = info.spouse_age {
            request.personal_info.spouse.age = v;
        }
        if let Some(v) = info.spouse_income {
            request.personal_info.spouse.monthly_income = v;
        }
        if let Some(v) = info.spouse_pension {
            request.personal_info.spouse.pension = v;
        }
        if let Some(v) = info.spouse_retirement_age {
            request.personal_info.spouse.retirement_age = v;
        }
        if let Some(v) = info.spouse_life_expectancy {
            request.personal_info.spouse.life_expectancy = v;
        }
        if let Some(v) = info.spouse_salary_increase_rate {
            request.personal_info.spouse.salary_increase_rate = v;
        }
        if let Some(children) = info.children {
            request.personal_info.dependents = children
                .into_iter()
                .map(|child| Dependent {
                    age: child.age.unwrap_or(0),
                })
                .collect();
        }
    }

    if let Some(goals) = payload.goals {
        request.goals = goals
            .into_iter()
            .enumerate()
            .map(|(position, goal)| goal_from_payload(goal, position))
            .collect();
    }

    validate_request(&request)?;
    Ok(request)
}

fn goal_from_payload(payload: GoalPayload, position: usize) -> Goal {
    let name = payload.name.unwrap_or_default();
    let category = payload
        .category
        .map(GoalCategory::from)
        .unwrap_or_else(|| category_from_name(&name));

    Goal {
        id: payload.id.unwrap_or(position as u64 + 1),
        name,
        category,
        timing: payload.timing.unwrap_or(0),
        required_funds: payload.required_funds.unwrap_or(0.0),
        current_savings: payload.current_savings.unwrap_or(0.0),
        saving_start: payload.saving_start.unwrap_or(0),
        saving_period: payload.saving_period.unwrap_or(0),
        lump_sum_return_rate: payload.lump_sum_return_rate,
        periodic_return_rate: payload.periodic_return_rate,
    }
}

// Resource caps, not plausibility checks; the schedule allocation is linear
// in goal count times horizon.
fn validate_request(request: &PlanRequest) -> Result<(), String> {
    if request.goals.len() > MAX_GOALS {
        return Err(format!("goals must contain at most {MAX_GOALS} entries"));
    }

    for (index, goal) in request.goals.iter().enumerate() {
        for (field, value) in [
            ("timing", goal.timing),
            ("savingStart", goal.saving_start),
            ("savingPeriod", goal.saving_period),
        ] {
            if value > MAX_PLAN_YEARS {
                return Err(format!(
                    "goals[{index}].{field} must be <= {MAX_PLAN_YEARS}"
                ));
            }
        }
        if goal.saving_start.saturating_add(goal.saving_period) > MAX_PLAN_YEARS {
            return Err(format!(
                "goals[{index}].savingStart + savingPeriod must be <= {MAX_PLAN_YEARS}"
            ));
        }
    }

    let info = &request.personal_info;
    for (field, value) in [
        ("clientAge", info.client.age),
        ("clientRetirementAge", info.client.retirement_age),
        ("clientLifeExpectancy", info.client.life_expectancy),
        ("spouseAge", info.spouse.age),
        ("spouseRetirementAge", info.spouse.retirement_age),
        ("spouseLifeExpectancy", info.spouse.life_expectancy),
    ] {
        if value > MAX_AGE_YEARS {
            return Err(format!("{field} must be <= {MAX_AGE_YEARS}"));
        }
    }

    Ok(())
}

fn default_plan() -> PlanRequest {
    let goals = [
        (1, "결혼자금", 3, 5_000.0, 2_000.0, 0, 3),
        (2, "전세자금", 3, 5_000.0, 0.0, 0, 3),
        (3, "주택마련", 11, 20_000.0, 0.0, 3, 8),
        (4, "대출상환", 11, 20_000.0, 0.0, 11, 20),
        (5, "첫째대학", 24, 5_000.0, 0.0, 11, 13),
        (6, "둘째대학", 26, 5_000.0, 0.0, 11, 15),
        (7, "첫째결혼", 34, 10_000.0, 0.0, 24, 10),
        (8, "둘째결혼", 36, 10_000.0, 0.0, 26, 10),
        (9, "은퇴자금", 35, 100.0, 0.0, 24, 11),
        (10, "은퇴자금2", 35, 100.0, 0.0, 24, 11),
    ]
    .into_iter()
    .map(
        |(id, name, timing, required_funds, current_savings, saving_start, saving_period)| Goal {
            id,
            name: name.to_string(),
            category: category_from_name(name),
            timing,
            required_funds,
            current_savings,
            saving_start,
            saving_period,
            lump_sum_return_rate: None,
            periodic_return_rate: None,
        },
    )
    .collect();

    PlanRequest {
        assumptions: EconomicAssumptions {
            inflation_rate: 2.5,
            education_inflation_rate: 6.0,
            loan_interest_rate: 3.8,
            expected_return_rate: 2.5,
            post_retirement_inflation_rate: 2.0,
            post_retirement_return_rate: 3.0,
        },
        personal_info: PersonalInfo {
            client: Earner {
                age: 25,
                monthly_income: 300.0,
                pension: 80.0,
                retirement_age: 60,
                life_expectancy: 90,
                salary_increase_rate: 3.0,
            },
            spouse: Earner {
                age: 22,
                monthly_income: 250.0,
                pension: 70.0,
                retirement_age: 57,
                life_expectancy: 90,
                salary_increase_rate: 2.5,
            },
            dependents: vec![Dependent { age: -4 }],
        },
        goals,
    }
}

fn build_plan_response(request: &PlanRequest) -> PlanResponse {
    let result = run_plan(&request.goals, &request.assumptions, &request.personal_info);
    plan_response_from_result(result)
}

fn plan_response_from_result(result: PlanResult) -> PlanResponse {
    let total_current_savings = result.goals.iter().map(|goal| goal.current_savings).sum();
    let total_monthly_payment = result
        .goals
        .iter()
        .filter(|goal| goal.saving_start == 0)
        .map(|goal| goal.monthly_payment)
        .sum();
    let total_savings_principal = result
        .goals
        .iter()
        .map(|goal| goal.saving_period as f64 * goal.monthly_payment * 12.0)
        .sum();

    let mut response = PlanResponse {
        goals: result.goals,
        schedule: result.schedule.years,
        chart_axis_max: result.schedule.axis_max,
        client_expected_income: result.client_expected_income,
        spouse_expected_income: result.spouse_expected_income,
        total_current_savings,
        total_monthly_payment,
        total_savings_principal,
    };
    sanitize_response(&mut response);
    response
}

// Non-finite numbers render as zero rather than breaking JSON consumers.
fn sanitize_response(response: &mut PlanResponse) {
    for goal in &mut response.goals {
        for value in [
            &mut goal.required_funds,
            &mut goal.current_savings,
            &mut goal.future_value_required,
            &mut goal.future_value_current,
            &mut goal.shortfall,
            &mut goal.monthly_payment,
        ] {
            *value = displayable(*value);
        }
    }
    for year in &mut response.schedule {
        year.total_payment = displayable(year.total_payment);
        year.income = displayable(year.income);
        for slice in year.goals.values_mut() {
            slice.payment = displayable(slice.payment);
        }
    }
    response.chart_axis_max = displayable(response.chart_axis_max);
    response.client_expected_income = displayable(response.client_expected_income);
    response.spouse_expected_income = displayable(response.spouse_expected_income);
    response.total_current_savings = displayable(response.total_current_savings);
    response.total_monthly_payment = displayable(response.total_monthly_payment);
    response.total_savings_principal = displayable(response.total_savings_principal);
}

fn displayable(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn default_plan_matches_the_built_in_sample() {
        let request = default_plan();

        assert_eq!(request.goals.len(), 10);
        assert_eq!(request.goals[0].name, "결혼자금");
        assert_approx(request.goals[0].current_savings, 2_000.0);
        assert_eq!(request.goals[3].category, GoalCategory::LoanRepayment);
        assert_eq!(
            request.goals[4].category,
            GoalCategory::Generic(InflationTrack::Education)
        );
        assert_eq!(request.goals[8].category, GoalCategory::Retirement);
        assert_eq!(request.goals[9].category, GoalCategory::Retirement);

        assert_approx(request.assumptions.loan_interest_rate, 3.8);
        assert_eq!(request.personal_info.client.age, 25);
        assert_eq!(request.personal_info.spouse.retirement_age, 57);
        assert_eq!(request.personal_info.dependents.len(), 1);
        assert_eq!(request.personal_info.dependents[0].age, -4);
    }

    #[test]
    fn empty_payload_falls_back_to_the_default_plan() {
        let request = plan_request_from_json("{}").expect("empty payload is valid");
        assert_eq!(request.goals.len(), 10);
        assert_eq!(request.personal_info.client.age, 25);
        assert_approx(request.assumptions.expected_return_rate, 2.5);
    }

    #[test]
    fn legacy_snapshot_overlays_the_default_plan() {
        let json = r#"{
          "economicAssumptions": { "inflationRate": 3.0 },
          "personalInfo": {
            "clientAge": 30,
            "spouseIncome": 200,
            "children": [{ "age": 3 }, { "age": -1 }]
          },
          "goals": [
            { "name": "은퇴자금", "timing": 30, "requiredFunds": 150, "savingStart": 5, "savingPeriod": 20 },
            { "id": 9, "name": "자동차", "timing": 4, "requiredFunds": 3000, "savingPeriod": 4 }
          ],
          "totalSavingsPrincipal": 123456
        }"#;

        let request = plan_request_from_json(json).expect("snapshot should parse");

        assert_approx(request.assumptions.inflation_rate, 3.0);
        assert_approx(request.assumptions.education_inflation_rate, 6.0);
        assert_eq!(request.personal_info.client.age, 30);
        assert_eq!(request.personal_info.client.retirement_age, 60);
        assert_approx(request.personal_info.spouse.monthly_income, 200.0);
        assert_eq!(request.personal_info.dependents.len(), 2);

        // The goals array replaces the default list wholesale.
        assert_eq!(request.goals.len(), 2);
        assert_eq!(request.goals[0].id, 1);
        assert_eq!(request.goals[0].category, GoalCategory::Retirement);
        assert_eq!(request.goals[1].id, 9);
        assert_eq!(
            request.goals[1].category,
            GoalCategory::Generic(InflationTrack::General)
        );
        assert_approx(request.goals[1].current_savings, 0.0);
    }

    #[test]
    fn explicit_category_beats_name_inference() {
        let json = r#"{
          "goals": [
            { "name": "은퇴자금", "category": "loan-repayment", "requiredFunds": 1000, "savingPeriod": 5 }
          ]
        }"#;
        let request = plan_request_from_json(json).expect("snapshot should parse");
        assert_eq!(request.goals[0].category, GoalCategory::LoanRepayment);
    }

    #[test]
    fn category_accepts_kebab_case_and_aliases() {
        for spelling in ["\"loan-repayment\"", "\"loanRepayment\"", "\"loan_repayment\""] {
            let json = format!(r#"{{ "goals": [{{ "category": {spelling} }}] }}"#);
            let request = plan_request_from_json(&json).expect("category should parse");
            assert_eq!(request.goals[0].category, GoalCategory::LoanRepayment);
        }

        let json = r#"{ "goals": [{ "category": "education" }] }"#;
        let request = plan_request_from_json(json).expect("category should parse");
        assert_eq!(
            request.goals[0].category,
            GoalCategory::Generic(InflationTrack::Education)
        );
    }

    #[test]
    fn rejects_unparseable_payloads() {
        let err = plan_request_from_json("{nonsense").expect_err("must reject bad JSON");
        assert!(err.contains("Invalid API JSON payload"));
    }

    #[test]
    fn rejects_oversized_plans() {
        let err = plan_request_from_json(r#"{ "goals": [{ "timing": 601 }] }"#)
            .expect_err("must reject oversized timing");
        assert!(err.contains("goals[0].timing"));

        let err =
            plan_request_from_json(r#"{ "goals": [{ "savingStart": 400, "savingPeriod": 300 }] }"#)
                .expect_err("must reject oversized window");
        assert!(err.contains("savingStart + savingPeriod"));

        let goals: Vec<String> = (0..201).map(|_| "{}".to_string()).collect();
        let json = format!(r#"{{ "goals": [{}] }}"#, goals.join(","));
        let err = plan_request_from_json(&json).expect_err("must reject too many goals");
        assert!(err.contains("at most 200"));

        let err = plan_request_from_json(r#"{ "personalInfo": { "clientAge": 151 } }"#)
            .expect_err("must reject oversized age");
        assert!(err.contains("clientAge"));
    }

    #[test]
    fn missing_goal_ids_default_to_their_position() {
        let json = r#"{ "goals": [{}, {}, { "id": 42 }] }"#;
        let request = plan_request_from_json(json).expect("snapshot should parse");
        assert_eq!(request.goals[0].id, 1);
        assert_eq!(request.goals[1].id, 2);
        assert_eq!(request.goals[2].id, 42);
    }

    #[test]
    fn response_totals_follow_the_legacy_rules() {
        let request = default_plan();
        let response = build_plan_response(&request);

        // Only the first goal carries current savings in the default plan.
        assert_approx(response.total_current_savings, 2_000.0);

        // The summary row only counts payments that start immediately.
        let starting_now: f64 = response
            .goals
            .iter()
            .filter(|goal| goal.saving_start == 0)
            .map(|goal| goal.monthly_payment)
            .sum();
        assert_approx(
            response.total_monthly_payment,
            response.goals[0].monthly_payment + response.goals[1].monthly_payment,
        );
        assert_approx(response.total_monthly_payment, starting_now);

        let principal: f64 = response
            .goals
            .iter()
            .map(|goal| goal.saving_period as f64 * goal.monthly_payment * 12.0)
            .sum();
        assert!(principal > 0.0);
        assert_approx(response.total_savings_principal, principal);

        // The default plan's first goal is the hand-checked marriage goal.
        assert_approx(response.goals[0].future_value_required, 5_384.453125);
        assert_approx(response.goals[0].future_value_current, 2_153.78125);
        assert_approx(response.goals[0].shortfall, 3_230.671875);
    }

    #[test]
    fn response_serializes_with_legacy_field_names() {
        let request = default_plan();
        let response = build_plan_response(&request);
        let json = serde_json::to_string(&response).expect("response should serialize");

        for field in [
            "\"goals\"",
            "\"schedule\"",
            "\"chartAxisMax\"",
            "\"clientExpectedIncome\"",
            "\"spouseExpectedIncome\"",
            "\"totalCurrentSavings\"",
            "\"totalMonthlyPayment\"",
            "\"totalSavingsPrincipal\"",
            "\"futureValueRequired\"",
            "\"futureValueCurrent\"",
            "\"holdingPeriod\"",
            "\"monthlyPayment\"",
            "\"totalPayment\"",
            "\"year\":1",
        ] {
            assert!(json.contains(field), "missing {field} in {json}");
        }
    }

    #[test]
    fn non_finite_outputs_are_displayed_as_zero() {
        let json = r#"{
          "goals": [
            { "name": "여행자금", "timing": 5, "requiredFunds": 1000,
              "savingStart": 0, "savingPeriod": 3, "lumpSumReturnRate": -100 }
          ]
        }"#;
        let request = plan_request_from_json(json).expect("snapshot should parse");
        let response = build_plan_response(&request);

        // The core lets this blow up to infinity; the boundary flattens it.
        assert_approx(response.goals[0].monthly_payment, 0.0);
        assert_approx(response.total_monthly_payment, 0.0);
        assert_approx(response.total_savings_principal, 0.0);
        for year in &response.schedule {
            assert!(year.total_payment.is_finite());
            for slice in year.goals.values() {
                assert!(slice.payment.is_finite());
            }
        }

        let serialized = serde_json::to_string(&response).expect("response should serialize");
        assert!(!serialized.contains("null"), "no non-finite leftovers");
    }
}
