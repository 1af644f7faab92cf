use super::types::{GoalCategory, InflationTrack};

// Marker substrings from plans saved before goals carried an explicit
// category; names were the only classification such snapshots had.
pub const RETIREMENT_MARKER: &str = "은퇴";
pub const LOAN_REPAYMENT_MARKER: &str = "대출상환";
pub const EDUCATION_MARKER: &str = "대학";

pub fn category_from_name(name: &str) -> GoalCategory {
    if name.contains(RETIREMENT_MARKER) {
        GoalCategory::Retirement
    } else if name.contains(LOAN_REPAYMENT_MARKER) {
        GoalCategory::LoanRepayment
    } else if name.contains(EDUCATION_MARKER) {
        GoalCategory::Generic(InflationTrack::Education)
    } else {
        GoalCategory::Generic(InflationTrack::General)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_legacy_goal_names() {
        let cases = [
            ("결혼자금", GoalCategory::Generic(InflationTrack::General)),
            ("주택구입", GoalCategory::Generic(InflationTrack::General)),
            ("첫째 대학자금", GoalCategory::Generic(InflationTrack::Education)),
            ("둘째 대학자금", GoalCategory::Generic(InflationTrack::Education)),
            ("주택확장(대출상환)", GoalCategory::LoanRepayment),
            ("은퇴자금", GoalCategory::Retirement),
        ];
        for (name, expected) in cases {
            assert_eq!(category_from_name(name), expected, "name {name}");
        }
    }

    #[test]
    fn retirement_marker_wins_over_loan_marker() {
        assert_eq!(
            category_from_name("은퇴 대출상환"),
            GoalCategory::Retirement
        );
        assert_eq!(
            category_from_name("대출상환 후 은퇴"),
            GoalCategory::Retirement
        );
    }

    #[test]
    fn unmarked_names_follow_general_inflation() {
        assert_eq!(
            category_from_name(""),
            GoalCategory::Generic(InflationTrack::General)
        );
        assert_eq!(
            category_from_name("자동차 구입"),
            GoalCategory::Generic(InflationTrack::General)
        );
    }
}
