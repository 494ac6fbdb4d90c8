//! Rule-based academic risk predictor

use crate::contracts::{PredictRequest, Prediction, RiskLevel};

/// Attendance below this is high risk
pub const HIGH_RISK_ATTENDANCE: f64 = 75.0;
/// Marks below this are high risk
pub const HIGH_RISK_MARKS: f64 = 50.0;
/// Attendance below this is medium risk
pub const MEDIUM_RISK_ATTENDANCE: f64 = 85.0;
/// Marks below this are medium risk
pub const MEDIUM_RISK_MARKS: f64 = 70.0;

/// Classify risk and estimate CGPA from attendance and marks (both percentages)
pub fn predict(request: &PredictRequest) -> Prediction {
    let attendance = clamp_percent(request.attendance);
    let marks = clamp_percent(request.marks);

    let risk_level = if attendance < HIGH_RISK_ATTENDANCE || marks < HIGH_RISK_MARKS {
        RiskLevel::High
    } else if attendance < MEDIUM_RISK_ATTENDANCE || marks < MEDIUM_RISK_MARKS {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let raw = (attendance * 0.03 + marks * 0.07) * 0.1 * 10.0;
    let predicted_cgpa = ((raw * 100.0).round() / 100.0).clamp(0.0, 10.0);

    Prediction {
        risk_level,
        predicted_cgpa,
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}
