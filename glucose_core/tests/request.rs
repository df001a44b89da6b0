use glucose_core::error::BuildError;
use glucose_core::mocks::{FixedActivity, FixedClock};
use glucose_core::{
    CurrentTemp, Decision, DecisionEngine, DeterminationRequest, GlucoseStatus, MealData, Profile,
    Result,
};
use rstest::{fixture, rstest};

#[fixture]
fn status() -> GlucoseStatus {
    GlucoseStatus {
        glucose: 142.0,
        delta: 4.25,
        short_avg_delta: 3.5,
        long_avg_delta: 1.25,
        date: 1_700_000_000_000,
        dura_isf_minutes: 20.0,
        dura_isf_average: 139.5,
        parabola_minutes: 25.0,
        delta_pl: 4.44,
        delta_pn: 5.56,
        bg_acceleration: 1.234,
        a0: 141.96,
        a1: 5.004,
        a2: 0.556,
        corr_squ: 0.987_654,
        ..GlucoseStatus::default()
    }
}

#[rstest]
fn missing_status_yields_typed_build_error() {
    let err = DeterminationRequest::builder()
        .with_profile(Profile::default())
        .try_build()
        .expect_err("should fail with MissingGlucoseStatus");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingGlucoseStatus) => {}
        other => panic!("expected MissingGlucoseStatus, got: {other:?}"),
    }
}

#[rstest]
fn missing_profile_yields_typed_build_error(status: GlucoseStatus) {
    let err = DeterminationRequest::builder()
        .with_glucose_status(status)
        .try_build()
        .expect_err("should fail with MissingProfile");
    assert_eq!(err.downcast_ref::<BuildError>(), Some(&BuildError::MissingProfile));
}

#[rstest]
#[case::zero_isf(Profile { sens: 0.0, ..Profile::default() })]
#[case::inverted_range(Profile { min_bg: 150.0, max_bg: 100.0, ..Profile::default() })]
fn invalid_profile_is_rejected(status: GlucoseStatus, #[case] profile: Profile) {
    let err = DeterminationRequest::builder()
        .with_glucose_status(status)
        .with_profile(profile)
        .build()
        .expect_err("invalid profile");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));
}

#[rstest]
fn wire_view_uses_engine_keys_and_precision(status: GlucoseStatus) {
    let req = DeterminationRequest::builder()
        .with_glucose_status(status)
        .with_profile(Profile::default())
        .with_activity_from(&FixedActivity {
            steps_per_minute: 10,
            phone_moved: true,
        })
        .with_clock(&FixedClock(42))
        .build()
        .unwrap();

    let gs = &req.glucose_status;
    assert_eq!(gs.delta, 4.25);
    assert_eq!(gs.parabola_fit_correlation, 0.9877);
    assert_eq!(gs.parabola_fit_last_delta, 4.4);
    assert_eq!(gs.parabola_fit_next_delta, 5.6);
    assert_eq!(gs.parabola_fit_a0, 142.0);
    assert_eq!(gs.parabola_fit_a1, 5.0);
    assert_eq!(gs.parabola_fit_a2, 0.56);
    assert_eq!(gs.bg_acceleration, 1.23);
    assert_eq!(req.activity.steps_60m, 600);
    assert_eq!(req.current_time, 42);

    let json: serde_json::Value = serde_json::from_str(&req.to_json().unwrap()).unwrap();
    let gs = &json["glucose_status"];
    for key in [
        "short_avgdelta",
        "long_avgdelta",
        "dura_ISF_minutes",
        "dura_ISF_average",
        "useFSL1minuteSmooth",
        "parabola_fit_correlation",
        "parabola_fit_minutes",
        "bg_acceleration",
    ] {
        assert!(gs.get(key).is_some(), "missing {key}");
    }
    assert_eq!(json["activity"]["recentSteps5Minutes"], 50);
    assert_eq!(json["activity"]["phone_moved"], true);
    assert_eq!(json["meal_data"]["mealCOB"], 0.0);
}

#[rstest]
fn short_average_can_replace_delta(status: GlucoseStatus) {
    let req = DeterminationRequest::builder()
        .with_glucose_status(status)
        .with_profile(Profile::default())
        .with_always_use_short_avg(true)
        .build()
        .unwrap();
    assert_eq!(req.glucose_status.delta, 3.5);
    assert_eq!(req.current_time, status.date);
}

#[rstest]
fn engine_sees_the_request_unchanged(status: GlucoseStatus) {
    let req = DeterminationRequest::builder()
        .with_glucose_status(status)
        .with_profile(Profile::default())
        .with_autosens_ratio(1.1)
        .build()
        .unwrap();
    let engine = |r: &DeterminationRequest| -> Result<Decision> {
        Ok(Decision {
            rate: Some(r.profile.current_basal * r.autosens_ratio),
            duration: Some(30),
            units: None,
            reason: format!("bg {}", r.glucose_status.glucose),
        })
    };
    let before = req.clone();
    let d = engine.determine(&req).unwrap();
    assert_eq!(d.reason, "bg 142");
    assert_eq!(d.duration, Some(30));
    assert_eq!(req, before);
}

#[rstest]
fn optional_inputs_reach_the_wire(status: GlucoseStatus) {
    let req = DeterminationRequest::builder()
        .with_current_temp(CurrentTemp {
            duration: 20,
            rate: 0.8,
            minutes_running: Some(10),
        })
        .with_meal_data(MealData {
            carbs: 30.0,
            meal_cob: 12.5,
            ..MealData::default()
        })
        .with_micro_bolus_allowed(true)
        .with_flat_bgs_detected(true)
        .with_profile(Profile::default())
        .with_glucose_status(status)
        .build()
        .unwrap();
    assert!(req.micro_bolus_allowed && req.flat_bgs_detected);

    let json: serde_json::Value = serde_json::from_str(&req.to_json().unwrap()).unwrap();
    assert_eq!(json["current_temp"]["minutesrunning"], 10);
    assert_eq!(json["meal_data"]["mealCOB"], 12.5);
    assert_eq!(json["meal_data"]["carbs"], 30.0);
}

#[rstest]
#[case::zero(0.0)]
#[case::nan(f64::NAN)]
fn autosens_ratio_must_be_positive(status: GlucoseStatus, #[case] ratio: f64) {
    let err = DeterminationRequest::builder()
        .with_glucose_status(status)
        .with_profile(Profile::default())
        .with_autosens_ratio(ratio)
        .build()
        .expect_err("bad ratio");
    assert_eq!(
        err.downcast_ref::<BuildError>(),
        Some(&BuildError::InvalidConfig("autosens ratio must be > 0"))
    );
}
