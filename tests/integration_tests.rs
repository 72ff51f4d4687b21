use chrono::NaiveDate;
use crop_price_forecaster::*;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use std::io::Write;
use std::process::{Command, Output, Stdio};

fn run_forecast_binary(stdin: &str, seed: &str) -> anyhow::Result<Output> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_price_forecast"))
        .env_remove("CROP_PRICE_CONFIG")
        .env("CROP_PRICE_SEED", seed)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(mut pipe) = child.stdin.take() {
        pipe.write_all(stdin.as_bytes())?;
    }

    Ok(child.wait_with_output()?)
}

fn run_estimate_binary(args: &[&str]) -> anyhow::Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_quick_estimate"))
        .args(args)
        .env_remove("CROP_PRICE_CONFIG")
        .env_remove("CROP_PRICE_SEED")
        .output()?)
}

fn single_json_line(output: &Output) -> anyhow::Result<Value> {
    let stdout = String::from_utf8(output.stdout.clone())?;
    assert_eq!(stdout.lines().count(), 1, "stdout was {:?}", stdout);
    Ok(serde_json::from_str(stdout.trim())?)
}

fn assert_day_points(points: &Value) {
    let points = points.as_array().expect("array of day points");
    assert_eq!(points.len(), 7);
    for point in points {
        assert_eq!(point["day"].as_str().map(str::len), Some(3));
        assert!(point["date"].as_str().is_some());
        let price = point["price"].as_i64().expect("integer price");
        assert!(price > 0);
    }
}

#[test]
fn test_forecaster_binary_happy_path() -> anyhow::Result<()> {
    let output = run_forecast_binary("{\"currentPrice\": 3000}\n", "42")?;
    assert!(output.status.success());

    let json = single_json_line(&output)?;
    assert!(json.get("error").is_none());
    assert_day_points(&json["history"]);
    assert_day_points(&json["forecast"]);
    assert_eq!(json["history"][6]["price"], 3000);
    Ok(())
}

#[test]
fn test_forecaster_binary_tolerates_garbage() -> anyhow::Result<()> {
    for stdin in ["", "garbage", "{\"currentPrice\": "] {
        let output = run_forecast_binary(stdin, "7")?;
        assert_eq!(output.status.code(), Some(0));

        let json = single_json_line(&output)?;
        assert_eq!(json["history"][6]["price"], 2000, "stdin {:?}", stdin);
    }
    Ok(())
}

#[test]
fn test_forecaster_binary_reports_errors_as_json() -> anyhow::Result<()> {
    let output = run_forecast_binary("{\"currentPrice\": \"abc\"}", "7")?;
    assert_eq!(output.status.code(), Some(0));

    let json = single_json_line(&output)?;
    assert!(json["error"].as_str().is_some());
    assert_eq!(json["history"], serde_json::json!([]));
    assert_eq!(json["forecast"], serde_json::json!([]));
    Ok(())
}

#[test]
fn test_forecaster_binary_is_reproducible_with_seed() -> anyhow::Result<()> {
    let a = run_forecast_binary("{\"currentPrice\": 3300}", "99")?;
    let b = run_forecast_binary("{\"currentPrice\": 3300}", "99")?;
    assert_eq!(a.stdout, b.stdout);
    Ok(())
}

#[test]
fn test_estimator_binary_with_arguments() -> anyhow::Result<()> {
    let output = run_estimate_binary(&["Tomato", "Guntur"])?;
    assert!(output.status.success());

    let json = single_json_line(&output)?;
    assert_eq!(json["crop"], "Tomato");
    assert_eq!(json["location"], "Guntur");

    let current = json["current_price"].as_u64().expect("current price");
    let predicted = json["predicted_price"].as_u64().expect("predicted price");
    assert!((2000..5000).contains(&current));
    assert!((100..500).contains(&(predicted - current)));
    assert_eq!(json["trend"], if predicted > current { "UP" } else { "DOWN" });
    assert!(json["confidence_score"].as_str().unwrap_or("").ends_with('%'));
    assert_eq!(
        json["advisory"],
        "Prices for Tomato are trending UP. Best time to sell is in 3 days."
    );
    Ok(())
}

#[test]
fn test_estimator_binary_without_arguments() -> anyhow::Result<()> {
    let output = run_estimate_binary(&[])?;
    assert_eq!(output.status.code(), Some(0));

    let json = single_json_line(&output)?;
    assert_eq!(json["crop"], "Unknown");
    assert_eq!(json["location"], "Unknown");
    Ok(())
}

#[test]
fn test_estimator_binary_ignores_extra_arguments() -> anyhow::Result<()> {
    let output = run_estimate_binary(&["Onion", "Kurnool", "surplus"])?;
    assert_eq!(output.status.code(), Some(0));

    let json = single_json_line(&output)?;
    assert_eq!(json["crop"], "Onion");
    assert_eq!(json["location"], "Kurnool");
    Ok(())
}

#[test]
fn test_estimator_binary_treats_help_as_crop_name() -> anyhow::Result<()> {
    for flag in ["--help", "-h"] {
        let output = run_estimate_binary(&[flag, "Guntur"])?;
        assert_eq!(output.status.code(), Some(0));

        let json = single_json_line(&output)?;
        assert_eq!(json["crop"], flag);
        assert_eq!(json["location"], "Guntur");
    }
    Ok(())
}

#[test]
fn test_schema_flags_print_json_schema() -> anyhow::Result<()> {
    let output = run_estimate_binary(&["--schema"])?;
    let json = single_json_line(&output)?;
    assert!(json["properties"]["advisory"].is_object());
    Ok(())
}

#[test]
fn test_library_forecast_across_leap_day() {
    let today = NaiveDate::from_ymd_opt(2024, 2, 26).unwrap();
    let mut rng = StdRng::seed_from_u64(2024);
    let response = ForecastProcessor::process(
        r#"{"cropName": "Paddy", "currentPrice": 2183}"#,
        &ForecastConfig::default(),
        today,
        &mut rng,
    );

    let labels: Vec<&str> = response
        .forecast()
        .iter()
        .map(|p| p.date_label.as_str())
        .collect();
    assert_eq!(
        labels,
        vec!["27 Feb", "28 Feb", "29 Feb", "01 Mar", "02 Mar", "03 Mar", "04 Mar"]
    );
    assert_eq!(response.history()[6].price, 2183);
}

#[test]
fn test_response_round_trips_through_json() {
    let response = process_forecast(
        r#"{"currentPrice": 5120}"#,
        &ForecastConfig {
            seed: Some(5),
            ..ForecastConfig::default()
        },
        NaiveDate::from_ymd_opt(2023, 7, 1).unwrap(),
    );
    let json = serde_json::to_string(&response).unwrap();
    let parsed: ForecastResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, response);

    let failure = ForecastResponse::failure(PriceEngineError::InvalidPrice(-1.0));
    let json = serde_json::to_string(&failure).unwrap();
    let parsed: ForecastResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, failure);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_estimate_bounds_and_trend(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let estimate = estimate(&EstimateRequest::default(), &EstimatorConfig::default(), &mut rng);

        prop_assert!((2000..5000).contains(&estimate.current_price));
        prop_assert!((100..500).contains(&(estimate.predicted_price - estimate.current_price)));
        let expected = if estimate.predicted_price > estimate.current_price {
            Trend::Up
        } else {
            Trend::Down
        };
        prop_assert_eq!(estimate.trend, expected);
    }

    #[test]
    fn prop_series_anchors_to_current_price(price in 1.0f64..1_000_000.0, seed in any::<u64>()) {
        let analyzer = MarketAnalyzer::new(ForecastConfig::default());
        let today = NaiveDate::from_ymd_opt(2024, 10, 19).unwrap();
        let series = analyzer
            .synthesize(price, today, &mut StdRng::seed_from_u64(seed))
            .unwrap();

        prop_assert_eq!(series.len(), 365);
        prop_assert_eq!(series.last().unwrap().price, price.trunc() as i64);
    }

    #[test]
    fn prop_adjacent_days_are_close(day in 1u32..365) {
        let a = cyclical_features(day);
        let b = cyclical_features(day + 1);
        let distance = ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt();
        prop_assert!(distance < 0.1);
    }
}

#[test]
fn test_year_wraparound_distance() {
    let first = cyclical_features(1);
    let last = cyclical_features(365);
    let distance = ((first[0] - last[0]).powi(2) + (first[1] - last[1]).powi(2)).sqrt();
    assert!(distance < 0.1);
}
