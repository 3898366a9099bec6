//! Integration tests for the vendor analysis pipeline

use chrono::{TimeZone, Utc};
use prometheus::{Encoder, TextEncoder};
use risk_lib::{
    AnalysisConfig, AnalysisError, PriorityConfig, Record, RiskFinding, RiskLevel, RiskTrend,
    TimeSeriesAnalyzer, TrendDirection,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

fn daily(metric: &str, values: &[f64]) -> Vec<Record> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let day = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::days(i as i64);
            record(json!({
                "vendor_id": "V-100",
                "date": day.format("%Y-%m-%d").to_string(),
                metric: v,
            }))
        })
        .collect()
}

fn declining_delivery() -> Vec<Record> {
    let values: Vec<f64> = (0..30).map(|i| 95.0 - 35.0 * i as f64 / 29.0).collect();
    daily("on_time_delivery", &values)
}

fn priority(finding: &RiskFinding, config: &PriorityConfig) -> f64 {
    let weight = match finding.level {
        RiskLevel::Critical => config.critical_weight,
        RiskLevel::High => config.high_weight,
        RiskLevel::Medium => config.medium_weight,
        RiskLevel::Low => config.low_weight,
    };
    let days = finding.time_to_impact_days.max(1) as f64;
    weight * finding.confidence / days.powf(config.decay_exponent)
}

#[tokio::test]
async fn test_declining_delivery_scenario() {
    let analyzer = TimeSeriesAnalyzer::default();
    let analysis = analyzer
        .analyze(&declining_delivery(), 30, None)
        .await
        .unwrap();

    let delivery = &analysis.metrics_analysis["on_time_delivery"];
    assert_eq!(delivery.trend.direction, TrendDirection::Decreasing);
    assert!((delivery.current_value - 60.0).abs() < 1e-9);

    let decline = analysis
        .risk_findings
        .iter()
        .find(|f| f.category == "performance_decline")
        .expect("performance_decline finding");
    assert!(matches!(decline.level, RiskLevel::High | RiskLevel::Critical));
    assert!(decline.time_to_impact_days <= 14);

    assert_eq!(analysis.risk_trend, RiskTrend::Deteriorating);
    assert!(analysis.predictions.risk_level >= RiskLevel::High);
    assert_eq!(analysis.predictions.horizon_days, 30);
}

#[tokio::test]
async fn test_constant_quality_has_no_anomalies() {
    let analyzer = TimeSeriesAnalyzer::default();
    let analysis = analyzer
        .analyze(&daily("quality_score", &[88.0; 12]), 7, None)
        .await
        .unwrap();

    assert!(analysis.anomalies.is_empty());
    assert_eq!(
        analysis.metrics_analysis["quality_score"].trend.direction,
        TrendDirection::Stable
    );
    assert_eq!(analysis.risk_trend, RiskTrend::Stable);
}

#[tokio::test]
async fn test_findings_sorted_by_priority() {
    let config = AnalysisConfig::default();
    let analyzer = TimeSeriesAnalyzer::new(config.clone());
    let mut records = declining_delivery();
    for r in records.iter_mut() {
        r.insert("quality_score".to_string(), json!(72.0));
        r.insert("financial_health_score".to_string(), json!(45.0));
        r.insert("spend_concentration".to_string(), json!(0.8));
    }

    let analysis = analyzer.analyze(&records, 30, None).await.unwrap();
    assert!(analysis.risk_findings.len() >= 4);
    for pair in analysis.risk_findings.windows(2) {
        assert!(priority(&pair[0], &config.priority) >= priority(&pair[1], &config.priority));
    }

    let json = serde_json::to_value(&analysis).unwrap();
    for finding in json["risk_findings"].as_array().unwrap() {
        assert!(finding.get("priority").is_none());
    }
}

#[tokio::test]
async fn test_output_mapping_shape() {
    let analyzer = TimeSeriesAnalyzer::default();
    let analysis = analyzer
        .analyze(&declining_delivery(), 7, None)
        .await
        .unwrap();

    let json = serde_json::to_value(&analysis).unwrap();
    for key in [
        "metrics_analysis",
        "anomalies",
        "change_points",
        "predictions",
        "risk_trend",
        "risk_findings",
        "degraded",
        "generated_at",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert_eq!(json["degraded"], serde_json::json!([]));
    assert_eq!(json["risk_trend"], "deteriorating");
    let forecast = &json["metrics_analysis"]["on_time_delivery"]["forecast"];
    assert_eq!(forecast["values"].as_array().unwrap().len(), 7);
    assert_eq!(forecast["method"], "seasonal_trend");
}

#[tokio::test]
async fn test_weekly_pattern_is_seasonal() {
    let pattern = [0.0, 3.0, 5.0, 3.0, 0.0, -5.0, -6.0];
    let values: Vec<f64> = (0..42).map(|i| 85.0 + pattern[i % 7]).collect();
    let analyzer = TimeSeriesAnalyzer::default();
    let analysis = analyzer
        .analyze(&daily("quality_score", &values), 14, None)
        .await
        .unwrap();

    let quality = &analysis.metrics_analysis["quality_score"];
    let seasonality = quality.seasonality.expect("seasonality result");
    assert!(seasonality.seasonal);
    assert_eq!(seasonality.period, 7);
}

#[tokio::test]
async fn test_mean_shift_reports_change_point() {
    let mut values = vec![95.0; 20];
    values.extend(vec![70.0; 20]);
    let analyzer = TimeSeriesAnalyzer::default();
    let analysis = analyzer
        .analyze(&daily("on_time_delivery", &values), 7, None)
        .await
        .unwrap();

    assert!(!analysis.change_points.is_empty());
    assert!(analysis
        .change_points
        .iter()
        .all(|c| c.after_value < c.before_value));
}

#[tokio::test]
async fn test_records_without_dates_are_synthesized() {
    let anchor = Utc.with_ymd_and_hms(2024, 6, 30, 15, 30, 0).unwrap();
    let analyzer = TimeSeriesAnalyzer::default().with_anchor(anchor);
    let records: Vec<Record> = (0..15)
        .map(|i| record(json!({ "id": i, "defect_rate": format!("{}", 2.0 + i as f64 * 0.1) })))
        .collect();

    let analysis = analyzer.analyze(&records, 5, None).await.unwrap();
    assert_eq!(analysis.metrics_analysis.len(), 1);
    assert!(analysis.metrics_analysis.contains_key("defect_rate"));
}

#[tokio::test]
async fn test_too_few_records_is_hard_failure() {
    let analyzer = TimeSeriesAnalyzer::default();
    let err = analyzer
        .analyze(&daily("quality_score", &[90.0; 5]), 7, None)
        .await
        .unwrap_err();
    assert_eq!(err, AnalysisError::InsufficientData { required: 10, actual: 5 });
}

#[tokio::test]
async fn test_analyze_many_preserves_order() {
    let analyzer = Arc::new(TimeSeriesAnalyzer::default());
    let batches = vec![
        (declining_delivery(), None),
        (daily("quality_score", &[90.0; 3]), None),
        (daily("quality_score", &[88.0; 12]), None),
    ];

    let results = analyzer.analyze_many(batches, 14).await;
    assert_eq!(results.len(), 3);
    assert!(results[0]
        .as_ref()
        .unwrap()
        .metrics_analysis
        .contains_key("on_time_delivery"));
    assert!(matches!(
        results[1],
        Err(AnalysisError::InsufficientData { .. })
    ));
    assert!(results[2]
        .as_ref()
        .unwrap()
        .metrics_analysis
        .contains_key("quality_score"));
}

#[tokio::test]
async fn test_metrics_exposed_after_analysis() {
    let analyzer = TimeSeriesAnalyzer::default();
    analyzer
        .analyze(&declining_delivery(), 7, None)
        .await
        .unwrap();

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert!(text.contains("vendor_risk_analyses_total"));
    assert!(text.contains("vendor_risk_analysis_latency_seconds"));
}
