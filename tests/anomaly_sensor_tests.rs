//! Anomaly sensor behaviour through the public component API

use anomaly_sensor::components::anomaly_sensor::{self as anomaly, AnomalySensor, SENSOR_READING_KEY};
use anomaly_sensor::resource::{Dependencies, Extra, Reconfigurable, Sensor};
use anomaly_sensor::{ComponentConfig, Error};
use serde_json::{json, Value};
use std::sync::Arc;

fn config(attributes: Value) -> ComponentConfig {
    ComponentConfig::new("anomaly", anomaly::model())
        .with_attributes(attributes.as_object().cloned().unwrap_or_default())
}

fn sensor(attributes: Value) -> AnomalySensor {
    AnomalySensor::from_config(&config(attributes)).unwrap()
}

fn reading(value: Value) -> Extra {
    let mut extra = Extra::new();
    extra.insert(SENSOR_READING_KEY.to_string(), value);
    extra
}

#[tokio::test]
async fn test_anomaly_discarded_when_not_included() {
    let sensor = sensor(json!({
        "mean": 0.0, "std": 1.0, "include_anomalies": false, "update_statistics": false
    }));

    let readings = sensor
        .get_readings(Some(&reading(json!(10))), None)
        .await
        .unwrap();

    assert_eq!(Value::Object(readings), json!({"anomaly": 1, "reading": 10}));
    assert!(sensor.history().await.is_empty());
}

#[tokio::test]
async fn test_anomaly_retained_when_included() {
    let sensor = sensor(json!({
        "mean": 0.0, "std": 1.0, "include_anomalies": true, "update_statistics": false
    }));

    let readings = sensor
        .get_readings(Some(&reading(json!(10))), None)
        .await
        .unwrap();

    assert_eq!(Value::Object(readings), json!({"anomaly": 1, "reading": 10}));
    assert_eq!(sensor.history().await, vec![10.0]);
}

#[tokio::test]
async fn test_boundaries_classify_as_normal() {
    let sensor = sensor(json!({"mean": 10.0, "std": 2.5}));

    for boundary in [15.0, 5.0] {
        let readings = sensor
            .get_readings(Some(&reading(json!(boundary))), None)
            .await
            .unwrap();
        assert_eq!(readings.get("anomaly"), Some(&json!(0)), "{}", boundary);
    }

    for outside in [15.001, 4.999] {
        let readings = sensor
            .get_readings(Some(&reading(json!(outside))), None)
            .await
            .unwrap();
        assert_eq!(readings.get("anomaly"), Some(&json!(1)), "{}", outside);
    }
}

#[tokio::test]
async fn test_pure_classification_leaves_state_alone() {
    let sensor = sensor(json!({
        "mean": 50.0, "std": 5.0, "include_anomalies": false, "update_statistics": false
    }));
    let before = sensor.snapshot().await;

    for value in [-100.0, 200.0, 1e6] {
        sensor
            .get_readings(Some(&reading(json!(value))), None)
            .await
            .unwrap();
    }

    assert_eq!(sensor.snapshot().await, before);
}

#[tokio::test]
async fn test_retention_law() {
    let values = [0.0, 100.0, 1.0, -50.0, 2.0];

    let including = sensor(json!({"mean": 0.0, "std": 1.0, "include_anomalies": true}));
    let excluding = sensor(json!({"mean": 0.0, "std": 1.0, "include_anomalies": false}));

    for value in values {
        including
            .get_readings(Some(&reading(json!(value))), None)
            .await
            .unwrap();
        excluding
            .get_readings(Some(&reading(json!(value))), None)
            .await
            .unwrap();
    }

    assert_eq!(including.history().await, values.to_vec());
    assert_eq!(excluding.history().await, vec![0.0, 1.0, 2.0]);
}

#[tokio::test]
async fn test_statistics_refresh_matches_history() {
    let sensor = sensor(json!({
        "mean": 0.0, "std": 10.0, "include_anomalies": true, "update_statistics": true
    }));

    // 1 is normal; the refresh then leaves mean 1/std 0 and later mean 1.5/std 0.5
    for (value, expected) in [(1, 0), (2, 1), (3, 1)] {
        let readings = sensor
            .get_readings(Some(&reading(json!(value))), None)
            .await
            .unwrap();
        assert_eq!(readings.get("anomaly"), Some(&json!(expected)), "{}", value);
    }

    let snapshot = sensor.snapshot().await;
    assert_eq!(sensor.history().await, vec![1.0, 2.0, 3.0]);
    assert!((snapshot.mean - 2.0).abs() < 1e-12);
    assert!((snapshot.std - 0.8165).abs() < 1e-4);
}

#[tokio::test]
async fn test_statistics_track_retained_history_after_many_reads() {
    let sensor = sensor(json!({
        "mean": 500.0, "std": 300.0, "include_anomalies": true, "update_statistics": true
    }));

    for _ in 0..25 {
        sensor.get_readings(None, None).await.unwrap();
    }

    let history = sensor.history().await;
    let snapshot = sensor.snapshot().await;
    let n = history.len() as f64;
    let mean = history.iter().sum::<f64>() / n;
    let std = (history.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();

    assert_eq!(history.len(), 25);
    assert!((snapshot.mean - mean).abs() < 1e-9);
    assert!((snapshot.std - std).abs() < 1e-9);
}

#[tokio::test]
async fn test_statistics_cover_only_retained_readings() {
    let sensor = sensor(json!({
        "mean": 5.0, "std": 10.0, "include_anomalies": false, "update_statistics": true
    }));

    let inputs = [
        (json!(5), 0),
        (json!([4, 6]), 0),
        (json!(100), 1),
        (json!([4.5, 5.5]), 0),
        (json!(-50), 1),
        (json!(5.25), 0),
    ];
    for (value, expected) in inputs {
        let readings = sensor
            .get_readings(Some(&reading(value.clone())), None)
            .await
            .unwrap();
        assert_eq!(readings.get("anomaly"), Some(&json!(expected)), "{}", value);
    }

    let history = sensor.history().await;
    assert_eq!(history, vec![5.0, 4.0, 6.0, 4.5, 5.5, 5.25]);

    let n = history.len() as f64;
    let mean = history.iter().sum::<f64>() / n;
    let std = (history.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    let snapshot = sensor.snapshot().await;
    assert!((snapshot.mean - mean).abs() < 1e-12);
    assert!((snapshot.std - std).abs() < 1e-12);
}

#[tokio::test]
async fn test_supplied_reading_echoed_unchanged() {
    let sensor = sensor(json!({"mean": 0.0, "std": 1.0}));

    let readings = sensor
        .get_readings(Some(&reading(json!(10.0))), None)
        .await
        .unwrap();
    assert_eq!(readings.get("reading"), Some(&json!(10.0)));
    assert_ne!(readings.get("reading"), Some(&json!(10)));

    let readings = sensor
        .get_readings(Some(&reading(json!([1.0, 2]))), None)
        .await
        .unwrap();
    assert_eq!(readings.get("reading"), Some(&json!([1.0, 2])));
}

#[tokio::test]
async fn test_batch_reading_reported_and_retained() {
    let sensor = sensor(json!({"mean": 2.0, "std": 1.0}));

    let readings = sensor
        .get_readings(Some(&reading(json!([1, 2, 3]))), None)
        .await
        .unwrap();

    assert_eq!(Value::Object(readings), json!({"anomaly": 0, "reading": [1, 2, 3]}));
    assert_eq!(sensor.history().await, vec![1.0, 2.0, 3.0]);
}

#[tokio::test]
async fn test_synthesized_reading_in_range() {
    let sensor = sensor(json!({}));

    for _ in 0..200 {
        let readings = sensor.get_readings(None, None).await.unwrap();
        let value = readings.get("reading").and_then(Value::as_u64).unwrap();
        assert!(value <= 1000);
    }

    // extra without a reading also synthesizes
    let mut extra = Extra::new();
    extra.insert("unrelated".to_string(), json!(true));
    let readings = sensor.get_readings(Some(&extra), None).await.unwrap();
    assert!(readings.get("reading").and_then(Value::as_u64).is_some());
}

#[tokio::test]
async fn test_non_numeric_reading_is_invalid_input() {
    let sensor = sensor(json!({}));
    let err = sensor
        .get_readings(Some(&reading(json!("not a number"))), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_partial_reconfiguration() {
    let sensor = sensor(json!({
        "mean": 3.0, "std": 1.0, "include_anomalies": true, "update_statistics": true
    }));
    sensor
        .get_readings(Some(&reading(json!(3))), None)
        .await
        .unwrap();

    sensor
        .reconfigure(&config(json!({"std": 5.0})), &Dependencies::new())
        .await
        .unwrap();

    let snapshot = sensor.snapshot().await;
    assert_eq!(snapshot.mean, 3.0);
    assert_eq!(snapshot.std, 5.0);
    assert!(snapshot.include_anomalies);
    assert!(snapshot.update_statistics);
    assert_eq!(snapshot.history_len, 1);
}

#[tokio::test]
async fn test_bad_reconfiguration_changes_nothing() {
    let sensor = sensor(json!({"mean": 3.0, "std": 1.0}));

    let err = sensor
        .reconfigure(
            &config(json!({"mean": 10.0, "std": "wide"})),
            &Dependencies::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Configuration { ref field, .. } if field == "std"));

    let snapshot = sensor.snapshot().await;
    assert_eq!(snapshot.mean, 3.0);
    assert_eq!(snapshot.std, 1.0);
}

#[tokio::test]
async fn test_concurrent_reads_keep_history_consistent() {
    let sensor = Arc::new(sensor(json!({
        "mean": 500.0, "std": 1000.0, "include_anomalies": true, "update_statistics": true
    })));

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let sensor = Arc::clone(&sensor);
            tokio::spawn(async move {
                sensor
                    .get_readings(Some(&reading(json!(i))), None)
                    .await
                    .unwrap();
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let mut history = sensor.history().await;
    history.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(history, (0..32).map(f64::from).collect::<Vec<_>>());

    let snapshot = sensor.snapshot().await;
    assert!((snapshot.mean - 15.5).abs() < 1e-9);
}
