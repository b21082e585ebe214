use covid_series::telemetry::{LogConfig, init};

#[test]
fn test_init_installs_subscriber_once() {
    let dir = std::env::temp_dir().join("covid_series_telemetry_test");
    let config = LogConfig {
        file_path: dir.join("run.log"),
        ..Default::default()
    };

    let guard = init(&config).expect("first init succeeds");
    tracing::info!(target: "covid_series", "telemetry ready");

    assert!(init(&config).is_err());
    drop(guard);
}
