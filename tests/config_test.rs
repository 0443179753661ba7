// ==========================================
// 运行配置集成测试
// ==========================================
// 职责: 验证 JSON 配置文件的加载、缺省回填与致命校验
// ==========================================

use std::io::Write;

use tempfile::NamedTempFile;

use oee_telemetry::config::ConfigError;
use oee_telemetry::AppConfig;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_full_config_from_file() {
    let file = write_config(
        r#"{
            "devices": [
                {
                    "device_id": "adam-01",
                    "host": "192.168.1.10",
                    "port": 502,
                    "unit_id": 1,
                    "timeout_ms": 3000,
                    "max_retries": 3,
                    "poll_interval_ms": 5000,
                    "channels": [
                        { "channel": 0, "start_register": 0, "register_count": 2, "scale_factor": 1.0 },
                        { "channel": 1, "start_register": 2, "register_count": 2, "scale_factor": 0.5 }
                    ]
                }
            ],
            "sink": {
                "batch_size": 200,
                "flush_interval_ms": 5000,
                "max_retries": 2
            },
            "downtime": { "min_duration_minutes": 10 },
            "max_concurrent_devices": 8
        }"#,
    );

    let config = AppConfig::from_file(file.path()).unwrap();
    assert_eq!(config.devices.len(), 1);
    assert_eq!(config.devices[0].device_id, "adam-01");
    assert_eq!(config.devices[0].channels.len(), 2);
    // 未写明的可选项按缺省回填
    assert!(config.devices[0].channels.iter().all(|c| c.enabled));
    assert_eq!(config.devices[0].retry_delay_ms, 1000);
    assert_eq!(config.sink.batch_size, 200);
    assert_eq!(config.downtime.min_duration_minutes, 10);
    assert_eq!(config.max_concurrent_devices, 8);
}

#[test]
fn test_minimal_config_gets_defaults() {
    let file = write_config(
        r#"{
            "devices": [
                {
                    "device_id": "adam-01",
                    "host": "192.168.1.10",
                    "port": 502,
                    "unit_id": 1,
                    "timeout_ms": 3000,
                    "max_retries": 3,
                    "poll_interval_ms": 5000,
                    "channels": [
                        { "channel": 0, "start_register": 0, "register_count": 2, "scale_factor": 1.0 }
                    ]
                }
            ]
        }"#,
    );

    let config = AppConfig::from_file(file.path()).unwrap();
    assert_eq!(config.sink.batch_size, 100);
    assert_eq!(config.sink.flush_interval_ms, 10_000);
    assert_eq!(config.downtime.min_duration_minutes, 5);
    assert_eq!(config.max_concurrent_devices, 32);
}

#[test]
fn test_missing_file_is_fatal() {
    let result = AppConfig::from_file("/nonexistent/oee_telemetry.json");
    assert!(matches!(result, Err(ConfigError::FileRead { .. })));
}

#[test]
fn test_malformed_json_is_fatal() {
    let file = write_config("{ not json");
    let result = AppConfig::from_file(file.path());
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_duplicate_channel_in_file_rejected() {
    let file = write_config(
        r#"{
            "devices": [
                {
                    "device_id": "adam-01",
                    "host": "192.168.1.10",
                    "port": 502,
                    "unit_id": 1,
                    "timeout_ms": 3000,
                    "max_retries": 3,
                    "poll_interval_ms": 5000,
                    "channels": [
                        { "channel": 0, "start_register": 0, "register_count": 2, "scale_factor": 1.0 },
                        { "channel": 0, "start_register": 2, "register_count": 2, "scale_factor": 1.0 }
                    ]
                }
            ]
        }"#,
    );

    let result = AppConfig::from_file(file.path());
    assert!(matches!(
        result,
        Err(ConfigError::DuplicateChannel { channel: 0, .. })
    ));
}
