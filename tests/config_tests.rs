use sauti_captions::config::{Config, SinkBackend};
use sauti_captions::recognizer::{AudioEncoding, Decoding};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

const MINIMAL: &str = r#"
[service]
name = "Sauti Darasa Transcription API"
project_id = "sauti-darasa"

[service.http]
bind = "127.0.0.1"
port = 8000
"#;

#[test]
fn test_minimal_config_uses_defaults() {
    let file = write_config(MINIMAL);
    let config = Config::load(file.path().to_str().unwrap()).unwrap();

    assert_eq!(config.service.region, "us");
    assert_eq!(config.sink.backend, SinkBackend::Nats);
    assert_eq!(config.sink.bucket, "captions");
    assert!(config.allowed_origins_list().is_empty());

    let session = config.session_config().unwrap();
    assert_eq!(session.queue_capacity, 64);
    assert_eq!(session.dequeue_poll, Duration::from_secs(1));
    assert_eq!(session.send_timeout, Duration::from_secs(5));
    assert_eq!(session.recognizer.languages, vec!["en-US", "sw-KE"]);
    assert_eq!(session.recognizer.decoding, Decoding::Auto);
    assert_eq!(session.recognizer.model, "chirp_3");
}

#[test]
fn test_explicit_decoding_is_resolved() {
    let file = write_config(&format!(
        r#"{MINIMAL}
[recognizer]
decoding = "explicit"
encoding = "WEBM_OPUS"
sample_rate_hertz = 48000
channels = 1
interim_results = false
"#
    ));
    let config = Config::load(file.path().to_str().unwrap()).unwrap();
    let session = config.session_config().unwrap();

    assert_eq!(
        session.recognizer.decoding,
        Decoding::Explicit {
            encoding: AudioEncoding::WebmOpus,
            sample_rate_hertz: 48000,
            channels: 1,
        }
    );
    assert!(!session.recognizer.interim_results);
}

#[test]
fn test_invalid_recognizer_settings_fail_before_any_session() {
    let file = write_config(&format!(
        r#"{MINIMAL}
[recognizer]
languages = []
"#
    ));
    let config = Config::load(file.path().to_str().unwrap()).unwrap();

    assert!(config.session_config().is_err());
}

#[test]
fn test_origins_and_memory_sink() {
    let file = write_config(
        r#"
[service]
name = "captions"
project_id = "sauti-darasa"
allowed_origins = "http://localhost:3000, https://sauti.example ,"

[service.http]
bind = "0.0.0.0"
port = 9000

[sink]
backend = "memory"

[session]
enqueue_timeout_ms = 250
send_timeout_ms = 750
"#,
    );
    let config = Config::load(file.path().to_str().unwrap()).unwrap();

    assert_eq!(
        config.allowed_origins_list(),
        vec!["http://localhost:3000", "https://sauti.example"]
    );
    assert_eq!(config.sink.backend, SinkBackend::Memory);
    assert_eq!(config.service.http.port, 9000);

    let session = config.session_config().unwrap();
    assert_eq!(session.enqueue_timeout, Duration::from_millis(250));
    assert_eq!(session.send_timeout, Duration::from_millis(750));
    assert_eq!(session.stop_timeout, Duration::from_secs(5));
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(Config::load("/nonexistent/sauti-captions").is_err());
}
