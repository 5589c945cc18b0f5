use base64::Engine;
use sauti_captions::nats::messages::{
    audio_subject, config_subject, results_subject, AudioFrameMessage, StreamingConfigMessage,
    TranscriptMessage,
};
use sauti_captions::protocol::{ClientCommand, ServerMessage};
use sauti_captions::recognizer::{RecognitionResult, RecognizerConfig};

#[test]
fn test_transcription_message_wire_format() {
    let result = RecognitionResult::final_result("Karibu darasani", Some(0.75));
    let message = ServerMessage::transcription("room-9", &result);

    let json: serde_json::Value = serde_json::to_value(&message).unwrap();
    assert_eq!(json["type"], "transcription");
    assert_eq!(json["transcript"], "Karibu darasani");
    assert_eq!(json["isFinal"], true);
    assert_eq!(json["confidence"], 0.75);
    assert_eq!(json["sessionId"], "room-9");
}

#[test]
fn test_interim_message_reports_zero_confidence() {
    let message = ServerMessage::transcription("room-9", &RecognitionResult::interim("Kari"));

    let json: serde_json::Value = serde_json::to_value(&message).unwrap();
    assert_eq!(json["isFinal"], false);
    assert_eq!(json["confidence"], 0.0);
}

#[test]
fn test_error_message_wire_format() {
    let json = serde_json::to_string(&ServerMessage::error("recognizer stream failed")).unwrap();
    assert_eq!(json, r#"{"type":"error","message":"recognizer stream failed"}"#);
}

#[test]
fn test_stop_command_parses() {
    assert_eq!(
        ClientCommand::parse(r#"{"command":"stop"}"#).unwrap(),
        ClientCommand::Stop
    );
}

#[test]
fn test_unknown_or_garbled_commands_fail() {
    assert!(ClientCommand::parse(r#"{"command":"rewind"}"#).is_err());
    assert!(ClientCommand::parse("stop").is_err());
    assert!(ClientCommand::parse("{}").is_err());
}

#[test]
fn test_audio_frame_serialization() {
    let msg = AudioFrameMessage {
        session_id: "test-session".to_string(),
        sequence: 0,
        audio: base64::engine::general_purpose::STANDARD.encode([0u8; 100]),
        timestamp: "2025-10-27T14:30:00Z".to_string(),
        final_frame: false,
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"final\":false"));
    assert!(json.contains("\"sequence\":0"));

    let deserialized: AudioFrameMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.session_id, "test-session");
    assert!(!deserialized.final_frame);
}

#[test]
fn test_audio_payload_survives_base64() {
    let original: Vec<u8> = vec![0x1A, 0x45, 0xDF, 0xA3, 0x00, 0xFF];

    let msg = AudioFrameMessage {
        session_id: "webm".to_string(),
        sequence: 3,
        audio: base64::engine::general_purpose::STANDARD.encode(&original),
        timestamp: "2025-10-27T14:30:00Z".to_string(),
        final_frame: false,
    };

    let json = serde_json::to_string(&msg).unwrap();
    let deserialized: AudioFrameMessage = serde_json::from_str(&json).unwrap();
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(&deserialized.audio)
        .unwrap();

    assert_eq!(decoded, original);
}

#[test]
fn test_transcript_without_confidence() {
    let json = r#"{
        "session_id": "test-session",
        "text": "No confidence score",
        "partial": false
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.text, "No confidence score");
    assert_eq!(msg.confidence, None);
    assert_eq!(msg.timestamp, None);
}

#[test]
fn test_handshake_message_carries_config() {
    let msg = StreamingConfigMessage {
        session_id: "room-1".to_string(),
        config: RecognizerConfig::default(),
        timestamp: "2025-10-27T14:30:00Z".to_string(),
    };

    let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["config"]["model"], "chirp_3");
    assert_eq!(json["config"]["languages"][1], "sw-KE");
    assert_eq!(json["config"]["decoding"]["mode"], "auto");
    assert_eq!(json["config"]["features"]["punctuation"], true);
    assert_eq!(json["config"]["features"]["wordTiming"], true);
    assert_eq!(json["config"]["interimResults"], true);
}

#[test]
fn test_subjects_are_scoped_per_session() {
    assert_eq!(config_subject("room-1"), "audio.room-1.config");
    assert_eq!(audio_subject("room-1"), "audio.room-1.frame");
    assert_eq!(results_subject("room-1"), "stt.room-1.>");
}
