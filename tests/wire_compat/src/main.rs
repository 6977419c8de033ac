fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use hubchat_protocol::constants::MessageType;
    use hubchat_protocol::envelope::Envelope;
    use hubchat_protocol::messages::{
        ChatMessage, HandshakeAck, HandshakeRequest, SendMessageRequest,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn read_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (key-order independent).
    ///
    /// Parses from the raw text so types holding `RawValue` payloads work.
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let text = read_fixture(name);
        let fixture: serde_json::Value = serde_json::from_str(&text)
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"));
        let parsed: T = serde_json::from_str(&text)
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  wire: {fixture}\n  Rust: {reserialized}"
        );
        parsed
    }

    // --- Payloads ---

    #[test]
    fn fixture_handshake_request() {
        let req = roundtrip_test::<HandshakeRequest>("handshake_request.json");
        assert_eq!(req.protocol_version, 2);
    }

    #[test]
    fn fixture_handshake_ack() {
        let ack = roundtrip_test::<HandshakeAck>("handshake_ack.json");
        assert!(!ack.connection_id.is_empty());
    }

    #[test]
    fn fixture_send_message_request() {
        let req = roundtrip_test::<SendMessageRequest>("send_message_request.json");
        assert_eq!(req.chat_id.as_str(), "team-general");
        assert_eq!(req.sender_id.as_str(), "alice");
    }

    #[test]
    fn fixture_chat_message() {
        let msg = roundtrip_test::<ChatMessage>("chat_message.json");
        assert_eq!(msg.id.as_str(), "msg-000184");
        assert_eq!(msg.timestamp.to_rfc3339(), "2026-03-02T09:15:30+00:00");
    }

    // --- Envelopes ---

    #[test]
    fn fixture_envelope_send_message() {
        let env = roundtrip_test::<Envelope>("envelope_send_message.json");
        assert_eq!(env.msg_type, MessageType::SendMessage);
        let req: SendMessageRequest = env.parse_payload().unwrap().unwrap();
        assert_eq!(req.content, "Standup moved to 10:30");
    }

    #[test]
    fn fixture_envelope_receive_message() {
        let env = roundtrip_test::<Envelope>("envelope_receive_message.json");
        assert_eq!(env.msg_type, MessageType::ReceiveMessage);
        let msg: ChatMessage = env.parse_payload().unwrap().unwrap();
        assert_eq!(msg.sender_id.as_str(), "alice");
    }

    #[test]
    fn fixture_envelope_completion_error() {
        let env = roundtrip_test::<Envelope>("envelope_completion_error.json");
        assert_eq!(env.msg_type, MessageType::Completion);
        assert!(env.payload.is_none());
        let err = env.error.unwrap();
        assert_eq!(err.code, 403);
    }

    #[test]
    fn fixture_envelope_unknown_type_is_tolerated() {
        let text = read_fixture("envelope_unknown_type.json");
        let env: Envelope = serde_json::from_str(&text).unwrap();
        assert_eq!(env.msg_type, MessageType::Unknown);
        assert_eq!(env.id, "evt-9");
    }

    #[test]
    fn all_fixtures_are_valid_json() {
        for entry in fs::read_dir(fixtures_dir()).unwrap() {
            let path = entry.unwrap().path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let data = fs::read_to_string(&path).unwrap();
            serde_json::from_str::<serde_json::Value>(&data)
                .unwrap_or_else(|e| panic!("invalid JSON in {}: {e}", path.display()));
        }
    }
}
