use super::*;
use crate::identity::Identity;
use serde::Deserialize;

#[test]
fn test_message_creation() {
    let system = Message::system("You are a helpful assistant");
    assert_eq!(system.role, MessageRole::System);

    let user = Message::user("Hello!").with_name("alice");
    assert_eq!(user.role, MessageRole::User);
    assert_eq!(user.name.as_deref(), Some("alice"));

    let tool = Message::tool_response("call_123", r#"{"result": "ok"}"#);
    assert_eq!(tool.role, MessageRole::Tool);
    assert_eq!(tool.tool_call_id, Some("call_123".to_string()));
}

#[test]
fn test_message_role_as_str() {
    assert_eq!(MessageRole::System.as_str(), "system");
    assert_eq!(MessageRole::User.as_str(), "user");
    assert_eq!(MessageRole::Assistant.as_str(), "assistant");
    assert_eq!(MessageRole::Tool.as_str(), "tool");
}

#[test]
fn test_encode_produces_objects() {
    let raw = encode(&[Message::user("hi")]).unwrap();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0]["role"], "user");
    assert_eq!(raw[0]["content"], "hi");
    assert!(!raw[0].contains_key("tool_call_id"));
}

#[test]
fn test_message_round_trip() {
    let items = vec![
        Message::system("rules"),
        Message::user("question"),
        Message::tool_response("call_1", "42"),
        Message::assistant("answer").with_name("bot"),
    ];

    let decoded: Vec<Message> = decode(encode(&items).unwrap()).unwrap();
    assert_eq!(decoded, items);
}

#[test]
fn test_identity_and_usage_round_trip() {
    let identities = vec![
        Identity::new("chatHistory", "helper").with_user_id("u1"),
        Identity::new("usage", "helper").with_group("ops"),
    ];
    let decoded: Vec<Identity> = decode(encode(&identities).unwrap()).unwrap();
    assert_eq!(decoded, identities);

    let usage = vec![UsageRecord::new("gpt-test", 10, 5)];
    let decoded: Vec<UsageRecord> = decode(encode(&usage).unwrap()).unwrap();
    assert_eq!(decoded, usage);
    assert_eq!(decoded[0].total_tokens(), 15);
}

#[test]
fn test_encode_rejects_non_object_records() {
    let err = encode(&[42_u32]).unwrap_err();
    assert!(err.to_string().contains("a number"));
}

#[test]
fn test_decode_rejects_mismatched_shape() {
    #[derive(Debug, Clone, serde::Serialize, Deserialize)]
    struct Strict {
        required: String,
    }

    let mut map = RawRecord::new();
    map.insert("other".into(), serde_json::json!(1));
    assert!(decode::<Strict>(vec![map]).is_err());
}
