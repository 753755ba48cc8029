use parley_core::codec::{decode, encode, encode_all};
use parley_core::models::{Button, Message, Sender};
use serde_json::Value;

fn at(rfc3339: &str) -> jiff::Timestamp {
    rfc3339.parse().unwrap()
}

#[test]
fn plain_message_omits_optional_fields() {
    let message = Message::new("m1", "hello", Sender::User, at("2024-05-01T09:30:00Z"));

    let json: Value = serde_json::from_str(&encode(&message).unwrap()).unwrap();
    let obj = json.as_object().unwrap();

    assert_eq!(obj.len(), 4);
    assert_eq!(obj["id"], "m1");
    assert_eq!(obj["text"], "hello");
    assert_eq!(obj["sender"], "user");
    assert_eq!(obj["timestamp"], "2024-05-01T09:30:00.000Z");
}

#[test]
fn buttons_are_an_array_of_id_label_objects() {
    let message = Message::new("m2", "pick one", Sender::Bot, at("2024-05-01T09:30:05Z"))
        .with_buttons(vec![Button::new("yes", "Yes"), Button::new("no", "No")])
        .with_image("https://example.com/cat.png");

    let json: Value = serde_json::from_str(&encode(&message).unwrap()).unwrap();

    assert_eq!(json["sender"], "bot");
    assert_eq!(
        json["buttons"],
        serde_json::json!([
            { "id": "yes", "label": "Yes" },
            { "id": "no", "label": "No" },
        ])
    );
    assert_eq!(json["image"], "https://example.com/cat.png");
}

#[test]
fn decodes_browser_style_timestamps() {
    let payload = r#"{"id":"1714555800000","text":"hi","sender":"user","timestamp":"2024-05-01T09:30:00.000Z"}"#;

    let message = decode(payload).unwrap();

    assert_eq!(message.id, "1714555800000");
    assert_eq!(message.sender, Sender::User);
    assert_eq!(message.timestamp, at("2024-05-01T09:30:00Z"));
    assert!(message.buttons.is_none());
    assert!(message.image.is_none());
}

#[test]
fn sub_second_precision_survives() {
    let timestamp = jiff::Timestamp::new(1_714_555_800, 123_456_000).unwrap();
    let message = Message::new("m3", "precise", Sender::Bot, timestamp);

    let decoded = decode(&encode(&message).unwrap()).unwrap();

    assert_eq!(decoded.timestamp, timestamp);
    assert_eq!(decoded, message);
}

#[test]
fn browser_written_records_are_rewritten_byte_for_byte() {
    let payloads = [
        r#"{"id":"1714555800000","text":"hi","sender":"user","timestamp":"2024-05-01T09:30:00.000Z"}"#,
        r#"{"id":"b1","text":"pick","sender":"bot","timestamp":"2024-05-01T09:30:00.250Z","buttons":[{"id":"yes","label":"Yes"}],"image":"data:image/png;base64,AAAA"}"#,
    ];

    for payload in payloads {
        assert_eq!(encode(&decode(payload).unwrap()).unwrap(), payload);
    }
}

#[test]
fn microsecond_timestamps_keep_their_digits() {
    let timestamp = jiff::Timestamp::new(1_714_555_800, 123_456_000).unwrap();
    let message = Message::new("m", "x", Sender::User, timestamp);

    let json: Value = serde_json::from_str(&encode(&message).unwrap()).unwrap();

    assert_eq!(json["timestamp"], "2024-05-01T09:30:00.123456Z");
}

#[test]
fn unknown_fields_are_preserved() {
    let payload = r#"{"id":"m4","text":"<b>hi</b>","sender":"bot","timestamp":"2024-05-01T09:30:00Z","reaction":"thumbs_up","meta":{"n":1}}"#;

    let message = decode(payload).unwrap();
    assert_eq!(message.extra["reaction"], "thumbs_up");

    let json: Value = serde_json::from_str(&encode(&message).unwrap()).unwrap();
    assert_eq!(json["reaction"], "thumbs_up");
    assert_eq!(json["meta"]["n"], 1);
    assert_eq!(json["text"], "<b>hi</b>");
}

#[test]
fn rejects_records_that_break_the_contract() {
    assert!(decode("not json").is_err());
    assert!(decode(r#"{"id":"m5","text":"x","sender":"robot","timestamp":"2024-05-01T09:30:00Z"}"#).is_err());
    assert!(decode(r#"{"id":"m6","text":"x","sender":"user","timestamp":"yesterday"}"#).is_err());
    assert!(decode(r#"{"id":"m7","sender":"user","timestamp":"2024-05-01T09:30:00Z"}"#).is_err());
}

#[test]
fn encode_all_keeps_order() {
    let messages = vec![
        Message::new("a", "first", Sender::User, at("2024-05-01T09:30:00Z")),
        Message::new("b", "second", Sender::Bot, at("2024-05-01T09:30:01Z")),
    ];

    let payloads = encode_all(&messages).unwrap();

    assert_eq!(payloads.len(), 2);
    assert_eq!(decode(&payloads[0]).unwrap().id, "a");
    assert_eq!(decode(&payloads[1]).unwrap().id, "b");
}
