#![cfg(feature = "serde")]

use csvmap::{Policy, ReaderBuilder, Shape, Trim};

#[test]
fn policy_from_json() {
    let policy: Policy = serde_json::from_str(
        r#"{"delimiter": ";", "trim": {"chars": " \r"}}"#,
    )
    .unwrap();
    assert_eq!(policy.delimiter, b';');
    assert_eq!(policy.quote, b'"');
    assert_eq!(policy.trim, Trim::chars(" \r"));

    let rdr = ReaderBuilder::new()
        .policy(policy)
        .from_bytes("a ; \"b;c\" \r\nd;e\r\n")
        .unwrap();
    let mut got = vec![];
    rdr.run(|f| got.push(f.to_string())).unwrap();
    assert_eq!(got, vec!["a", "b;c", "d", "e"]);
}

#[test]
fn policy_defaults() {
    let policy: Policy = serde_json::from_str("{}").unwrap();
    assert_eq!(policy, Policy::default());

    let policy: Policy =
        serde_json::from_str(r#"{"quote": "'", "trim": "whitespace"}"#).unwrap();
    assert_eq!(policy.quote, b'\'');
    assert_eq!(policy.trim, Trim::Whitespace);
}

#[test]
fn policy_round_trip() {
    let policy = Policy { delimiter: b'\t', quote: b'`', trim: Trim::None };
    let json = serde_json::to_string(&policy).unwrap();
    assert_eq!(json, r#"{"delimiter":"\t","quote":"`","trim":"none"}"#);
    let back: Policy = serde_json::from_str(&json).unwrap();
    assert_eq!(back, policy);
}

#[test]
fn multi_byte_delimiter_is_rejected() {
    let err = serde_json::from_str::<Policy>(r#"{"delimiter": "→"}"#).unwrap_err();
    assert!(err.to_string().contains("single-byte character"));
}

#[test]
fn shape_serializes() {
    let json = serde_json::to_string(&Shape { cols: 3, rows: 2 }).unwrap();
    assert_eq!(json, r#"{"cols":3,"rows":2}"#);
}
