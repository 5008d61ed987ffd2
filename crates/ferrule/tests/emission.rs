//! Ordering guarantees of header and body emission in both output modes.

use ferrule::{
    ComposerConfig, MemoryTransport, ResponseComposer, ResponseError, TransportEvent,
};
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone)]
enum Op {
    Header(String, String),
    Write(String),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        ("X-[A-Z][a-z]{0,6}", "[a-z0-9]{1,8}").prop_map(|(n, v)| Op::Header(n, v)),
        "[a-zA-Z0-9 <>&]{1,12}".prop_map(Op::Write),
    ]
}

fn composer(deferred: bool, transport: &MemoryTransport) -> ResponseComposer {
    let mut response = ResponseComposer::builder(transport.clone())
        .config(ComposerConfig::new().deferred(deferred))
        .build()
        .unwrap();
    response.suppress_template();
    response
}

proptest! {
    #[test]
    fn deferred_headers_precede_concatenated_body(ops in prop::collection::vec(op_strategy(), 0..24)) {
        let transport = MemoryTransport::new();
        let mut response = composer(true, &transport);

        let mut headers = Vec::new();
        let mut body = String::new();
        for op in &ops {
            match op {
                Op::Header(name, value) => {
                    response.set_header(name, value.as_str()).unwrap();
                    headers.push(format!("{}: {}", name, value));
                }
                Op::Write(text) => {
                    response.write(text).unwrap();
                    body.push_str(text);
                }
            }
        }
        prop_assert!(transport.events().is_empty());

        response.output().unwrap();

        let mut expected: Vec<TransportEvent> =
            headers.into_iter().map(TransportEvent::Header).collect();
        if !body.is_empty() {
            expected.push(TransportEvent::Body(body.into_bytes()));
        }
        prop_assert_eq!(transport.events(), expected);
    }

    #[test]
    fn immediate_calls_reach_transport_in_order(ops in prop::collection::vec(op_strategy(), 0..24)) {
        let transport = MemoryTransport::new();
        let mut response = composer(false, &transport);

        let mut expected = Vec::new();
        let mut body_started = false;
        for op in &ops {
            match op {
                Op::Header(name, value) => {
                    let result = response.set_header(name, value.as_str());
                    if body_started {
                        let rejected = matches!(result, Err(ResponseError::AlreadyEmitted { .. }));
                        prop_assert!(rejected);
                    } else {
                        prop_assert!(result.is_ok());
                        expected.push(TransportEvent::Header(format!("{}: {}", name, value)));
                    }
                }
                Op::Write(text) => {
                    response.write(text).unwrap();
                    expected.push(TransportEvent::Body(text.clone().into_bytes()));
                    body_started = true;
                }
            }
            prop_assert_eq!(transport.events(), expected.clone());
        }

        response.output().unwrap();
        prop_assert_eq!(transport.events(), expected);
    }
}

#[test]
fn late_header_is_rejected_without_side_effects() {
    let transport = MemoryTransport::new();
    let mut response = composer(true, &transport);
    response.write("early").unwrap();
    transport.mark_headers_sent();

    let err = response.set_header("X-Late", "1").unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot set header 'X-Late: 1', headers already sent"
    );
    assert!(response.pending_headers().is_empty());
    assert_eq!(response.pending_body(), "early");
    assert!(transport.events().is_empty());
}

#[test]
fn write_json_emits_exactly_once_without_template() {
    let transport = MemoryTransport::new();
    // No suppress_template() here: write_json must do it.
    let mut response = ResponseComposer::builder(transport.clone())
        .templates(|_: &str| -> Option<std::path::PathBuf> { panic!("no template lookup expected") })
        .build()
        .unwrap();

    response.write_json(&json!({"a": 1})).unwrap();
    assert!(response.is_template_suppressed());
    response.output().unwrap();

    assert_eq!(
        transport.events(),
        vec![
            TransportEvent::Header("Content-Type: application/json".into()),
            TransportEvent::Body(br#"{"a":1}"#.to_vec()),
        ]
    );
}

#[test]
fn write_json_immediate_mode() {
    let transport = MemoryTransport::new();
    let mut response = composer(false, &transport);

    response.write_json(&vec![1, 2, 3]).unwrap();
    assert_eq!(transport.headers(), vec!["Content-Type: application/json"]);
    assert_eq!(transport.body(), "[1,2,3]");
}

#[test]
fn output_twice_does_not_re_emit() {
    let transport = MemoryTransport::new();
    let mut response = composer(true, &transport);
    response.set_header("X-Once", "1").unwrap();
    response.write("body").unwrap();

    response.output().unwrap();
    response.output().unwrap();

    assert_eq!(transport.headers(), vec!["X-Once: 1"]);
    assert_eq!(transport.body(), "body");
}
