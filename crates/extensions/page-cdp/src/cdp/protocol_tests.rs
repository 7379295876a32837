use super::*;

#[test]
fn test_cdp_request_serialize() {
    let req = CdpRequest {
        id: 1,
        method: "Runtime.addBinding".to_string(),
        params: Some(serde_json::json!({"name": "memlayerTrigger"})),
        session_id: Some("sess-1".to_string()),
    };
    let json = serde_json::to_string(&req).unwrap();
    assert!(json.contains("Runtime.addBinding"));
    assert!(json.contains("\"sessionId\":\"sess-1\""));
}

#[test]
fn test_cdp_request_omits_empty_fields() {
    let req = CdpRequest {
        id: 2,
        method: "Page.enable".to_string(),
        params: None,
        session_id: None,
    };
    assert_eq!(
        serde_json::to_string(&req).unwrap(),
        r#"{"id":2,"method":"Page.enable"}"#
    );
}

#[test]
fn test_cdp_event_deserialize() {
    let json = r#"{
        "method": "Runtime.bindingCalled",
        "params": {"name": "memlayerMutation", "payload": "{\"id\":3,\"records\":2}", "executionContextId": 7},
        "sessionId": "sess-1"
    }"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    assert_eq!(resp.id, None);
    assert_eq!(resp.method.as_deref(), Some("Runtime.bindingCalled"));

    let binding: BindingCalled = serde_json::from_value(resp.params.unwrap()).unwrap();
    assert_eq!(binding.name, "memlayerMutation");
    assert_eq!(binding.execution_context_id, 7);
}

#[test]
fn test_page_info_matches_patterns() {
    let json = r#"{
        "id": "page123",
        "type": "page",
        "title": "Claude",
        "url": "https://claude.ai/chat/abc",
        "webSocketDebuggerUrl": "ws://localhost:9222/devtools/page/page123"
    }"#;
    let info: PageInfo = serde_json::from_str(json).unwrap();

    assert!(info.matches(&["claude.ai".to_string()]));
    assert!(!info.matches(&["grok.com".to_string()]));
    assert!(!info.matches(&[]));
}

#[test]
fn test_page_info_ignores_workers() {
    let info = PageInfo {
        id: "w1".to_string(),
        page_type: "service_worker".to_string(),
        title: String::new(),
        url: "https://claude.ai/sw.js".to_string(),
        web_socket_debugger_url: None,
    };
    assert!(!info.matches(&["claude.ai".to_string()]));
}

#[test]
fn test_exception_message_prefers_description() {
    let json = r#"{
        "text": "Uncaught",
        "exception": {"type": "object", "description": "TypeError: x is undefined"}
    }"#;
    let details: ExceptionDetails = serde_json::from_str(json).unwrap();
    assert_eq!(details.message(), "TypeError: x is undefined");

    let bare: ExceptionDetails = serde_json::from_str(r#"{"text": "Uncaught"}"#).unwrap();
    assert_eq!(bare.message(), "Uncaught");
}
