use super::*;

fn event(json: &str) -> CdpResponse {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_route_trigger_click() {
    let e = event(
        r#"{"method": "Runtime.bindingCalled",
            "params": {"name": "memlayerTrigger", "payload": "click", "executionContextId": 1}}"#,
    );
    assert_eq!(route_event(&e), Some(PageEvent::TriggerClicked));
}

#[test]
fn test_route_mutation_batch() {
    let e = event(
        r#"{"method": "Runtime.bindingCalled",
            "params": {"name": "memlayerMutation", "payload": "{\"id\":2,\"records\":5}", "executionContextId": 1}}"#,
    );
    assert_eq!(
        route_event(&e),
        Some(PageEvent::Mutation(MutationPayload { id: 2, records: 5 }))
    );
}

#[test]
fn test_route_malformed_mutation_is_dropped() {
    let e = event(
        r#"{"method": "Runtime.bindingCalled",
            "params": {"name": "memlayerMutation", "payload": "not json", "executionContextId": 1}}"#,
    );
    assert_eq!(route_event(&e), None);
}

#[test]
fn test_route_load_event() {
    let e = event(r#"{"method": "Page.loadEventFired", "params": {"timestamp": 12.5}}"#);
    assert_eq!(route_event(&e), Some(PageEvent::Loaded));
}

#[test]
fn test_route_ignores_other_events() {
    let e = event(r#"{"method": "Runtime.consoleAPICalled", "params": {}}"#);
    assert_eq!(route_event(&e), None);

    let e = event(
        r#"{"method": "Runtime.bindingCalled",
            "params": {"name": "somethingElse", "payload": "", "executionContextId": 1}}"#,
    );
    assert_eq!(route_event(&e), None);

    let e = event(r#"{"id": 4, "result": {}}"#);
    assert_eq!(route_event(&e), None);
}

#[test]
fn test_handle_from_values() {
    assert_eq!(handle_from(Value::Null).unwrap(), None);
    assert_eq!(
        handle_from(json!("ml-9")).unwrap(),
        Some(ElementHandle::new("ml-9"))
    );
    assert!(handle_from(json!(12)).is_err());
}

#[tokio::test]
async fn test_event_loop_fans_out() {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (trigger_tx, mut trigger_rx) = mpsc::unbounded_channel();
    let subscribers: Subscribers = Arc::new(Mutex::new(HashMap::new()));
    let (sub_tx, mut sub_rx) = mpsc::unbounded_channel();
    subscribers.lock().insert(1, sub_tx);

    let task = tokio::spawn(CdpPage::event_loop(events_rx, trigger_tx, subscribers.clone()));

    events_tx
        .send(event(
            r#"{"method": "Runtime.bindingCalled",
                "params": {"name": "memlayerMutation", "payload": "{\"id\":1,\"records\":3}", "executionContextId": 1}}"#,
        ))
        .unwrap();
    events_tx
        .send(event(
            r#"{"method": "Runtime.bindingCalled",
                "params": {"name": "memlayerTrigger", "payload": "click", "executionContextId": 1}}"#,
        ))
        .unwrap();
    events_tx
        .send(event(r#"{"method": "Page.loadEventFired", "params": {}}"#))
        .unwrap();

    assert_eq!(sub_rx.recv().await, Some(MutationBatch { records: 3 }));
    assert_eq!(trigger_rx.recv().await, Some(TriggerEvent::Clicked));
    assert_eq!(trigger_rx.recv().await, Some(TriggerEvent::PageReloaded));

    // Reload drops observers, closing the subscription stream.
    assert_eq!(sub_rx.recv().await, None);

    drop(events_tx);
    task.await.unwrap();
    assert_eq!(trigger_rx.recv().await, None);
}

#[test]
fn test_notification_duration_ms() {
    assert_eq!(duration_ms(Duration::from_millis(2500)), 2500);
    assert_eq!(duration_ms(Duration::MAX), u64::MAX);
}
