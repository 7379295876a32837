//! The helper script installed in the provider page and the calling
//! convention used to talk to it.
//!
//! Every helper function returns `{ok, value}` on success or
//! `{ok: false, stale, error}` when it threw, so page-side failures come
//! back as values instead of Runtime exceptions.

use serde::Deserialize;
use serde_json::Value;

use memlayer_protocols::PageError;

pub(crate) const PAGE_SCRIPT: &str = include_str!("page_script.js");

/// Binding called with `"click"` when the trigger control is activated.
pub(crate) const TRIGGER_BINDING: &str = "memlayerTrigger";

/// Binding called with `{"id": <subscription>, "records": <n>}` per
/// mutation batch.
pub(crate) const MUTATION_BINDING: &str = "memlayerMutation";

/// JavaScript expression invoking helper `method` with JSON-encoded `args`.
pub(crate) fn call_expression(method: &str, args: &[Value]) -> String {
    let args: Vec<String> = args.iter().map(Value::to_string).collect();
    format!("window.__memlayer.{}({})", method, args.join(", "))
}

#[derive(Debug, Deserialize)]
struct HelperReply {
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    stale: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Unwrap a helper reply. `element` names the handle the call targeted.
pub(crate) fn decode_reply(reply: Value, element: Option<&str>) -> Result<Value, PageError> {
    if reply.is_null() {
        return Err(PageError::Script("page helper is not installed".to_string()));
    }
    let reply: HelperReply = serde_json::from_value(reply)
        .map_err(|e| PageError::Script(format!("malformed helper reply: {}", e)))?;

    if reply.ok {
        return Ok(reply.value);
    }
    let error = reply.error.unwrap_or_else(|| "unknown error".to_string());
    if reply.stale {
        Err(PageError::StaleElement(
            element.map(String::from).unwrap_or(error),
        ))
    } else {
        Err(PageError::Script(error))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub(crate) struct MutationPayload {
    pub id: u64,
    pub records: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_expression_escapes_arguments() {
        let expr = call_expression(
            "writeText",
            &[json!("ml-1"), json!("say \"hi\"\n</script>"), json!("auto")],
        );
        assert_eq!(
            expr,
            r#"window.__memlayer.writeText("ml-1", "say \"hi\"\n</script>", "auto")"#
        );
    }

    #[test]
    fn test_call_expression_array_argument() {
        let expr = call_expression("queryFirst", &[json!(["textarea", "div[contenteditable=\"true\"]"])]);
        assert_eq!(
            expr,
            r#"window.__memlayer.queryFirst(["textarea","div[contenteditable=\"true\"]"])"#
        );
    }

    #[test]
    fn test_call_expression_no_arguments() {
        assert_eq!(call_expression("queryAll", &[]), "window.__memlayer.queryAll()");
    }

    #[test]
    fn test_decode_ok_reply() {
        let value = decode_reply(json!({"ok": true, "value": "ml-4"}), None).unwrap();
        assert_eq!(value, json!("ml-4"));

        let value = decode_reply(json!({"ok": true}), None).unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn test_decode_stale_reply() {
        let err = decode_reply(
            json!({"ok": false, "stale": true, "error": "stale element ml-2"}),
            Some("ml-2"),
        )
        .unwrap_err();
        assert_eq!(err, PageError::StaleElement("ml-2".to_string()));
    }

    #[test]
    fn test_decode_script_error() {
        let err = decode_reply(
            json!({"ok": false, "stale": false, "error": "anchor.parentElement is null"}),
            Some("ml-1"),
        )
        .unwrap_err();
        assert_eq!(err, PageError::Script("anchor.parentElement is null".to_string()));
    }

    #[test]
    fn test_decode_missing_helper() {
        let err = decode_reply(Value::Null, None).unwrap_err();
        assert!(matches!(err, PageError::Script(_)));
    }

    #[test]
    fn test_page_script_defines_bindings() {
        assert!(PAGE_SCRIPT.contains(TRIGGER_BINDING));
        assert!(PAGE_SCRIPT.contains(MUTATION_BINDING));
        assert!(PAGE_SCRIPT.contains("window.__memlayer"));
    }

    #[test]
    fn test_mutation_payload() {
        let payload: MutationPayload = serde_json::from_str(r#"{"id": 3, "records": 12}"#).unwrap();
        assert_eq!(payload, MutationPayload { id: 3, records: 12 });
    }

    #[test]
    fn test_page_script_indexes_elements_weakly() {
        assert!(PAGE_SCRIPT.contains("new WeakMap()"));
        assert!(PAGE_SCRIPT.contains("ids.get(element)"));
        // Lookups prune handles to detached nodes first.
        for method in ["queryFirst(selectors) {\n      prune();", "queryAll(selector) {\n      prune();"] {
            assert!(PAGE_SCRIPT.contains(method), "missing prune in {}", method);
        }
    }

    #[test]
    fn test_page_script_observer_skips_own_nodes() {
        assert!(PAGE_SCRIPT.contains("records.filter((record) => !isOwnRecord(record))"));
        assert!(PAGE_SCRIPT.contains("className = NOTIFICATION_CLASS"));
    }
}
