//! Augmented message composition.

use memlayer_protocols::ContextBundle;

/// Framing line placed before the context bullets.
pub const CONTEXT_HEADER: &str = "Based on previous context:";

/// Label placed before the user's own text.
pub const QUESTION_LABEL: &str = "Question:";

/// Prefix `original` with every context item as a bullet line.
///
/// An empty bundle returns `original` unchanged.
pub fn compose_augmented(original: &str, context: &ContextBundle) -> String {
    if context.is_empty() {
        return original.to_string();
    }

    let mut text = String::from(CONTEXT_HEADER);
    for item in context.iter() {
        text.push_str("\n- ");
        text.push_str(item);
    }
    text.push_str("\n\n");
    text.push_str(QUESTION_LABEL);
    text.push(' ');
    text.push_str(original);
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bundle_is_identity() {
        let original = "explain recursion";
        assert_eq!(compose_augmented(original, &ContextBundle::empty()), original);
    }

    #[test]
    fn test_recursion_scenario() {
        let bundle = ContextBundle::from(vec!["recursion is self-reference", "base case stops it"]);
        assert_eq!(
            compose_augmented("explain recursion", &bundle),
            "Based on previous context:\n- recursion is self-reference\n- base case stops it\n\nQuestion: explain recursion"
        );
    }

    #[test]
    fn test_items_keep_order_before_original() {
        let items = vec!["zeta", "alpha", "mid", "alpha again"];
        let composed = compose_augmented("what now?", &ContextBundle::from(items.clone()));

        let lines: Vec<&str> = composed.lines().collect();
        let bullets: Vec<&str> = lines
            .iter()
            .filter_map(|l| l.strip_prefix("- "))
            .collect();
        assert_eq!(bullets, items);

        let question_at = composed.find("Question: what now?").unwrap();
        for item in &items {
            assert!(composed.find(&format!("- {}", item)).unwrap() < question_at);
        }
    }

    #[test]
    fn test_single_item() {
        let bundle = ContextBundle::from(vec!["only"]);
        assert_eq!(
            compose_augmented("q", &bundle),
            "Based on previous context:\n- only\n\nQuestion: q"
        );
    }
}
