//! Built-in provider profiles.

use memlayer_protocols::{ProviderId, TextSource};

use crate::schema::ProviderProfile;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Profiles shipped with memlayer. Configuration may override any field.
pub fn builtin_profiles() -> Vec<ProviderProfile> {
    vec![
        ProviderProfile {
            id: ProviderId::Claude,
            url_patterns: strings(&["claude.ai"]),
            input_selectors: strings(&["div[contenteditable=\"true\"]", "textarea"]),
            send_selectors: strings(&["button[aria-label*=\"Send\"]", "button[type=\"submit\"]"]),
            message_selector: "[data-test-render-count]".to_string(),
            generating_selectors: strings(&["button[aria-label*=\"Stop\"]"]),
            text_source: TextSource::TextContent,
            settle_delay_ms: 200,
        },
        ProviderProfile {
            id: ProviderId::Grok,
            url_patterns: strings(&["grok.com", "x.com/i/grok"]),
            input_selectors: strings(&["textarea", "[contenteditable=\"true\"]"]),
            send_selectors: strings(&["button[type=\"submit\"]", "button[aria-label*=\"Send\"]"]),
            message_selector: "[data-testid=\"message\"]".to_string(),
            generating_selectors: strings(&["[aria-label*=\"Stop\"]"]),
            text_source: TextSource::Auto,
            settle_delay_ms: 200,
        },
    ]
}
