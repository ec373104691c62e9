use crate::{config::Rules, show::ShowRecord};

/// Whether a listing is a live show rather than merchandise or a donation.
///
/// Merchandise terms win over show terms, and anything matching neither is
/// not a show.
pub fn is_show(show: &ShowRecord, rules: &Rules) -> bool {
    let text = format!(
        "{} {} {}",
        show.title.to_lowercase(),
        show.description.to_lowercase(),
        show.url.to_lowercase()
    );
    if rules.merch_exclusions.iter().any(|term| text.contains(term)) {
        return false;
    }
    rules.show_indicators.iter().any(|term| text.contains(term))
}

/// True when any phrase appears in `text`, ignoring case.
pub fn mentions_any(text: &str, phrases: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    phrases.iter().any(|phrase| lowered.contains(phrase))
}
