//! Catalogue of known local events
//!
//! Events annotate clusters whose peak months overlap the event's active
//! months. They never influence the classification label.

use serde::{Deserialize, Serialize};

/// A named recurring event and the calendar months it is active in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownEvent {
    pub name: String,
    /// 1-based calendar months
    pub months: Vec<u8>,
    #[serde(default)]
    pub description: String,
}

impl KnownEvent {
    pub fn new(name: &str, months: &[u8], description: &str) -> Self {
        Self {
            name: name.to_string(),
            months: months.to_vec(),
            description: description.to_string(),
        }
    }

    /// True when any active month is among `peak_months`
    pub fn matches(&self, peak_months: &[u8]) -> bool {
        self.months.iter().any(|m| peak_months.contains(m))
    }
}

/// Lyon events
pub fn default_known_events() -> Vec<KnownEvent> {
    vec![
        KnownEvent::new("Fête des Lumières", &[12], "Annual light festival in December"),
        KnownEvent::new("Nuits de Fourvière", &[6, 7], "Summer arts festival (June-July)"),
        KnownEvent::new(
            "Biennale de la Danse",
            &[9],
            "Biennial dance festival (September, odd years)",
        ),
        KnownEvent::new("Quais du Polar", &[4], "Crime fiction festival (March-April)"),
        KnownEvent::new("Just4U", &[6], "Music festival (June)"),
        KnownEvent::new("Summer Tourism", &[7, 8], "Peak tourist season"),
    ]
}

/// Names of the events matching `peak_months`, in catalogue order
pub fn match_events(events: &[KnownEvent], peak_months: &[u8]) -> Vec<String> {
    events
        .iter()
        .filter(|e| e.matches(peak_months))
        .map(|e| e.name.clone())
        .collect()
}
