//! Data-driven renderer cases.
//!
//! Runs every case in tests/fixtures/render_cases.json.

use std::fs;

use safemark::{Event, RendererConfig, render_events};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum FixtureEvent {
    Open {
        name: String,
        #[serde(default)]
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Close(String),
}

#[derive(Debug, Deserialize)]
struct FixtureCase {
    name: String,
    #[serde(default)]
    strict: bool,
    #[serde(default)]
    exempt: Vec<String>,
    events: Vec<FixtureEvent>,
    html: String,
    #[serde(default)]
    reports: Vec<String>,
}

impl FixtureCase {
    fn config(&self) -> RendererConfig {
        let mut config = RendererConfig::new();
        config.strict_unclosed_comment_check = self.strict;
        self.exempt.iter().fold(config, |config, tag| config.exempt(tag))
    }

    fn events(&self) -> Vec<Event<'_>> {
        self.events
            .iter()
            .map(|event| match event {
                FixtureEvent::Open { name, attrs } => Event::OpenTag {
                    name,
                    attrs: attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect(),
                },
                FixtureEvent::Text(text) => Event::Text(text),
                FixtureEvent::Close(name) => Event::CloseTag(name),
            })
            .collect()
    }
}

fn load_cases() -> Vec<FixtureCase> {
    let json = fs::read_to_string("tests/fixtures/render_cases.json")
        .expect("Failed to read tests/fixtures/render_cases.json");
    serde_json::from_str(&json).expect("Failed to parse render_cases.json")
}

#[test]
fn fixture_cases() {
    let cases = load_cases();
    assert!(!cases.is_empty());

    let mut failures = Vec::new();
    for case in &cases {
        let rendered = render_events(&case.events(), &case.config());
        let reports: Vec<String> = rendered.reports.iter().map(ToString::to_string).collect();
        if rendered.html != case.html || reports != case.reports {
            failures.push(format!(
                "{}\n  expected: {:?} {:?}\n  actual:   {:?} {:?}",
                case.name, case.html, case.reports, rendered.html, reports
            ));
        }
    }

    assert!(
        failures.is_empty(),
        "{} of {} fixture cases failed:\n{}",
        failures.len(),
        cases.len(),
        failures.join("\n")
    );
}
