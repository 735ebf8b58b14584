pub mod catalog;

use crate::logic::simulation::SimulationPlan;
use catalog::catalog_scenarios;

/// Named simulation run with its expectations.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            key: "",
            name: name.into(),
            plan,
        }
    }

    #[must_use]
    pub const fn with_key(mut self, key: &'static str) -> Self {
        self.key = key;
        self
    }
}

/// Look a scenario up by key or alias. Matching ignores ASCII case.
pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let wanted = name.trim().to_ascii_lowercase();
    let key = match wanted.as_str() {
        "tournament" | "full" => "full-tournament",
        "keeper" => "keeper-model",
        "power" => "power-bar",
        "quiz" => "quiz-timeouts",
        "deterministic" | "replay" => "deterministic-replay",
        "retry" => "retry-flow",
        "flow" | "screens" => "screen-flow",
        other => other,
    };
    catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.key == key)
}

/// `(key, display name)` for every scenario, in run order.
pub fn list_scenarios() -> Vec<(&'static str, String)> {
    catalog_scenarios()
        .into_iter()
        .map(|scenario| (scenario.key, scenario.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_catalog_entries() {
        assert_eq!(get_scenario("KEEPER").map(|s| s.key), Some("keeper-model"));
        assert_eq!(get_scenario("smoke").map(|s| s.key), Some("smoke"));
        assert!(get_scenario("weather").is_none());
    }

    #[test]
    fn listing_has_unique_keys() {
        let listed = list_scenarios();
        let mut keys: Vec<_> = listed.iter().map(|(key, _)| *key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), listed.len());
        assert!(listed.iter().all(|(key, _)| get_scenario(key).is_some()));
    }
}
