pub mod catalog;

use crate::logic::SeasonPlan;

#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SeasonPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SeasonPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let scenario = match name.to_lowercase().as_str() {
        "smoke" => catalog::smoke_scenario(),
        "state-bounds" | "bounds" => catalog::state_bounds_scenario(),
        "streak-reset" | "streaks" => catalog::streak_reset_scenario(),
        "idempotent-retries" | "retries" => catalog::idempotent_retries_scenario(),
        "chaos-liveness" | "chaos" => catalog::chaos_liveness_scenario(),
        "mentor-growth" | "mentor" => catalog::mentor_growth_scenario(),
        "idle-user" | "idle" => catalog::idle_user_scenario(),
        "mirror-baseline" | "mirror" => catalog::mirror_baseline_scenario(),
        "peer-rivalry" | "peer" => catalog::peer_rivalry_scenario(),
        _ => return None,
    };
    Some(scenario)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("state-bounds", "Respect and Heat Clamping"),
        ("streak-reset", "Win Streak Transitions"),
        ("idempotent-retries", "Idempotent Showdown Retries"),
        ("chaos-liveness", "Nemesis Chaos Liveness"),
        ("mentor-growth", "Mentor Growth Bias"),
        ("idle-user", "Idle Athlete vs Nemesis"),
        ("mirror-baseline", "Mirror Rolling Baseline"),
        ("peer-rivalry", "Peer Rivalry Season"),
    ]
}
