//! Heuristic continuity-contradiction check.
//!
//! Compares a scene's continuity constraints against the global ones,
//! field by field, looking for antonym-pair keyword collisions. Findings
//! are warnings, never fatal: this is a linter, not a gate.

use tf_state::ContinuityConstraints;

/// Keyword pairs that read as contradictory when they appear on opposite
/// sides of the same constraint field.
const ANTONYM_PAIRS: &[(&str, &str)] = &[
    ("warm", "cold"),
    ("bright", "dark"),
    ("indoor", "outdoor"),
    ("natural", "artificial"),
    ("soft", "harsh"),
];

/// Return one warning per antonym collision between `global` and `scene`.
pub fn contradictions(
    global: &ContinuityConstraints,
    scene: &ContinuityConstraints,
) -> Vec<String> {
    let mut warnings = Vec::new();

    for ((field, global_text), (_, scene_text)) in
        global.fields().iter().zip(scene.fields().iter())
    {
        let global_text = global_text.to_lowercase();
        let scene_text = scene_text.to_lowercase();

        for &(a, b) in ANTONYM_PAIRS {
            let collision = (contains_word(&global_text, a) && contains_word(&scene_text, b))
                || (contains_word(&global_text, b) && contains_word(&scene_text, a));
            if collision {
                warnings.push(format!(
                    "continuity contradiction on `{field}`: global `{global_text}` vs scene `{scene_text}` ({a}/{b})"
                ));
            }
        }
    }

    warnings
}

/// Whole-word containment, so "lukewarm" does not collide with "warm".
fn contains_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|w| w == word)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints(lighting: &str, environment: &str) -> ContinuityConstraints {
        ContinuityConstraints {
            lighting: lighting.into(),
            camera_axis: "fixed frontal".into(),
            motion_energy: "calm".into(),
            color_palette: "amber".into(),
            environment_type: environment.into(),
        }
    }

    #[test]
    fn no_warnings_when_consistent() {
        let global = constraints("warm sunlight", "indoor living room");
        let scene = constraints("warm lamplight", "indoor kitchen");
        assert!(contradictions(&global, &scene).is_empty());
    }

    #[test]
    fn warm_vs_cold_collides() {
        let global = constraints("warm sunlight", "indoor");
        let scene = constraints("cold fluorescent glare", "indoor");
        let warnings = contradictions(&global, &scene);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("lighting"));
        assert!(warnings[0].contains("warm/cold"));
    }

    #[test]
    fn collision_is_direction_agnostic() {
        let global = constraints("cold dusk light", "indoor");
        let scene = constraints("warm candle light", "indoor");
        assert_eq!(contradictions(&global, &scene).len(), 1);
    }

    #[test]
    fn indoor_vs_outdoor_collides() {
        let global = constraints("warm", "indoor studio");
        let scene = constraints("warm", "outdoor street");
        let warnings = contradictions(&global, &scene);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("environment_type"));
    }

    #[test]
    fn substrings_do_not_collide() {
        let global = constraints("lukewarm haze", "indoor");
        let scene = constraints("cold haze", "indoor");
        assert!(contradictions(&global, &scene).is_empty());
    }

    #[test]
    fn collisions_only_compare_matching_fields() {
        // "warm" in lighting vs "cold" in environment_type: different
        // fields, no collision.
        let global = constraints("warm light", "neutral hall");
        let scene = constraints("dim light", "cold storage room");
        assert!(contradictions(&global, &scene).is_empty());
    }
}
