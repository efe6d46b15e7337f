//! Grounding exercise from the quick-help page: a random "find things in
//! the room" task.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::env::Environment;

const COLORS: &[&str] = &[
    "red", "orange", "yellow", "green", "light blue", "blue", "purple", "pink", "brown", "black",
    "white", "grey",
];

const OBJECTS: &[&str] = &[
    "items",
    "things",
    "objects",
    "details",
    "elements",
    "products",
    "accessories",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct GroundingExercise;

impl GroundingExercise {
    /// Compose a task: 4 to 10 objects of one colour.
    pub fn compose<R: Rng + ?Sized>(rng: &mut R) -> String {
        let count = rng.gen_range(4..=10);
        let color = COLORS.choose(rng).copied().unwrap_or("red");
        let object = OBJECTS.choose(rng).copied().unwrap_or("items");
        format!("Find {count} {color} {object} in the room")
    }

    /// Show a fresh task in `#task-display` together with `#help-controls`.
    /// Returns None when the page lacks either element.
    pub fn generate<R: Rng + ?Sized>(&self, env: &mut dyn Environment, rng: &mut R) -> Option<String> {
        let doc = env.document();
        let display = doc.element_by_id("task-display")?;
        let controls = doc.element_by_id("help-controls")?;

        let task = Self::compose(rng);
        let doc = env.document_mut();
        doc.set_text(display, &task);
        doc.set_style(display, "display", "flex");
        doc.set_style(controls, "display", "flex");
        Some(task)
    }

    pub fn reset(&self, env: &mut dyn Environment) -> bool {
        let doc = env.document();
        let (Some(display), Some(controls)) = (
            doc.element_by_id("task-display"),
            doc.element_by_id("help-controls"),
        ) else {
            return false;
        };
        let doc = env.document_mut();
        doc.set_style(display, "display", "none");
        doc.set_style(controls, "display", "none");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Document, ElementSpec, HeadlessEnv, PageSpec};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn composed_tasks_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let task = GroundingExercise::compose(&mut rng);
            let count: u32 = task.split_whitespace().nth(1).unwrap().parse().unwrap();
            assert!((4..=10).contains(&count), "{task}");
            assert!(task.ends_with(" in the room"));
        }
    }

    #[test]
    fn generate_and_reset_toggle_display() {
        let mut env = HeadlessEnv::from_spec(&PageSpec::new(vec![
            ElementSpec::new("div").id("task-display").style("display", "none"),
            ElementSpec::new("div").id("help-controls").style("display", "none"),
        ]))
        .unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let task = GroundingExercise.generate(&mut env, &mut rng).unwrap();

        let display = env.document.element_by_id("task-display").unwrap();
        let controls = env.document.element_by_id("help-controls").unwrap();
        assert_eq!(env.document.text(display), Some(task.as_str()));
        assert_eq!(env.document.style(controls, "display"), Some("flex"));

        assert!(GroundingExercise.reset(&mut env));
        assert_eq!(env.document.style(display, "display"), Some("none"));
    }

    #[test]
    fn missing_elements_are_a_noop() {
        let mut env = HeadlessEnv::empty();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(GroundingExercise.generate(&mut env, &mut rng).is_none());
        assert!(!GroundingExercise.reset(&mut env));
    }
}
