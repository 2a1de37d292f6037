use crate::category::Category;
use rand::Rng;

/// A question put to the user: which category does this image belong to?
/// The image reference is opaque to everything but the display layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub category: Category,
    pub image: String,
}

/// Relative path of image `index` (1-based) within a category's pool,
/// mirroring the published asset layout.
pub fn image_path(category: Category, index: u32) -> String {
    format!(
        "SweepImages/{category}/sweeps_{}{index}.png",
        category.to_string().to_lowercase()
    )
}

/// Supplies the next question of a session.
pub trait QuestionSource {
    fn next_question(&mut self) -> Question;
}

/// Uniform over the three categories, then uniform over the configured
/// image pool within the drawn category.
#[derive(Debug, Clone, Copy)]
pub struct RandomPicker {
    images_per_category: u32,
}

impl RandomPicker {
    pub fn new(images_per_category: u32) -> Self {
        Self {
            images_per_category: images_per_category.max(1),
        }
    }
}

impl QuestionSource for RandomPicker {
    fn next_question(&mut self) -> Question {
        let mut rng = rand::thread_rng();
        let category = Category::ALL[rng.gen_range(0..Category::COUNT)];
        let index = rng.gen_range(1..=self.images_per_category);
        Question {
            category,
            image: image_path(category, index),
        }
    }
}

/// Deterministic source for tests and scripted runs; cycles through the
/// given questions. Must be constructed with at least one question.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    questions: Vec<Question>,
    next: usize,
}

impl ScriptedSource {
    pub fn new(questions: Vec<Question>) -> Self {
        assert!(!questions.is_empty(), "scripted source needs questions");
        Self { questions, next: 0 }
    }

    /// Convenience: one question per category, in order.
    pub fn cycling_categories() -> Self {
        Self::new(
            Category::ALL
                .iter()
                .map(|&category| Question {
                    category,
                    image: image_path(category, 1),
                })
                .collect(),
        )
    }
}

impl QuestionSource for ScriptedSource {
    fn next_question(&mut self) -> Question {
        let question = self.questions[self.next % self.questions.len()].clone();
        self.next += 1;
        question
    }
}
