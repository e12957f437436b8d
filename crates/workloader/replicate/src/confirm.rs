//! Confirmation before changes are applied

use parking_lot::Mutex;
use std::collections::VecDeque;

/// Asks the operator whether to go ahead
pub trait Confirmation: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Whether an answer counts as consent: `yes`, any case, surrounding space ignored
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// Always consents; used for `--no-prompt`
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

impl Confirmation for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Replays prepared answers and records the prompts it was shown
#[derive(Debug, Default)]
pub struct ScriptedConfirmation {
    answers: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedConfirmation {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

impl Confirmation for ScriptedConfirmation {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().push(prompt.to_string());
        // No answer left reads as a closed input
        self.answers
            .lock()
            .pop_front()
            .is_some_and(|a| is_affirmative(&a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative("yes"));
        assert!(is_affirmative("  YES\n"));
        assert!(is_affirmative("Yes"));
        assert!(!is_affirmative("y"));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative(""));
    }

    #[test]
    fn test_scripted_answers() {
        let confirmation = ScriptedConfirmation::new(["no", "yes"]);
        assert!(!confirmation.confirm("first?"));
        assert!(confirmation.confirm("second?"));
        assert!(!confirmation.confirm("third?"));
        assert_eq!(confirmation.prompts().len(), 3);
    }
}
