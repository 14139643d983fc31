/// Canned starter prompt shown on the empty transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptSuggestion {
    pub title: &'static str,
    pub prompt: &'static str,
}

pub const SUGGESTIONS: [PromptSuggestion; 4] = [
    PromptSuggestion {
        title: "Explain a concept",
        prompt: "Can you explain quantum computing in simple terms?",
    },
    PromptSuggestion {
        title: "Write code",
        prompt: "Write a Python function to calculate the Fibonacci sequence",
    },
    PromptSuggestion {
        title: "Creative writing",
        prompt: "Write a short story about a time traveler in ancient Rome",
    },
    PromptSuggestion {
        title: "Get advice",
        prompt: "What are some tips for improving productivity while working from home?",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_suggestion_is_submittable() {
        for suggestion in SUGGESTIONS {
            assert!(!suggestion.title.trim().is_empty());
            assert_eq!(suggestion.prompt, suggestion.prompt.trim());
            assert!(!suggestion.prompt.is_empty());
        }
    }

    #[test]
    fn titles_are_unique() {
        let mut titles = SUGGESTIONS.map(|suggestion| suggestion.title).to_vec();
        titles.sort_unstable();
        titles.dedup();
        assert_eq!(titles.len(), SUGGESTIONS.len());
    }
}
