use serde::{Deserialize, Serialize};

/// Text with do-not-translate phrases swapped for `__DNT_{i}__` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedText {
    pub text: String,
    /// `(token, phrase)` in the order the phrases were replaced.
    pub tokens: Vec<(String, String)>,
}

impl ProtectedText {
    pub fn is_protected(&self) -> bool {
        !self.tokens.is_empty()
    }

    /// Puts every protected phrase back in place of its token.
    ///
    /// Tokens are undone last-replaced first: a short phrase such as `0` or `_`
    /// may have been substituted inside an earlier token.
    pub fn restore(&self, translated: &str) -> String {
        let mut restored = translated.to_string();
        for (token, phrase) in self.tokens.iter().rev() {
            restored = restored.replace(token.as_str(), phrase);
        }
        restored
    }
}

/// Longest phrases are replaced first so a phrase nested in a longer one stays intact.
pub fn protect_phrases<S: AsRef<str>>(text: &str, phrases: &[S]) -> ProtectedText {
    let mut ordered: Vec<&str> = phrases.iter().map(|p| p.as_ref()).collect();
    ordered.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));

    let mut protected = text.to_string();
    let mut tokens = Vec::new();

    for (i, phrase) in ordered.into_iter().enumerate() {
        if phrase.is_empty() || !protected.contains(phrase) {
            continue;
        }
        let token = format!("__DNT_{}__", i);
        protected = protected.replace(phrase, &token);
        tokens.push((token, phrase.to_string()));
    }

    ProtectedText {
        text: protected,
        tokens,
    }
}
