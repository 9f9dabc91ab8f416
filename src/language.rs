//! Collaborator seams: text normalization, semantic similarity and link prediction.
//!
//! The engine never tokenizes, lemmatizes or embeds text itself. It calls a
//! [`LanguageService`] for those, and optionally a [`LinkPredictor`] that
//! scores how likely two concepts are to be related. Both calls are
//! synchronous and blocking.
//!
//! [`LexicalLanguageService`] is a deterministic built-in implementation based
//! on character bigrams. It is what the CLI uses when no external service is
//! wired in.

use std::collections::HashSet;

use crate::normalize::normalize_key;

/// Embedding dimension produced by [`LexicalLanguageService`].
pub const EMBEDDING_DIM: usize = 300;

/// Text normalization and semantic similarity.
pub trait LanguageService {
    /// Normalize free text into a concept key.
    fn normalize(&self, text: &str) -> String {
        normalize_key(text)
    }

    /// Similarity in `[0, 1]` between two keys, or `None` when undefined
    /// (e.g. one side has no embedding).
    fn similarity(&self, a: &str, b: &str) -> Option<f64>;

    /// Dense embedding for a key. A zero vector signals "no embedding".
    fn embedding(&self, key: &str) -> Vec<f32>;

    /// Content keywords of a text, already normalized.
    fn keywords(&self, text: &str) -> Vec<String>;
}

/// Optional link-prediction collaborator.
pub trait LinkPredictor {
    /// Probability in `[0, 1]` that the two concepts should be linked.
    fn predict_link(&self, a: &str, b: &str) -> f64;
}

const STOPWORDS: &[&str] = &[
    // es
    "como", "con", "del", "ella", "ellos", "era", "esa", "ese", "eso", "esta", "este", "esto",
    "gran", "hay", "las", "los", "mas", "muy", "para", "pero", "por", "que", "sin", "sobre",
    "son", "una", "uno", "unos", "unas",
    // en
    "and", "are", "but", "for", "from", "has", "have", "its", "not", "that", "the", "this",
    "was", "were", "what", "with",
];

/// Deterministic bigram-based language service.
#[derive(Debug, Clone, Default)]
pub struct LexicalLanguageService;

impl LexicalLanguageService {
    pub fn new() -> Self {
        Self
    }

    fn bigrams(key: &str) -> Vec<(char, char)> {
        let padded: Vec<char> = std::iter::once(' ')
            .chain(key.chars())
            .chain(std::iter::once(' '))
            .collect();
        padded.windows(2).map(|w| (w[0], w[1])).collect()
    }
}

impl LanguageService for LexicalLanguageService {
    fn similarity(&self, a: &str, b: &str) -> Option<f64> {
        let a = normalize_key(a);
        let b = normalize_key(b);
        if a.is_empty() || b.is_empty() {
            return None;
        }
        if a == b {
            return Some(1.0);
        }
        let left: HashSet<(char, char)> = Self::bigrams(&a).into_iter().collect();
        let right: HashSet<(char, char)> = Self::bigrams(&b).into_iter().collect();
        let shared = left.intersection(&right).count();
        Some(2.0 * shared as f64 / (left.len() + right.len()) as f64)
    }

    fn embedding(&self, key: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; EMBEDDING_DIM];
        let key = normalize_key(key);
        if key.is_empty() {
            return vector;
        }
        for (x, y) in Self::bigrams(&key) {
            // FNV-1a over the two code points.
            let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
            for part in [x as u64, y as u64] {
                hash ^= part;
                hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
            }
            vector[(hash % EMBEDDING_DIM as u64) as usize] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }

    fn keywords(&self, text: &str) -> Vec<String> {
        let normalized = normalize_key(text);
        let mut seen = HashSet::new();
        normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| token.chars().count() >= 3)
            .filter(|token| !STOPWORDS.contains(token))
            .filter(|token| seen.insert(token.to_string()))
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_keys_are_fully_similar() {
        let svc = LexicalLanguageService::new();
        assert_eq!(svc.similarity("Tigre", "tigre"), Some(1.0));
    }

    #[test]
    fn near_words_score_above_unrelated() {
        let svc = LexicalLanguageService::new();
        let close = svc.similarity("felino", "felinos").unwrap();
        let far = svc.similarity("felino", "granito").unwrap();
        assert!(close > 0.7, "close = {close}");
        assert!(far < close);
    }

    #[test]
    fn empty_key_has_undefined_similarity_and_zero_embedding() {
        let svc = LexicalLanguageService::new();
        assert_eq!(svc.similarity("", "tigre"), None);
        assert!(svc.embedding("   ").iter().all(|v| *v == 0.0));
        assert_eq!(svc.embedding("tigre").len(), EMBEDDING_DIM);
    }

    #[test]
    fn keywords_drop_stopwords_and_short_tokens() {
        let svc = LexicalLanguageService::new();
        let words = svc.keywords("El tigre es un felino carnívoro de gran tamaño, el tigre");
        assert_eq!(words, vec!["tigre", "felino", "carnivoro", "tamano"]);
    }
}
