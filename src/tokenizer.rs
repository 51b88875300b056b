//! The single point of text normalization.
//!
//! Both the builders and the query engine call `tokenize` — never a
//! hand-rolled substitute. Mismatched tokenization between a builder and
//! the query engine silently mis-indexes: a term the query engine derives
//! that the lexicon never assigned an id to just looks like an empty
//! result, with nothing to point at the real cause. Treat this module as a
//! correctness contract, not a performance knob.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Traverse bytes, accumulate runs of ASCII alphanumerics (lower-cased),
/// emit a run on any other byte and at end-of-input, then drop stopwords.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for b in text.bytes() {
        if b.is_ascii_alphanumeric() {
            current.push(b.to_ascii_lowercase() as char);
        } else if !current.is_empty() {
            push_token(&mut tokens, std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        push_token(&mut tokens, current);
    }

    tokens
}

#[inline]
fn push_token(tokens: &mut Vec<String>, word: String) {
    if !STOPWORDS.contains(word.as_str()) {
        tokens.push(word);
    }
}

/// The canonical ~170-entry English stopword list, fixed at compile time so
/// every process in the pipeline (and every future process) sees the exact
/// same set.
static STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    STOPWORD_LIST.iter().copied().collect()
});

const STOPWORD_LIST: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "arent", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "cant", "cannot", "could", "couldnt", "did", "didnt", "do", "does", "doesnt",
    "doing", "dont", "down", "during", "each", "few", "for", "from", "further", "had", "hadnt",
    "has", "hasnt", "have", "havent", "having", "he", "hed", "hell", "hes", "her", "here",
    "heres", "hers", "herself", "him", "himself", "his", "how", "hows", "i", "id", "ill", "im",
    "ive", "if", "in", "into", "is", "isnt", "it", "its", "itself", "lets", "me", "more", "most",
    "mustnt", "my", "myself", "no", "nor", "not", "of", "off", "on", "once", "only", "or",
    "other", "ought", "our", "ours", "ourselves", "out", "over", "own", "same", "shant", "she",
    "shed", "shell", "shes", "should", "shouldnt", "so", "some", "such", "than", "that", "thats",
    "the", "their", "theirs", "them", "themselves", "then", "there", "theres", "these", "they",
    "theyd", "theyll", "theyre", "theyve", "this", "those", "through", "to", "too", "under",
    "until", "up", "very", "was", "wasnt", "we", "wed", "well", "were", "weve", "werent", "what",
    "whats", "when", "whens", "where", "wheres", "which", "while", "who", "whos", "whom", "why",
    "whys", "with", "wont", "would", "wouldnt", "you", "youd", "youll", "youre", "youve", "your",
    "yours", "yourself", "yourselves", "also", "however", "thus", "therefore", "upon", "within",
    "without", "among", "via", "per", "et", "al", "eg", "ie", "one", "two", "new", "using", "based",
    "shall", "will", "can", "may", "might", "must",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_punctuation_and_lowercases() {
        assert_eq!(
            tokenize("Alpha-Beta, GAMMA!"),
            vec!["alpha", "beta", "gamma"]
        );
    }

    #[test]
    fn drops_stopwords() {
        assert_eq!(tokenize("the quick and the dead"), vec!["quick", "dead"]);
    }

    #[test]
    fn trailing_run_is_emitted() {
        assert_eq!(tokenize("trailingword"), vec!["trailingword"]);
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ...   ").is_empty());
    }

    // tokenize is idempotent under join/retokenize.
    #[test]
    fn idempotent_under_rejoin() {
        let samples = [
            "Alpha Beta Gamma-Delta 123",
            "  leading and trailing spaces  ",
            "MixedCASE123 and_punctuation!!",
            "",
        ];
        for s in samples {
            let once = tokenize(s);
            let rejoined = once.join(" ");
            let twice = tokenize(&rejoined);
            assert_eq!(once, twice, "not idempotent for {s:?}");
        }
    }
}
