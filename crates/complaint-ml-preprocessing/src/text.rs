use complaint_ml_core::SparseMatrix;
use complaint_ml_data::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{PreprocessError, PreprocessResult};

/// English stop words removed before counting terms.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst",
    "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can", "cannot",
    "cant", "co", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do", "done",
    "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else", "elsewhere",
    "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything", "everywhere",
    "except", "few", "fifteen", "fifty", "fill", "find", "fire", "first", "five", "for", "former",
    "formerly", "forty", "found", "four", "from", "front", "full", "further", "get", "give", "go",
    "had", "has", "hasnt", "have", "he", "hence", "her", "here", "hereafter", "hereby", "herein",
    "hereupon", "hers", "herself", "him", "himself", "his", "how", "however", "hundred", "i", "ie",
    "if", "in", "inc", "indeed", "interest", "into", "is", "it", "its", "itself", "keep", "last",
    "latter", "latterly", "least", "less", "ltd", "made", "many", "may", "me", "meanwhile",
    "might", "mill", "mine", "more", "moreover", "most", "mostly", "move", "much", "must", "my",
    "myself", "name", "namely", "neither", "never", "nevertheless", "next", "nine", "no", "nobody",
    "none", "noone", "nor", "not", "nothing", "now", "nowhere", "of", "off", "often", "on", "once",
    "one", "only", "onto", "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out",
    "over", "own", "part", "per", "perhaps", "please", "put", "rather", "re", "same", "see",
    "seem", "seemed", "seeming", "seems", "serious", "several", "she", "should", "show", "side",
    "since", "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something",
    "sometime", "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than", "that",
    "the", "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "thick", "thin", "third", "this",
    "those", "though", "three", "through", "throughout", "thru", "thus", "to", "together", "too",
    "top", "toward", "towards", "twelve", "twenty", "two", "un", "under", "until", "up", "upon",
    "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
    "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon", "wherever",
    "whether", "which", "while", "whither", "who", "whoever", "whole", "whom", "whose", "why",
    "will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Lowercase word tokens: runs of alphanumerics or `_`, at least two characters long.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|s| s.chars().count() >= 2)
        .map(|s| s.to_string())
        .collect()
}

/// Bounded-vocabulary term counter for one free-text column.
///
/// The vocabulary keeps the `max_features` most frequent non-stop-word terms
/// across the fitted corpus (ties broken alphabetically), and output columns
/// are ordered alphabetically.
#[derive(Debug, Clone, PartialEq)]
pub struct CountVectorizer {
    pub vocabulary: Vec<String>,
    term_to_idx: HashMap<String, usize>,
}

impl CountVectorizer {
    pub fn fit(documents: &[Value], max_features: usize) -> PreprocessResult<Self> {
        if max_features == 0 {
            return Err(PreprocessError::Configuration(
                "max_features must be at least 1".to_string(),
            ));
        }
        let stop: HashSet<&str> = ENGLISH_STOP_WORDS.iter().copied().collect();

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for doc in documents.iter().filter(|d| !d.is_missing()) {
            for token in tokenize(&doc.to_string()) {
                if !stop.contains(token.as_str()) {
                    *counts.entry(token).or_insert(0) += 1;
                }
            }
        }

        // BTreeMap iteration is alphabetical, so a stable sort by count keeps ties ordered.
        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(max_features);

        let mut vocabulary: Vec<String> = ranked.into_iter().map(|(t, _)| t).collect();
        vocabulary.sort();
        let term_to_idx = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Ok(CountVectorizer { vocabulary, term_to_idx })
    }

    pub fn width(&self) -> usize {
        self.vocabulary.len()
    }

    /// Count vocabulary terms per document into an `n × width` matrix.
    /// Only terms that occur are stored.
    pub fn transform(&self, documents: &[Value]) -> PreprocessResult<SparseMatrix<f64>> {
        let rows: Vec<Vec<(usize, f64)>> = documents
            .iter()
            .map(|doc| {
                if doc.is_missing() {
                    return Vec::new();
                }
                tokenize(&doc.to_string())
                    .iter()
                    .filter_map(|token| self.term_to_idx.get(token).map(|&j| (j, 1.0)))
                    .collect()
            })
            .collect();
        SparseMatrix::from_rows(rows, self.width()).map_err(PreprocessError::from)
    }
}
