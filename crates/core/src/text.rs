/// Strips control characters (keeping newlines and tabs) and surrounding whitespace.
pub fn sanitize_text(input: &str) -> String {
    input
        .chars()
        .filter(|character| !character.is_control() || matches!(character, '\n' | '\r' | '\t'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Lowercases and folds the Latin accents that show up in Portuguese input, so
/// `Informações` and `informacoes` compare equal.
pub fn fold_text(input: &str) -> String {
    input
        .chars()
        .flat_map(char::to_lowercase)
        .map(|character| match character {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Folded, tokenized view of an utterance used by every keyword check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedText {
    tokens: Vec<String>,
    padded: String,
}

impl NormalizedText {
    pub fn new(input: &str) -> Self {
        let tokens = tokenize(&fold_text(input));
        let padded = format!(" {} ", tokens.join(" "));
        Self { tokens, padded }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whole-word (or whole-phrase) match, so `red` does not hit `registered`.
    pub fn contains_term(&self, term: &str) -> bool {
        let needle = tokenize(&fold_text(term));
        if needle.is_empty() {
            return false;
        }
        self.padded.contains(&format!(" {} ", needle.join(" ")))
    }

    pub fn contains_any(&self, terms: &[&str]) -> bool {
        terms.iter().any(|term| self.contains_term(term))
    }

    /// Returns the first table entry whose key appears in the text.
    pub fn find_mapped<'a>(&self, table: &'a [(&'a str, &'a str)]) -> Option<&'a str> {
        table.iter().find(|(term, _)| self.contains_term(term)).map(|(_, mapped)| *mapped)
    }

    pub fn has_digit(&self) -> bool {
        self.tokens.iter().any(|token| token.chars().any(|character| character.is_ascii_digit()))
    }

    /// Exact comparison of the whole input against a phrase.
    pub fn equals_phrase(&self, phrase: &str) -> bool {
        self.tokens == tokenize(&fold_text(phrase))
    }
}

fn tokenize(folded: &str) -> Vec<String> {
    let mut sanitized = String::with_capacity(folded.len());
    for character in folded.chars() {
        if character.is_alphanumeric() || character == '#' {
            sanitized.push(character);
        } else {
            sanitized.push(' ');
        }
    }
    sanitized.split_whitespace().map(str::to_string).collect()
}
