//! Deterministic keyword tables shared by classification, extraction and
//! presentation. Terms are stored folded (lowercase, no accents) and matched
//! as whole words against a [`NormalizedText`].

use crate::text::NormalizedText;

/// Whole-input phrases that end the session.
pub const EXIT_PHRASES: &[&str] = &["exit", "quit", "bye", "sair", "tchau", "adeus", "ate logo"];

pub const SEARCH_KEYWORDS: &[&str] = &[
    "search",
    "find",
    "show me",
    "show",
    "list",
    "available",
    "plate",
    "want",
    "need",
    "looking for",
    "car",
    "cars",
    "buscar",
    "procurar",
    "quero",
    "preciso",
    "encontrar",
    "carro",
    "carros",
    "placa",
    "listar",
    "lista",
    "mostrar",
    "ver",
    "todos",
    "disponiveis",
    "disponivel",
];

pub const LIST_ALL_KEYWORDS: &[&str] = &[
    "all",
    "everything",
    "list",
    "available",
    "show all",
    "see all",
    "available cars",
    "todos",
    "listar",
    "disponiveis",
    "disponivel",
    "mostrar todos",
    "ver todos",
    "carros disponiveis",
];

/// Words that ask for per-vehicle specifics during extraction.
pub const DETAIL_KEYWORDS: &[&str] = &[
    "doors",
    "engine",
    "specs",
    "specifications",
    "details",
    "information",
    "features",
    "portas",
    "motor",
    "motorizacao",
    "detalhes",
    "informacoes",
    "especificacoes",
    "caracteristicas",
];

/// Words that switch the presentation to the detailed view.
pub const DETAILED_VIEW_KEYWORDS: &[&str] = &[
    "details",
    "detail",
    "information",
    "specific",
    "number",
    "detalhes",
    "informacoes",
    "especifico",
    "especifica",
    "numero",
];

pub const METRICS_KEYWORDS: &[&str] = &[
    "metrics",
    "fields",
    "attributes",
    "properties",
    "available data",
    "available information",
    "technical details",
    "metricas",
    "campos",
    "atributos",
    "propriedades",
    "informacoes disponiveis",
    "dados disponiveis",
    "caracteristicas disponiveis",
    "detalhes tecnicos",
];

/// Color synonyms mapped to the catalog's canonical color names.
pub const COLOR_SYNONYMS: &[(&str, &str)] = &[
    ("branco", "Branco"),
    ("branca", "Branco"),
    ("brancos", "Branco"),
    ("brancas", "Branco"),
    ("white", "Branco"),
    ("preto", "Preto"),
    ("preta", "Preto"),
    ("pretos", "Preto"),
    ("pretas", "Preto"),
    ("black", "Preto"),
    ("azul", "Azul"),
    ("azuis", "Azul"),
    ("blue", "Azul"),
    ("vermelho", "Vermelho"),
    ("vermelha", "Vermelho"),
    ("vermelhos", "Vermelho"),
    ("vermelhas", "Vermelho"),
    ("red", "Vermelho"),
    ("verde", "Verde"),
    ("verdes", "Verde"),
    ("green", "Verde"),
    ("amarelo", "Amarelo"),
    ("amarela", "Amarelo"),
    ("amarelos", "Amarelo"),
    ("yellow", "Amarelo"),
    ("cinza", "Cinza"),
    ("cinzas", "Cinza"),
    ("gray", "Cinza"),
    ("grey", "Cinza"),
    ("prata", "Prata"),
    ("silver", "Prata"),
    ("dourado", "Dourado"),
    ("dourada", "Dourado"),
    ("gold", "Dourado"),
    ("marrom", "Marrom"),
    ("brown", "Marrom"),
    ("bege", "Bege"),
    ("beige", "Bege"),
    ("roxo", "Roxo"),
    ("roxa", "Roxo"),
    ("purple", "Roxo"),
    ("rosa", "Rosa"),
    ("pink", "Rosa"),
];

/// Tokens that introduce a numbered item reference ("item 5", "carro 3").
const REFERENCE_MARKERS: &[&str] = &["item", "car", "carro", "number", "numero", "no", "n"];
const REFERENCE_CONNECTORS: &[&str] = &["number", "numero", "no", "n"];
/// A number followed by one of these is a spec ("carro 4 portas"), not a reference.
const REFERENCE_STOPWORDS: &[&str] = &["doors", "door", "portas", "porta", "seats", "lugares"];

pub const MAX_ITEM_REFERENCE: u32 = 100;

pub fn is_exit_phrase(text: &NormalizedText) -> bool {
    EXIT_PHRASES.iter().any(|phrase| text.equals_phrase(phrase))
}

pub fn has_search_keyword(text: &NormalizedText) -> bool {
    text.contains_any(SEARCH_KEYWORDS)
}

pub fn has_list_all_keyword(text: &NormalizedText) -> bool {
    text.contains_any(LIST_ALL_KEYWORDS)
}

pub fn mentions_brand(text: &NormalizedText, brands: &[String]) -> bool {
    brands.iter().any(|brand| text.contains_term(brand))
}

/// List-all phrasing with no known brand named.
pub fn is_list_all_request(text: &NormalizedText, brands: &[String]) -> bool {
    has_list_all_keyword(text) && !mentions_brand(text, brands)
}

pub fn wants_detail(text: &NormalizedText) -> bool {
    text.contains_any(DETAIL_KEYWORDS)
}

pub fn wants_detailed_view(text: &NormalizedText) -> bool {
    text.contains_any(DETAILED_VIEW_KEYWORDS)
}

pub fn is_metrics_request(text: &NormalizedText) -> bool {
    text.contains_any(METRICS_KEYWORDS)
}

pub fn detect_color(text: &NormalizedText) -> Option<&'static str> {
    text.find_mapped(COLOR_SYNONYMS)
}

/// 1-based item index referenced by the utterance, within `1..=100`.
pub fn item_reference(text: &NormalizedText) -> Option<u32> {
    let tokens = text.tokens();
    for (index, token) in tokens.iter().enumerate() {
        if let Some(number) = token.strip_prefix('#') {
            if let Some(value) = parse_reference(number, tokens.get(index + 1)) {
                return Some(value);
            }
            continue;
        }

        if !REFERENCE_MARKERS.contains(&token.as_str()) {
            continue;
        }
        let mut next = index + 1;
        if tokens.get(next).is_some_and(|candidate| {
            REFERENCE_CONNECTORS.contains(&candidate.as_str()) || candidate == "#"
        }) {
            next += 1;
        }
        let Some(candidate) = tokens.get(next) else {
            continue;
        };
        let candidate = candidate.trim_start_matches('#');
        if let Some(value) = parse_reference(candidate, tokens.get(next + 1)) {
            return Some(value);
        }
    }
    None
}

fn parse_reference(number: &str, following: Option<&String>) -> Option<u32> {
    if following.is_some_and(|word| REFERENCE_STOPWORDS.contains(&word.as_str())) {
        return None;
    }
    number.parse::<u32>().ok().filter(|value| (1..=MAX_ITEM_REFERENCE).contains(value))
}
