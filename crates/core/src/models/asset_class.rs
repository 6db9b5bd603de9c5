use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reduce a free-form asset-class label to its canonical key.
///
/// Steps, applied once at ingestion:
/// - trim and collapse inner whitespace
/// - fold Latin diacritics (`ç` → `c`, `õ` → `o`, ...)
/// - lowercase
/// - fold simple plurals per word (`acoes` → `acao`, `stocks` → `stock`)
///
/// `"Ações"`, `" ação "` and `"ACOES"` therefore share the key `"acao"`.
pub fn canonical_key(label: &str) -> String {
    label
        .split_whitespace()
        .map(|word| {
            let folded: String = word.chars().flat_map(fold_char).collect::<String>().to_lowercase();
            singularize(&folded)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn fold_char(c: char) -> Vec<char> {
    let base = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        'ß' => return vec!['s', 's'],
        other => other,
    };
    vec![base]
}

fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("oes") {
        return format!("{stem}ao");
    }
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Canonical asset-class label set built at ingestion.
///
/// Maps each canonical key to the first display label seen for it, so
/// `"Ações"` and `"ação"` land in one bucket that is shown as `"Ações"`.
/// Missing or blank labels resolve to the configured unknown label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassCatalog {
    labels: BTreeMap<String, String>,
    unknown_label: String,
}

impl ClassCatalog {
    pub fn new(unknown_label: impl Into<String>) -> Self {
        Self {
            labels: BTreeMap::new(),
            unknown_label: unknown_label.into(),
        }
    }

    /// Resolve a raw label to its display label, registering it if unseen.
    pub fn resolve(&mut self, raw: Option<&str>) -> String {
        let trimmed = raw.map(|r| r.split_whitespace().collect::<Vec<_>>().join(" "));
        let display = match trimmed {
            Some(t) if !t.is_empty() => t,
            _ => self.unknown_label.clone(),
        };
        self.labels
            .entry(canonical_key(&display))
            .or_insert(display)
            .clone()
    }

    /// Look up the display label of a raw label without registering it.
    pub fn display_for(&self, raw: &str) -> Option<&str> {
        self.labels.get(&canonical_key(raw)).map(String::as_str)
    }

    /// Number of distinct classes registered.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Display labels in canonical-key order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.values().map(String::as_str)
    }
}
