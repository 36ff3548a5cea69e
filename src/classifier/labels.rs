/// ImageNet class label table, parsed from the synset file that ships
/// alongside the model. One line per class, in class order:
///
/// ```text
/// n07697537 hotdog, hot dog, red hot
/// ```
#[derive(Debug, Clone)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    pub fn parse(raw: &str) -> Self {
        let labels = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| strip_synset_id(line).to_string())
            .collect();

        Self { labels }
    }

    pub fn get(&self, class: usize) -> Option<&str> {
        self.labels.get(class).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn strip_synset_id(line: &str) -> &str {
    match line.split_once(char::is_whitespace) {
        Some((id, rest)) if is_synset_id(id) => rest.trim(),
        _ => line,
    }
}

fn is_synset_id(token: &str) -> bool {
    token.len() == 9
        && token.starts_with('n')
        && token[1..].chars().all(|c| c.is_ascii_digit())
}

/// Lowercase search terms for one class label. Labels often carry several
/// comma-separated aliases ("hotdog, hot dog, red hot"); each alias becomes
/// its own term.
pub fn alias_terms(label: &str) -> Vec<String> {
    label
        .split(',')
        .map(|alias| alias.trim().to_lowercase())
        .filter(|alias| !alias.is_empty())
        .collect()
}
