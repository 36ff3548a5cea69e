use crate::recipes::Recipe;

/// Case-insensitive title search. An empty or whitespace query filters
/// nothing. Source order is preserved and no ranking is applied.
pub fn filter_by_query<'a>(recipes: &'a [Recipe], query: &str) -> Vec<&'a Recipe> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return recipes.iter().collect();
    }

    recipes
        .iter()
        .filter(|recipe| recipe.title.to_lowercase().contains(&query))
        .collect()
}

/// Matches recipes whose title contains any of the detected labels,
/// case-insensitively. An empty label list filters nothing.
pub fn match_labels<'a>(recipes: &'a [Recipe], labels: &[String]) -> Vec<&'a Recipe> {
    let labels: Vec<String> = labels
        .iter()
        .map(|label| label.trim().to_lowercase())
        .filter(|label| !label.is_empty())
        .collect();
    if labels.is_empty() {
        return recipes.iter().collect();
    }

    recipes
        .iter()
        .filter(|recipe| {
            let title = recipe.title.to_lowercase();
            labels.iter().any(|label| title.contains(label))
        })
        .collect()
}
