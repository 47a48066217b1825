//! "Did you mean" suggestions for unknown command names
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Count adjacent transpositions as a single edit
//! - 1.0.0: Initial edit-distance recommender

/// Suggestions below this similarity (1.0 = identical) are discarded
pub const MIN_SIMILARITY: f64 = 0.4;

#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub name: String,
    pub distance: usize,
    pub similarity: f64,
}

/// Indexes registered command names for fuzzy lookup
#[derive(Debug, Clone, Default)]
pub struct CommandRecommender {
    names: Vec<String>,
}

impl CommandRecommender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_all(&mut self, names: impl IntoIterator<Item = String>) {
        for name in names {
            let name = name.to_lowercase();
            if !self.names.contains(&name) {
                self.names.push(name);
            }
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Best match for `input` among names accepted by `visible`
    pub fn recommend(&self, input: &str, visible: impl Fn(&str) -> bool) -> Option<String> {
        self.ranked(input, visible, 1).into_iter().next().map(|s| s.name)
    }

    /// Up to `limit` matches, closest first, ties broken alphabetically
    pub fn ranked(
        &self,
        input: &str,
        visible: impl Fn(&str) -> bool,
        limit: usize,
    ) -> Vec<Suggestion> {
        let input = input.to_lowercase();

        let mut suggestions: Vec<Suggestion> = self
            .names
            .iter()
            .filter(|name| visible(name))
            .map(|name| {
                let distance = edit_distance(&input, name);
                Suggestion {
                    name: name.clone(),
                    distance,
                    similarity: similarity(&input, name, distance),
                }
            })
            .filter(|s| s.similarity >= MIN_SIMILARITY)
            .collect();

        suggestions.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.name.cmp(&b.name)));
        suggestions.truncate(limit);
        suggestions
    }
}

fn similarity(a: &str, b: &str, distance: usize) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - distance as f64 / longest as f64
}

/// Optimal string alignment distance: insertions, deletions, substitutions
/// and adjacent transpositions each cost one
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (n, m) = (a.len(), b.len());

    let mut d = vec![vec![0usize; m + 1]; n + 1];
    for (i, row) in d.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=m {
        d[0][j] = j;
    }

    for i in 1..=n {
        for j in 1..=m {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (d[i - 1][j] + 1)
                .min(d[i][j - 1] + 1)
                .min(d[i - 1][j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(d[i - 2][j - 2] + 1);
            }
            d[i][j] = best;
        }
    }

    d[n][m]
}
