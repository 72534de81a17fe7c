use crate::api::models::Scope;

/// Cached scope snapshot plus the ephemeral selection used to scope queries.
#[derive(Debug, Default, Clone)]
pub struct ScopeRegistry {
    scopes: Vec<Scope>,
    selected: Vec<String>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a freshly loaded snapshot, discarding the previous one.
    /// Duplicate ids keep their first occurrence.
    pub fn replace(&mut self, scopes: Vec<Scope>) -> &[Scope] {
        let mut unique: Vec<Scope> = Vec::with_capacity(scopes.len());
        for scope in scopes {
            if unique.iter().all(|s| s.id != scope.id) {
                unique.push(scope);
            }
        }
        self.scopes = unique;
        &self.scopes
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn get(&self, id: &str) -> Option<&Scope> {
        self.scopes.iter().find(|s| s.id == id)
    }

    /// Flips membership of `id`; returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if let Some(pos) = self.selected.iter().position(|s| s == id) {
            self.selected.remove(pos);
            false
        } else {
            self.selected.push(id.to_string());
            true
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    /// Selected ids in the order they were picked.
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn total_pages(&self) -> u64 {
        self.scopes.iter().map(|s| s.page_count).sum()
    }
}

/// Splits newline-separated pattern text, dropping blank lines.
pub fn parse_patterns(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
