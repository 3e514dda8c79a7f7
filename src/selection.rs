use crate::catalog::CountryRecord;

/// The single active country. Only the app controller writes to it.
#[derive(Clone, Debug)]
pub struct Selection {
    active: CountryRecord,
}

impl Selection {
    pub fn new(initial: &CountryRecord) -> Self {
        Self {
            active: initial.clone(),
        }
    }

    pub fn active(&self) -> &CountryRecord {
        &self.active
    }

    /// Replace the active record. Returns true if a different country is now active.
    pub fn select(&mut self, country: &CountryRecord) -> bool {
        let changed = self.active.id != country.id;
        self.active = country.clone();
        changed
    }

    /// Adopt the sole match of a non-empty query. An empty query or an empty
    /// result set leaves the current selection alone.
    pub fn resolve(&mut self, query: &str, filtered: &[&CountryRecord]) -> bool {
        match filtered {
            [only] if !query.is_empty() => self.select(only),
            _ => false,
        }
    }

    /// Step to the next visible country, wrapping around
    pub fn select_next(&mut self, filtered: &[&CountryRecord]) -> bool {
        self.step(filtered, 1)
    }

    /// Step to the previous visible country, wrapping around
    pub fn select_prev(&mut self, filtered: &[&CountryRecord]) -> bool {
        self.step(filtered, -1)
    }

    fn step(&mut self, filtered: &[&CountryRecord], delta: isize) -> bool {
        if filtered.is_empty() {
            return false;
        }
        let len = filtered.len() as isize;
        let next = match filtered.iter().position(|c| c.id == self.active.id) {
            Some(idx) => (idx as isize + delta).rem_euclid(len),
            // Active record is filtered out: start from the edge
            None if delta > 0 => 0,
            None => len - 1,
        };
        self.select(filtered[next as usize])
    }
}
