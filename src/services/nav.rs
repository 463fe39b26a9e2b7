//! Page navigation state
//!
//! Purely presentational: tracks which dashboard page is active. Exactly one
//! page is active at any time; selecting a page deactivates every other.

/// Tab/page selection state for the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct PageNav {
    pages: Vec<String>,
    active: usize,
}

impl PageNav {
    /// Build navigation over the given pages; the first page starts active.
    pub fn new(pages: Vec<String>) -> Self {
        debug_assert!(!pages.is_empty());
        Self { pages, active: 0 }
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    /// Name of the active page.
    pub fn active(&self) -> &str {
        &self.pages[self.active]
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn is_active(&self, page: &str) -> bool {
        self.active() == page
    }

    /// Activate the named page, deactivating all others.
    /// Returns false (and changes nothing) if the page does not exist.
    pub fn select(&mut self, page: &str) -> bool {
        match self.pages.iter().position(|p| p == page) {
            Some(idx) => {
                self.active = idx;
                true
            }
            None => false,
        }
    }

    /// Activate the page at `idx`, if it exists.
    pub fn select_index(&mut self, idx: usize) -> bool {
        if idx < self.pages.len() {
            self.active = idx;
            true
        } else {
            false
        }
    }

    pub fn next(&mut self) {
        self.active = (self.active + 1) % self.pages.len();
    }

    pub fn prev(&mut self) {
        self.active = (self.active + self.pages.len() - 1) % self.pages.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nav() -> PageNav {
        PageNav::new(vec![
            "gas".to_string(),
            "noise".to_string(),
            "pm".to_string(),
            "climate".to_string(),
            "charts".to_string(),
        ])
    }

    #[test]
    fn test_first_page_starts_active() {
        let nav = nav();
        assert_eq!(nav.active(), "gas");
    }

    #[test]
    fn test_select_activates_exactly_one_page() {
        let mut nav = nav();
        assert!(nav.select("pm"));
        assert!(nav.is_active("pm"));
        for page in ["gas", "noise", "climate", "charts"] {
            assert!(!nav.is_active(page), "{page} should be inactive");
        }
    }

    #[test]
    fn test_select_unknown_page_is_noop() {
        let mut nav = nav();
        nav.select("pm");
        assert!(!nav.select("bogus"));
        assert_eq!(nav.active(), "pm");
    }

    #[test]
    fn test_next_and_prev_cycle() {
        let mut nav = nav();
        nav.next();
        assert_eq!(nav.active(), "noise");
        nav.prev();
        nav.prev();
        assert_eq!(nav.active(), "charts");
        nav.next();
        assert_eq!(nav.active(), "gas");
    }

    #[test]
    fn test_select_index() {
        let mut nav = nav();
        assert!(nav.select_index(2));
        assert_eq!(nav.active(), "pm");
        assert!(!nav.select_index(9));
        assert_eq!(nav.active(), "pm");
    }
}
