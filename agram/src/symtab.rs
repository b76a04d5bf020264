use indexmap::IndexSet;
use smartstring::alias::String;

/// Interns grammar symbol names to dense ids in first-seen order.
#[derive(Default, Debug, Clone)]
pub struct Symtab {
    names: IndexSet<String>,
}

impl Symtab {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, sym: &str) -> usize {
        match self.names.get_index_of(sym) {
            Some(idx) => idx,
            None => self.names.insert_full(String::from(sym)).0,
        }
    }

    pub fn idx(&self, sym: &str) -> Option<usize> {
        self.names.get_index_of(sym)
    }

    pub fn sym(&self, idx: usize) -> Option<&str> {
        self.names.get_index(idx).map(|s| s.as_str())
    }

    pub fn contains(&self, sym: &str) -> bool {
        self.names.contains(sym)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Symtab;

    #[test]
    fn new_is_empty() {
        let st = Symtab::new();
        assert!(st.is_empty());
        assert_eq!(st.idx("anything"), None);
        assert_eq!(st.sym(0), None);
    }

    #[test]
    fn add_and_retrieve() {
        let mut st = Symtab::new();
        assert_eq!(st.add("foo"), 0);
        assert_eq!(st.add("bar"), 1);
        assert_eq!(st.idx("bar"), Some(1));
        assert_eq!(st.sym(0), Some("foo"));
        assert!(st.contains("foo"));
        assert!(!st.contains("baz"));
    }

    #[test]
    fn duplicate_add_returns_same_index() {
        let mut st = Symtab::new();
        let names = ["a", "b", "c", "a", "d", "b"];
        let ids: Vec<usize> = names.iter().map(|n| st.add(n)).collect();
        assert_eq!(ids, vec![0, 1, 2, 0, 3, 1]);
        assert_eq!(st.len(), 4);
        assert_eq!(st.iter().collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);
    }
}
