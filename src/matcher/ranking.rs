use std::fmt::Debug;

use serde::Serialize;

/// Environment scores of one scorer
///
/// Entries keep environment id order until explicitly sorted.
#[derive(Clone, Default, PartialEq, Serialize)]
pub struct Ranking {
    /// (environment name, score)
    pub list: Vec<(String, f64)>,
}

impl Ranking {
    pub fn new(list: Vec<(String, f64)>) -> Self {
        Ranking { list }
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.list.iter().map(|(_, s)| *s).sum()
    }

    /// Scores divided by their sum; a list summing to zero is returned as is
    pub fn normalized(&self) -> Self {
        let total = self.total();
        if total == 0.0 {
            return self.clone();
        }
        Ranking {
            list: self.list.iter().map(|(k, s)| (k.clone(), s / total)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.list.iter().find(|(k, _)| k == name).map(|(_, s)| *s)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Sort by descending score
    pub fn sort_by_score(&mut self) -> &mut Self {
        // Remove NaN scores
        self.list.retain(|(_, s)| !s.is_nan());
        self.list.sort_by(|a, b| b.1.total_cmp(&a.1));
        self
    }
}

impl Debug for Ranking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            writeln!(f, "Ranking [")?;
            for (name, score) in &self.list {
                writeln!(f, "    {:?}: {:.6}", name, score)?;
            }
            write!(f, "]")
        } else {
            f.debug_list().entries(&self.list).finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranking(scores: &[(&str, f64)]) -> Ranking {
        Ranking::new(scores.iter().map(|(k, s)| (k.to_string(), *s)).collect())
    }

    #[test]
    fn normalization_divides_by_total() {
        let r = ranking(&[("a", 1.0), ("b", 3.0)]).normalized();
        assert_eq!(r.get("a"), Some(0.25));
        assert_eq!(r.get("b"), Some(0.75));
    }

    #[test]
    fn zero_total_is_left_alone() {
        let r = ranking(&[("a", 0.0), ("b", 0.0)]);
        assert_eq!(r.normalized(), r);
    }

    #[test]
    fn sorting_drops_nan() {
        let mut r = ranking(&[("a", 1.0), ("b", f64::NAN), ("c", 2.0)]);
        r.sort_by_score();
        assert_eq!(r.list.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(), vec!["c", "a"]);
        assert_eq!(format!("{:?}", r), r#"[("c", 2.0), ("a", 1.0)]"#);
    }
}
