//! Column-name collision resolution for one pipeline run.

use std::collections::HashMap;

/// Counts how often each composed column name has been produced.
///
/// The first occurrence keeps the bare name; the k-th (k >= 2) becomes
/// `name_k`. A registry lives exactly as long as one fetch.
#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    counts: HashMap<String, usize>,
}

impl ColumnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, base_name: &str) -> String {
        let count = self.counts.entry(base_name.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base_name.to_string()
        } else {
            format!("{base_name}_{count}")
        }
    }

    /// Mark names already present in a frame as taken, so a composed name
    /// that matches one is suffixed instead of replacing that column. Names
    /// the registry has already seen keep their counts.
    pub fn reserve<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let count = self.counts.entry(name.into()).or_insert(0);
            if *count == 0 {
                *count = 1;
            }
        }
    }

    /// Times `base_name` has been resolved so far.
    pub fn count(&self, base_name: &str) -> usize {
        self.counts.get(base_name).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_is_bare_then_numbered_from_two() {
        let mut reg = ColumnRegistry::new();
        assert_eq!(reg.resolve("rsi"), "rsi");
        assert_eq!(reg.resolve("rsi"), "rsi_2");
        assert_eq!(reg.resolve("rsi"), "rsi_3");
        assert_eq!(reg.resolve("sma"), "sma");
        assert_eq!(reg.count("rsi"), 3);
        assert_eq!(reg.count("ema"), 0);
    }

    #[test]
    fn names_are_tracked_independently() {
        let mut reg = ColumnRegistry::new();
        assert_eq!(reg.resolve("macd_0"), "macd_0");
        assert_eq!(reg.resolve("macd_1"), "macd_1");
        assert_eq!(reg.resolve("macd_0"), "macd_0_2");
    }

    #[test]
    fn reserved_names_are_never_handed_out_bare() {
        let mut reg = ColumnRegistry::new();
        reg.reserve(["close", "range"]);
        assert_eq!(reg.resolve("close"), "close_2");
        assert_eq!(reg.resolve("range"), "range_2");
        assert_eq!(reg.resolve("rsi"), "rsi");
    }

    #[test]
    fn reserving_again_keeps_counts() {
        let mut reg = ColumnRegistry::new();
        assert_eq!(reg.resolve("rsi"), "rsi");
        assert_eq!(reg.resolve("rsi"), "rsi_2");
        reg.reserve(["rsi", "rsi_2"]);
        assert_eq!(reg.resolve("rsi"), "rsi_3");
        assert_eq!(reg.count("rsi_2"), 1);
    }
}
