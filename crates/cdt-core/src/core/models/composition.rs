use super::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Amount of each element in a cell, keyed by element symbol.
///
/// Elements that are not present are treated as having an amount of zero, which is
/// what the chemical-potential bookkeeping of a vacancy or substitution needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Composition(BTreeMap<String, f64>);

impl Composition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a composition from `(symbol, amount)` pairs, summing repeated symbols.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidAmount`] if an amount is negative or not finite.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut composition = Self::new();
        for (element, amount) in pairs {
            composition.add(element, amount)?;
        }
        Ok(composition)
    }

    pub fn add(&mut self, element: impl Into<String>, amount: f64) -> Result<(), ModelError> {
        let element = element.into();
        if !amount.is_finite() || amount < 0.0 {
            return Err(ModelError::InvalidAmount { element, amount });
        }
        *self.0.entry(element).or_insert(0.0) += amount;
        Ok(())
    }

    #[inline]
    pub fn amount(&self, element: &str) -> f64 {
        self.0.get(element).copied().unwrap_or(0.0)
    }

    pub fn elements(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Elements present in either composition, in symbol order.
    pub fn union_elements<'a>(&'a self, other: &'a Composition) -> BTreeSet<&'a str> {
        self.elements().chain(other.elements()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_elements_have_zero_amount() {
        let comp = Composition::from_pairs([("Ga", 32.0), ("N", 31.0)]).unwrap();
        assert_eq!(comp.amount("Ga"), 32.0);
        assert_eq!(comp.amount("Mg"), 0.0);
    }

    #[test]
    fn repeated_symbols_are_summed() {
        let comp = Composition::from_pairs([("O", 1.0), ("O", 2.0)]).unwrap();
        assert_eq!(comp.amount("O"), 3.0);
    }

    #[test]
    fn negative_amount_is_rejected() {
        let err = Composition::from_pairs([("Zn", -1.0)]).unwrap_err();
        assert!(matches!(err, ModelError::InvalidAmount { .. }));
    }

    #[test]
    fn union_contains_elements_of_both_sides() {
        let bulk = Composition::from_pairs([("Zn", 16.0), ("O", 16.0)]).unwrap();
        let defect = Composition::from_pairs([("Zn", 16.0), ("O", 15.0), ("N", 1.0)]).unwrap();
        let union: Vec<_> = bulk.union_elements(&defect).into_iter().collect();
        assert_eq!(union, vec!["N", "O", "Zn"]);
    }

    #[test]
    fn serializes_as_a_plain_map() {
        let comp = Composition::from_pairs([("Si", 64.0)]).unwrap();
        let json = serde_json::to_string(&comp).unwrap();
        assert_eq!(json, r#"{"Si":64.0}"#);
        let back: Composition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, comp);
    }
}
