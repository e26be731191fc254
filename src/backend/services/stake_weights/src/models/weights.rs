use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{BTreeMap, Entry};
use std::fmt;
use std::str::FromStr;

use crate::utils::errors::{Result, WeightError};

/// Scale between a fraction (`0..=1`) and a percentage (`0..=100`).
pub const PERCENT_SCALE: Decimal = Decimal::ONE_HUNDRED;

/// Label prefix the web front-end uses for stored subnet keys.
const SUBNET_LABEL_PREFIX: &str = "Subnet ";

/// Allocation target, ordered by its numeric netuid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubnetId(pub u64);

impl fmt::Display for SubnetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubnetId {
    type Err = WeightError;

    /// Accepts both `"7"` and the stored `"Subnet 7"` form.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix(SUBNET_LABEL_PREFIX).unwrap_or(trimmed);
        digits
            .trim()
            .parse::<u64>()
            .map(SubnetId)
            .map_err(|_| WeightError::InvalidSubnetId(s.to_string()))
    }
}

/// A share of allocation, always held as a fraction in `[0, 1]`.
///
/// Delegator declarations arrive as percentages and operator input as
/// fractions. Both are converted at the boundary so the arithmetic only
/// ever sees one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weight(Decimal);

impl Weight {
    pub const ZERO: Weight = Weight(Decimal::ZERO);

    /// Convert a delegator-declared percentage in `[0, 100]`.
    pub fn from_percent(percent: Decimal) -> Result<Self> {
        if percent < Decimal::ZERO || percent > PERCENT_SCALE {
            return Err(WeightError::MalformedWeightVector(format!(
                "percentage {} outside [0, 100]",
                percent
            )));
        }
        percent
            .checked_div(PERCENT_SCALE)
            .map(Weight)
            .ok_or_else(|| WeightError::MalformedWeightVector(format!("percentage {} not representable", percent)))
    }

    /// Convert an operator-supplied fraction in `[0, 1]`.
    pub fn from_fraction(fraction: Decimal) -> Result<Self> {
        if fraction < Decimal::ZERO || fraction > Decimal::ONE {
            return Err(WeightError::MalformedWeightVector(format!(
                "fraction {} outside [0, 1]",
                fraction
            )));
        }
        Ok(Weight(fraction))
    }

    /// Derived weights (means, blends) are in range by construction.
    pub(crate) fn derived(fraction: Decimal) -> Self {
        Weight(fraction)
    }

    pub fn fraction(&self) -> Decimal {
        self.0
    }

    pub fn as_percent(&self) -> Decimal {
        self.0 * PERCENT_SCALE
    }
}

/// Mapping from subnet to weight with unique keys, iterated in subnet order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightVector(BTreeMap<SubnetId, Weight>);

impl WeightVector {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build from a delegator declaration expressed in percent.
    pub fn from_percentages<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (SubnetId, Decimal)>,
    {
        Self::collect_unique(entries, Weight::from_percent)
    }

    /// Build from operator input expressed as fractions.
    pub fn from_fractions<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (SubnetId, Decimal)>,
    {
        Self::collect_unique(entries, Weight::from_fraction)
    }

    fn collect_unique<I, F>(entries: I, convert: F) -> Result<Self>
    where
        I: IntoIterator<Item = (SubnetId, Decimal)>,
        F: Fn(Decimal) -> Result<Weight>,
    {
        let mut map = BTreeMap::new();
        for (subnet, value) in entries {
            match map.entry(subnet) {
                Entry::Vacant(slot) => {
                    slot.insert(convert(value)?);
                }
                Entry::Occupied(_) => {
                    return Err(WeightError::MalformedWeightVector(format!(
                        "subnet {} listed more than once",
                        subnet
                    )));
                }
            }
        }
        Ok(Self(map))
    }

    pub fn get(&self, subnet: SubnetId) -> Option<Weight> {
        self.0.get(&subnet).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SubnetId, Weight)> + '_ {
        self.0.iter().map(|(subnet, weight)| (*subnet, *weight))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of the fractions.
    pub fn sum(&self) -> Decimal {
        self.0.values().map(Weight::fraction).sum()
    }

    /// Same vector with every weight expressed in percent.
    pub fn percentages(&self) -> BTreeMap<SubnetId, Decimal> {
        self.0
            .iter()
            .map(|(subnet, weight)| (*subnet, weight.as_percent()))
            .collect()
    }

    /// Adds `amount` to the running value for `subnet`, inserting it if absent.
    pub(crate) fn accumulate(&mut self, subnet: SubnetId, amount: Decimal) {
        let slot = self.0.entry(subnet).or_insert(Weight::ZERO);
        *slot = Weight::derived(slot.fraction() + amount);
    }
}

impl FromIterator<(SubnetId, Weight)> for WeightVector {
    fn from_iter<T: IntoIterator<Item = (SubnetId, Weight)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_subnet_id_parses_labels() {
        assert_eq!("12".parse::<SubnetId>().unwrap(), SubnetId(12));
        assert_eq!("Subnet 3".parse::<SubnetId>().unwrap(), SubnetId(3));
        assert_eq!(" 4 ".parse::<SubnetId>().unwrap(), SubnetId(4));
        assert!("Subnet".parse::<SubnetId>().is_err());
        assert!("-1".parse::<SubnetId>().is_err());
    }

    #[test]
    fn test_percent_and_fraction_agree() {
        let from_percent = Weight::from_percent(d("37.5")).unwrap();
        let from_fraction = Weight::from_fraction(d("0.375")).unwrap();
        assert_eq!(from_percent, from_fraction);
        assert_eq!(from_percent.as_percent(), d("37.5"));
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        assert!(matches!(
            Weight::from_percent(d("100.01")),
            Err(WeightError::MalformedWeightVector(_))
        ));
        assert!(matches!(
            Weight::from_percent(d("-1")),
            Err(WeightError::MalformedWeightVector(_))
        ));
        assert!(Weight::from_fraction(d("1.5")).is_err());
        assert!(Weight::from_percent(Decimal::ZERO).is_ok());
        assert!(Weight::from_percent(PERCENT_SCALE).is_ok());
    }

    #[test]
    fn test_duplicate_subnets_rejected() {
        let result = WeightVector::from_fractions(vec![
            (SubnetId(1), d("0.5")),
            (SubnetId(1), d("0.5")),
        ]);
        assert!(matches!(result, Err(WeightError::MalformedWeightVector(_))));
    }

    #[test]
    fn test_accumulate_sums_per_subnet() {
        let mut vector = WeightVector::new();
        vector.accumulate(SubnetId(2), d("0.25"));
        vector.accumulate(SubnetId(2), d("0.5"));
        assert_eq!(vector.get(SubnetId(2)).unwrap().fraction(), d("0.75"));
        assert_eq!(vector.len(), 1);
    }
}
