//! Account types a user can hold balances in

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Sub-account tag. Every ledger carries a balance for each variant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum AccountType {
    Personal,
    Savings,
    Business,
    Government,
    Investment,
    CreditCard,
    Shadow,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(AccountType::from_str("savings").unwrap(), AccountType::Savings);
        assert_eq!(AccountType::from_str("CreditCard").unwrap(), AccountType::CreditCard);
        assert!(AccountType::from_str("Checking").is_err());
    }

    #[test]
    fn test_all_variants_iterable() {
        assert_eq!(AccountType::iter().count(), 7);
        assert_eq!(AccountType::Personal.to_string(), "Personal");
    }
}
