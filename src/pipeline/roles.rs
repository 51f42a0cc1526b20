//! Variable roles: which predictors are binned as categories
//!
//! The default policy is a naming convention: loan-tape columns carrying a
//! code or flag marker are categorical. It misclassifies any column that
//! does not follow the convention (a numeric `*_cd` amount, an unmarked
//! text column), so callers with a schema should swap in
//! [`ExplicitSchemaClassifier`] or [`DtypeClassifier`].

use std::collections::BTreeSet;

use polars::prelude::*;
use serde::Serialize;

/// Role of a column in the modelling dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VariableRole {
    Label,
    Categorical,
    Continuous,
}

/// Policy deciding whether a predictor column is categorical
pub trait ColumnClassifier: Send + Sync {
    fn is_categorical(&self, name: &str, dtype: &DataType) -> bool;
}

/// Categorical iff the name contains one of the markers (case-insensitive)
#[derive(Debug, Clone)]
pub struct NamingConventionClassifier {
    markers: Vec<String>,
}

impl NamingConventionClassifier {
    pub const DEFAULT_MARKERS: [&'static str; 4] = ["cd", "flg", "code", "flag"];

    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: markers.into_iter().map(|m| m.as_ref().to_lowercase()).collect(),
        }
    }
}

impl Default for NamingConventionClassifier {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MARKERS)
    }
}

impl ColumnClassifier for NamingConventionClassifier {
    fn is_categorical(&self, name: &str, _dtype: &DataType) -> bool {
        let lower = name.to_lowercase();
        self.markers.iter().any(|m| lower.contains(m.as_str()))
    }
}

/// Categorical iff the column holds text, categorical or boolean values
#[derive(Debug, Clone, Copy, Default)]
pub struct DtypeClassifier;

impl ColumnClassifier for DtypeClassifier {
    fn is_categorical(&self, _name: &str, dtype: &DataType) -> bool {
        matches!(
            dtype,
            DataType::String | DataType::Categorical(_, _) | DataType::Enum(_, _) | DataType::Boolean
        )
    }
}

/// Categorical iff the name is in a caller-supplied set
#[derive(Debug, Clone, Default)]
pub struct ExplicitSchemaClassifier {
    categoricals: BTreeSet<String>,
}

impl ExplicitSchemaClassifier {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categoricals: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl ColumnClassifier for ExplicitSchemaClassifier {
    fn is_categorical(&self, name: &str, _dtype: &DataType) -> bool {
        self.categoricals.contains(name)
    }
}

/// Role of every column of `df`, in column order
pub fn variable_roles(df: &DataFrame, label: &str, classifier: &dyn ColumnClassifier) -> Vec<(String, VariableRole)> {
    df.get_columns()
        .iter()
        .map(|col| {
            let name = col.name().as_str();
            let role = if name == label {
                VariableRole::Label
            } else if classifier.is_categorical(name, col.dtype()) {
                VariableRole::Categorical
            } else {
                VariableRole::Continuous
            };
            (name.to_string(), role)
        })
        .collect()
}

/// Names of the categorical predictors of `df`; never includes the label
pub fn identify_categoricals(df: &DataFrame, label: &str, classifier: &dyn ColumnClassifier) -> BTreeSet<String> {
    variable_roles(df, label, classifier)
        .into_iter()
        .filter(|(_, role)| *role == VariableRole::Categorical)
        .map(|(name, _)| name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loan_tape() -> DataFrame {
        df! {
            "default_event_flg" => [0i32, 1],
            "property_type_cd" => ["SF", "CO"],
            "first_time_buyer_flag" => ["Y", "N"],
            "Channel_Code" => [1i64, 2],
            "ltv" => [80.0f64, 95.0],
        }
        .unwrap()
    }

    #[test]
    fn test_naming_convention_excludes_label() {
        let cats = identify_categoricals(&loan_tape(), "default_event_flg", &NamingConventionClassifier::default());

        let expected: BTreeSet<String> = ["property_type_cd", "first_time_buyer_flag", "Channel_Code"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(cats, expected);
    }

    #[test]
    fn test_dtype_classifier() {
        let cats = identify_categoricals(&loan_tape(), "default_event_flg", &DtypeClassifier);
        assert!(cats.contains("property_type_cd"));
        assert!(!cats.contains("Channel_Code"));
        assert!(!cats.contains("ltv"));
    }

    #[test]
    fn test_explicit_schema_never_returns_label() {
        let classifier = ExplicitSchemaClassifier::new(["ltv", "default_event_flg"]);
        let cats = identify_categoricals(&loan_tape(), "default_event_flg", &classifier);
        assert_eq!(cats.len(), 1);
        assert!(cats.contains("ltv"));
    }

    #[test]
    fn test_roles() {
        let roles = variable_roles(&loan_tape(), "default_event_flg", &NamingConventionClassifier::default());
        assert_eq!(roles[0].1, VariableRole::Label);
        assert_eq!(roles[4], ("ltv".to_string(), VariableRole::Continuous));
    }
}
