//! Factors: the inputs handed to the use case under optimization.
//!
//! One factor, the *control* factor, varies from iteration to iteration. All
//! other factors are fixed for the lifetime of a run. The two are merged into
//! a [`FactorSuit`] every time samples are executed.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::errors::{OptimizationError, OptimizationResult};

/// A value the optimization loop can vary.
///
/// The loop treats factor values as opaque. The only thing it asks of them
/// is a display form for logs and reports, and a length used to break score
/// ties in favor of concise values. Non-textual values keep the default
/// length of `0`, which disables the tie-break.
pub trait FactorValue: Clone + Debug + Send + Sync + Serialize + 'static {
    /// Human-readable form used in logs and reports.
    fn display_value(&self) -> String;

    /// Length used for the shortest-value tie-break.
    fn tie_break_len(&self) -> usize {
        0
    }
}

impl FactorValue for String {
    fn display_value(&self) -> String {
        self.clone()
    }

    fn tie_break_len(&self) -> usize {
        self.chars().count()
    }
}

macro_rules! non_textual_factor {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FactorValue for $ty {
                fn display_value(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

non_textual_factor!(i32, i64, u32, u64, usize, f32, f64, bool);

/// Immutable, named set of factors held constant for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixedFactors {
    values: BTreeMap<String, Value>,
}

impl FixedFactors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with `name` set to `value`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FixedFactors {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// The complete input set for one iteration: fixed factors plus the current
/// value of the control factor.
///
/// The control factor name is always a key of the suit. If a fixed factor
/// shares the control factor's name, the control value shadows it.
#[derive(Debug, Clone)]
pub struct FactorSuit<F> {
    control_name: String,
    control_value: F,
    fixed: Arc<FixedFactors>,
}

impl<F: FactorValue> FactorSuit<F> {
    pub fn new(
        control_name: impl Into<String>,
        control_value: F,
        fixed: Arc<FixedFactors>,
    ) -> OptimizationResult<Self> {
        let control_name = control_name.into();
        if control_name.trim().is_empty() {
            return Err(OptimizationError::InvalidConfiguration(
                "control factor name cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            control_name,
            control_value,
            fixed,
        })
    }

    /// Same fixed factors, new control value.
    #[must_use]
    pub fn with_control_value(&self, control_value: F) -> Self {
        Self {
            control_name: self.control_name.clone(),
            control_value,
            fixed: Arc::clone(&self.fixed),
        }
    }

    pub fn control_name(&self) -> &str {
        &self.control_name
    }

    pub fn control_value(&self) -> &F {
        &self.control_value
    }

    pub fn fixed(&self) -> &FixedFactors {
        &self.fixed
    }

    pub fn contains(&self, name: &str) -> bool {
        name == self.control_name || self.fixed.contains(name)
    }

    /// Flatten into a single name → value map, control value last.
    pub fn to_values(&self) -> OptimizationResult<BTreeMap<String, Value>> {
        let mut values: BTreeMap<String, Value> = self
            .fixed
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        values.insert(
            self.control_name.clone(),
            serde_json::to_value(&self.control_value)?,
        );
        Ok(values)
    }
}
