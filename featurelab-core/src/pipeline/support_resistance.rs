//! Rolling support/resistance from prior bars.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::series::{rolling_max, rolling_min, shift};
use crate::domain::FeatureFrame;

fn default_fields() -> Vec<String> {
    vec!["close".to_string()]
}

/// Windows and fields for the support/resistance stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportResistanceSpec {
    #[serde(default)]
    pub windows: Vec<usize>,
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
}

impl Default for SupportResistanceSpec {
    fn default() -> Self {
        Self {
            windows: Vec::new(),
            fields: default_fields(),
        }
    }
}

/// Add `support_<w>_<field>` and `resistance_<w>_<field>` for every pair.
///
/// Values at row `i` only look at rows before `i`.
pub fn add_support_resistance(mut frame: FeatureFrame, spec: &SupportResistanceSpec) -> FeatureFrame {
    for field in &spec.fields {
        let Some(values) = frame.column(field) else {
            warn!(field = %field, "support/resistance field does not exist, skipping");
            continue;
        };
        let lagged = shift(values, 1);
        for &window in &spec.windows {
            frame.insert(format!("support_{window}_{field}"), rolling_min(&lagged, window));
            frame.insert(format!("resistance_{window}_{field}"), rolling_max(&lagged, window));
        }
    }
    frame
}
