use annot_store::OverlapPolicy;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ControllerConfig {
    pub overlap: OverlapPolicy,
    /// Handed to the host untouched.
    pub style: Option<String>,
}
