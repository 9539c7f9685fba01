//! Hardware description sources.
//!
//! | Source              | Backing                                  |
//! |---------------------|------------------------------------------|
//! | [`JsonDescription`] | JSON node blob shipped with the board    |
//! | [`BoardDescription`]| Compile-time defaults from [`pins`]      |
//!
//! A JSON node looks like:
//!
//! ```json
//! {
//!   "compatible": "imagis,isa1000",
//!   "gpio-isa1000-en": 39,
//!   "gpio-haptic-en": 38,
//!   "pwm-channel": 0
//! }
//! ```
//!
//! `compatible` may also be an array of strings.

use log::warn;
use serde_json::Value;

use crate::app::ports::DescriptionSource;
use crate::config::{COMPATIBLE, PROP_ENABLE_GPIO, PROP_HAPTIC_ENABLE_GPIO, PROP_PWM_CHANNEL};
use crate::error::SetupError;
use crate::pins;

// ── JSON node ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct JsonDescription {
    node: Value,
}

impl JsonDescription {
    /// Parse a node.  Anything but a JSON object is malformed.
    pub fn from_json(json: &str) -> Result<Self, SetupError> {
        let node: Value = serde_json::from_str(json).map_err(|e| {
            warn!("description: parse failed: {}", e);
            SetupError::MalformedDescription
        })?;
        if !node.is_object() {
            warn!("description: node is not an object");
            return Err(SetupError::MalformedDescription);
        }
        Ok(Self { node })
    }
}

impl DescriptionSource for JsonDescription {
    fn is_compatible(&self, compatible: &str) -> bool {
        match self.node.get("compatible") {
            Some(Value::String(s)) => s == compatible,
            Some(Value::Array(list)) => list.iter().any(|v| v.as_str() == Some(compatible)),
            _ => false,
        }
    }

    fn named_gpio(&self, name: &str) -> Option<i64> {
        self.node.get(name)?.as_i64()
    }

    fn read_u32(&self, name: &str) -> Option<u32> {
        self.node.get(name)?.as_u64()?.try_into().ok()
    }
}

// ── Board defaults ────────────────────────────────────────────

/// The wiring in [`pins`], for boards without a description blob.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoardDescription;

impl DescriptionSource for BoardDescription {
    fn is_compatible(&self, compatible: &str) -> bool {
        compatible == COMPATIBLE
    }

    fn named_gpio(&self, name: &str) -> Option<i64> {
        match name {
            PROP_ENABLE_GPIO => Some(i64::from(pins::ISA1000_EN_GPIO)),
            PROP_HAPTIC_ENABLE_GPIO => Some(i64::from(pins::HAPTIC_EN_GPIO)),
            _ => None,
        }
    }

    fn read_u32(&self, name: &str) -> Option<u32> {
        (name == PROP_PWM_CHANNEL).then_some(pins::ISA1000_PWM_CHANNEL)
    }
}
