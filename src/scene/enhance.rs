use serde::{Deserialize, Serialize};

/// Global image enhancement parameters, applied to the background layer only.
///
/// `brightness`, `contrast` and `saturation` are percentages where 0 attenuates fully,
/// 100 is neutral and larger values amplify. `fade` is the percent of opacity removed from
/// the background.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageEnhancements {
    /// Brightness percent.
    pub brightness: f64,
    /// Contrast percent.
    pub contrast: f64,
    /// Saturation percent.
    pub saturation: f64,
    /// Background fade percent, `[0, 100]`.
    pub fade: f64,
}

impl Default for ImageEnhancements {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Addresses a single enhancement parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementField {
    /// [`ImageEnhancements::brightness`].
    Brightness,
    /// [`ImageEnhancements::contrast`].
    Contrast,
    /// [`ImageEnhancements::saturation`].
    Saturation,
    /// [`ImageEnhancements::fade`].
    Fade,
}

impl ImageEnhancements {
    /// Neutral parameters (100, 100, 100, 0).
    pub const NEUTRAL: Self = Self {
        brightness: 100.0,
        contrast: 100.0,
        saturation: 100.0,
        fade: 0.0,
    };

    /// Read one parameter.
    pub fn get(&self, field: EnhancementField) -> f64 {
        match field {
            EnhancementField::Brightness => self.brightness,
            EnhancementField::Contrast => self.contrast,
            EnhancementField::Saturation => self.saturation,
            EnhancementField::Fade => self.fade,
        }
    }

    /// Set one parameter, clamped into its domain. Non-finite values are ignored.
    ///
    /// Returns `true` when the stored value changed.
    pub fn set(&mut self, field: EnhancementField, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        let slot = match field {
            EnhancementField::Brightness => &mut self.brightness,
            EnhancementField::Contrast => &mut self.contrast,
            EnhancementField::Saturation => &mut self.saturation,
            EnhancementField::Fade => &mut self.fade,
        };
        let value = match field {
            EnhancementField::Fade => value.clamp(0.0, 100.0),
            _ => value.max(0.0),
        };
        let changed = *slot != value;
        *slot = value;
        changed
    }

    /// Return `true` when every color parameter is neutral (fade may still be set).
    pub fn is_color_neutral(&self) -> bool {
        self.brightness == 100.0 && self.contrast == 100.0 && self.saturation == 100.0
    }

    /// Background opacity implied by `fade`.
    pub fn background_opacity(&self) -> f32 {
        (1.0 - self.fade.clamp(0.0, 100.0) / 100.0) as f32
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/enhance.rs"]
mod tests;
