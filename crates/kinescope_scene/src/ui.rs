//! # Menu and Slider Registry
//!
//! The scheduler is the authority on slider ranges: values are clamped
//! here before any directive is emitted, so the renderer never sees a
//! value outside the registered range. Range violations (min above max)
//! are rejected; value violations are clamped - that asymmetry is part
//! of the contract.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, ConfigurationResult};

/// One pull-down menu definition.
///
/// Item labels use a pathname-like syntax ("submenu/item") to describe
/// nesting; the paired integer is the id reported back when the item is
/// picked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    /// Button label for the menu.
    pub title: String,
    /// (path, id) pairs defining the items.
    pub items: Vec<(String, i32)>,
}

impl Menu {
    /// Creates a menu definition.
    #[must_use]
    pub fn new(title: impl Into<String>, items: Vec<(String, i32)>) -> Self {
        Self {
            title: title.into(),
            items,
        }
    }
}

/// State of one registered slider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Slider {
    /// Label shown next to the slider.
    pub title: String,
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
    /// Current value, always within min..=max.
    pub value: f64,
}

/// Registry of sliders keyed by id, owning the clamp/reject rules.
#[derive(Clone, Debug, Default)]
pub struct SliderRegistry {
    sliders: HashMap<i32, Slider>,
}

impl SliderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new slider.
    ///
    /// The initial value is clamped into `min..=max`; the clamped value
    /// is returned so the caller can forward it to the renderer.
    ///
    /// # Errors
    ///
    /// Rejects inverted ranges and duplicate ids.
    pub fn register(
        &mut self,
        title: impl Into<String>,
        id: i32,
        min: f64,
        max: f64,
        value: f64,
    ) -> ConfigurationResult<f64> {
        if min > max {
            return Err(ConfigurationError::InvertedSliderRange { id, min, max });
        }
        if self.sliders.contains_key(&id) {
            return Err(ConfigurationError::DuplicateSlider(id));
        }
        let value = value.clamp(min, max);
        self.sliders.insert(
            id,
            Slider {
                title: title.into(),
                min,
                max,
                value,
            },
        );
        Ok(value)
    }

    /// Moves a slider, clamping the value into the registered range.
    ///
    /// Returns the effective (possibly clamped) value.
    ///
    /// # Errors
    ///
    /// Rejects unknown slider ids.
    pub fn set_value(&mut self, id: i32, value: f64) -> ConfigurationResult<f64> {
        let slider = self
            .sliders
            .get_mut(&id)
            .ok_or(ConfigurationError::UnknownSlider(id))?;
        slider.value = value.clamp(slider.min, slider.max);
        Ok(slider.value)
    }

    /// Changes a slider's range.
    ///
    /// The current value keeps its position if it still fits, otherwise
    /// it moves to the nearest limit. Returns the resulting value.
    ///
    /// # Errors
    ///
    /// Rejects inverted ranges and unknown slider ids.
    pub fn set_range(&mut self, id: i32, min: f64, max: f64) -> ConfigurationResult<f64> {
        if min > max {
            return Err(ConfigurationError::InvertedSliderRange { id, min, max });
        }
        let slider = self
            .sliders
            .get_mut(&id)
            .ok_or(ConfigurationError::UnknownSlider(id))?;
        slider.min = min;
        slider.max = max;
        slider.value = slider.value.clamp(min, max);
        Ok(slider.value)
    }

    /// Looks up a slider by id.
    #[must_use]
    pub fn get(&self, id: i32) -> Option<&Slider> {
        self.sliders.get(&id)
    }

    /// Number of registered sliders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sliders.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sliders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_clamps_initial_value() {
        let mut reg = SliderRegistry::new();
        let v = reg.register("gain", 1, 0.0, 10.0, 25.0).unwrap();
        assert_eq!(v, 10.0);
        assert_eq!(reg.get(1).unwrap().value, 10.0);
    }

    #[test]
    fn register_rejects_inverted_range_and_duplicates() {
        let mut reg = SliderRegistry::new();
        assert_eq!(
            reg.register("bad", 1, 5.0, 1.0, 2.0),
            Err(ConfigurationError::InvertedSliderRange {
                id: 1,
                min: 5.0,
                max: 1.0
            })
        );
        reg.register("ok", 1, 0.0, 1.0, 0.5).unwrap();
        assert_eq!(
            reg.register("dup", 1, 0.0, 1.0, 0.5),
            Err(ConfigurationError::DuplicateSlider(1))
        );
    }

    #[test]
    fn out_of_range_value_is_clamped_not_rejected() {
        let mut reg = SliderRegistry::new();
        reg.register("speed", 3, 0.0, 10.0, 5.0).unwrap();
        assert_eq!(reg.set_value(3, 15.0).unwrap(), 10.0);
        assert_eq!(reg.set_value(3, -1.0).unwrap(), 0.0);
        assert_eq!(reg.set_value(3, 7.5).unwrap(), 7.5);
    }

    #[test]
    fn range_update_reclamps_current_value() {
        let mut reg = SliderRegistry::new();
        reg.register("speed", 3, 0.0, 100.0, 80.0).unwrap();
        // Shrinking the range moves the value to the nearest limit.
        assert_eq!(reg.set_range(3, 0.0, 10.0).unwrap(), 10.0);
        // Value that still fits stays put.
        reg.set_value(3, 4.0).unwrap();
        assert_eq!(reg.set_range(3, 0.0, 50.0).unwrap(), 4.0);
    }

    #[test]
    fn unknown_slider_is_an_error() {
        let mut reg = SliderRegistry::new();
        assert_eq!(
            reg.set_value(9, 1.0),
            Err(ConfigurationError::UnknownSlider(9))
        );
        assert_eq!(
            reg.set_range(9, 0.0, 1.0),
            Err(ConfigurationError::UnknownSlider(9))
        );
    }
}
