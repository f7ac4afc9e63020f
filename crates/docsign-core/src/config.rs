//! Explicit engine configuration, passed into the injector and pipeline

use serde::{Deserialize, Serialize};
use shared_types::PageSize;

use crate::error::{InjectionError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectionConfig {
    /// Font size for text and date fields without their own size
    pub font_size: f64,
    /// Left inset of text from the box edge
    pub text_inset: f64,
    /// Subtracted from half the shorter box side to get the outline radius
    pub choice_inset: f64,
    /// Radius of the selected dot relative to the outline radius
    pub choice_fill_ratio: f64,
    pub choice_stroke_width: f64,
    /// Used when a page declares no MediaBox
    pub fallback_page_size: PageSize,
    /// Standard-14 base font
    pub font: String,
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            text_inset: 5.0,
            choice_inset: 2.0,
            choice_fill_ratio: 0.6,
            choice_stroke_width: 1.0,
            fallback_page_size: PageSize::A4,
            font: "Helvetica".to_string(),
        }
    }
}

impl InjectionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(InjectionError::InvalidConfig(format!(
                "font_size must be positive, got {}",
                self.font_size
            )));
        }
        if !self.fallback_page_size.is_valid() {
            return Err(InjectionError::InvalidConfig(format!(
                "fallback_page_size must be positive, got {}x{}",
                self.fallback_page_size.width, self.fallback_page_size.height
            )));
        }
        if !(self.choice_fill_ratio > 0.0 && self.choice_fill_ratio <= 1.0) {
            return Err(InjectionError::InvalidConfig(format!(
                "choice_fill_ratio must be in (0, 1], got {}",
                self.choice_fill_ratio
            )));
        }
        if self.text_inset < 0.0 || self.choice_inset < 0.0 || self.choice_stroke_width < 0.0 {
            return Err(InjectionError::InvalidConfig(
                "insets and stroke width must not be negative".to_string(),
            ));
        }
        if self.font.trim().is_empty() {
            return Err(InjectionError::InvalidConfig("font must not be empty".to_string()));
        }
        Ok(())
    }

    /// Parse from JSON; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| InjectionError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
