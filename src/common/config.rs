use std::path::{Path, PathBuf};

use anyhow::bail;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::collections::HashMap;
use crate::layout_engine::{LayoutMode, Orientation, SplitMode, optimal_orientation};
use crate::model::geometry::{Rect, RectExt};

pub fn data_dir() -> PathBuf { dirs::home_dir().unwrap_or_default().join(".tile-tree") }
pub fn restore_file() -> PathBuf { data_dir().join("layout.ron") }
pub fn config_file() -> PathBuf { data_dir().join("config.toml") }

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub layout: LayoutSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    /// Layout mode: "bsp", "monocle" or "float"
    #[serde(default)]
    pub mode: LayoutMode,
    /// Share of a split given to its first child
    #[serde(default = "default_split_ratio")]
    pub split_ratio: f64,
    /// Orientation used for new splits
    #[serde(default)]
    pub split_mode: SplitMode,
    /// Width/height threshold above which optimal splits go side by side
    #[serde(default = "default_optimal_ratio")]
    pub optimal_ratio: f64,
    /// Put newly inserted windows in the first child of a split
    #[serde(default = "no")]
    pub spawn_as_left_child: bool,
    /// Gap configuration for window spacing
    #[serde(default)]
    pub gaps: GapSettings,
}

/// Gap configuration for window spacing
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct GapSettings {
    /// Outer gaps (space between windows and screen edges)
    #[serde(default)]
    pub outer: OuterGaps,
    /// Inner gaps (space between windows)
    #[serde(default)]
    pub inner: InnerGaps,
    /// Display-specific gap overrides keyed by display name
    #[serde(default)]
    pub per_display: HashMap<String, GapOverride>,
}

/// Outer gap configuration (space between windows and screen edges)
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy, Default)]
#[serde(deny_unknown_fields)]
pub struct OuterGaps {
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub bottom: f64,
    #[serde(default)]
    pub right: f64,
}

/// Inner gap configuration (space between windows)
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy, Default)]
#[serde(deny_unknown_fields)]
pub struct InnerGaps {
    /// Gap between windows stacked top to bottom
    #[serde(default)]
    pub horizontal: f64,
    /// Gap between windows placed side by side
    #[serde(default)]
    pub vertical: f64,
}

/// Overrides for gaps on a per-display basis
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct GapOverride {
    #[serde(default)]
    pub outer: Option<OuterGaps>,
    #[serde(default)]
    pub inner: Option<InnerGaps>,
}

/// Resolved settings handed to every tree operation.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct TilingConfig {
    pub split_ratio: f64,
    pub split_mode: SplitMode,
    pub optimal_ratio: f64,
    pub spawn_as_left_child: bool,
    pub outer: OuterGaps,
    pub inner: InnerGaps,
}

impl Default for TilingConfig {
    fn default() -> Self { LayoutSettings::default().tiling(None) }
}

impl TilingConfig {
    pub fn gap(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Vertical => self.inner.vertical,
            Orientation::Horizontal => self.inner.horizontal,
        }
    }

    /// The screen frame minus the outer gaps.
    pub fn usable_area(&self, frame: Rect) -> Rect {
        frame.inset(self.outer.top, self.outer.left, self.outer.bottom, self.outer.right)
    }

    /// Orientation for a new split of `rect`.
    pub fn orientation_for(&self, rect: Rect) -> Orientation {
        self.split_mode
            .fixed()
            .unwrap_or_else(|| optimal_orientation(rect, self.optimal_ratio))
    }

    /// The same settings with every split following the rectangle's shape.
    /// Whole trees are built and refilled this way.
    pub fn optimal(self) -> TilingConfig {
        TilingConfig { split_mode: SplitMode::Optimal, ..self }
    }
}

impl Default for LayoutSettings {
    fn default() -> Self {
        LayoutSettings {
            mode: LayoutMode::default(),
            split_ratio: default_split_ratio(),
            split_mode: SplitMode::default(),
            optimal_ratio: default_optimal_ratio(),
            spawn_as_left_child: false,
            gaps: GapSettings::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Vec<String> { self.layout.validate() }
}

impl LayoutSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !is_valid_ratio(self.split_ratio) {
            issues.push(format!(
                "split_ratio must lie strictly between 0 and 1, got {}",
                self.split_ratio
            ));
        }

        if !is_valid_optimal_ratio(self.optimal_ratio) {
            issues.push(format!(
                "optimal_ratio must be positive, got {}",
                self.optimal_ratio
            ));
        }

        issues.extend(self.gaps.validate());

        issues
    }

    /// Changes the default ratio for future splits. Values outside (0, 1) are
    /// ignored.
    pub fn set_split_ratio(&mut self, ratio: f64) -> bool {
        if !is_valid_ratio(ratio) {
            return false;
        }
        self.split_ratio = ratio;
        true
    }

    /// Resolves the settings for one display. Ratios that fail validation
    /// fall back to their defaults.
    pub fn tiling(&self, display: Option<&str>) -> TilingConfig {
        let gaps = self.gaps.effective_for_display(display);
        let split_ratio = if is_valid_ratio(self.split_ratio) {
            self.split_ratio
        } else {
            warn!(ratio = self.split_ratio, "ignoring invalid split_ratio");
            default_split_ratio()
        };
        let optimal_ratio = if is_valid_optimal_ratio(self.optimal_ratio) {
            self.optimal_ratio
        } else {
            warn!(ratio = self.optimal_ratio, "ignoring invalid optimal_ratio");
            default_optimal_ratio()
        };
        TilingConfig {
            split_ratio,
            split_mode: self.split_mode,
            optimal_ratio,
            spawn_as_left_child: self.spawn_as_left_child,
            outer: gaps.outer,
            inner: gaps.inner,
        }
    }
}

pub fn is_valid_ratio(ratio: f64) -> bool { ratio > 0.0 && ratio < 1.0 }

fn is_valid_optimal_ratio(ratio: f64) -> bool { ratio > 0.0 && ratio.is_finite() }

impl GapSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        issues.extend(self.outer.validate());
        issues.extend(self.inner.validate());

        for (name, overrides) in &self.per_display {
            if let Some(outer) = &overrides.outer {
                for issue in outer.validate() {
                    issues.push(format!("per_display[{name}] {issue}"));
                }
            }
            if let Some(inner) = &overrides.inner {
                for issue in inner.validate() {
                    issues.push(format!("per_display[{name}] {issue}"));
                }
            }
        }

        issues
    }

    pub fn effective_for_display(&self, display: Option<&str>) -> GapSettings {
        let mut resolved = GapSettings {
            outer: self.outer,
            inner: self.inner,
            per_display: HashMap::default(),
        };
        if let Some(overrides) = display.and_then(|name| self.per_display.get(name)) {
            if let Some(outer) = overrides.outer {
                resolved.outer = outer;
            }
            if let Some(inner) = overrides.inner {
                resolved.inner = inner;
            }
        }
        resolved
    }
}

impl OuterGaps {
    pub fn validate(&self) -> Vec<String> {
        [
            ("top", self.top),
            ("left", self.left),
            ("bottom", self.bottom),
            ("right", self.right),
        ]
        .into_iter()
        .filter(|(_, v)| *v < 0.0)
        .map(|(side, v)| format!("outer.{side} gap must be non-negative, got {v}"))
        .collect()
    }
}

impl InnerGaps {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.horizontal < 0.0 {
            issues.push(format!(
                "inner.horizontal gap must be non-negative, got {}",
                self.horizontal
            ));
        }

        if self.vertical < 0.0 {
            issues.push(format!(
                "inner.vertical gap must be non-negative, got {}",
                self.vertical
            ));
        }

        issues
    }
}

fn no() -> bool { false }

fn default_split_ratio() -> f64 { 0.5 }

fn default_optimal_ratio() -> f64 { 1.0 }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    /// Reads `path` if it exists, otherwise falls back to defaults.
    pub fn read_or_default(path: &Path) -> anyhow::Result<Config> {
        if path.exists() {
            Self::read(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Save the current config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml_string.as_bytes())?;
        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> { self.settings.validate() }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        match toml::from_str::<Config>(buf) {
            Ok(config) => Ok(config),
            Err(e) => bail!("{e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_defaults() {
        let settings = LayoutSettings::default();
        assert_eq!(settings.mode, LayoutMode::Bsp);
        assert_eq!(settings.split_ratio, 0.5);
        assert_eq!(settings.split_mode, SplitMode::Optimal);
        assert_eq!(settings.optimal_ratio, 1.0);
        assert!(!settings.spawn_as_left_child);
    }

    #[test]
    fn test_parse_layout_section() {
        let config = Config::parse(
            r#"
            [settings.layout]
            mode = "monocle"
            split_ratio = 0.6
            split_mode = "horizontal"
            spawn_as_left_child = true

            [settings.layout.gaps.outer]
            top = 30.0
            left = 10.0

            [settings.layout.gaps.inner]
            vertical = 8.0
            "#,
        )
        .unwrap();
        let layout = &config.settings.layout;
        assert_eq!(layout.mode, LayoutMode::Monocle);
        assert_eq!(layout.split_ratio, 0.6);
        assert_eq!(layout.split_mode, SplitMode::Horizontal);
        assert!(layout.spawn_as_left_child);
        assert_eq!(layout.optimal_ratio, 1.0);
        assert_eq!(layout.gaps.outer.top, 30.0);
        assert_eq!(layout.gaps.inner.vertical, 8.0);
    }

    #[test]
    fn test_parse_rejects_unknown_fields() {
        let err = Config::parse("[settings.layout]\nsplit_raito = 0.4\n").unwrap_err();
        assert!(err.to_string().contains("split_raito"), "{err}");
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_set_split_ratio_rejects_out_of_range() {
        let mut settings = LayoutSettings::default();
        assert!(!settings.set_split_ratio(0.0));
        assert!(!settings.set_split_ratio(1.0));
        assert!(!settings.set_split_ratio(-0.2));
        assert!(!settings.set_split_ratio(f64::NAN));
        assert_eq!(settings.split_ratio, 0.5);
        assert!(settings.set_split_ratio(0.7));
        assert_eq!(settings.split_ratio, 0.7);
    }

    #[test]
    fn test_layout_validation() {
        let mut settings = LayoutSettings::default();
        settings.split_ratio = 1.5;
        settings.optimal_ratio = 0.0;
        let issues = settings.validate();
        assert_eq!(2, issues.len(), "{issues:?}");
        assert!(issues[0].contains("split_ratio"));
    }

    #[test]
    fn test_invalid_ratios_fall_back_to_defaults() {
        let config = Config::parse("[settings.layout]\nsplit_ratio = 1.5\noptimal_ratio = -2.0\n")
            .unwrap();
        let layout = &config.settings.layout;
        assert_eq!(layout.validate().len(), 2);
        let tiling = layout.tiling(None);
        assert_eq!(tiling.split_ratio, 0.5);
        assert_eq!(tiling.optimal_ratio, 1.0);

        let mut settings = LayoutSettings::default();
        settings.split_ratio = f64::NAN;
        settings.optimal_ratio = f64::INFINITY;
        assert_eq!(settings.tiling(None).split_ratio, 0.5);
        assert_eq!(settings.tiling(None).optimal_ratio, 1.0);
        settings.split_ratio = 0.3;
        assert_eq!(settings.tiling(None).split_ratio, 0.3);
    }

    #[test]
    fn test_outer_gaps_validation_negative_values() {
        let gaps = OuterGaps {
            top: -1.0,
            left: -2.0,
            bottom: -3.0,
            right: -4.0,
        };
        assert_eq!(4, gaps.validate().len());
    }

    #[test]
    fn test_inner_gaps_validation_negative_values() {
        let gaps = InnerGaps {
            horizontal: -1.0,
            vertical: -2.0,
        };
        assert_eq!(2, gaps.validate().len());
    }

    #[test]
    fn test_gap_settings_effective_for_display_with_override() {
        let mut gap_settings = GapSettings::default();
        gap_settings.per_display.insert("external".to_string(), GapOverride {
            outer: Some(OuterGaps {
                top: 10.0,
                left: 20.0,
                bottom: 30.0,
                right: 40.0,
            }),
            inner: None,
        });
        gap_settings.inner.vertical = 6.0;

        let effective = gap_settings.effective_for_display(Some("external"));
        assert_eq!(10.0, effective.outer.top);
        assert_eq!(40.0, effective.outer.right);
        assert_eq!(6.0, effective.inner.vertical);

        let fallback = gap_settings.effective_for_display(Some("builtin"));
        assert_eq!(0.0, fallback.outer.top);
    }

    #[test]
    fn test_per_display_issues_are_prefixed() {
        let mut gap_settings = GapSettings::default();
        gap_settings.per_display.insert("external".to_string(), GapOverride {
            outer: None,
            inner: Some(InnerGaps {
                horizontal: -1.0,
                vertical: 0.0,
            }),
        });
        let issues = gap_settings.validate();
        assert_eq!(1, issues.len());
        assert!(issues[0].starts_with("per_display[external]"));
    }

    #[test]
    fn test_tiling_config_resolution() {
        let mut settings = LayoutSettings::default();
        settings.gaps.outer = OuterGaps {
            top: 10.0,
            left: 5.0,
            bottom: 10.0,
            right: 5.0,
        };
        settings.gaps.inner = InnerGaps {
            horizontal: 4.0,
            vertical: 8.0,
        };
        let tiling = settings.tiling(None);
        assert_eq!(tiling.gap(Orientation::Vertical), 8.0);
        assert_eq!(tiling.gap(Orientation::Horizontal), 4.0);
        assert_eq!(
            tiling.usable_area(Rect::new(0.0, 0.0, 100.0, 100.0)),
            Rect::new(5.0, 10.0, 90.0, 80.0)
        );
        assert_eq!(
            tiling.orientation_for(Rect::new(0.0, 0.0, 50.0, 100.0)),
            Orientation::Horizontal
        );
        settings.split_mode = SplitMode::Vertical;
        assert_eq!(
            settings.tiling(None).orientation_for(Rect::new(0.0, 0.0, 50.0, 100.0)),
            Orientation::Vertical
        );
    }

    #[test]
    fn test_config_validate_default_is_valid() {
        let issues = Config::default().validate();
        assert!(issues.is_empty(), "Expected no issues, got: {:?}", issues);
    }

    #[test]
    fn test_save_and_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.settings.layout.split_ratio = 0.3;
        config.settings.layout.mode = LayoutMode::Float;
        config.save(&path).unwrap();
        assert_eq!(Config::read(&path).unwrap(), config);
        assert_eq!(
            Config::read_or_default(&dir.path().join("missing.toml")).unwrap(),
            Config::default()
        );
    }
}
