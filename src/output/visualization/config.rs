//! Plot configuration

use plotters::prelude::*;

/// Appearance of a chart
///
/// # Example
///
/// ```rust
/// use pulse_rs::output::visualization::PlotConfig;
/// use plotters::prelude::*;
///
/// let config = PlotConfig::fit("Graphite, 25 °C").with_size(1920, 1080);
/// assert_eq!(config.xlabel, "Time (s)");
/// assert_eq!(config.model_color, RED);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    /// Image width in pixels (default: 1024)
    pub width: u32,

    /// Image height in pixels (default: 768)
    pub height: u32,

    pub title: String,
    pub xlabel: String,
    pub ylabel: String,

    /// Colour of the experimental points (default: BLUE)
    pub data_color: RGBColor,

    /// Colour of the model curve (default: RED)
    pub model_color: RGBColor,

    /// Background colour (default: WHITE)
    pub background: RGBColor,

    /// Line width in pixels (default: 2)
    pub line_width: u32,

    /// Radius of the experimental points in pixels (default: 2)
    pub point_size: u32,

    pub show_grid: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            title: "Heating curve".to_string(),
            xlabel: "Time (s)".to_string(),
            ylabel: "Temperature rise (K)".to_string(),
            data_color: BLUE,
            model_color: RED,
            background: WHITE,
            line_width: 2,
            point_size: 2,
            show_grid: true,
        }
    }
}

impl PlotConfig {
    /// Configuration for a model-versus-experiment chart
    pub fn fit(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_colors(mut self, data: RGBColor, model: RGBColor) -> Self {
        self.data_color = data;
        self.model_color = model;
        self
    }

    pub fn without_grid(mut self) -> Self {
        self.show_grid = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plot_config_default() {
        let config = PlotConfig::default();
        assert_eq!(config.width, 1024);
        assert_eq!(config.height, 768);
        assert!(config.show_grid);
    }

    #[test]
    fn test_builders() {
        let config = PlotConfig::fit("Shot 3")
            .with_size(640, 480)
            .with_colors(BLACK, GREEN)
            .without_grid();
        assert_eq!(config.title, "Shot 3");
        assert_eq!((config.width, config.height), (640, 480));
        assert_eq!(config.data_color, BLACK);
        assert_eq!(config.model_color, GREEN);
        assert!(!config.show_grid);
    }
}
