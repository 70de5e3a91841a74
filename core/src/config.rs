use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::*;

pub const DEFAULT_BACKGROUND_COLOR: &str = "rgb(15,15,23)";
pub const DEFAULT_FRAME: f32 = 15.0;
pub const DEFAULT_GAP: f32 = 5.0;
pub const DEFAULT_GRID: GridSize = GridSize {
    width: 16,
    height: 10,
};

/// Field size in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

/// Number of chunks along each axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub width: Coord,
    pub height: Coord,
}

impl Default for GridSize {
    fn default() -> Self {
        DEFAULT_GRID
    }
}

/// Colors of the chunk pass; strings use CSS color syntax.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub chunk: String,
    pub checked: String,
    pub prize_highlight: String,
    pub marker: String,
    pub marker_width: f32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            chunk: "rgb(162, 133, 218)".into(),
            checked: "rgba(80, 76, 78, 0.3)".into(),
            prize_highlight: "rgb(255, 255, 0)".into(),
            marker: "rgb(255, 0, 0)".into(),
            marker_width: 2.0,
        }
    }
}

/// Everything a contest needs at construction.
///
/// Finish listeners are not part of the configuration; register them on the
/// [`Contest`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContestConfig {
    pub size: PixelSize,
    #[serde(default)]
    pub grid: GridSize,
    #[serde(default = "default_frame")]
    pub frame: f32,
    #[serde(default = "default_gap")]
    pub gap: f32,
    #[serde(default)]
    pub bank: Vec<PrizeDefinition>,
    #[serde(default)]
    pub background_color: Option<String>,
    /// Path or `file://` URI of a PNG drawn under the chunks
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub palette: Palette,
    /// Fixes prize placement; random when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_frame() -> f32 {
    DEFAULT_FRAME
}

fn default_gap() -> f32 {
    DEFAULT_GAP
}

impl ContestConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: PixelSize { width, height },
            grid: DEFAULT_GRID,
            frame: DEFAULT_FRAME,
            gap: DEFAULT_GAP,
            bank: Vec::new(),
            background_color: None,
            background_image: None,
            palette: Palette::default(),
            seed: None,
        }
    }

    pub fn with_grid(mut self, width: Coord, height: Coord) -> Self {
        self.grid = GridSize { width, height };
        self
    }

    pub fn with_prize(mut self, prize: Prize, count: ChunkCount) -> Self {
        self.bank.push(PrizeDefinition::new(prize, count));
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    pub fn layout(&self) -> FieldLayout {
        FieldLayout {
            field: Size::new(self.size.width as f32, self.size.height as f32),
            frame: self.frame,
            gap: self.gap,
            grid: (self.grid.width, self.grid.height),
        }
    }

    pub fn background_color(&self) -> &str {
        self.background_color
            .as_deref()
            .unwrap_or(DEFAULT_BACKGROUND_COLOR)
    }

    /// Checks everything that would otherwise fail halfway through a contest.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err(ConfigError::EmptyGrid);
        }

        let layout = self.layout();
        let chunk = layout.chunk_size();
        if !chunk.is_positive() {
            return Err(ConfigError::NonPositiveChunkSize {
                width: chunk.width,
                height: chunk.height,
            });
        }

        let mut ids = BTreeSet::new();
        for definition in &self.bank {
            if !ids.insert(definition.prize.id) {
                return Err(ConfigError::DuplicatePrize(definition.prize.id));
            }
        }

        let requested = self
            .bank
            .iter()
            .fold(0 as ChunkCount, |sum, definition| sum.saturating_add(definition.count));
        let capacity = layout.total_chunks();
        if requested > capacity {
            return Err(ConfigError::TooManyPrizes {
                requested,
                capacity,
            });
        }

        for color in [
            self.background_color(),
            self.palette.chunk.as_str(),
            self.palette.checked.as_str(),
            self.palette.prize_highlight.as_str(),
            self.palette.marker.as_str(),
        ] {
            color.parse::<Rgba>()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_field() {
        let config = ContestConfig::new(900, 600);

        assert_eq!(config.grid, GridSize { width: 16, height: 10 });
        assert_eq!(config.frame, 15.0);
        assert_eq!(config.gap, 5.0);
        assert_eq!(config.background_color(), DEFAULT_BACKGROUND_COLOR);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn field_too_small_for_frame_is_rejected() {
        let config = ContestConfig::new(30, 600);

        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveChunkSize { .. })
        ));
    }

    #[test]
    fn bank_larger_than_grid_is_rejected() {
        let config = ContestConfig::new(400, 300)
            .with_grid(4, 3)
            .with_prize(Prize::new(0), 10)
            .with_prize(Prize::new(1), 3);

        assert_eq!(
            config.validate(),
            Err(ConfigError::TooManyPrizes {
                requested: 13,
                capacity: 12
            })
        );
    }

    #[test]
    fn duplicate_prize_ids_are_rejected() {
        let config = ContestConfig::new(400, 300)
            .with_prize(Prize::new(3), 1)
            .with_prize(Prize::new(3), 2);

        assert_eq!(config.validate(), Err(ConfigError::DuplicatePrize(3)));
    }

    #[test]
    fn bad_color_is_a_config_error() {
        let mut config = ContestConfig::new(400, 300);
        config.background_color = Some("rgb(nope)".into());

        assert!(matches!(config.validate(), Err(ConfigError::InvalidColor(_))));
    }

    #[test]
    fn parses_toml_with_defaults() {
        let config = ContestConfig::from_toml_str(
            r##"
            seed = 11
            background_color = "#101010"

            [size]
            width = 900
            height = 600

            [[bank]]
            prize = { id = 0 }
            count = 1

            [[bank]]
            prize = { id = 1 }
            count = 4
            "##,
        )
        .unwrap();

        assert_eq!(config.grid, DEFAULT_GRID);
        assert_eq!(config.seed, Some(11));
        assert_eq!(config.bank[1], PrizeDefinition::new(Prize::new(1), 4));
        assert_eq!(config.palette, Palette::default());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn parses_json() {
        let config = ContestConfig::from_json_str(
            r#"{"size": {"width": 400, "height": 200}, "grid": {"width": 4, "height": 3}}"#,
        )
        .unwrap();

        assert_eq!(config.layout().grid, (4, 3));
        assert!(matches!(
            ContestConfig::from_json_str("{}"),
            Err(ConfigError::Parse(_))
        ));
    }
}
