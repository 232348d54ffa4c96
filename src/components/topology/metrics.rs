use super::types::Layer;

pub const MIN_WIDTH: f64 = 520.0;
pub const MIN_HEIGHT: f64 = 420.0;

const ROW_INSET: f64 = 14.0;
const ROW_GAP: f64 = 14.0;
const MIN_ROW_HEIGHT: f64 = 120.0;

/// Normalised container geometry every layout pass works from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutMetrics {
	pub width: f64,
	pub height: f64,
	pub min_spacing: f64,
	pub max_spacing: f64,
	pub padding_x: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowMetrics {
	pub inset: f64,
	pub gap: f64,
	pub row_height: f64,
}

/// Vertical centre of each layer band, relative to the container centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandCenters {
	pub cloud: f64,
	pub edge: f64,
	pub terminal: f64,
}

impl BandCenters {
	pub fn get(&self, layer: Layer) -> f64 {
		match layer {
			Layer::Cloud => self.cloud,
			Layer::Edge => self.edge,
			Layer::Terminal => self.terminal,
		}
	}
}

fn sane(value: f64, floor: f64) -> f64 {
	if value.is_finite() { value.max(floor) } else { floor }
}

impl LayoutMetrics {
	/// Build metrics from the rendered container size. Collapsed or not yet
	/// laid out containers fall back to the floor size.
	pub fn from_bounds(width: f64, height: f64) -> Self {
		let width = sane(width, MIN_WIDTH);
		let height = sane(height, MIN_HEIGHT);
		let min_spacing = (width * 0.16).max(120.0);
		Self {
			width,
			height,
			min_spacing,
			max_spacing: (width * 0.3).min(320.0).max(min_spacing + 8.0),
			padding_x: (width * 0.05).max(18.0),
		}
	}

	pub fn band_width(&self) -> f64 {
		self.width - self.padding_x * 2.0
	}

	pub fn rows(&self) -> RowMetrics {
		RowMetrics {
			inset: ROW_INSET,
			gap: ROW_GAP,
			row_height: ((self.height - ROW_INSET * 2.0 - ROW_GAP * 2.0) / 3.0).max(MIN_ROW_HEIGHT),
		}
	}

	pub fn band_centers(&self) -> BandCenters {
		let RowMetrics {
			inset,
			gap,
			row_height,
		} = self.rows();
		let first = inset + row_height / 2.0 - self.height / 2.0;
		BandCenters {
			cloud: first,
			edge: first + row_height + gap,
			terminal: first + 2.0 * (row_height + gap),
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn collapsed_container_uses_floor() {
		let metrics = LayoutMetrics::from_bounds(0.0, 0.0);
		assert_eq!(metrics.width, MIN_WIDTH);
		assert_eq!(metrics.height, MIN_HEIGHT);
		assert_eq!(metrics, LayoutMetrics::from_bounds(f64::NAN, -5.0));
	}

	#[test]
	fn spacing_is_clamped() {
		let metrics = LayoutMetrics::from_bounds(800.0, 600.0);
		assert_eq!(metrics.min_spacing, 128.0);
		assert_eq!(metrics.max_spacing, 240.0);
		assert_eq!(metrics.padding_x, 40.0);

		let wide = LayoutMetrics::from_bounds(4000.0, 600.0);
		assert_eq!(wide.max_spacing, wide.min_spacing + 8.0);
	}

	#[test]
	fn bands_run_top_to_bottom() {
		let centers = LayoutMetrics::from_bounds(800.0, 600.0).band_centers();
		assert!(centers.cloud < centers.edge);
		assert!(centers.edge < centers.terminal);
		assert!(centers.edge.abs() < 1e-9);
	}
}
