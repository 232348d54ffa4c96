use std::cmp::Ordering;

use super::metrics::LayoutMetrics;
use super::types::{Point, TopologyNode};

const MAX_BASE_SPACING: f64 = 240.0;
const MIN_BASE_SPACING: f64 = 160.0;
const ROW_SPACING: f64 = 48.0;
const LEVEL_GAP: f64 = 140.0;

/// Offset of the `index`-th member of an extension group from its anchor.
///
/// Members pair up into binary-tree rows (`index / 2`); even members go right,
/// odd members left. Each row spreads wider and sits one level further above
/// the anchor.
pub fn offset(index: usize, total: usize, metrics: &LayoutMetrics) -> Point {
	if total == 0 {
		return Point::new(0.0, -LEVEL_GAP);
	}
	let row = (index / 2) as f64;
	let side = if index % 2 == 0 { 1.0 } else { -1.0 };
	let base = (metrics.width * 0.3).clamp(MIN_BASE_SPACING, MAX_BASE_SPACING);
	Point::new(side * (base + row * ROW_SPACING), -(row + 1.0) * LEVEL_GAP)
}

/// Tree parent of a group member: the anchor for the first member, otherwise
/// an earlier sibling.
pub fn parent_index(index: usize) -> Option<usize> {
	(index > 0).then(|| (index - 1) / 2)
}

/// Creation order first, id second.
pub fn member_order(a: &TopologyNode, b: &TopologyNode) -> Ordering {
	a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn offsets_are_pairwise_distinct() {
		let metrics = LayoutMetrics::from_bounds(800.0, 600.0);
		for total in 1..16 {
			let offsets: Vec<Point> = (0..total).map(|i| offset(i, total, &metrics)).collect();
			for (i, a) in offsets.iter().enumerate() {
				for b in &offsets[i + 1..] {
					assert_ne!(a, b);
				}
			}
		}
	}

	#[test]
	fn rows_alternate_sides_and_climb() {
		let metrics = LayoutMetrics::from_bounds(800.0, 600.0);
		assert_eq!(offset(0, 1, &metrics), Point::new(240.0, -140.0));
		assert_eq!(offset(1, 2, &metrics), Point::new(-240.0, -140.0));
		assert_eq!(offset(2, 3, &metrics), Point::new(288.0, -280.0));
		assert_eq!(offset(3, 4, &metrics), Point::new(-288.0, -280.0));
	}

	#[test]
	fn narrow_containers_tighten_spacing() {
		let metrics = LayoutMetrics::from_bounds(0.0, 0.0);
		assert_eq!(offset(0, 1, &metrics).x, 160.0);
	}

	#[test]
	fn tree_parents() {
		assert_eq!(parent_index(0), None);
		assert_eq!(parent_index(1), Some(0));
		assert_eq!(parent_index(2), Some(0));
		assert_eq!(parent_index(3), Some(1));
		assert_eq!(parent_index(4), Some(1));
	}
}
