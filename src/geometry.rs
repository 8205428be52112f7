//! Bounding boxes, affine geotransforms and pixel windows.
//!
//! These types are independent of any raster library so that the window arithmetic can be tested
//! without opening a dataset.

use geojson::Value;

/// An axis-aligned bounding box `(min_x, min_y, max_x, max_y)` in some coordinate reference
/// system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Return a new BoundingBox.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Returns the bounding box of a set of points, ignoring non-finite coordinates.
    ///
    /// Returns `None` if there are no finite points.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        points
            .into_iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .fold(None, |bbox: Option<Self>, (x, y)| match bbox {
                None => Some(Self::new(x, y, x, y)),
                Some(b) => Some(Self::new(
                    b.min_x.min(x),
                    b.min_y.min(y),
                    b.max_x.max(x),
                    b.max_y.max(y),
                )),
            })
    }

    /// Returns the bounding box of all positions in a GeoJSON geometry.
    ///
    /// Only the first two ordinates of each position are considered.
    pub fn from_geometry(geometry: &geojson::Geometry) -> Option<Self> {
        let mut points = Vec::new();
        collect_positions(&geometry.value, &mut points);
        Self::from_points(points)
    }

    /// Whether the box has zero (or negative) extent on either axis.
    pub fn is_degenerate(&self) -> bool {
        !(self.min_x < self.max_x && self.min_y < self.max_y)
    }

    /// Returns the bounds as `[min_x, min_y, max_x, max_y]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }

    /// Transform the bounding box into another coordinate reference system.
    ///
    /// Each edge is densified with `densify_pts` intermediate points before transforming so that
    /// curved edges in the target CRS are accounted for. The result is the bounding box of all
    /// finite transformed points, or `None` if no point transformed to a finite coordinate.
    ///
    /// # Arguments
    ///
    /// * `densify_pts`: Number of points to add between the corners of each edge
    /// * `transform`: Function transforming x and y coordinates in place
    pub fn transform<F, E>(&self, densify_pts: usize, transform: F) -> Result<Option<Self>, E>
    where
        F: FnOnce(&mut [f64], &mut [f64]) -> Result<(), E>,
    {
        let segments = densify_pts + 1;
        let (dx, dy) = (self.max_x - self.min_x, self.max_y - self.min_y);
        let mut xs = Vec::with_capacity(4 * (segments + 1));
        let mut ys = Vec::with_capacity(4 * (segments + 1));
        for i in 0..=segments {
            let t = i as f64 / segments as f64;
            let x = self.min_x + t * dx;
            let y = self.min_y + t * dy;
            // Bottom, top, left and right edges.
            xs.extend_from_slice(&[x, x, self.min_x, self.max_x]);
            ys.extend_from_slice(&[self.min_y, self.max_y, y, y]);
        }
        transform(&mut xs, &mut ys)?;
        Ok(Self::from_points(xs.into_iter().zip(ys)))
    }
}

/// Append the x/y coordinates of every position in `value` to `points`.
fn collect_positions(value: &Value, points: &mut Vec<(f64, f64)>) {
    let mut push = |position: &Vec<f64>| {
        if let [x, y, ..] = position.as_slice() {
            points.push((*x, *y))
        }
    };
    match value {
        Value::Point(position) => push(position),
        Value::MultiPoint(positions) | Value::LineString(positions) => {
            positions.iter().for_each(push)
        }
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            lines.iter().flatten().for_each(push)
        }
        Value::MultiPolygon(polygons) => polygons.iter().flatten().flatten().for_each(push),
        Value::GeometryCollection(geometries) => geometries
            .iter()
            .for_each(|geometry| collect_positions(&geometry.value, points)),
    }
}

/// An affine transform from pixel (column, row) to world (x, y) coordinates.
///
/// Coefficients use GDAL ordering:
///
/// * x = c\[0\] + column * c\[1\] + row * c\[2\]
/// * y = c\[3\] + column * c\[4\] + row * c\[5\]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    /// Map world coordinates to fractional (column, row) pixel coordinates.
    ///
    /// Returns `None` if the transform is not invertible.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let [x0, a, b, y0, d, e] = self.0;
        let det = a * e - b * d;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let (dx, dy) = (x - x0, y - y0);
        let col = (e * dx - b * dy) / det;
        let row = (a * dy - d * dx) / det;
        Some((col, row))
    }
}

/// A rectangular window on a raster's pixel grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PixelWindow {
    pub col_off: usize,
    pub row_off: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelWindow {
    /// Whether the window contains no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Compute the window covering `bounds` on a raster of `size` (columns, rows).
    ///
    /// The fractional window spanned by the four corners of `bounds` is computed first. Its
    /// offsets are floored and its lengths rounded to whole pixels, and the result is clipped
    /// to the raster extent. Bounds that lie outside the raster produce an empty window.
    ///
    /// Returns `None` if the transform is not invertible.
    pub fn from_bounds(
        bounds: &BoundingBox,
        transform: &GeoTransform,
        size: (usize, usize),
    ) -> Option<Self> {
        let corners = [
            (bounds.min_x, bounds.max_y),
            (bounds.max_x, bounds.max_y),
            (bounds.max_x, bounds.min_y),
            (bounds.min_x, bounds.min_y),
        ];
        let mut pixels = Vec::with_capacity(corners.len());
        for (x, y) in corners {
            pixels.push(transform.world_to_pixel(x, y)?);
        }
        let extent = BoundingBox::from_points(pixels)?;

        let col_start = extent.min_x.floor();
        let row_start = extent.min_y.floor();
        let col_stop = col_start + (extent.max_x - extent.min_x).round();
        let row_stop = row_start + (extent.max_y - extent.min_y).round();

        let (cols, rows) = (size.0 as f64, size.1 as f64);
        let col_start = col_start.clamp(0.0, cols);
        let row_start = row_start.clamp(0.0, rows);
        let col_stop = col_stop.clamp(col_start, cols);
        let row_stop = row_stop.clamp(row_start, rows);

        Some(PixelWindow {
            col_off: col_start as usize,
            row_off: row_start as usize,
            width: (col_stop - col_start) as usize,
            height: (row_stop - row_start) as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use geojson::Geometry;

    // A 10m north-up UTM-like grid with origin at (600000, 5000000).
    const TRANSFORM: GeoTransform = GeoTransform([600000.0, 10.0, 0.0, 5000000.0, 0.0, -10.0]);

    #[test]
    fn bbox_from_polygon() {
        let geometry = Geometry::new(Value::Polygon(vec![vec![
            vec![-1.5, 2.0],
            vec![3.0, 2.0],
            vec![3.0, 4.5],
            vec![-1.5, 2.0],
        ]]));
        assert_eq!(
            Some(BoundingBox::new(-1.5, 2.0, 3.0, 4.5)),
            BoundingBox::from_geometry(&geometry)
        );
    }

    #[test]
    fn bbox_from_geometry_collection() {
        let geometry = Geometry::new(Value::GeometryCollection(vec![
            Geometry::new(Value::Point(vec![1.0, 1.0, 100.0])),
            Geometry::new(Value::MultiPolygon(vec![vec![vec![
                vec![-2.0, 0.0],
                vec![0.0, 5.0],
            ]]])),
        ]));
        assert_eq!(
            Some(BoundingBox::new(-2.0, 0.0, 1.0, 5.0)),
            BoundingBox::from_geometry(&geometry)
        );
    }

    #[test]
    fn bbox_from_empty_geometry() {
        let geometry = Geometry::new(Value::LineString(vec![]));
        assert_eq!(None, BoundingBox::from_geometry(&geometry));
    }

    #[test]
    fn bbox_degenerate() {
        assert!(BoundingBox::new(1.0, 1.0, 1.0, 2.0).is_degenerate());
        assert!(BoundingBox::new(1.0, 1.0, 2.0, 1.0).is_degenerate());
        assert!(!BoundingBox::new(1.0, 1.0, 2.0, 2.0).is_degenerate());
    }

    #[test]
    fn bbox_from_points_skips_non_finite() {
        let points = [(f64::INFINITY, 0.0), (1.0, 2.0), (f64::NAN, 5.0), (3.0, -1.0)];
        assert_eq!(
            Some(BoundingBox::new(1.0, -1.0, 3.0, 2.0)),
            BoundingBox::from_points(points)
        );
    }

    #[test]
    fn transform_identity() {
        let bbox = BoundingBox::new(-1.0, -2.0, 3.0, 4.0);
        let result = bbox
            .transform(21, |_, _| Ok::<_, ()>(()))
            .unwrap()
            .unwrap();
        assert_eq!(bbox, result);
    }

    #[test]
    fn transform_densifies_edges() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let mut count = 0;
        bbox.transform(3, |xs, ys| {
            count = xs.len();
            assert_eq!(xs.len(), ys.len());
            Ok::<_, ()>(())
        })
        .unwrap();
        // Five points on each of four edges.
        assert_eq!(20, count);
    }

    #[test]
    fn transform_curved_edge() {
        // A transform that bulges the top edge upwards at its midpoint.
        let bbox = BoundingBox::new(-1.0, 0.0, 1.0, 1.0);
        let result = bbox
            .transform(1, |xs, ys| {
                for (x, y) in xs.iter().zip(ys.iter_mut()) {
                    *y += *y * (1.0 - x * x);
                }
                Ok::<_, ()>(())
            })
            .unwrap()
            .unwrap();
        assert_abs_diff_eq!(2.0, result.max_y);
    }

    #[test]
    fn transform_error() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let result = bbox.transform(21, |_, _| Err("failed"));
        assert_eq!(Err("failed"), result);
    }

    #[test]
    fn world_to_pixel_north_up() {
        let (col, row) = TRANSFORM.world_to_pixel(600025.0, 4999985.0).unwrap();
        assert_abs_diff_eq!(2.5, col);
        assert_abs_diff_eq!(1.5, row);
    }

    #[test]
    fn world_to_pixel_rotated() {
        // 90 degree rotation: x follows rows, y follows columns.
        let transform = GeoTransform([0.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
        let (col, row) = transform.world_to_pixel(3.0, 2.0).unwrap();
        assert_abs_diff_eq!(2.0, col);
        assert_abs_diff_eq!(3.0, row);
    }

    #[test]
    fn world_to_pixel_singular() {
        let transform = GeoTransform([0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(None, transform.world_to_pixel(1.0, 1.0));
    }

    #[test]
    fn window_from_bounds() {
        let bounds = BoundingBox::new(600020.0, 4999900.0, 600100.0, 4999980.0);
        let window = PixelWindow::from_bounds(&bounds, &TRANSFORM, (1000, 1000)).unwrap();
        assert_eq!(
            PixelWindow {
                col_off: 2,
                row_off: 2,
                width: 8,
                height: 8
            },
            window
        );
    }

    #[test]
    fn window_from_fractional_bounds() {
        let bounds = BoundingBox::new(600015.0, 4999955.0, 600052.0, 4999985.0);
        let window = PixelWindow::from_bounds(&bounds, &TRANSFORM, (1000, 1000)).unwrap();
        // Columns 1.5..5.2 and rows 1.5..4.5.
        assert_eq!(
            PixelWindow {
                col_off: 1,
                row_off: 1,
                width: 4,
                height: 3
            },
            window
        );
    }

    #[test]
    fn window_clipped_to_raster() {
        let bounds = BoundingBox::new(599950.0, 4999950.0, 600050.0, 5000050.0);
        let window = PixelWindow::from_bounds(&bounds, &TRANSFORM, (3, 100)).unwrap();
        assert_eq!(
            PixelWindow {
                col_off: 0,
                row_off: 0,
                width: 3,
                height: 5
            },
            window
        );
    }

    #[test]
    fn window_outside_raster() {
        let bounds = BoundingBox::new(500000.0, 4000000.0, 500100.0, 4000100.0);
        let window = PixelWindow::from_bounds(&bounds, &TRANSFORM, (100, 100)).unwrap();
        assert!(window.is_empty());
    }
}
