//! Bounding boxes tagged with the coordinate space they live in.

use std::fmt;
use std::marker::PhantomData;

/// Marker type for absolute pixel coordinates, origin at the top-left corner.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Marker type for coordinates expressed as fractions of the image size.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalized {}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Normalized {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

/// An axis-aligned bounding box in XYXY format (xmin, ymin, xmax, ymax).
///
/// The `TSpace` parameter is either [`Pixel`] or [`Normalized`], so a box
/// read from an annotation document cannot be written out as a label line
/// without going through an explicit normalization step.
///
/// Construction does not require `min <= max`. Malformed boxes are
/// representable so the caller's box policy decides what happens to them.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            _space: PhantomData,
        }
    }

    /// Builds a box from its center point and size.
    #[inline]
    pub fn from_cxcywh(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        Self::from_xyxy(cx - half_w, cy - half_h, cx + half_w, cy + half_h)
    }

    /// Returns (center_x, center_y, width, height) in this box's own space.
    #[inline]
    pub fn to_cxcywh(&self) -> (f64, f64, f64, f64) {
        (
            (self.xmin + self.xmax) / 2.0,
            (self.ymin + self.ymax) / 2.0,
            self.width(),
            self.height(),
        )
    }

    /// May be negative if the box is malformed.
    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// May be negative if the box is malformed.
    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.xmin.is_finite()
            && self.ymin.is_finite()
            && self.xmax.is_finite()
            && self.ymax.is_finite()
    }

    /// Returns true if `min < max` on both axes.
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.xmin < self.xmax && self.ymin < self.ymax
    }
}

impl BBoxXYXY<Pixel> {
    /// Normalizes to YOLO center/size form.
    ///
    /// The arithmetic is fixed as `(min + max) / 2 / size` for centers and
    /// `(max - min) / size` for extents. Training pipelines compare labels
    /// byte for byte, so the order of operations must not change. No
    /// clamping is applied.
    pub fn to_normalized_cxcywh(&self, image_width: f64, image_height: f64) -> (f64, f64, f64, f64) {
        (
            (self.xmin + self.xmax) / 2.0 / image_width,
            (self.ymin + self.ymax) / 2.0 / image_height,
            (self.xmax - self.xmin) / image_width,
            (self.ymax - self.ymin) / image_height,
        )
    }

    /// Converts to an XYXY box in normalized space.
    pub fn to_normalized(&self, image_width: f64, image_height: f64) -> BBoxXYXY<Normalized> {
        BBoxXYXY::from_xyxy(
            self.xmin / image_width,
            self.ymin / image_height,
            self.xmax / image_width,
            self.ymax / image_height,
        )
    }

    /// Returns true if the box lies inside `[0, width] x [0, height]`.
    pub fn is_within(&self, image_width: f64, image_height: f64) -> bool {
        self.xmin >= 0.0
            && self.ymin >= 0.0
            && self.xmax <= image_width
            && self.ymax <= image_height
    }

    /// Clamps every edge into `[0, width] x [0, height]`.
    pub fn clamp_to(&self, image_width: f64, image_height: f64) -> Self {
        Self::from_xyxy(
            self.xmin.clamp(0.0, image_width),
            self.ymin.clamp(0.0, image_height),
            self.xmax.clamp(0.0, image_width),
            self.ymax.clamp(0.0, image_height),
        )
    }
}

impl BBoxXYXY<Normalized> {
    pub fn to_pixel(&self, image_width: f64, image_height: f64) -> BBoxXYXY<Pixel> {
        BBoxXYXY::from_xyxy(
            self.xmin * image_width,
            self.ymin * image_height,
            self.xmax * image_width,
            self.ymax * image_height,
        )
    }
}

impl<TSpace> fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("xmin", &self.xmin)
            .field("ymin", &self.ymin)
            .field("xmax", &self.xmax)
            .field("ymax", &self.ymax)
            .finish()
    }
}

impl<TSpace> Default for BBoxXYXY<TSpace> {
    fn default() -> Self {
        Self::from_xyxy(0.0, 0.0, 0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_inclusion_example() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(50.0, 20.0, 150.0, 80.0);
        let (cx, cy, w, h) = bbox.to_normalized_cxcywh(200.0, 100.0);
        assert_eq!(cx, 0.5);
        assert_eq!(cy, 0.5);
        assert_eq!(w, 0.5);
        assert_eq!(h, 0.6);
    }

    #[test]
    fn cxcywh_roundtrip_in_pixel_space() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_cxcywh(40.0, 30.0, 20.0, 10.0);
        assert_eq!(bbox.xmin, 30.0);
        assert_eq!(bbox.ymin, 25.0);
        assert_eq!(bbox.xmax, 50.0);
        assert_eq!(bbox.ymax, 35.0);
        assert_eq!(bbox.to_cxcywh(), (40.0, 30.0, 20.0, 10.0));
    }

    #[test]
    fn ordering_and_bounds() {
        let ordered: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(10.0, 20.0, 100.0, 80.0);
        assert!(ordered.is_ordered());
        assert!(ordered.is_within(100.0, 80.0));
        assert!(!ordered.is_within(99.0, 80.0));

        let flipped: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(100.0, 80.0, 10.0, 20.0);
        assert!(!flipped.is_ordered());

        let degenerate: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(10.0, 10.0, 10.0, 20.0);
        assert!(!degenerate.is_ordered());
    }

    #[test]
    fn clamp_pulls_edges_inside_image() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(-5.0, 10.0, 210.0, 120.0);
        let clamped = bbox.clamp_to(200.0, 100.0);
        assert_eq!(clamped, BBoxXYXY::from_xyxy(0.0, 10.0, 200.0, 100.0));
    }

    #[test]
    fn normalized_pixel_roundtrip() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(16.0, 8.0, 48.0, 24.0);
        let back = bbox.to_normalized(64.0, 32.0).to_pixel(64.0, 32.0);
        assert_eq!(bbox, back);
    }

    #[test]
    fn is_finite_detects_nan() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(f64::NAN, 0.0, 1.0, 1.0);
        assert!(!bbox.is_finite());
    }
}
