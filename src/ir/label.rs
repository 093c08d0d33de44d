//! YOLO label lines: `class_id cx cy w h`, coordinates normalized to the image.

use std::fmt;
#[cfg(any(test, feature = "fuzzing"))]
use std::path::Path;

use super::{BBoxXYXY, ClassId, Pixel};
#[cfg(any(test, feature = "fuzzing"))]
use crate::error::DefectPrepError;

/// One object in a YOLO label file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelLine {
    pub class_id: ClassId,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl LabelLine {
    /// Normalizes a pixel-space box against the image size.
    pub fn from_pixel_box(
        class_id: ClassId,
        bbox: &BBoxXYXY<Pixel>,
        image_width: f64,
        image_height: f64,
    ) -> Self {
        let (cx, cy, w, h) = bbox.to_normalized_cxcywh(image_width, image_height);
        Self {
            class_id,
            cx,
            cy,
            w,
            h,
        }
    }

    /// A single object covering the entire frame.
    pub fn full_frame(class_id: ClassId) -> Self {
        Self {
            class_id,
            cx: 0.5,
            cy: 0.5,
            w: 1.0,
            h: 1.0,
        }
    }

    /// The line with coordinates in their shortest form, so a full-frame
    /// extent prints as `1` rather than `1.0`.
    pub fn to_compact_string(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.class_id, self.cx, self.cy, self.w, self.h
        )
    }

    /// Maps the line back to pixel coordinates.
    pub fn to_pixel_box(&self, image_width: f64, image_height: f64) -> BBoxXYXY<Pixel> {
        BBoxXYXY::from_cxcywh(
            self.cx * image_width,
            self.cy * image_height,
            self.w * image_width,
            self.h * image_height,
        )
    }
}

impl fmt::Display for LabelLine {
    /// Coordinates render through [`format_coordinate`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.class_id,
            format_coordinate(self.cx),
            format_coordinate(self.cy),
            format_coordinate(self.w),
            format_coordinate(self.h)
        )
    }
}

/// Shortest round-trip decimal that always reads as a float: integral values
/// keep a `.0`, and magnitudes below `1e-4` or from `1e16` up switch to
/// exponent form with a signed two-digit exponent (`1e-05`, `1.5e+16`).
pub fn format_coordinate(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return value.to_string();
    };

    if value == 0.0 || (-4..16).contains(&exponent) {
        let mut fixed = value.to_string();
        if !fixed.contains('.') {
            fixed.push_str(".0");
        }
        return fixed;
    }

    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.abs())
}

/// Parses one label line. Blank lines yield `Ok(None)`.
#[cfg(any(test, feature = "fuzzing"))]
pub fn parse_label_line(
    line: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<Option<LabelLine>, DefectPrepError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // At most 6 tokens so pathological inputs do not allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(6).collect();
    if tokens.len() != 5 {
        return Err(DefectPrepError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!(
                "expected 5 tokens (class_id cx cy w h), found {}{}",
                if tokens.len() > 5 { "more than " } else { "" },
                tokens.len().min(5)
            ),
        });
    }

    let class_id = tokens[0]
        .parse::<usize>()
        .map_err(|_| DefectPrepError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!(
                "invalid class_id '{}'; expected non-negative integer",
                tokens[0]
            ),
        })?;

    Ok(Some(LabelLine {
        class_id: ClassId::new(class_id),
        cx: parse_f64_token(tokens[1], "x_center", file_path, line_num)?,
        cy: parse_f64_token(tokens[2], "y_center", file_path, line_num)?,
        w: parse_f64_token(tokens[3], "width", file_path, line_num)?,
        h: parse_f64_token(tokens[4], "height", file_path, line_num)?,
    }))
}

/// Fuzz-only entrypoint for single-line parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_label_line(input: &str) -> Result<(), DefectPrepError> {
    let _ = parse_label_line(input, Path::new("<fuzz>"), 1)?;
    Ok(())
}

#[cfg(any(test, feature = "fuzzing"))]
fn parse_f64_token(
    raw: &str,
    field_name: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<f64, DefectPrepError> {
    raw.parse::<f64>()
        .map_err(|_| DefectPrepError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("invalid {field_name} '{raw}'; expected floating-point number"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn full_frame_compact_form_is_verbatim() {
        let line = LabelLine::full_frame(ClassId::new(3));
        assert_eq!(line.to_compact_string(), "3 0.5 0.5 1 1");
        assert_eq!(line.to_string(), "3 0.5 0.5 1.0 1.0");
    }

    #[test]
    fn pixel_box_renders_shortest_decimals() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(50.0, 20.0, 150.0, 80.0);
        let line = LabelLine::from_pixel_box(ClassId::new(6), &bbox, 200.0, 100.0);
        assert_eq!(line.to_string(), "6 0.5 0.5 0.5 0.6");
    }

    #[test]
    fn integral_coordinates_keep_a_decimal_point() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(0.0, 0.0, 200.0, 100.0);
        let line = LabelLine::from_pixel_box(ClassId::new(8), &bbox, 200.0, 100.0);
        assert_eq!(line.to_string(), "8 0.5 0.5 1.0 1.0");
    }

    #[test]
    fn coordinate_formatting_matches_float_repr() {
        assert_eq!(format_coordinate(1.0), "1.0");
        assert_eq!(format_coordinate(0.0), "0.0");
        assert_eq!(format_coordinate(-0.0), "-0.0");
        assert_eq!(format_coordinate(0.5), "0.5");
        assert_eq!(format_coordinate(0.6), "0.6");
        assert_eq!(format_coordinate(-0.25), "-0.25");
        assert_eq!(format_coordinate(1.2), "1.2");
        assert_eq!(format_coordinate(0.0001), "0.0001");
        assert_eq!(format_coordinate(4.8828125e-05), "4.8828125e-05");
        assert_eq!(format_coordinate(0.00001), "1e-05");
        assert_eq!(format_coordinate(1e16), "1e+16");
        assert_eq!(format_coordinate(1.5e16), "1.5e+16");
        assert_eq!(format_coordinate(1e15), "1000000000000000.0");
        assert_eq!(format_coordinate(f64::INFINITY), "inf");
        assert_eq!(format_coordinate(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_coordinate(f64::NAN), "nan");
    }

    #[test]
    fn parse_accepts_valid_rows() {
        let parsed = parse_label_line("2 0.5 0.25 0.3 0.1", Path::new("a.txt"), 1)
            .expect("parse should succeed")
            .expect("line should produce a row");
        assert_eq!(
            parsed,
            LabelLine {
                class_id: ClassId::new(2),
                cx: 0.5,
                cy: 0.25,
                w: 0.3,
                h: 0.1,
            }
        );
    }

    #[test]
    fn parse_skips_blank_rows() {
        let parsed = parse_label_line("   ", Path::new("a.txt"), 2).expect("parse should succeed");
        assert!(parsed.is_none());
    }

    #[test]
    fn parse_rejects_wrong_token_counts() {
        let short = parse_label_line("0 0.1 0.2", Path::new("a.txt"), 3).unwrap_err();
        assert!(matches!(short, DefectPrepError::LabelParse { line: 3, .. }));

        let long = parse_label_line("0 0.1 0.2 0.3 0.4 0.5", Path::new("a.txt"), 4).unwrap_err();
        assert!(matches!(long, DefectPrepError::LabelParse { line: 4, .. }));
    }

    #[test]
    fn parse_rejects_negative_class() {
        let err = parse_label_line("-1 0.5 0.5 0.1 0.1", Path::new("a.txt"), 1).unwrap_err();
        assert!(err.to_string().contains("class_id"));
    }

    #[test]
    fn display_then_parse_is_stable() {
        let line = LabelLine {
            class_id: ClassId::new(1),
            cx: 0.123456789,
            cy: 0.9,
            w: 0.05,
            h: 1.0 / 3.0,
        };
        let parsed = parse_label_line(&line.to_string(), Path::new("a.txt"), 1)
            .expect("parse")
            .expect("row");
        assert_eq!(parsed, line);
    }

    proptest! {
        #[test]
        fn rendered_lines_parse_back_exactly(
            class in 0usize..10,
            coords in prop::array::uniform4(-1e20f64..1e20),
        ) {
            let line = LabelLine {
                class_id: ClassId::new(class),
                cx: coords[0],
                cy: coords[1],
                w: coords[2],
                h: coords[3],
            };
            let parsed = parse_label_line(&line.to_string(), Path::new("prop.txt"), 1)
                .expect("parse")
                .expect("non-empty");
            prop_assert_eq!(parsed, line);
        }

        #[test]
        fn tiny_coordinates_parse_back_exactly(value in 1e-12f64..1e-3) {
            let text = format_coordinate(value);
            prop_assert_eq!(text.parse::<f64>().expect("parse"), value);
        }
    }
}
