//! Décodage par lots et conteneur d'animation.
//!
//! Payloads of a batch are independent: each gets its own `Result`, in input
//! order, and one failure never touches the others.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CodecError;
use crate::payload::Decoded;
use crate::registry::DecoderRegistry;
use crate::sparse::{PositionMap, color_position_map, position_map};

/// Version written into [`AnimationMeta::v`].
pub const ANIMATION_VERSION: &str = "2.0";

/// Default playback rate when a container omits `fps`.
pub const DEFAULT_FPS: u32 = 24;

/// Decode every payload of `values`, in parallel when `parallel` is set.
///
/// # Example
/// ```
/// use ac_codec::batch::decode_batch;
/// use ac_codec::registry::DecoderRegistry;
/// use serde_json::json;
///
/// let values = vec![
///     json!({"type": "rle", "data": [["#", 2]], "metadata": {"width": 2, "height": 1}}),
///     json!({"type": "nope", "data": [], "metadata": {"width": 2, "height": 1}}),
/// ];
/// let results = decode_batch(&DecoderRegistry::standard(), &values, true);
/// assert!(results[0].is_ok());
/// assert!(results[1].is_err());
/// ```
pub fn decode_batch(
    registry: &DecoderRegistry,
    values: &[Value],
    parallel: bool,
) -> Vec<Result<Decoded, CodecError>> {
    let results: Vec<_> = if parallel {
        values.par_iter().map(|v| registry.decode_value(v)).collect()
    } else {
        values.iter().map(|v| registry.decode_value(v)).collect()
    };

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        log::warn!("Lot : {failed}/{} payload(s) en échec", results.len());
    }
    log::info!("Lot : {} payload(s) décodé(s)", results.len() - failed);
    results
}

/// En-tête d'animation `{v, t, m}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationMeta {
    /// Container version.
    pub v: String,
    /// Art type label, opaque to the codecs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
    /// Color mode label, opaque to the codecs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m: Option<String>,
}

impl Default for AnimationMeta {
    fn default() -> Self {
        Self {
            v: ANIMATION_VERSION.to_string(),
            t: None,
            m: None,
        }
    }
}

/// Frame compacte `{w, h, c, p?}`, dimensions toujours présentes.
#[derive(Serialize)]
struct CompactFrame {
    w: usize,
    h: usize,
    c: PositionMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    p: Option<PositionMap>,
}

/// Conteneur d'animation.
///
/// Frames are compact sparse frames on encode; on decode any payload the
/// registry accepts is allowed.
///
/// # Example
/// ```
/// use ac_codec::batch::Animation;
/// use ac_codec::payload::Decoded;
/// use ac_codec::registry::DecoderRegistry;
/// use ac_core::Grid;
///
/// let frames = vec![
///     Decoded::plain(Grid::from_rows(&["# "]).unwrap()),
///     Decoded::plain(Grid::from_rows(&[" #"]).unwrap()),
/// ];
/// let anim = Animation::encode(&frames, 10).unwrap();
/// assert_eq!(anim.timestamps, vec![0.0, 0.1]);
/// let back = anim.decode(&DecoderRegistry::standard(), false);
/// assert_eq!(back[1].as_ref().unwrap().lines(), vec![" #"]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    /// Container header.
    #[serde(default)]
    pub meta: AnimationMeta,
    /// Playback rate.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// One payload per frame.
    pub frames: Vec<Value>,
    /// Seconds from the first frame, one per frame.
    #[serde(default)]
    pub timestamps: Vec<f64>,
}

fn default_fps() -> u32 {
    DEFAULT_FPS
}

impl Animation {
    /// Encode frames as compact sparse frames, timestamps at `1/fps`.
    ///
    /// # Errors
    /// Returns [`CodecError::MalformedMetadata`] if a frame's color layer does
    /// not match its grid.
    pub fn encode(frames: &[Decoded], fps: u32) -> Result<Self, CodecError> {
        let fps = fps.max(1);
        let mut encoded = Vec::with_capacity(frames.len());
        for frame in frames {
            if let Some(layer) = &frame.colors {
                layer.check_shape(&frame.grid)?;
            }
            let compact = CompactFrame {
                w: frame.grid.width(),
                h: frame.grid.height(),
                c: position_map(&frame.grid),
                p: frame.colors.as_ref().map(color_position_map),
            };
            encoded.push(serde_json::to_value(compact)?);
        }
        Ok(Self {
            meta: AnimationMeta::default(),
            fps,
            timestamps: (0..frames.len())
                .map(|i| i as f64 / f64::from(fps))
                .collect(),
            frames: encoded,
        })
    }

    /// Decode every frame through [`decode_batch`].
    #[must_use]
    pub fn decode(
        &self,
        registry: &DecoderRegistry,
        parallel: bool,
    ) -> Vec<Result<Decoded, CodecError>> {
        if !self.timestamps.is_empty() && self.timestamps.len() != self.frames.len() {
            log::warn!(
                "Animation : {} timestamp(s) pour {} frame(s)",
                self.timestamps.len(),
                self.frames.len()
            );
        }
        decode_batch(registry, &self.frames, parallel)
    }

    /// Total duration in seconds at the container's rate.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.frames.len() as f64 / f64::from(self.fps.max(1))
    }
}

#[cfg(test)]
mod tests {
    use ac_core::{CellColor, ColorLayer, Grid, NamedColor};
    use serde_json::json;

    use super::*;

    fn payload(glyph: &str, pos: usize) -> Value {
        json!({"type": "ultraMinimal", "data": {glyph: [pos]}, "metadata": {"width": 2, "height": 2}})
    }

    #[test]
    fn order_is_preserved_in_parallel() {
        let glyphs = ["a", "b", "c", "d", "e"];
        let values: Vec<Value> = (0..60).map(|i| payload(glyphs[i % 5], i % 4)).collect();
        let results = decode_batch(&DecoderRegistry::standard(), &values, true);
        assert_eq!(results.len(), 60);
        for (i, result) in results.iter().enumerate() {
            let grid = &result.as_ref().unwrap().grid;
            assert_eq!(grid.cell(i % 4), Some(glyphs[i % 5]), "frame {i}");
        }
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let values = vec![payload("#", 0), json!({"type": "rle"}), payload("@", 3)];
        let registry = DecoderRegistry::standard();
        let seq = decode_batch(&registry, &values, false);
        let par = decode_batch(&registry, &values, true);
        assert_eq!(seq.len(), 3);
        for (a, b) in seq.iter().zip(&par) {
            assert_eq!(a.as_ref().ok(), b.as_ref().ok());
        }
        assert!(seq[1].is_err());
        assert_eq!(seq[2].as_ref().unwrap().lines(), vec!["  ", " @"]);
    }

    #[test]
    fn oversized_entry_fails_alone() {
        let huge = 1u64 << 33;
        let values = vec![
            payload("#", 0),
            json!({"type": "ultraMinimal", "data": {}, "metadata": {"width": huge, "height": huge}}),
            json!({"type": "rle", "data": [], "metadata": {"width": 100_000, "height": 100_000}}),
        ];
        let results = decode_batch(&DecoderRegistry::standard(), &values, true);
        assert_eq!(results[0].as_ref().unwrap().lines(), vec!["# ", "  "]);
        assert!(matches!(results[1], Err(CodecError::MalformedMetadata(_))));
        assert!(matches!(results[2], Err(CodecError::MalformedMetadata(_))));
    }

    #[test]
    fn animation_roundtrip_with_colors() {
        let grid = Grid::from_rows(&["ab", "  "]).unwrap();
        let mut layer = ColorLayer::new(2, 2).unwrap();
        layer.set(1, CellColor::Named(NamedColor::Green));
        let frames = vec![
            Decoded {
                grid: grid.clone(),
                colors: Some(layer.clone()),
            },
            Decoded::plain(Grid::blank(2, 2).unwrap()),
        ];
        let anim = Animation::encode(&frames, 24).unwrap();
        let json = serde_json::to_string(&anim).unwrap();
        let back: Animation = serde_json::from_str(&json).unwrap();
        assert_eq!(back.meta.v, "2.0");
        assert_eq!(back.frames[1], json!({"w": 2, "h": 2, "c": {}}));

        let decoded = back.decode(&DecoderRegistry::standard(), true);
        let first = decoded[0].as_ref().unwrap();
        assert_eq!(first.grid, grid);
        assert_eq!(first.colors.as_ref(), Some(&layer));
        assert!(decoded[1].as_ref().unwrap().grid.is_all_blank());
    }

    #[test]
    fn container_defaults_apply() {
        let anim: Animation = serde_json::from_value(json!({"frames": []})).unwrap();
        assert_eq!(anim.fps, DEFAULT_FPS);
        assert_eq!(anim.meta, AnimationMeta::default());
        assert!(anim.duration().abs() < f64::EPSILON);
    }

    #[test]
    fn mismatched_color_layer_is_rejected() {
        let frames = vec![Decoded {
            grid: Grid::blank(2, 2).unwrap(),
            colors: Some(ColorLayer::new(3, 2).unwrap()),
        }];
        assert!(matches!(
            Animation::encode(&frames, 24),
            Err(CodecError::MalformedMetadata(_))
        ));
    }
}
