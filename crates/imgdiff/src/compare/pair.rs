use std::io;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use thiserror::Error;
use tracing::debug;

use super::kernel;
use super::pixels::PixelBuffer;
use super::{DecodeError, Decoder, DiffRecord};

/// Why a left-tree file produced no comparison. Always local to its pair.
#[derive(Debug, Error)]
pub enum PairError {
    #[error("{} is not under {}", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    ReadLeft { path: PathBuf, source: io::Error },

    /// Any read failure at the resolved path, not only a missing file.
    #[error("no corresponding file found for {} (expected {}: {source})", left.display(), right.display())]
    MissingCounterpart {
        left: PathBuf,
        right: PathBuf,
        source: io::Error,
    },

    #[error("couldn't decode {}: {source}", path.display())]
    UndecodableLeft { path: PathBuf, source: DecodeError },

    #[error("couldn't decode {}: {source}", path.display())]
    UndecodableRight { path: PathBuf, source: DecodeError },
}

/// Result of scoring one pair that was present on both sides.
#[derive(Debug)]
pub enum Verdict {
    /// Byte-for-byte equal; never decoded.
    IdenticalBytes,
    /// Decoded and scored. The score may still be zero.
    Compared(DiffRecord),
}

/// Maps left-tree files onto the right tree and scores each pair.
pub struct PairScorer {
    left_root: PathBuf,
    right_root: PathBuf,
    decoder: Box<dyn Decoder>,
}

impl PairScorer {
    pub fn new(left_root: PathBuf, right_root: PathBuf, decoder: Box<dyn Decoder>) -> Self {
        Self {
            left_root,
            right_root,
            decoder,
        }
    }

    /// Path of `left` re-rooted under the right tree.
    ///
    /// A left root of `.` owns every relative path, since the walker yields
    /// those without a leading `./`.
    pub fn counterpart(&self, left: &Path) -> Result<PathBuf, PairError> {
        let rel = if self.left_root == Path::new(".") && left.is_relative() {
            left
        } else {
            left.strip_prefix(&self.left_root)
                .map_err(|_| PairError::OutsideRoot {
                    path: left.to_path_buf(),
                    root: self.left_root.clone(),
                })?
        };
        Ok(self.right_root.join(rel))
    }

    /// Four phases:
    /// 1. Resolve and read both files
    /// 2. Byte-identical check (no decode)
    /// 3. Decode both sides
    /// 4. Dimension check, then SAD
    pub fn score(&self, left: &Path) -> Result<Verdict, PairError> {
        let right = self.counterpart(left)?;

        let left_bytes = std::fs::read(left).map_err(|source| PairError::ReadLeft {
            path: left.to_path_buf(),
            source,
        })?;
        let right_bytes =
            std::fs::read(&right).map_err(|source| PairError::MissingCounterpart {
                left: left.to_path_buf(),
                right: right.clone(),
                source,
            })?;

        if left_bytes == right_bytes {
            return Ok(Verdict::IdenticalBytes);
        }

        let left_image =
            self.decoder
                .decode(&left_bytes)
                .map_err(|source| PairError::UndecodableLeft {
                    path: left.to_path_buf(),
                    source,
                })?;
        let right_image =
            self.decoder
                .decode(&right_bytes)
                .map_err(|source| PairError::UndecodableRight {
                    path: right.clone(),
                    source,
                })?;

        let (score, dimension_mismatch) = score_images(&left_image, &right_image);
        debug!(score, "scored");

        Ok(Verdict::Compared(DiffRecord {
            left: left.to_path_buf(),
            right,
            score,
            dimension_mismatch,
        }))
    }
}

/// Normalized difference of two decoded images.
///
/// Differing dimensions are never aligned: the score is infinite and the
/// dimensions are returned as `(left_w, left_h, right_w, right_h)`.
pub fn score_images(
    left: &DynamicImage,
    right: &DynamicImage,
) -> (f64, Option<(u32, u32, u32, u32)>) {
    let (lw, lh) = (left.width(), left.height());
    let (rw, rh) = (right.width(), right.height());
    if (lw, lh) != (rw, rh) {
        return (f64::INFINITY, Some((lw, lh, rw, rh)));
    }
    let score = kernel::score(&PixelBuffer::classify(left), &PixelBuffer::classify(right));
    (score, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::ImageDecoder;
    use image::{Rgba, RgbaImage};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Delegates to the real decoder and counts invocations.
    struct CountingDecoder(Arc<AtomicUsize>);

    impl Decoder for CountingDecoder {
        fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            ImageDecoder.decode(bytes)
        }
    }

    fn solid_png(w: u32, h: u32, color: Rgba<u8>) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, color);
        let mut buf = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    struct Trees {
        _dir: tempfile::TempDir,
        left: PathBuf,
        right: PathBuf,
    }

    fn trees() -> Trees {
        let dir = tempfile::tempdir().unwrap();
        let left = dir.path().join("left");
        let right = dir.path().join("right");
        std::fs::create_dir_all(&left).unwrap();
        std::fs::create_dir_all(&right).unwrap();
        Trees {
            _dir: dir,
            left,
            right,
        }
    }

    fn scorer(t: &Trees) -> (PairScorer, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let s = PairScorer::new(
            t.left.clone(),
            t.right.clone(),
            Box::new(CountingDecoder(calls.clone())),
        );
        (s, calls)
    }

    #[test]
    fn counterpart_swaps_root_prefix() {
        let t = trees();
        let (s, _) = scorer(&t);
        let p = s.counterpart(&t.left.join("a/b.png")).unwrap();
        assert_eq!(p, t.right.join("a/b.png"));
    }

    #[test]
    fn counterpart_rejects_paths_outside_root() {
        let t = trees();
        let (s, _) = scorer(&t);
        let err = s.counterpart(Path::new("/elsewhere/b.png")).unwrap_err();
        assert!(matches!(err, PairError::OutsideRoot { .. }));
    }

    #[test]
    fn dot_left_root_owns_relative_paths() {
        let s = PairScorer::new(PathBuf::from("."), PathBuf::from("/r"), Box::new(ImageDecoder));
        assert_eq!(s.counterpart(Path::new("a/b.png")).unwrap(), PathBuf::from("/r/a/b.png"));
        assert!(matches!(
            s.counterpart(Path::new("/abs/b.png")).unwrap_err(),
            PairError::OutsideRoot { .. }
        ));
    }

    // -- byte-identical fast path --

    #[test]
    fn identical_bytes_skip_decoding() {
        let t = trees();
        let png = solid_png(8, 8, Rgba([1, 2, 3, 255]));
        std::fs::write(t.left.join("a.png"), &png).unwrap();
        std::fs::write(t.right.join("a.png"), &png).unwrap();
        let (s, calls) = scorer(&t);
        let v = s.score(&t.left.join("a.png")).unwrap();
        assert!(matches!(v, Verdict::IdenticalBytes));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn identical_non_image_files_are_not_decoded() {
        let t = trees();
        std::fs::write(t.left.join("notes.txt"), "same").unwrap();
        std::fs::write(t.right.join("notes.txt"), "same").unwrap();
        let (s, calls) = scorer(&t);
        assert!(matches!(
            s.score(&t.left.join("notes.txt")).unwrap(),
            Verdict::IdenticalBytes
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    // -- failures --

    #[test]
    fn missing_right_file_is_missing_counterpart() {
        let t = trees();
        std::fs::write(t.left.join("only.png"), solid_png(1, 1, Rgba([0; 4]))).unwrap();
        let (s, calls) = scorer(&t);
        let err = s.score(&t.left.join("only.png")).unwrap_err();
        assert!(matches!(err, PairError::MissingCounterpart { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unreadable_right_path_is_missing_counterpart() {
        let t = trees();
        std::fs::write(t.left.join("a.png"), solid_png(1, 1, Rgba([0; 4]))).unwrap();
        std::fs::create_dir_all(t.right.join("a.png")).unwrap();
        let (s, calls) = scorer(&t);
        match s.score(&t.left.join("a.png")).unwrap_err() {
            PairError::MissingCounterpart { right, .. } => assert_eq!(right, t.right.join("a.png")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn undecodable_left_stops_before_right() {
        let t = trees();
        std::fs::write(t.left.join("x.png"), "not a png").unwrap();
        std::fs::write(t.right.join("x.png"), solid_png(1, 1, Rgba([0; 4]))).unwrap();
        let (s, calls) = scorer(&t);
        let err = s.score(&t.left.join("x.png")).unwrap_err();
        assert!(matches!(err, PairError::UndecodableLeft { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn undecodable_right_is_reported_with_right_path() {
        let t = trees();
        std::fs::write(t.left.join("x.png"), solid_png(1, 1, Rgba([0; 4]))).unwrap();
        std::fs::write(t.right.join("x.png"), "garbage").unwrap();
        let (s, _) = scorer(&t);
        match s.score(&t.left.join("x.png")).unwrap_err() {
            PairError::UndecodableRight { path, .. } => assert_eq!(path, t.right.join("x.png")),
            other => panic!("unexpected error: {other}"),
        }
    }

    // -- scoring --

    #[test]
    fn single_pixel_red_vs_black_scores_a_quarter() {
        let t = trees();
        std::fs::write(t.left.join("p.png"), solid_png(1, 1, Rgba([255, 0, 0, 255]))).unwrap();
        std::fs::write(t.right.join("p.png"), solid_png(1, 1, Rgba([0, 0, 0, 255]))).unwrap();
        let (s, calls) = scorer(&t);
        match s.score(&t.left.join("p.png")).unwrap() {
            Verdict::Compared(r) => {
                assert_eq!(r.score, 0.25);
                assert_eq!(r.right, t.right.join("p.png"));
                assert!(r.dimension_mismatch.is_none());
            }
            Verdict::IdenticalBytes => panic!("bytes differ"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dimension_mismatch_scores_infinity() {
        let a = DynamicImage::ImageRgba8(RgbaImage::new(2, 2));
        let b = DynamicImage::ImageRgba8(RgbaImage::new(2, 3));
        let (score, dims) = score_images(&a, &b);
        assert!(score.is_infinite() && score > 0.0);
        assert_eq!(dims, Some((2, 2, 2, 3)));
    }

    #[test]
    fn score_images_is_symmetric() {
        let a = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 3, Rgba([10, 20, 30, 40])));
        let b = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(3, 3, image::Rgb([200, 0, 5])));
        assert_eq!(score_images(&a, &b).0, score_images(&b, &a).0);
    }
}
