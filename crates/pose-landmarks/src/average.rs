//! Frame averaging for static captures

use crate::frame::{Landmark, LandmarkFrame};

/// Average landmarks index-by-index across frames
///
/// Each of x, y, z and visibility is the plain arithmetic mean over the frames
/// holding that index; visibility does not weight the average. The output has
/// as many landmarks as the longest input frame. Returns `None` for no frames.
pub fn average_frames<'a, I>(frames: I) -> Option<LandmarkFrame>
where
    I: IntoIterator<Item = &'a LandmarkFrame>,
{
    let mut sums: Vec<(Landmark, usize)> = Vec::new();
    let mut frame_count = 0usize;

    for frame in frames {
        frame_count += 1;
        if sums.len() < frame.len() {
            sums.resize(frame.len(), (Landmark::new(0.0, 0.0, 0.0, 0.0), 0));
        }
        for (slot, lm) in sums.iter_mut().zip(&frame.landmarks) {
            slot.0.x += lm.x;
            slot.0.y += lm.y;
            slot.0.z += lm.z;
            slot.0.visibility += lm.visibility;
            slot.1 += 1;
        }
    }

    if frame_count == 0 {
        return None;
    }

    let landmarks = sums
        .into_iter()
        .map(|(sum, count)| {
            let n = count.max(1) as f64;
            Landmark::new(sum.x / n, sum.y / n, sum.z / n, sum.visibility / n)
        })
        .collect();

    Some(LandmarkFrame::new(landmarks))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_none() {
        let frames: Vec<LandmarkFrame> = vec![];
        assert!(average_frames(&frames).is_none());
    }

    #[test]
    fn test_mean_of_each_component() {
        let frames = vec![
            LandmarkFrame::new(vec![Landmark::new(0.2, 0.4, -0.2, 1.0)]),
            LandmarkFrame::new(vec![Landmark::new(0.4, 0.6, 0.2, 0.5)]),
        ];
        let avg = average_frames(&frames).unwrap();
        let lm = avg.get(0).unwrap();
        assert!((lm.x - 0.3).abs() < 1e-12);
        assert!((lm.y - 0.5).abs() < 1e-12);
        assert!(lm.z.abs() < 1e-12);
        assert!((lm.visibility - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_short_frames_average_over_present_samples() {
        let frames = vec![
            LandmarkFrame::new(vec![Landmark::visible(0.1, 0.1), Landmark::visible(0.8, 0.8)]),
            LandmarkFrame::new(vec![Landmark::visible(0.3, 0.3)]),
        ];
        let avg = average_frames(&frames).unwrap();
        assert_eq!(avg.len(), 2);
        assert!((avg.get(0).unwrap().x - 0.2).abs() < 1e-12);
        assert!((avg.get(1).unwrap().x - 0.8).abs() < 1e-12);
    }
}
