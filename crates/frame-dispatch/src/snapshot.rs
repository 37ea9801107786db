//! Peak snapshot encoding

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use measurement_session::Snapshot;

use crate::DispatchError;

pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Snapshot, DispatchError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).encode_image(image)?;
    Ok(Snapshot::jpeg(buf))
}
