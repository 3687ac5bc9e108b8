//! # Output Module
//!
//! Writes rendered frames to disk or streams them to TEV (The EXR Viewer).
//!
//! Rendered images already hold tone-mapped, gamma-encoded colors in [0, 1],
//! so PNG export only quantizes, and EXR export stores the same values as f32.

use std::net::TcpStream;
use std::path::Path;

use exr::prelude::write_rgb_file;
use image::{ImageBuffer, Rgb, Rgb32FImage};
use log::{debug, info, warn};
use tev_client::{PacketCreateImage, PacketUpdateImage, TevClient};

const TEV_IMAGE_NAME: &str = "chromamarch_output";
const TEV_DEFAULT_PORT: u16 = 14158;

/// Image file formats understood by [`save_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Exr,
}

impl OutputFormat {
    /// Pick a format from the file extension, case-insensitively.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "exr" => Some(Self::Exr),
            _ => None,
        }
    }
}

/// Save `image` in the given format. Failures are logged, not returned.
pub fn save_image(image: &Rgb32FImage, output_path: &str, format: OutputFormat) {
    match format {
        OutputFormat::Png => save_image_as_png(image, output_path),
        OutputFormat::Exr => save_image_as_exr(image, output_path),
    }
}

/// Append the default TEV port when `address` has none.
fn tev_address_with_port(address: &str) -> String {
    if address.contains(':') {
        address.to_string()
    } else {
        format!("{}:{}", address, TEV_DEFAULT_PORT)
    }
}

/// Convert interleaved RGB (RGBRGB...) into planar (RRR...GGG...BBB...).
fn planar_channels(image: &Rgb32FImage) -> Vec<f32> {
    let mut data = Vec::with_capacity(image.as_raw().len());
    for channel in 0..3 {
        data.extend(image.pixels().map(|p| p[channel]));
    }
    data
}

/// Send an f32 RGB image to TEV for real-time visualization.
///
/// `tev_address` is `host:port` or just `host`, in which case port 14158 is used.
pub fn send_image_to_tev(image: &Rgb32FImage, tev_address: &str) {
    let tev_address = tev_address_with_port(tev_address);
    let (width, height) = image.dimensions();

    debug!("Attempting to connect to TEV at {}", tev_address);
    let stream = match TcpStream::connect(&tev_address) {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Failed to connect to TEV on {}: {}", tev_address, e);
            return;
        }
    };
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Failed to set TCP_NODELAY: {}", e);
    }
    let mut client = TevClient::wrap(stream);

    let create_packet = PacketCreateImage {
        image_name: TEV_IMAGE_NAME,
        width,
        height,
        channel_names: &["R", "G", "B"],
        grab_focus: true,
    };
    if let Err(e) = client.send(create_packet) {
        warn!("Failed to create image in TEV: {}", e);
        return;
    }

    let data = planar_channels(image);
    let plane = u64::from(width) * u64::from(height);
    debug!("Sending {} pixels to TEV ({:.1} MB)", plane, data.len() as f32 * 4.0 / 1_000_000.0);
    let start_time = std::time::Instant::now();

    let update_packet = PacketUpdateImage {
        image_name: TEV_IMAGE_NAME,
        grab_focus: false,
        channel_names: &["R", "G", "B"],
        x: 0,
        y: 0,
        width,
        height,
        channel_offsets: &[0, plane, 2 * plane],
        channel_strides: &[1, 1, 1],
        data: &data,
    };
    match client.send(update_packet) {
        Ok(_) => info!("Image sent to TEV at {} in {:.2?}", tev_address, start_time.elapsed()),
        Err(e) => warn!("Failed to send image data to TEV: {}", e),
    }
}

/// Quantize display colors in [0, 1] to 8 bits.
pub fn to_rgb8(image: &Rgb32FImage) -> ImageBuffer<Rgb<u8>, Vec<u8>> {
    ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        let pixel = image.get_pixel(x, y);
        let quantize = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgb([quantize(pixel[0]), quantize(pixel[1]), quantize(pixel[2])])
    })
}

/// Save an f32 RGB image as an 8-bit PNG.
pub fn save_image_as_png(image: &Rgb32FImage, output_path: &str) {
    match to_rgb8(image).save(output_path) {
        Ok(_) => info!("Image saved as {}", output_path),
        Err(e) => warn!("Failed to save image: {}", e),
    }
}

/// Save an f32 RGB image as EXR with full float precision.
pub fn save_image_as_exr(image: &Rgb32FImage, output_path: &str) {
    let result = write_rgb_file(output_path, image.width() as usize, image.height() as usize, |x, y| {
        let p = image.get_pixel(x as u32, y as u32);
        (p[0], p[1], p[2])
    });

    match result {
        Ok(_) => info!("Image saved as EXR: {}", output_path),
        Err(e) => warn!("Failed to save EXR image: {}", e),
    }
}
