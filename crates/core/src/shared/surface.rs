use image::RgbaImage;
use ndarray::ArrayView3;

/// Bytes per pixel. Surfaces are always RGBA.
pub const CHANNELS: usize = 4;

/// An in-memory RGBA pixel buffer: contiguous bytes in row-major order.
///
/// Decoding and encoding happen at the edges only; effects and detectors
/// see nothing but the raw channel bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelSurface {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelSurface {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 4"
        );
        Self {
            data,
            width,
            height,
        }
    }

    /// A fully transparent black surface.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(
            vec![0u8; (width as usize) * (height as usize) * CHANNELS],
            width,
            height,
        )
    }

    /// Decode encoded image bytes (PNG, JPEG, ...) into a fresh surface.
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(Self::from(decoded.to_rgba8()))
    }

    /// Copy the pixels into an `RgbaImage` for encoding.
    ///
    /// Returns `None` when the buffer does not match the dimensions.
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total pixel count, as used for relative-area checks.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// True when the surface has a non-empty backing store matching its size.
    pub fn is_drawable(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == (self.width as usize) * (self.height as usize) * CHANNELS
    }

    /// RGBA channels of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y as usize) * (self.width as usize) + x as usize) * CHANNELS;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let idx = ((y as usize) * (self.width as usize) + x as usize) * CHANNELS;
        self.data[idx..idx + CHANNELS].copy_from_slice(&rgba);
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("surface data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, CHANNELS)
    }
}

impl From<RgbaImage> for PixelSurface {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height)
    }
}
