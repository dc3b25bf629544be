use gloo_net::http::Request;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    Fetch(String),
    Status(u16),
    Decode(String),
}

impl std::fmt::Display for AssetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetError::Fetch(msg) => write!(f, "asset request failed: {msg}"),
            AssetError::Status(code) => write!(f, "asset request returned HTTP {code}"),
            AssetError::Decode(msg) => write!(f, "asset is not a decodable PNG: {msg}"),
        }
    }
}

impl std::error::Error for AssetError {}

/// Tightly packed RGBA8 texels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedTexture {
    /// Opaque black 1x1, bound until the real blue noise arrives.
    pub fn placeholder() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![0, 0, 0, 255],
        }
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }
}

pub fn decode_png(bytes: &[u8]) -> Result<DecodedTexture, AssetError> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map_err(|e| AssetError::Decode(e.to_string()))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(AssetError::Decode("image has no texels".to_string()));
    }
    Ok(DecodedTexture {
        width,
        height,
        pixels: img.into_raw(),
    })
}

pub async fn fetch_blue_noise(url: &str) -> Result<DecodedTexture, AssetError> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| AssetError::Fetch(e.to_string()))?;
    if !resp.ok() {
        return Err(AssetError::Status(resp.status()));
    }
    let bytes = resp
        .binary()
        .await
        .map_err(|e| AssetError::Fetch(e.to_string()))?;
    decode_png(&bytes)
}

#[cfg(test)]
mod tests {
    use super::{AssetError, DecodedTexture, decode_png};
    use pretty_assertions::assert_eq;

    fn encode(img: &image::RgbaImage) -> Vec<u8> {
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_png_into_rgba_rows() {
        let img = image::RgbaImage::from_fn(3, 2, |x, y| image::Rgba([x as u8 * 10, y as u8, 7, 255]));
        let tex = decode_png(&encode(&img)).unwrap();
        assert_eq!((tex.width, tex.height), (3, 2));
        assert_eq!(tex.bytes_per_row(), 12);
        assert_eq!(&tex.pixels[4..8], &[10, 0, 7, 255]);
        assert_eq!(&tex.pixels[12..16], &[0, 1, 7, 255]);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            decode_png(b"definitely not a png"),
            Err(AssetError::Decode(_))
        ));
    }

    #[test]
    fn placeholder_is_opaque_black() {
        let p = DecodedTexture::placeholder();
        assert_eq!(p.pixels, vec![0, 0, 0, 255]);
        assert_eq!(p.bytes_per_row(), 4);
    }
}
