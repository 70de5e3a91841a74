//! Raster rendering of snapshots.
//!
//! Every render is a full redraw: background fill, chunk pass, then optionally
//! the background image followed by a second chunk pass so the image never
//! hides the chunks.

use std::collections::BTreeMap;
use std::f32::consts::FRAC_1_SQRT_2;
use std::fs;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use base64::Engine as _;
use tiny_skia::{
    Color, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};

use crate::*;

/// Source of background image bytes, the only asynchronous part of rendering.
pub trait ImageLoader {
    fn load(&self, uri: &str) -> impl Future<Output = Result<Vec<u8>, RenderError>>;
}

/// Reads local paths and `file://` URIs.
#[derive(Copy, Clone, Debug, Default)]
pub struct FsImageLoader;

impl ImageLoader for FsImageLoader {
    async fn load(&self, uri: &str) -> Result<Vec<u8>, RenderError> {
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        log::debug!("Loading background image from {:?}", path);
        fs::read(path).map_err(|source| RenderError::Load {
            uri: uri.to_string(),
            source,
        })
    }
}

/// Serves images registered up front, keyed by URI.
#[derive(Clone, Debug, Default)]
pub struct MemoryImageLoader {
    images: BTreeMap<String, Vec<u8>>,
}

impl MemoryImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uri: impl Into<String>, bytes: Vec<u8>) {
        self.images.insert(uri.into(), bytes);
    }
}

impl ImageLoader for MemoryImageLoader {
    async fn load(&self, uri: &str) -> Result<Vec<u8>, RenderError> {
        self.images
            .get(uri)
            .cloned()
            .ok_or_else(|| RenderError::Load {
                uri: uri.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no image registered"),
            })
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ImageFormat {
    #[default]
    Png,
}

impl ImageFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            _ => Err(RenderError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Draws snapshots with colors resolved once from the contest configuration.
#[derive(Clone, Debug)]
pub struct Renderer {
    width: u32,
    height: u32,
    background: Color,
    background_image: Option<String>,
    chunk: Color,
    checked: Color,
    prize_highlight: Color,
    marker: Color,
    marker_width: f32,
}

impl Renderer {
    pub fn new(config: &ContestConfig) -> Result<Self, ColorError> {
        let color = |s: &str| s.parse::<Rgba>().map(Rgba::to_skia);
        let palette = &config.palette;

        Ok(Self {
            width: config.size.width,
            height: config.size.height,
            background: color(config.background_color())?,
            background_image: config.background_image.clone(),
            chunk: color(palette.chunk.as_str())?,
            checked: color(palette.checked.as_str())?,
            prize_highlight: color(palette.prize_highlight.as_str())?,
            marker: color(palette.marker.as_str())?,
            marker_width: palette.marker_width,
        })
    }

    /// Redraws `snapshot` from scratch. Nothing outside the returned surface is
    /// touched, so a failure leaves the caller's state as it was.
    pub async fn render<L>(&self, snapshot: &Snapshot, loader: &L) -> Result<Pixmap, RenderError>
    where
        L: ImageLoader,
    {
        let mut surface = Pixmap::new(self.width, self.height).ok_or(RenderError::Surface {
            width: self.width,
            height: self.height,
        })?;

        surface.fill(self.background);
        self.draw_chunks(&mut surface, snapshot);

        if let Some(uri) = &self.background_image {
            let bytes = loader.load(uri).await?;
            let image =
                Pixmap::decode_png(&bytes).map_err(|err| RenderError::Decode(err.to_string()))?;
            self.draw_stretched(&mut surface, &image);
            self.draw_chunks(&mut surface, snapshot);
        }

        log::trace!("Rendered snapshot #{}", snapshot.sequence);
        Ok(surface)
    }

    pub async fn render_png<L>(
        &self,
        snapshot: &Snapshot,
        loader: &L,
    ) -> Result<Vec<u8>, RenderError>
    where
        L: ImageLoader,
    {
        encode_png(&self.render(snapshot, loader).await?)
    }

    fn draw_stretched(&self, surface: &mut Pixmap, image: &Pixmap) {
        let scale_x = self.width as f32 / image.width() as f32;
        let scale_y = self.height as f32 / image.height() as f32;
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        surface.draw_pixmap(
            0,
            0,
            image.as_ref(),
            &paint,
            Transform::from_scale(scale_x, scale_y),
            None,
        );
    }

    fn draw_chunks(&self, surface: &mut Pixmap, snapshot: &Snapshot) {
        for chunk in snapshot.chunks.iter() {
            self.draw_chunk(surface, chunk);
        }
    }

    fn draw_chunk(&self, surface: &mut Pixmap, chunk: &GameChunk) {
        let ChunkInfo { size, offset, .. } = chunk.info;
        let Some(rect) = Rect::from_xywh(offset.left, offset.top, size.width, size.height) else {
            return;
        };

        if !chunk.status.checked {
            fill(surface, rect, self.chunk);
            return;
        }

        fill(surface, rect, self.checked);
        if chunk.prize.is_some() {
            fill(surface, rect, self.prize_highlight);
            self.draw_circle(surface, &chunk.info);
        } else {
            self.draw_cross(surface, &chunk.info);
        }
    }

    fn draw_circle(&self, surface: &mut Pixmap, info: &ChunkInfo) {
        let (cx, cy) = center(info);
        let radius = 0.4 * info.size.min_side();
        if let Some(path) = PathBuilder::from_circle(cx, cy, radius) {
            self.stroke(surface, &path);
        }
    }

    fn draw_cross(&self, surface: &mut Pixmap, info: &ChunkInfo) {
        let (cx, cy) = center(info);
        let length = 0.5 * info.size.min_side();
        // half the marker length projected on each axis at 45 degrees
        let arm = 0.5 * length * FRAC_1_SQRT_2;

        let mut builder = PathBuilder::new();
        builder.move_to(cx - arm, cy - arm);
        builder.line_to(cx + arm, cy + arm);
        builder.move_to(cx - arm, cy + arm);
        builder.line_to(cx + arm, cy - arm);
        if let Some(path) = builder.finish() {
            self.stroke(surface, &path);
        }
    }

    fn stroke(&self, surface: &mut Pixmap, path: &tiny_skia::Path) {
        let mut paint = Paint::default();
        paint.set_color(self.marker);
        paint.anti_alias = true;
        let stroke = Stroke {
            width: self.marker_width,
            ..Stroke::default()
        };
        surface.stroke_path(path, &paint, &stroke, Transform::identity(), None);
    }
}

fn center(info: &ChunkInfo) -> (f32, f32) {
    (
        info.offset.left + 0.5 * info.size.width,
        info.offset.top + 0.5 * info.size.height,
    )
}

fn fill(surface: &mut Pixmap, rect: Rect, color: Color) {
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    surface.fill_rect(rect, &paint, Transform::identity(), None);
}

pub fn encode_png(surface: &Pixmap) -> Result<Vec<u8>, RenderError> {
    surface
        .encode_png()
        .map_err(|err| RenderError::Encode(err.to_string()))
}

pub fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Writes `{directory}/{name}.{ext}`, creating `directory` when missing.
pub fn write_image_file(
    directory: &Path,
    name: &str,
    format: ImageFormat,
    bytes: &[u8],
) -> Result<PathBuf, RenderError> {
    fs::create_dir_all(directory).map_err(|source| RenderError::Write {
        path: directory.to_path_buf(),
        source,
    })?;

    let path = directory.join(format!("{}.{}", name, format.extension()));
    fs::write(&path, bytes).map_err(|source| RenderError::Write {
        path: path.clone(),
        source,
    })?;
    log::info!("The {}.{} file was created", name, format.extension());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use futures_executor::block_on;
    use rand::{SeedableRng, rngs::SmallRng};
    use tiny_skia::PremultipliedColorU8;

    use super::*;

    const IMAGE_URI: &str = "memory://background.png";

    fn config() -> ContestConfig {
        ContestConfig::new(200, 100)
            .with_grid(4, 2)
            .with_prize(Prize::new(1), 1)
    }

    fn engine(config: &ContestConfig) -> RevealEngine {
        RevealEngine::generate(&config.layout(), &config.bank, &mut SmallRng::seed_from_u64(2))
            .unwrap()
    }

    fn pixel(surface: &Pixmap, x: f32, y: f32) -> PremultipliedColorU8 {
        surface.pixel(x as u32, y as u32).unwrap()
    }

    fn rgb(color: PremultipliedColorU8) -> (u8, u8, u8, u8) {
        (color.red(), color.green(), color.blue(), color.alpha())
    }

    fn solid_png(r: u8, g: u8, b: u8) -> Vec<u8> {
        let mut image = Pixmap::new(4, 4).unwrap();
        image.fill(Color::from_rgba8(r, g, b, 255));
        image.encode_png().unwrap()
    }

    #[test]
    fn draws_background_and_chunk_states() {
        let config = config();
        let mut engine = engine(&config);
        let prize_position = *engine.bank().entries()[0].assigned.first().unwrap();
        let plain_position = if prize_position == (0, 0) { (1, 0) } else { (0, 0) };
        engine.apply_steps([Step::new(1, prize_position), Step::new(2, plain_position)]);
        let snapshot = Snapshot::capture(1, engine.capture(), Vec::new());
        let renderer = Renderer::new(&config).unwrap();

        let surface = block_on(renderer.render(&snapshot, &FsImageLoader)).unwrap();

        assert_eq!(rgb(pixel(&surface, 2.0, 2.0)), (15, 15, 23, 255));

        let open = snapshot.chunks.iter().find(|chunk| chunk.is_open()).unwrap();
        let corner = open.info.offset;
        assert_eq!(
            rgb(pixel(&surface, corner.left + 2.0, corner.top + 2.0)),
            (162, 133, 218, 255)
        );

        let prize = snapshot.chunk_at(prize_position).unwrap().info.offset;
        assert_eq!(rgb(pixel(&surface, prize.left + 2.0, prize.top + 2.0)), (255, 255, 0, 255));

        let plain = snapshot.chunk_at(plain_position).unwrap().info;
        let plain_corner = rgb(pixel(&surface, plain.offset.left + 2.0, plain.offset.top + 2.0));
        assert_ne!(plain_corner, (162, 133, 218, 255));
        assert_ne!(plain_corner, (255, 255, 0, 255));
        let (cx, cy) = center(&plain);
        let (r, g, b, _) = rgb(pixel(&surface, cx, cy));
        assert!(r > 200 && g < 60 && b < 60, "cross center should be red");
    }

    #[test]
    fn rendering_is_deterministic() {
        let config = config();
        let mut engine = engine(&config);
        engine.apply_steps([Step::new(1, (0, 0)), Step::new(2, (3, 1))]);
        let snapshot = Snapshot::capture(1, engine.capture(), Vec::new());
        let renderer = Renderer::new(&config).unwrap();

        let first = block_on(renderer.render_png(&snapshot, &FsImageLoader)).unwrap();
        let second = block_on(renderer.render_png(&snapshot, &FsImageLoader)).unwrap();

        assert_eq!(first, second);
        assert!(first.starts_with(b"\x89PNG"));
    }

    #[test]
    fn background_image_is_drawn_under_chunks() {
        let mut config = config();
        config.background_image = Some(IMAGE_URI.into());
        let snapshot = Snapshot::capture(0, engine(&config).capture(), Vec::new());
        let renderer = Renderer::new(&config).unwrap();
        let mut loader = MemoryImageLoader::new();
        loader.insert(IMAGE_URI, solid_png(0, 200, 0));

        let surface = block_on(renderer.render(&snapshot, &loader)).unwrap();

        let (r, g, b, a) = rgb(pixel(&surface, 2.0, 2.0));
        assert!(r <= 2 && b <= 2 && g.abs_diff(200) <= 2 && a == 255);
        let corner = snapshot.chunk_at((0, 0)).unwrap().info.offset;
        assert_eq!(
            rgb(pixel(&surface, corner.left + 2.0, corner.top + 2.0)),
            (162, 133, 218, 255)
        );
    }

    #[test]
    fn background_failures_are_render_errors() {
        let mut config = config();
        config.background_image = Some(IMAGE_URI.into());
        let snapshot = Snapshot::capture(0, engine(&config).capture(), Vec::new());
        let renderer = Renderer::new(&config).unwrap();

        let missing = block_on(renderer.render(&snapshot, &MemoryImageLoader::new()));
        assert!(matches!(missing, Err(RenderError::Load { .. })));

        let mut loader = MemoryImageLoader::new();
        loader.insert(IMAGE_URI, b"not a png".to_vec());
        let garbage = block_on(renderer.render(&snapshot, &loader));
        assert!(matches!(garbage, Err(RenderError::Decode(_))));
    }

    #[test]
    fn fs_loader_reads_file_uris() {
        let directory =
            std::env::temp_dir().join(format!("chunkfall-loader-{}", std::process::id()));
        fs::create_dir_all(&directory).unwrap();
        let path = directory.join("bg.png");
        fs::write(&path, solid_png(1, 2, 3)).unwrap();

        let uri = format!("file://{}", path.display());
        let bytes = block_on(FsImageLoader.load(&uri)).unwrap();
        assert_eq!(bytes, solid_png(1, 2, 3));

        let missing = block_on(FsImageLoader.load("/definitely/not/here.png"));
        assert!(matches!(missing, Err(RenderError::Load { .. })));
        fs::remove_dir_all(&directory).unwrap();
    }

    #[test]
    fn image_format_parsing() {
        assert_eq!("PNG".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
        assert!(matches!(
            "gif".parse::<ImageFormat>(),
            Err(RenderError::UnsupportedFormat(format)) if format == "gif"
        ));
    }

    #[test]
    fn write_image_file_creates_directory() {
        let directory = std::env::temp_dir()
            .join(format!("chunkfall-write-{}", std::process::id()))
            .join("nested");

        let path = write_image_file(&directory, "first", ImageFormat::Png, b"data").unwrap();

        assert_eq!(path, directory.join("first.png"));
        assert_eq!(fs::read(&path).unwrap(), b"data");
        fs::remove_dir_all(directory.parent().unwrap()).unwrap();
    }

    #[test]
    fn renderer_reports_bad_palette_colors() {
        let mut config = config();
        config.palette.checked = "not-a-color".into();

        assert!(matches!(
            Renderer::new(&config),
            Err(ColorError::Invalid { input, .. }) if input == "not-a-color"
        ));
    }

    #[test]
    fn base64_uses_standard_alphabet() {
        assert_eq!(encode_base64(&[0xfb, 0xff]), "+/8=");
    }
}
