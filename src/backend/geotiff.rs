//! Native GeoTIFF reading/writing (without GDAL dependency)
//!
//! Uses the `tiff` crate for TIFF I/O. Every band is written as its own page (IFD)
//! of single-sample grey pixels, georeferencing tags are repeated on each page and
//! read back from the first one. Pages with several samples per pixel, the way GDAL
//! stores pixel-interleaved multi-band files, are read as one band per sample.
//!
//! Files the `tiff` crate cannot decode, such as band-planar layouts, can be opened
//! with `GdalBackend` under the `gdal` feature.

use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};

use ndarray::{Array2, Array3, ArrayView2, Axis};
use num_traits::NumCast;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind, TiffValue};
use tiff::tags::Tag;
use tiff::TiffResult;
use tracing::debug;

use crate::backend::{check_band, check_band_dim, Backend, BackendDataset, OpenFlags};
use crate::errors::{Result, SkopeError};
use crate::geo_transform::GeoTransform;
use crate::raster::{GridShape, PixelType};
use crate::spatial_ref::WellKnownGeogCs;

const FORMAT: &str = "GTiff";
const DEFAULT_GEO_TRANSFORM: GeoTransform = [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GEO_ASCII_PARAMS: u16 = 34737;
const GDAL_NODATA: u16 = 42113;

const GT_MODEL_TYPE_KEY: u16 = 1024;
const GT_RASTER_TYPE_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/// Reads and writes GeoTIFF files natively.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffBackend;

impl GeoTiffBackend {
    pub fn new() -> Self {
        GeoTiffBackend
    }
}

impl Backend for GeoTiffBackend {
    type Dataset = GeoTiffDataset;

    fn name(&self) -> &'static str {
        "geotiff"
    }

    fn open(&self, path: &Path, flags: OpenFlags) -> Result<GeoTiffDataset> {
        if !self.exists(path) {
            return Err(SkopeError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path)?;
        let mut dataset = decode(path, BufReader::new(file))?;
        dataset.flags = flags;
        debug!(path = %path.display(), shape = ?dataset.shape(), "decoded GeoTIFF");
        Ok(dataset)
    }

    fn allocate(
        &self,
        path: &Path,
        format: &str,
        pixel_type: PixelType,
        shape: GridShape,
    ) -> Result<GeoTiffDataset> {
        if !format.eq_ignore_ascii_case(FORMAT) {
            return Err(SkopeError::UnsupportedFormat {
                format: format.to_string(),
                backend: self.name(),
            });
        }
        if shape.is_empty() {
            return Err(SkopeError::BadArgument(format!(
                "cannot allocate a dataset of shape {shape:?}"
            )));
        }
        let mut dataset = GeoTiffDataset {
            path: path.to_path_buf(),
            flags: OpenFlags::UPDATE,
            pixel_type,
            geo_transform: DEFAULT_GEO_TRANSFORM,
            coordinate_system: None,
            pixels: Array3::zeros((shape.bands, shape.rows, shape.cols)),
            no_data: vec![None; shape.bands],
            dirty: true,
        };
        dataset.commit()?;
        Ok(dataset)
    }
}

/// A GeoTIFF file decoded into memory.
///
/// Writes change the decoded copy; [`commit`](BackendDataset::commit) re-encodes the
/// whole file.
#[derive(Debug)]
pub struct GeoTiffDataset {
    path: PathBuf,
    flags: OpenFlags,
    pixel_type: PixelType,
    geo_transform: GeoTransform,
    coordinate_system: Option<WellKnownGeogCs>,
    pixels: Array3<f64>,
    no_data: Vec<Option<f64>>,
    dirty: bool,
}

impl GeoTiffDataset {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_writable(&self) -> Result<()> {
        if !self.flags.contains(OpenFlags::UPDATE) {
            return Err(SkopeError::ReadOnly {
                path: self.path.display().to_string(),
            });
        }
        Ok(())
    }

    /// Encodes the dataset as a complete GeoTIFF file.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        encode(self, Cursor::new(&mut buf))?;
        Ok(buf)
    }
}

impl BackendDataset for GeoTiffDataset {
    fn format(&self) -> &str {
        FORMAT
    }

    fn shape(&self) -> GridShape {
        self.pixels.dim().into()
    }

    fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    fn geo_transform(&self) -> Result<GeoTransform> {
        Ok(self.geo_transform)
    }

    fn set_geo_transform(&mut self, geo_transform: &GeoTransform) -> Result<()> {
        self.ensure_writable()?;
        self.geo_transform = *geo_transform;
        self.dirty = true;
        Ok(())
    }

    fn coordinate_system(&self) -> Result<Option<String>> {
        Ok(self.coordinate_system.map(|cs| cs.to_wkt()))
    }

    fn set_coordinate_system(&mut self, name: &str) -> Result<()> {
        self.ensure_writable()?;
        self.coordinate_system = Some(name.parse()?);
        self.dirty = true;
        Ok(())
    }

    fn read_all_bands(&self) -> Result<Array3<f64>> {
        Ok(self.pixels.clone())
    }

    fn read_band(&self, band: usize) -> Result<Array2<f64>> {
        check_band(band, self.shape())?;
        Ok(self.pixels.index_axis(Axis(0), band).to_owned())
    }

    fn write_band(&mut self, band: usize, data: &Array2<f64>) -> Result<()> {
        self.ensure_writable()?;
        check_band(band, self.shape())?;
        check_band_dim(data, self.shape())?;
        let pixel_type = self.pixel_type;
        self.pixels
            .index_axis_mut(Axis(0), band)
            .zip_mut_with(data, |stored, &v| *stored = pixel_type.quantize(v));
        self.dirty = true;
        Ok(())
    }

    fn no_data(&self, band: usize) -> Result<Option<f64>> {
        check_band(band, self.shape())?;
        Ok(self.no_data[band])
    }

    fn set_no_data(&mut self, band: usize, value: f64) -> Result<()> {
        self.ensure_writable()?;
        check_band(band, self.shape())?;
        self.no_data[band] = Some(value);
        self.dirty = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.ensure_writable()?;
        std::fs::write(&self.path, self.to_bytes()?)?;
        self.dirty = false;
        debug!(path = %self.path.display(), "wrote GeoTIFF");
        Ok(())
    }
}

trait OrInvalid<T> {
    fn or_invalid(self, path: &Path) -> Result<T>;
}

impl<T, E: Display> OrInvalid<T> for std::result::Result<T, E> {
    fn or_invalid(self, path: &Path) -> Result<T> {
        self.map_err(|e| invalid(path, e))
    }
}

fn invalid(path: &Path, msg: impl Display) -> SkopeError {
    SkopeError::InvalidFormat {
        path: path.to_path_buf(),
        msg: msg.to_string(),
    }
}

fn decode<R: Read + Seek>(path: &Path, reader: R) -> Result<GeoTiffDataset> {
    let mut decoder = Decoder::new(reader).or_invalid(path)?;

    let geo_transform = read_geo_transform(path, &mut decoder)?;
    let coordinate_system = read_coordinate_system(&mut decoder).or_invalid(path)?;

    let mut pixel_type: Option<PixelType> = None;
    let mut bands: Vec<Array2<f64>> = Vec::new();
    let mut no_data = Vec::new();
    loop {
        let (width, height) = decoder.dimensions().or_invalid(path)?;
        let (rows, cols) = (height as usize, width as usize);
        let page_no_data = read_no_data(&mut decoder).or_invalid(path)?;

        let image = decoder.read_image().or_invalid(path)?;
        let (page_type, samples) =
            widen(image).ok_or_else(|| invalid(path, "unsupported sample type"))?;
        if *pixel_type.get_or_insert(page_type) != page_type {
            return Err(invalid(path, "bands have different sample types"));
        }
        let pixel_count = rows * cols;
        if pixel_count == 0 || samples.is_empty() || samples.len() % pixel_count != 0 {
            return Err(invalid(path, "sample count does not match the page dimensions"));
        }

        // pixel-interleaved: sample `s` of every pixel belongs to band `s`
        let samples_per_pixel = samples.len() / pixel_count;
        let page = Array3::from_shape_vec((rows, cols, samples_per_pixel), samples)?;
        for band in page.axis_iter(Axis(2)) {
            if let Some(first) = bands.first() {
                if first.dim() != band.dim() {
                    return Err(invalid(path, "bands have different dimensions"));
                }
            }
            bands.push(band.to_owned());
            no_data.push(page_no_data);
        }

        if !decoder.more_images() {
            break;
        }
        decoder.next_image().or_invalid(path)?;
    }

    let views: Vec<ArrayView2<f64>> = bands.iter().map(|band| band.view()).collect();
    let pixels = ndarray::stack(Axis(0), &views)?;

    Ok(GeoTiffDataset {
        path: path.to_path_buf(),
        flags: OpenFlags::READ_ONLY,
        pixel_type: pixel_type.unwrap_or(PixelType::Byte),
        geo_transform,
        coordinate_system,
        pixels,
        no_data,
        dirty: false,
    })
}

fn widen(result: DecodingResult) -> Option<(PixelType, Vec<f64>)> {
    fn to_f64<T: Into<f64>>(buf: Vec<T>) -> Vec<f64> {
        buf.into_iter().map(Into::into).collect()
    }
    Some(match result {
        DecodingResult::U8(buf) => (PixelType::Byte, to_f64(buf)),
        DecodingResult::U16(buf) => (PixelType::UInt16, to_f64(buf)),
        DecodingResult::I16(buf) => (PixelType::Int16, to_f64(buf)),
        DecodingResult::U32(buf) => (PixelType::UInt32, to_f64(buf)),
        DecodingResult::I32(buf) => (PixelType::Int32, to_f64(buf)),
        DecodingResult::F32(buf) => (PixelType::Float32, to_f64(buf)),
        DecodingResult::F64(buf) => (PixelType::Float64, buf),
        _ => return None,
    })
}

fn read_geo_transform<R: Read + Seek>(
    path: &Path,
    decoder: &mut Decoder<R>,
) -> Result<GeoTransform> {
    if let Some(value) = decoder.find_tag(tag(MODEL_TRANSFORMATION)).or_invalid(path)? {
        let m = value.into_f64_vec().or_invalid(path)?;
        if m.len() < 8 {
            return Err(invalid(path, "short ModelTransformation tag"));
        }
        return Ok([m[3], m[0], m[1], m[7], m[4], m[5]]);
    }

    let scale = decoder.find_tag(tag(MODEL_PIXEL_SCALE)).or_invalid(path)?;
    let tiepoint = decoder.find_tag(tag(MODEL_TIEPOINT)).or_invalid(path)?;
    match (scale, tiepoint) {
        (Some(scale), Some(tiepoint)) => {
            let scale = scale.into_f64_vec().or_invalid(path)?;
            let tiepoint = tiepoint.into_f64_vec().or_invalid(path)?;
            if scale.len() < 2 || tiepoint.len() < 6 {
                return Err(invalid(path, "short georeferencing tags"));
            }
            // tiepoint: [I, J, K, X, Y, Z]
            let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
            let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
            Ok([origin_x, scale[0], 0.0, origin_y, 0.0, -scale[1]])
        }
        _ => Ok(DEFAULT_GEO_TRANSFORM),
    }
}

fn read_coordinate_system<R: Read + Seek>(
    decoder: &mut Decoder<R>,
) -> TiffResult<Option<WellKnownGeogCs>> {
    let Some(directory) = decoder.find_tag(tag(GEO_KEY_DIRECTORY))? else {
        return Ok(None);
    };
    let keys = directory.into_u16_vec()?;
    // header is [version, revision, minor, count], then one [key, location, count, value] per key
    let code = keys
        .chunks_exact(4)
        .skip(1)
        .find(|entry| entry[0] == GEOGRAPHIC_TYPE_KEY && entry[1] == 0)
        .map(|entry| entry[3]);
    Ok(code.and_then(|code| WellKnownGeogCs::from_epsg(code).ok()))
}

fn read_no_data<R: Read + Seek>(decoder: &mut Decoder<R>) -> TiffResult<Option<f64>> {
    let Some(value) = decoder.find_tag(tag(GDAL_NODATA))? else {
        return Ok(None);
    };
    let text = value.into_string()?;
    Ok(text.trim_end_matches('\0').trim().parse::<f64>().ok())
}

fn encode<W: Write + Seek>(dataset: &GeoTiffDataset, writer: W) -> Result<()> {
    let mut encoder = TiffEncoder::new(writer)?;
    for (band, pixels) in dataset.pixels.axis_iter(Axis(0)).enumerate() {
        let enc = &mut encoder;
        let no_data = dataset.no_data[band];
        match dataset.pixel_type {
            PixelType::Byte => write_page::<_, colortype::Gray8>(enc, dataset, pixels, no_data)?,
            PixelType::UInt16 => {
                write_page::<_, colortype::Gray16>(enc, dataset, pixels, no_data)?
            }
            PixelType::Int16 => {
                write_page::<_, colortype::GrayI16>(enc, dataset, pixels, no_data)?
            }
            PixelType::UInt32 => {
                write_page::<_, colortype::Gray32>(enc, dataset, pixels, no_data)?
            }
            PixelType::Int32 => {
                write_page::<_, colortype::GrayI32>(enc, dataset, pixels, no_data)?
            }
            PixelType::Float32 => {
                write_page::<_, colortype::Gray32Float>(enc, dataset, pixels, no_data)?
            }
            PixelType::Float64 => {
                write_page::<_, colortype::Gray64Float>(enc, dataset, pixels, no_data)?
            }
        }
    }
    Ok(())
}

fn write_page<W, C>(
    encoder: &mut TiffEncoder<W>,
    dataset: &GeoTiffDataset,
    pixels: ArrayView2<f64>,
    no_data: Option<f64>,
) -> Result<()>
where
    W: Write + Seek,
    C: ColorType,
    C::Inner: NumCast,
    [C::Inner]: TiffValue,
{
    let (rows, cols) = pixels.dim();
    let data = pixels
        .iter()
        .map(|&v| {
            num_traits::cast::<f64, C::Inner>(v).ok_or_else(|| {
                SkopeError::BadArgument(format!("value {v} does not fit {}", dataset.pixel_type))
            })
        })
        .collect::<Result<Vec<C::Inner>>>()?;

    let mut image = encoder.new_image::<C>(cols as u32, rows as u32)?;
    write_geo_tags(image.encoder(), dataset)?;
    if let Some(no_data) = no_data {
        image
            .encoder()
            .write_tag(tag(GDAL_NODATA), no_data.to_string().as_str())?;
    }
    image.write_data(&data)?;
    Ok(())
}

fn write_geo_tags<W: Write + Seek, K: TiffKind>(
    dir: &mut DirectoryEncoder<W, K>,
    dataset: &GeoTiffDataset,
) -> Result<()> {
    let gt = &dataset.geo_transform;
    if gt[2] == 0.0 && gt[4] == 0.0 {
        let scale = [gt[1], -gt[5], 0.0];
        dir.write_tag(tag(MODEL_PIXEL_SCALE), &scale[..])?;
        let tiepoint = [0.0, 0.0, 0.0, gt[0], gt[3], 0.0];
        dir.write_tag(tag(MODEL_TIEPOINT), &tiepoint[..])?;
    } else {
        let matrix = [
            gt[1], gt[2], 0.0, gt[0], //
            gt[4], gt[5], 0.0, gt[3], //
            0.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ];
        dir.write_tag(tag(MODEL_TRANSFORMATION), &matrix[..])?;
    }

    let mut geo_keys: Vec<u16> = vec![1, 1, 0, 0];
    if let Some(cs) = dataset.coordinate_system {
        geo_keys.extend_from_slice(&[GT_MODEL_TYPE_KEY, 0, 1, MODEL_TYPE_GEOGRAPHIC]);
        geo_keys.extend_from_slice(&[GT_RASTER_TYPE_KEY, 0, 1, RASTER_PIXEL_IS_AREA]);
        geo_keys.extend_from_slice(&[GEOGRAPHIC_TYPE_KEY, 0, 1, cs.epsg()]);
    } else {
        geo_keys.extend_from_slice(&[GT_RASTER_TYPE_KEY, 0, 1, RASTER_PIXEL_IS_AREA]);
    }
    geo_keys[3] = (geo_keys.len() / 4 - 1) as u16;
    dir.write_tag(tag(GEO_KEY_DIRECTORY), &geo_keys[..])?;
    if let Some(cs) = dataset.coordinate_system {
        dir.write_tag(tag(GEO_ASCII_PARAMS), format!("{}|", cs.name()).as_str())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TempFixture;
    use ndarray::arr2;

    fn allocate(fixture: &TempFixture, pixel_type: PixelType) -> GeoTiffDataset {
        GeoTiffBackend
            .allocate(fixture.path(), "GTiff", pixel_type, GridShape::new(3, 2, 2))
            .unwrap()
    }

    #[test]
    fn test_allocate_writes_file() {
        let fixture = TempFixture::empty("allocated.tif");
        let dataset = allocate(&fixture, PixelType::Float32);
        assert!(fixture.path().is_file());
        assert_eq!(dataset.format(), "GTiff");

        let reopened = GeoTiffBackend
            .open(fixture.path(), OpenFlags::READ_ONLY)
            .unwrap();
        assert_eq!(reopened.shape(), GridShape::new(3, 2, 2));
        assert_eq!(reopened.pixel_type(), PixelType::Float32);
        assert_eq!(reopened.geo_transform().unwrap(), DEFAULT_GEO_TRANSFORM);
        assert_eq!(reopened.coordinate_system().unwrap(), None);
        assert!(reopened.read_all_bands().unwrap().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_metadata_round_trip() {
        let fixture = TempFixture::empty("metadata.tif");
        let mut dataset = allocate(&fixture, PixelType::Int16);
        dataset
            .set_geo_transform(&[-123.0, 1.0, 0.0, 45.0, 0.0, -2.0])
            .unwrap();
        dataset.set_coordinate_system("WGS84").unwrap();
        dataset.set_no_data(2, -9999.0).unwrap();
        dataset.commit().unwrap();

        let reopened = GeoTiffBackend
            .open(fixture.path(), OpenFlags::READ_ONLY)
            .unwrap();
        assert_eq!(
            reopened.geo_transform().unwrap(),
            [-123.0, 1.0, 0.0, 45.0, 0.0, -2.0]
        );
        assert_eq!(reopened.pixel_type(), PixelType::Int16);
        let wkt = reopened.coordinate_system().unwrap().unwrap();
        assert_eq!(&wkt[8..14], "WGS 84");
        assert_eq!(reopened.no_data(0).unwrap(), None);
        assert_eq!(reopened.no_data(2).unwrap(), Some(-9999.0));
    }

    #[test]
    fn test_rotated_transform_round_trip() {
        let fixture = TempFixture::empty("rotated.tif");
        let mut dataset = allocate(&fixture, PixelType::Byte);
        let gt = [10.0, 2.0, 0.5, 20.0, 0.25, -3.0];
        dataset.set_geo_transform(&gt).unwrap();
        dataset.commit().unwrap();

        let reopened = GeoTiffBackend
            .open(fixture.path(), OpenFlags::READ_ONLY)
            .unwrap();
        assert_eq!(reopened.geo_transform().unwrap(), gt);
    }

    #[test]
    fn test_band_round_trip() {
        let fixture = TempFixture::empty("bands.tif");
        let mut dataset = allocate(&fixture, PixelType::UInt16);
        dataset
            .write_band(1, &arr2(&[[1.0, 2.0], [3.4, 70000.0]]))
            .unwrap();
        dataset.commit().unwrap();

        let reopened = GeoTiffBackend
            .open(fixture.path(), OpenFlags::READ_ONLY)
            .unwrap();
        assert_eq!(
            reopened.read_band(1).unwrap(),
            arr2(&[[1.0, 2.0], [3.0, 65535.0]])
        );
        assert_eq!(reopened.read_band(0).unwrap(), Array2::<f64>::zeros((2, 2)));
    }

    #[test]
    fn test_pixel_interleaved_page() {
        let fixture = TempFixture::empty("interleaved.tif");
        {
            let file = File::create(fixture.path()).unwrap();
            let mut encoder = TiffEncoder::new(file).unwrap();
            let mut image = encoder.new_image::<colortype::RGB8>(2, 2).unwrap();
            image
                .encoder()
                .write_tag(tag(MODEL_PIXEL_SCALE), &[1.0, 1.0, 0.0][..])
                .unwrap();
            image
                .encoder()
                .write_tag(tag(MODEL_TIEPOINT), &[0.0, 0.0, 0.0, -123.0, 45.0, 0.0][..])
                .unwrap();
            // row-major pixels, three samples each
            let data: [u8; 12] = [1, 11, 21, 2, 12, 22, 3, 13, 23, 4, 14, 24];
            image.write_data(&data).unwrap();
        }

        let dataset = GeoTiffBackend
            .open(fixture.path(), OpenFlags::READ_ONLY)
            .unwrap();
        assert_eq!(dataset.shape(), GridShape::new(3, 2, 2));
        assert_eq!(dataset.pixel_type(), PixelType::Byte);
        assert_eq!(dataset.read_band(0).unwrap(), arr2(&[[1.0, 2.0], [3.0, 4.0]]));
        assert_eq!(
            dataset.read_band(2).unwrap(),
            arr2(&[[21.0, 22.0], [23.0, 24.0]])
        );
        assert_eq!(dataset.no_data(1).unwrap(), None);

        let grid = crate::RasterGrid::open_path(GeoTiffBackend, fixture.path()).unwrap();
        assert_eq!(
            grid.series_at_pixel(0, 0, None, None).unwrap(),
            vec![1.0, 11.0, 21.0]
        );
        assert_eq!(
            grid.series_at_point(-121.5, 43.5, Some(1), None).unwrap(),
            vec![14.0, 24.0]
        );
    }

    #[test]
    fn test_open_missing_file() {
        let fixture = TempFixture::empty("missing.tif");
        let result = GeoTiffBackend.open(fixture.path(), OpenFlags::READ_ONLY);
        assert!(matches!(result, Err(SkopeError::NotFound { .. })));
    }

    #[test]
    fn test_open_empty_file() {
        let fixture = TempFixture::empty("empty.txt");
        std::fs::write(fixture.path(), b"").unwrap();
        let result = GeoTiffBackend.open(fixture.path(), OpenFlags::READ_ONLY);
        assert!(matches!(result, Err(SkopeError::InvalidFormat { .. })));
    }

    #[test]
    fn test_open_text_file() {
        let fixture = TempFixture::empty("notes.txt");
        std::fs::write(fixture.path(), b"not a raster").unwrap();
        let result = GeoTiffBackend.open(fixture.path(), OpenFlags::READ_ONLY);
        assert!(matches!(result, Err(SkopeError::InvalidFormat { .. })));
    }

    #[test]
    fn test_read_only_refuses_writes() {
        let fixture = TempFixture::empty("read_only.tif");
        allocate(&fixture, PixelType::Byte);
        let mut dataset = GeoTiffBackend
            .open(fixture.path(), OpenFlags::READ_ONLY)
            .unwrap();
        assert!(matches!(
            dataset.write_band(0, &Array2::zeros((2, 2))),
            Err(SkopeError::ReadOnly { .. })
        ));
        // nothing changed, so there is nothing to write
        assert!(dataset.commit().is_ok());
    }

    #[test]
    fn test_unsupported_format() {
        let fixture = TempFixture::empty("grid.nc");
        let result = GeoTiffBackend.allocate(
            fixture.path(),
            "netCDF",
            PixelType::Float32,
            GridShape::new(1, 1, 1),
        );
        assert!(matches!(
            result,
            Err(SkopeError::UnsupportedFormat { backend: "geotiff", .. })
        ));
        assert!(!fixture.path().exists());
    }
}
