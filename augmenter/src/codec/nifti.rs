//! NIfTI-1 single-file volumes, plain (`.nii`) or gzip compressed (`.nii.gz`).
//!
//! Voxels are decoded to f32 with the header's intensity scaling applied.
//! Arrays use numpy axis order, so a volume with `dim = [x, y, z]` becomes a
//! `[z, y, x]` array. [`SpatialMetadata`] uses the LPS convention while NIfTI
//! stores RAS affines, so the first two world axes change sign on the way in
//! and out.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use burn::tensor::TensorData;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use flate2::{read::MultiGzDecoder, write::GzEncoder, Compression};

use super::{has_extension, DecodedVolume, VolumeCodec};
use crate::{
    error::{AugmentError, AugmentResult},
    volume::SpatialMetadata,
};

const HEADER_SIZE: usize = 348;
/// Header plus the 4-byte extension flag.
const DATA_OFFSET: usize = 352;
const SPATIAL_AXES: usize = 3;
const LPS: [f64; SPATIAL_AXES] = [-1.0, -1.0, 1.0];
const UNITS_MM: u8 = 2;
const SFORM_SCANNER: i16 = 1;

/// NIfTI-1 header field byte offsets.
mod offsets {
    pub const DIM: usize = 40;
    pub const DATATYPE: usize = 70;
    pub const BITPIX: usize = 72;
    pub const PIXDIM: usize = 76;
    pub const VOX_OFFSET: usize = 108;
    pub const SCL_SLOPE: usize = 112;
    pub const SCL_INTER: usize = 116;
    pub const XYZT_UNITS: usize = 123;
    pub const QFORM_CODE: usize = 252;
    pub const SFORM_CODE: usize = 254;
    pub const QUATERN_B: usize = 256;
    pub const QOFFSET_X: usize = 268;
    pub const SROW_X: usize = 280;
    pub const MAGIC: usize = 344;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Datatype {
    UInt8,
    Int8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
}

impl Datatype {
    const fn from_code(code: i16) -> Option<Self> {
        match code {
            2 => Some(Self::UInt8),
            4 => Some(Self::Int16),
            8 => Some(Self::Int32),
            16 => Some(Self::Float32),
            64 => Some(Self::Float64),
            256 => Some(Self::Int8),
            512 => Some(Self::UInt16),
            768 => Some(Self::UInt32),
            _ => None,
        }
    }

    const fn byte_size(self) -> usize {
        match self {
            Self::UInt8 | Self::Int8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    fn decode<E: ByteOrder>(self, raw: &[u8]) -> f64 {
        match self {
            Self::UInt8 => f64::from(raw[0]),
            Self::Int8 => f64::from(i8::from_ne_bytes([raw[0]])),
            Self::Int16 => f64::from(E::read_i16(raw)),
            Self::UInt16 => f64::from(E::read_u16(raw)),
            Self::Int32 => f64::from(E::read_i32(raw)),
            Self::UInt32 => f64::from(E::read_u32(raw)),
            Self::Float32 => f64::from(E::read_f32(raw)),
            Self::Float64 => E::read_f64(raw),
        }
    }
}

/// The header fields the codec needs.
#[derive(Debug, Clone)]
struct Header {
    /// Extent per axis, fastest first, trailing unit axes past the third dropped.
    dims: Vec<usize>,
    datatype: Datatype,
    vox_offset: usize,
    slope: f64,
    inter: f64,
    /// First three rows of the voxel to world (RAS) affine.
    affine: [[f64; 4]; SPATIAL_AXES],
    little_endian: bool,
}

impl Header {
    fn parse(bytes: &[u8]) -> Result<Self, String> {
        if bytes.len() < HEADER_SIZE {
            return Err(format!("header needs {HEADER_SIZE} bytes, got {}", bytes.len()));
        }
        let expected = HEADER_SIZE as i32;
        if LittleEndian::read_i32(&bytes[0..4]) == expected {
            Self::parse_as::<LittleEndian>(bytes, true)
        } else if BigEndian::read_i32(&bytes[0..4]) == expected {
            Self::parse_as::<BigEndian>(bytes, false)
        } else {
            Err("not a NIfTI-1 header".into())
        }
    }

    #[allow(clippy::wildcard_imports)]
    fn parse_as<E: ByteOrder>(bytes: &[u8], little_endian: bool) -> Result<Self, String> {
        use offsets::*;

        match &bytes[MAGIC..MAGIC + 4] {
            b"n+1\0" => {}
            b"ni1\0" => return Err("separate .hdr/.img pairs are not supported".into()),
            magic => return Err(format!("unexpected magic {magic:?}")),
        }

        let read_i16 = |offset: usize| E::read_i16(&bytes[offset..offset + 2]);
        let read_f32 = |offset: usize| f64::from(E::read_f32(&bytes[offset..offset + 4]));

        let ndim = usize::try_from(read_i16(DIM))
            .ok()
            .filter(|n| (1..=7).contains(n))
            .ok_or_else(|| format!("dim[0] must be in 1..=7, got {}", read_i16(DIM)))?;
        let mut dims = (1..=ndim)
            .map(|i| {
                usize::try_from(read_i16(DIM + 2 * i))
                    .ok()
                    .filter(|&extent| extent > 0)
                    .ok_or_else(|| format!("dim[{i}] must be positive, got {}", read_i16(DIM + 2 * i)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        while dims.len() > SPATIAL_AXES && dims.last() == Some(&1) {
            dims.pop();
        }
        if dims.len() > SPATIAL_AXES {
            return Err(format!("only volumes with up to 3 axes are supported, got {dims:?}"));
        }

        let code = read_i16(DATATYPE);
        let datatype = Datatype::from_code(code).ok_or_else(|| format!("unsupported datatype {code}"))?;
        let bitpix = read_i16(BITPIX);
        if usize::try_from(bitpix).ok() != Some(datatype.byte_size() * 8) {
            return Err(format!("bitpix {bitpix} does not match datatype {datatype:?}"));
        }

        let vox_offset = read_f32(VOX_OFFSET);
        if !vox_offset.is_finite() || vox_offset.fract() != 0.0 || vox_offset < HEADER_SIZE as f64 {
            return Err(format!("invalid vox_offset {vox_offset}"));
        }

        let pixdim: [f64; 8] = std::array::from_fn(|i| read_f32(PIXDIM + 4 * i));
        let affine = if read_i16(SFORM_CODE) > 0 {
            std::array::from_fn(|row| std::array::from_fn(move |col| read_f32(SROW_X + 16 * row + 4 * col)))
        } else if read_i16(QFORM_CODE) > 0 {
            let quatern = [QUATERN_B, QUATERN_B + 4, QUATERN_B + 8].map(read_f32);
            let offset = [QOFFSET_X, QOFFSET_X + 4, QOFFSET_X + 8].map(read_f32);
            qform_affine(quatern, offset, &pixdim)
        } else {
            std::array::from_fn(|row| {
                let mut values = [0.0; 4];
                values[row] = positive_or_one(pixdim[row + 1]);
                values
            })
        };

        Ok(Self {
            dims,
            datatype,
            vox_offset: vox_offset as usize,
            slope: read_f32(SCL_SLOPE),
            inter: read_f32(SCL_INTER),
            affine,
            little_endian,
        })
    }

    fn voxel_count(&self) -> Option<usize> {
        self.dims.iter().try_fold(1_usize, |acc, &extent| acc.checked_mul(extent))
    }

    fn decode_values<E: ByteOrder>(&self, raw: &[u8]) -> Vec<f32> {
        let scaled = self.slope != 0.0 && self.slope.is_finite();
        raw.chunks_exact(self.datatype.byte_size())
            .map(|chunk| {
                let value = self.datatype.decode::<E>(chunk);
                let value = if scaled { value * self.slope + self.inter } else { value };
                value as f32
            })
            .collect()
    }

    fn metadata(&self) -> SpatialMetadata {
        let n = self.dims.len();
        let mut spacing = Vec::with_capacity(n);
        let mut direction = vec![0.0; n * n];
        for col in 0..n {
            let norm = (0..SPATIAL_AXES)
                .map(|row| self.affine[row][col].powi(2))
                .sum::<f64>()
                .sqrt();
            if norm > 0.0 {
                for row in 0..n {
                    direction[row * n + col] = LPS[row] * self.affine[row][col] / norm;
                }
                spacing.push(norm);
            } else {
                direction[col * n + col] = 1.0;
                spacing.push(1.0);
            }
        }
        SpatialMetadata {
            size: self.dims.clone(),
            origin: (0..n).map(|row| LPS[row] * self.affine[row][3]).collect(),
            spacing,
            direction,
        }
    }
}

#[allow(clippy::many_single_char_names)]
fn qform_affine([b, c, d]: [f64; 3], offset: [f64; 3], pixdim: &[f64; 8]) -> [[f64; 4]; SPATIAL_AXES] {
    let a = (1.0 - b * b - c * c - d * d).max(0.0).sqrt();
    let qfac = if pixdim[0] < 0.0 { -1.0 } else { 1.0 };
    let (i, j, k) = (
        positive_or_one(pixdim[1]),
        positive_or_one(pixdim[2]),
        positive_or_one(pixdim[3]) * qfac,
    );
    [
        [
            (a * a + b * b - c * c - d * d) * i,
            2.0 * (b * c - a * d) * j,
            2.0 * (b * d + a * c) * k,
            offset[0],
        ],
        [
            2.0 * (b * c + a * d) * i,
            (a * a + c * c - b * b - d * d) * j,
            2.0 * (c * d - a * b) * k,
            offset[1],
        ],
        [
            2.0 * (b * d - a * c) * i,
            2.0 * (c * d + a * b) * j,
            (a * a + d * d - c * c - b * b) * k,
            offset[2],
        ],
    ]
}

fn positive_or_one(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        1.0
    }
}

/// RAS affine for `metadata`, padded with identity rows for missing axes.
fn affine_from(metadata: &SpatialMetadata) -> [[f64; 4]; SPATIAL_AXES] {
    let n = metadata.size.len();
    let mut affine: [[f64; 4]; SPATIAL_AXES] = std::array::from_fn(|row| {
        let mut values = [0.0; 4];
        values[row] = 1.0;
        values
    });
    for row in 0..n {
        for col in 0..n {
            affine[row][col] = LPS[row] * metadata.direction[row * n + col] * metadata.spacing[col];
        }
        affine[row][3] = LPS[row] * metadata.origin[row];
    }
    affine
}

fn encode_header(metadata: &SpatialMetadata) -> Result<Vec<u8>, String> {
    use offsets::{
        BITPIX, DATATYPE, DIM, MAGIC, PIXDIM, SCL_INTER, SCL_SLOPE, SFORM_CODE, SROW_X, VOX_OFFSET,
        XYZT_UNITS,
    };

    let mut buf = vec![0_u8; DATA_OFFSET];
    LittleEndian::write_i32(&mut buf[0..4], HEADER_SIZE as i32);

    let dims = &metadata.size;
    LittleEndian::write_i16(&mut buf[DIM..DIM + 2], dims.len() as i16);
    for i in 1..=7 {
        let extent = dims.get(i - 1).copied().unwrap_or(1);
        let extent = i16::try_from(extent).map_err(|_| format!("extent {extent} exceeds the NIfTI-1 limit"))?;
        LittleEndian::write_i16(&mut buf[DIM + 2 * i..DIM + 2 * i + 2], extent);
    }

    LittleEndian::write_i16(&mut buf[DATATYPE..DATATYPE + 2], 16);
    LittleEndian::write_i16(&mut buf[BITPIX..BITPIX + 2], 32);

    LittleEndian::write_f32(&mut buf[PIXDIM..PIXDIM + 4], 1.0);
    for (i, &spacing) in metadata.spacing.iter().enumerate() {
        let offset = PIXDIM + 4 * (i + 1);
        LittleEndian::write_f32(&mut buf[offset..offset + 4], spacing as f32);
    }

    LittleEndian::write_f32(&mut buf[VOX_OFFSET..VOX_OFFSET + 4], DATA_OFFSET as f32);
    LittleEndian::write_f32(&mut buf[SCL_SLOPE..SCL_SLOPE + 4], 1.0);
    LittleEndian::write_f32(&mut buf[SCL_INTER..SCL_INTER + 4], 0.0);
    buf[XYZT_UNITS] = UNITS_MM;

    LittleEndian::write_i16(&mut buf[SFORM_CODE..SFORM_CODE + 2], SFORM_SCANNER);
    for (row, values) in affine_from(metadata).iter().enumerate() {
        for (col, &value) in values.iter().enumerate() {
            let offset = SROW_X + 16 * row + 4 * col;
            LittleEndian::write_f32(&mut buf[offset..offset + 4], value as f32);
        }
    }

    buf[MAGIC..MAGIC + 4].copy_from_slice(b"n+1\0");
    Ok(buf)
}

/// NIfTI-1 codec for `.nii` and `.nii.gz` files.
///
/// Writes are always little-endian float32 with an sform affine built from the
/// given metadata, or from identity referencing when there is none.
#[derive(Debug, Clone, Copy, Default)]
pub struct NiftiCodec;

impl NiftiCodec {
    fn open(path: &Path) -> AugmentResult<Box<dyn Read>> {
        let file = File::open(path).map_err(|e| read_failed(path, e.to_string()))?;
        let reader = BufReader::new(file);
        Ok(if has_extension(path, "gz") {
            Box::new(MultiGzDecoder::new(reader))
        } else {
            Box::new(reader)
        })
    }

    fn read_header(path: &Path) -> AugmentResult<Header> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE);
        Self::open(path)?
            .take(HEADER_SIZE as u64)
            .read_to_end(&mut bytes)
            .map_err(|e| read_failed(path, e.to_string()))?;
        Header::parse(&bytes).map_err(|reason| read_failed(path, reason))
    }

    /// Writable `(dims, values)` for `data`: numpy order reversed to
    /// fastest-first, leading unit axes dropped down to three axes.
    fn layout(data: &TensorData, path: &Path) -> AugmentResult<(Vec<usize>, Vec<f32>)> {
        let mut shape = data.shape.as_slice();
        while shape.len() > SPATIAL_AXES && shape.first() == Some(&1) {
            shape = &shape[1..];
        }
        if shape.is_empty() || shape.len() > SPATIAL_AXES {
            return Err(write_failed(
                path,
                format!("NIfTI output needs 1 to 3 axes, got shape {:?}", data.shape),
            ));
        }
        let dims = shape.iter().rev().copied().collect();
        let values = data
            .clone()
            .convert::<f32>()
            .into_vec::<f32>()
            .map_err(|e| write_failed(path, format!("{e:?}")))?;
        Ok((dims, values))
    }
}

impl VolumeCodec for NiftiCodec {
    fn supports_extension(&self, extension: &str) -> bool {
        extension.eq_ignore_ascii_case("nii") || extension.eq_ignore_ascii_case("nii.gz")
    }

    fn handles(&self, path: &Path) -> bool {
        has_extension(path, "nii") || has_extension(path, "nii.gz")
    }

    fn read(&self, path: &Path) -> AugmentResult<DecodedVolume> {
        let mut bytes = Vec::new();
        Self::open(path)?
            .read_to_end(&mut bytes)
            .map_err(|e| read_failed(path, e.to_string()))?;
        let header = Header::parse(&bytes).map_err(|reason| read_failed(path, reason))?;

        let len = header
            .voxel_count()
            .and_then(|count| count.checked_mul(header.datatype.byte_size()))
            .ok_or_else(|| read_failed(path, "voxel count overflows"))?;
        let raw = header
            .vox_offset
            .checked_add(len)
            .and_then(|end| bytes.get(header.vox_offset..end))
            .ok_or_else(|| {
                read_failed(
                    path,
                    format!("expected {len} data bytes at offset {}, file has {}", header.vox_offset, bytes.len()),
                )
            })?;

        let values = if header.little_endian {
            header.decode_values::<LittleEndian>(raw)
        } else {
            header.decode_values::<BigEndian>(raw)
        };
        let shape: Vec<usize> = header.dims.iter().rev().copied().collect();
        tracing::trace!(path = %path.display(), ?shape, datatype = ?header.datatype, "decoded NIfTI volume");

        Ok(DecodedVolume {
            data: TensorData::new(values, shape),
            metadata: header.metadata(),
        })
    }

    fn read_metadata(&self, path: &Path) -> AugmentResult<SpatialMetadata> {
        Self::read_header(path).map(|header| header.metadata())
    }

    fn write(
        &self,
        data: &TensorData,
        metadata: Option<&SpatialMetadata>,
        path: &Path,
    ) -> AugmentResult<()> {
        let (dims, values) = Self::layout(data, path)?;
        let metadata = match metadata {
            Some(metadata) if fits(metadata, &dims) => metadata.clone(),
            Some(_) => {
                tracing::debug!(path = %path.display(), "metadata does not match the array, writing identity referencing");
                SpatialMetadata::identity(dims)
            }
            None => SpatialMetadata::identity(dims),
        };

        let mut bytes = encode_header(&metadata).map_err(|reason| write_failed(path, reason))?;
        let start = bytes.len();
        bytes.resize(start + values.len() * 4, 0);
        LittleEndian::write_f32_into(&values, &mut bytes[start..]);

        let io_failed = |e: std::io::Error| write_failed(path, e.to_string());
        let writer = BufWriter::new(File::create(path).map_err(io_failed)?);
        if has_extension(path, "gz") {
            let mut encoder = GzEncoder::new(writer, Compression::default());
            encoder.write_all(&bytes).map_err(io_failed)?;
            encoder.finish().map_err(io_failed)?.flush().map_err(io_failed)
        } else {
            let mut writer = writer;
            writer.write_all(&bytes).map_err(io_failed)?;
            writer.flush().map_err(io_failed)
        }
    }
}

fn fits(metadata: &SpatialMetadata, dims: &[usize]) -> bool {
    let n = dims.len();
    metadata.size == dims
        && metadata.spacing.len() == n
        && metadata.origin.len() == n
        && metadata.direction.len() == n * n
}

fn read_failed(path: &Path, reason: impl Into<String>) -> AugmentError {
    AugmentError::ReadFailed {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn write_failed(path: &Path, reason: impl Into<String>) -> AugmentError {
    AugmentError::WriteFailed {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn assert_all_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert_relative_eq!(*a, *e, epsilon = 1e-5);
        }
    }

    #[test]
    fn compressed_volumes_keep_values_and_referencing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.nii.gz");
        let values: Vec<f32> = (0..24).map(|v| v as f32 * 0.5).collect();
        let data = TensorData::new(values.clone(), [2, 3, 4]);
        let metadata = SpatialMetadata {
            size: vec![4, 3, 2],
            origin: vec![10.0, -4.0, 1.5],
            spacing: vec![0.5, 0.75, 2.0],
            direction: vec![0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0],
        };

        NiftiCodec.write(&data, Some(&metadata), &path).unwrap();
        let decoded = NiftiCodec.read(&path).unwrap();

        assert_eq!(decoded.data.shape, vec![2, 3, 4]);
        assert_eq!(decoded.data.to_vec::<f32>().unwrap(), values);
        assert_eq!(decoded.metadata.size, vec![4, 3, 2]);
        assert_eq!(decoded.metadata.depth(), 2);
        assert_all_close(&decoded.metadata.origin, &metadata.origin);
        assert_all_close(&decoded.metadata.spacing, &metadata.spacing);
        assert_all_close(&decoded.metadata.direction, &metadata.direction);

        let header_only = NiftiCodec.read_metadata(&path).unwrap();
        assert_eq!(header_only.size, decoded.metadata.size);
    }

    #[test]
    fn planar_writes_without_metadata_use_identity_referencing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slice.nii");
        let data = TensorData::new(vec![1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0], [2, 3]);

        NiftiCodec.write(&data, None, &path).unwrap();
        let decoded = NiftiCodec.read(&path).unwrap();

        assert_eq!(decoded.data.shape, vec![2, 3]);
        assert_eq!(decoded.data.to_vec::<f32>().unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(decoded.metadata, SpatialMetadata::identity(vec![3, 2]));
        assert_eq!(decoded.metadata.depth(), 0);
    }

    #[test]
    fn big_endian_integer_data_is_rescaled() {
        use offsets::*;

        let mut bytes = vec![0_u8; DATA_OFFSET + 8];
        BigEndian::write_i32(&mut bytes[0..4], HEADER_SIZE as i32);
        for (i, value) in [2_i16, 2, 2].into_iter().enumerate() {
            BigEndian::write_i16(&mut bytes[DIM + 2 * i..DIM + 2 * i + 2], value);
        }
        BigEndian::write_i16(&mut bytes[DATATYPE..DATATYPE + 2], 4);
        BigEndian::write_i16(&mut bytes[BITPIX..BITPIX + 2], 16);
        BigEndian::write_f32(&mut bytes[PIXDIM + 4..PIXDIM + 8], 0.5);
        BigEndian::write_f32(&mut bytes[PIXDIM + 8..PIXDIM + 12], 0.25);
        BigEndian::write_f32(&mut bytes[VOX_OFFSET..VOX_OFFSET + 4], DATA_OFFSET as f32);
        BigEndian::write_f32(&mut bytes[SCL_SLOPE..SCL_SLOPE + 4], 2.0);
        BigEndian::write_f32(&mut bytes[SCL_INTER..SCL_INTER + 4], 1.0);
        bytes[MAGIC..MAGIC + 4].copy_from_slice(b"n+1\0");
        BigEndian::write_i16_into(&[1, -2, 3, 4], &mut bytes[DATA_OFFSET..]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.nii");
        std::fs::write(&path, &bytes).unwrap();
        let decoded = NiftiCodec.read(&path).unwrap();

        assert_eq!(decoded.data.shape, vec![2, 2]);
        assert_eq!(decoded.data.to_vec::<f32>().unwrap(), vec![3.0, -3.0, 7.0, 9.0]);
        assert_all_close(&decoded.metadata.spacing, &[0.5, 0.25]);
        assert_all_close(&decoded.metadata.direction, &[-1.0, 0.0, 0.0, -1.0]);
        assert_eq!(decoded.metadata.depth(), 0);
    }

    #[test]
    fn truncated_data_is_a_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.nii");
        NiftiCodec
            .write(&TensorData::new(vec![0.0_f32; 8], [2, 2, 2]), None, &path)
            .unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 4]).unwrap();

        let err = NiftiCodec.read(&path).unwrap_err();
        assert!(matches!(err, AugmentError::ReadFailed { .. }));
    }

    #[test]
    fn foreign_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.nii");
        std::fs::write(&path, vec![0_u8; 400]).unwrap();

        let err = NiftiCodec.read(&path).unwrap_err();
        assert!(err.to_string().contains("not a NIfTI-1 header"));
    }

    #[test]
    fn four_axis_arrays_cannot_be_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.nii");
        let data = TensorData::new(vec![0.0_f32; 16], [2, 2, 2, 2]);

        let err = NiftiCodec.write(&data, None, &path).unwrap_err();
        assert!(matches!(err, AugmentError::WriteFailed { .. }));
    }
}
