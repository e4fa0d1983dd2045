use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::decode::{decode_hdr, decode_rgba};
use crate::encode::{encode_hdr, encode_rgba};
use crate::progress::{BlockProgress, ProgressSink};
use crate::{
    CodecError, CompressionFormat, DecodeOptions, EncodeOptions, HdrTile, ProgressElement,
    RgbaTile, Tile,
};

/// Blocks per work item when the blocks don't come from an image.
const SEQUENCE_ROW: usize = 64;

/// How the harness runs an operation over many blocks.
///
/// The default context runs sequentially, reports no progress, and cannot be
/// cancelled.
///
/// ```
/// use std::sync::atomic::AtomicBool;
/// use bcn::{OperationContext, ProgressElement};
///
/// let cancel = AtomicBool::new(false);
/// let mut report = |p: ProgressElement| println!("{:.1}%", p.percentage());
/// let context = OperationContext::new()
///     .with_parallel(4)
///     .with_cancellation(&cancel)
///     .with_progress(&mut report);
/// ```
pub struct OperationContext<'a> {
    parallel: Option<usize>,
    cancellation: Option<&'a AtomicBool>,
    progress: Option<Mutex<ProgressSink<'a>>>,
}
impl<'a> OperationContext<'a> {
    pub fn new() -> Self {
        Self {
            parallel: None,
            cancellation: None,
            progress: None,
        }
    }

    /// Runs the operation on a pool of `task_count` worker threads. With a
    /// count of 0, the pool picks the number of threads.
    ///
    /// Without the `rayon` feature, this is ignored and everything runs on
    /// the calling thread.
    pub fn with_parallel(mut self, task_count: usize) -> Self {
        self.parallel = Some(task_count);
        self
    }

    /// Aborts the operation with [`CodecError::Cancelled`] once `flag` is
    /// set.
    ///
    /// The flag is checked before each block. Blocks that already started
    /// are finished.
    pub fn with_cancellation(mut self, flag: &'a AtomicBool) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// Reports progress to `report`.
    ///
    /// Sequential operations report after every block. Parallel operations
    /// report after every row of blocks, possibly from different threads.
    pub fn with_progress(mut self, report: &'a mut (dyn FnMut(ProgressElement) + Send)) -> Self {
        self.progress = Some(Mutex::new(report));
        self
    }

    fn check_cancelled(&self) -> Result<(), CodecError> {
        match self.cancellation {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(CodecError::Cancelled),
            _ => Ok(()),
        }
    }
}
impl Default for OperationContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `process` for every block.
///
/// Block `i` reads `input[i * in_stride..][..in_stride]` and writes
/// `output[i * out_stride..][..out_stride]`. Parallel execution hands out
/// rows of `blocks_per_row` blocks.
fn for_each_block<I: Sync, O: Send>(
    format: CompressionFormat,
    context: &OperationContext,
    blocks_per_row: usize,
    (input, in_stride): (&[I], usize),
    (output, out_stride): (&mut [O], usize),
    process: impl Fn(&[I], &mut [O]) -> Result<(), CodecError> + Sync,
) -> Result<(), CodecError> {
    let total = input.len() / in_stride;
    debug_assert_eq!(input.len(), total * in_stride);
    debug_assert_eq!(output.len(), total * out_stride);

    log::debug!(
        "{format:?}: processing {total} blocks (parallel: {:?})",
        context.parallel
    );
    let progress = BlockProgress::new(context.progress.as_ref(), total);

    let result = match context.parallel {
        #[cfg(feature = "rayon")]
        Some(task_count) => run_parallel(
            context,
            task_count,
            blocks_per_row.max(1),
            (input, in_stride),
            (output, out_stride),
            &process,
            &progress,
        ),
        _ => run_sequential(
            context,
            (input, in_stride),
            (output, out_stride),
            &process,
            &progress,
        ),
    };

    match &result {
        Ok(()) => log::debug!("{format:?}: finished {total} blocks"),
        Err(CodecError::Cancelled) => log::debug!(
            "{format:?}: cancelled after {} of {total} blocks",
            progress.completed()
        ),
        Err(error) => log::debug!("{format:?}: failed: {error}"),
    }
    result
}

fn run_sequential<I, O>(
    context: &OperationContext,
    (input, in_stride): (&[I], usize),
    (output, out_stride): (&mut [O], usize),
    process: &impl Fn(&[I], &mut [O]) -> Result<(), CodecError>,
    progress: &BlockProgress,
) -> Result<(), CodecError> {
    let blocks = input
        .chunks_exact(in_stride)
        .zip(output.chunks_exact_mut(out_stride));
    for (block_in, block_out) in blocks {
        context.check_cancelled()?;
        process(block_in, block_out)?;
        progress.submit(1);
    }
    Ok(())
}

#[cfg(feature = "rayon")]
fn run_parallel<I: Sync, O: Send>(
    context: &OperationContext,
    task_count: usize,
    blocks_per_row: usize,
    (input, in_stride): (&[I], usize),
    (output, out_stride): (&mut [O], usize),
    process: &(impl Fn(&[I], &mut [O]) -> Result<(), CodecError> + Sync),
    progress: &BlockProgress,
) -> Result<(), CodecError> {
    use rayon::prelude::*;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(task_count)
        .build()?;
    log::debug!("running on {} worker threads", pool.current_num_threads());

    pool.install(|| {
        input
            .par_chunks(in_stride * blocks_per_row)
            .zip(output.par_chunks_mut(out_stride * blocks_per_row))
            .try_for_each(|(row_in, row_out)| {
                let blocks = row_in
                    .chunks_exact(in_stride)
                    .zip(row_out.chunks_exact_mut(out_stride));
                for (block_in, block_out) in blocks {
                    context.check_cancelled()?;
                    process(block_in, block_out)?;
                }
                progress.submit(row_in.len() / in_stride);
                Ok(())
            })
    })
}

fn check_block_data(format: CompressionFormat, data: &[u8]) -> Result<usize, CodecError> {
    let size = format.block_byte_size();
    if data.len() % size != 0 {
        return Err(CodecError::InvalidInputSize {
            expected: data.len().div_ceil(size) * size,
            actual: data.len(),
        });
    }
    Ok(data.len() / size)
}

fn encode_rows(
    format: CompressionFormat,
    tiles: &[RgbaTile],
    blocks_per_row: usize,
    options: &EncodeOptions,
    context: &OperationContext,
) -> Result<Vec<u8>, CodecError> {
    if format.is_hdr() {
        return Err(CodecError::UnsupportedFormat(format));
    }
    options.validate(format)?;

    let size = format.block_byte_size();
    let mut out = vec![0; tiles.len() * size];
    for_each_block(
        format,
        context,
        blocks_per_row,
        (tiles, 1),
        (&mut out, size),
        |tile, bytes| encode_rgba(format, &tile[0], options, bytes),
    )?;
    Ok(out)
}

fn encode_rows_hdr(
    format: CompressionFormat,
    tiles: &[HdrTile],
    blocks_per_row: usize,
    options: &EncodeOptions,
    context: &OperationContext,
) -> Result<Vec<u8>, CodecError> {
    if !format.is_hdr() {
        return Err(CodecError::UnsupportedFormat(format));
    }

    let size = format.block_byte_size();
    let mut out = vec![0; tiles.len() * size];
    for_each_block(
        format,
        context,
        blocks_per_row,
        (tiles, 1),
        (&mut out, size),
        |tile, bytes| encode_hdr(format, &tile[0], options, bytes),
    )?;
    Ok(out)
}

fn decode_rows(
    format: CompressionFormat,
    data: &[u8],
    blocks_per_row: usize,
    options: &DecodeOptions,
    context: &OperationContext,
) -> Result<Vec<RgbaTile>, CodecError> {
    if format.is_hdr() {
        return Err(CodecError::UnsupportedFormat(format));
    }
    options.validate(format)?;
    let count = check_block_data(format, data)?;

    let mut tiles = vec![RgbaTile::default(); count];
    for_each_block(
        format,
        context,
        blocks_per_row,
        (data, format.block_byte_size()),
        (&mut tiles, 1),
        |bytes, tile| {
            tile[0] = decode_rgba(format, bytes, options)?;
            Ok(())
        },
    )?;
    Ok(tiles)
}

fn decode_rows_hdr(
    format: CompressionFormat,
    data: &[u8],
    blocks_per_row: usize,
    context: &OperationContext,
) -> Result<Vec<HdrTile>, CodecError> {
    if !format.is_hdr() {
        return Err(CodecError::UnsupportedFormat(format));
    }
    let count = check_block_data(format, data)?;

    let mut tiles = vec![HdrTile::default(); count];
    for_each_block(
        format,
        context,
        blocks_per_row,
        (data, format.block_byte_size()),
        (&mut tiles, 1),
        |bytes, tile| {
            tile[0] = decode_hdr(format, bytes)?;
            Ok(())
        },
    )?;
    Ok(tiles)
}

/// Encodes a sequence of tiles into consecutive blocks.
///
/// The output has `tiles.len() * format.block_byte_size()` bytes and the
/// same order as `tiles`, no matter how the work is scheduled.
pub fn encode_tiles(
    format: CompressionFormat,
    tiles: &[RgbaTile],
    options: &EncodeOptions,
    context: &OperationContext,
) -> Result<Vec<u8>, CodecError> {
    encode_rows(format, tiles, SEQUENCE_ROW, options, context)
}

/// The HDR version of [`encode_tiles`].
pub fn encode_tiles_hdr(
    format: CompressionFormat,
    tiles: &[HdrTile],
    options: &EncodeOptions,
    context: &OperationContext,
) -> Result<Vec<u8>, CodecError> {
    encode_rows_hdr(format, tiles, SEQUENCE_ROW, options, context)
}

/// Decodes consecutive blocks.
///
/// `data` must be a whole number of blocks.
pub fn decode_tiles(
    format: CompressionFormat,
    data: &[u8],
    options: &DecodeOptions,
    context: &OperationContext,
) -> Result<Vec<RgbaTile>, CodecError> {
    decode_rows(format, data, SEQUENCE_ROW, options, context)
}

/// The HDR version of [`decode_tiles`].
pub fn decode_tiles_hdr(
    format: CompressionFormat,
    data: &[u8],
    context: &OperationContext,
) -> Result<Vec<HdrTile>, CodecError> {
    decode_rows_hdr(format, data, SEQUENCE_ROW, context)
}

/// The number of blocks of an image with the given size.
pub fn block_count(width: usize, height: usize) -> usize {
    width.div_ceil(4) * height.div_ceil(4)
}

/// A borrowed image in row-major order.
#[derive(Debug, Clone, Copy)]
pub struct ImageRef<'a, P> {
    pixels: &'a [P],
    width: usize,
    height: usize,
}
impl<'a, P: Copy> ImageRef<'a, P> {
    /// Fails with [`CodecError::InvalidInputSize`] unless there are exactly
    /// `width * height` pixels.
    pub fn new(pixels: &'a [P], width: usize, height: usize) -> Result<Self, CodecError> {
        let expected = width.checked_mul(height).unwrap_or(usize::MAX);
        if pixels.len() != expected {
            return Err(CodecError::InvalidInputSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    pub fn pixels(&self) -> &'a [P] {
        self.pixels
    }
    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }

    fn blocks_per_row(&self) -> usize {
        self.width.div_ceil(4)
    }

    /// Splits the image into tiles. Tiles on the right and bottom edge are
    /// padded by repeating the last column and row.
    fn tiles(&self) -> Vec<Tile<P>> {
        let columns = self.blocks_per_row();
        let rows = self.height.div_ceil(4);

        let mut tiles = Vec::with_capacity(columns * rows);
        for block_y in 0..rows {
            for block_x in 0..columns {
                tiles.push(Tile::from_fn(|i| {
                    let x = (block_x * 4 + i % 4).min(self.width - 1);
                    let y = (block_y * 4 + i / 4).min(self.height - 1);
                    self.pixels[y * self.width + x]
                }));
            }
        }
        tiles
    }
}

/// Puts tiles back together and crops them to `width * height` pixels.
fn untile<P: Copy + Default>(tiles: &[Tile<P>], width: usize, height: usize) -> Vec<P> {
    let columns = width.div_ceil(4);
    let mut pixels = vec![P::default(); width * height];
    for y in 0..height {
        for x in 0..width {
            pixels[y * width + x] = tiles[(y / 4) * columns + x / 4].get(x % 4, y % 4);
        }
    }
    pixels
}

fn check_image_data(
    format: CompressionFormat,
    data: &[u8],
    width: usize,
    height: usize,
) -> Result<(), CodecError> {
    let expected = block_count(width, height) * format.block_byte_size();
    if data.len() != expected {
        return Err(CodecError::InvalidInputSize {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Encodes an image of any size. Blocks are in row-major order.
pub fn encode_image(
    format: CompressionFormat,
    image: ImageRef<[u8; 4]>,
    options: &EncodeOptions,
    context: &OperationContext,
) -> Result<Vec<u8>, CodecError> {
    let tiles = image.tiles();
    encode_rows(format, &tiles, image.blocks_per_row(), options, context)
}

/// The HDR version of [`encode_image`].
pub fn encode_image_hdr(
    format: CompressionFormat,
    image: ImageRef<[f32; 3]>,
    options: &EncodeOptions,
    context: &OperationContext,
) -> Result<Vec<u8>, CodecError> {
    let tiles = image.tiles();
    encode_rows_hdr(format, &tiles, image.blocks_per_row(), options, context)
}

/// Decodes the blocks of a `width * height` image.
///
/// `data` must contain exactly [`block_count`] blocks.
pub fn decode_image(
    format: CompressionFormat,
    data: &[u8],
    width: usize,
    height: usize,
    options: &DecodeOptions,
    context: &OperationContext,
) -> Result<Vec<[u8; 4]>, CodecError> {
    check_image_data(format, data, width, height)?;
    let tiles = decode_rows(format, data, width.div_ceil(4), options, context)?;
    Ok(untile(&tiles, width, height))
}

/// The HDR version of [`decode_image`].
pub fn decode_image_hdr(
    format: CompressionFormat,
    data: &[u8],
    width: usize,
    height: usize,
    context: &OperationContext,
) -> Result<Vec<[f32; 3]>, CodecError> {
    check_image_data(format, data, width, height)?;
    let tiles = decode_rows_hdr(format, data, width.div_ceil(4), context)?;
    Ok(untile(&tiles, width, height))
}
