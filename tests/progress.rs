use std::sync::atomic::{AtomicBool, Ordering};

use bcn::*;
use util::{create_rng, hash_hex, random_image, smooth_tile};

mod util;

fn tiles(count: usize) -> Vec<RgbaTile> {
    let mut rng = create_rng();
    (0..count).map(|_| smooth_tile(&mut rng)).collect()
}

#[test]
fn sequential_reports_every_block() {
    let tiles = tiles(10);
    let mut reports = Vec::new();
    let mut record = |p: ProgressElement| reports.push(p);
    let context = OperationContext::new().with_progress(&mut record);

    encode_tiles(CompressionFormat::Bc1, &tiles, &EncodeOptions::default(), &context).unwrap();
    drop(context);

    let expected: Vec<_> = (1..=10)
        .map(|current_block| ProgressElement {
            current_block,
            total_blocks: 10,
        })
        .collect();
    assert_eq!(reports, expected);
}

#[test]
fn parallel_reports_are_monotonic() {
    let mut rng = create_rng();
    let pixels = random_image(&mut rng, 64, 48);
    let image = ImageRef::new(&pixels, 64, 48).unwrap();

    let mut reports = Vec::new();
    let mut record = |p: ProgressElement| reports.push(p);
    let context = OperationContext::new()
        .with_parallel(4)
        .with_progress(&mut record);
    encode_image(CompressionFormat::Bc3, image, &EncodeOptions::default(), &context).unwrap();
    drop(context);

    assert!(!reports.is_empty());
    for pair in reports.windows(2) {
        assert!(pair[0].current_block <= pair[1].current_block);
    }
    let last = reports[reports.len() - 1];
    assert_eq!(last.current_block, block_count(64, 48));
    assert_eq!(last.total_blocks, block_count(64, 48));
    assert_eq!(last.percentage(), 100.0);
}

#[test]
fn cancellation_stops_early() {
    let tiles = tiles(50);
    let cancel = AtomicBool::new(false);
    let mut seen = 0;
    let mut cancel_after_5 = |p: ProgressElement| {
        seen = p.current_block;
        if p.current_block == 5 {
            cancel.store(true, Ordering::Relaxed);
        }
    };
    let context = OperationContext::new()
        .with_cancellation(&cancel)
        .with_progress(&mut cancel_after_5);

    let result = encode_tiles(CompressionFormat::Bc7, &tiles, &EncodeOptions::default(), &context);
    drop(context);
    assert_eq!(result, Err(CodecError::Cancelled));
    assert_eq!(seen, 5);
}

#[test]
fn cancellation_in_parallel() {
    let tiles = tiles(500);
    let cancel = AtomicBool::new(true);
    let context = OperationContext::new()
        .with_parallel(2)
        .with_cancellation(&cancel);

    let data = vec![0; 500 * 16];
    assert_eq!(
        decode_tiles(CompressionFormat::Bc7, &data, &DecodeOptions::default(), &context),
        Err(CodecError::Cancelled)
    );
    assert_eq!(
        encode_tiles(CompressionFormat::Bc4, &tiles, &EncodeOptions::default(), &context),
        Err(CodecError::Cancelled)
    );
}

#[test]
fn parallel_equals_sequential() {
    let mut rng = create_rng();
    let (width, height) = (37, 21);
    let pixels = random_image(&mut rng, width, height);
    let image = ImageRef::new(&pixels, width, height).unwrap();
    let options = EncodeOptions::default();

    for format in util::ldr_formats() {
        let sequential =
            encode_image(format, image, &options, &OperationContext::new()).unwrap();
        let parallel =
            encode_image(format, image, &options, &OperationContext::new().with_parallel(3))
                .unwrap();
        assert_eq!(hash_hex(&parallel), hash_hex(&sequential), "{format:?}");
        assert_eq!(sequential.len(), block_count(width, height) * format.block_byte_size());
    }

    let hdr: Vec<[f32; 3]> = pixels
        .iter()
        .map(|p| [p[0] as f32 / 16.0, p[1] as f32 / 64.0, p[2] as f32 / 255.0])
        .collect();
    let image = ImageRef::new(&hdr, width, height).unwrap();
    for format in util::hdr_formats() {
        let sequential =
            encode_image_hdr(format, image, &options, &OperationContext::new()).unwrap();
        let parallel = encode_image_hdr(
            format,
            image,
            &options,
            &OperationContext::new().with_parallel(0),
        )
        .unwrap();
        assert_eq!(hash_hex(&parallel), hash_hex(&sequential), "{format:?}");
    }
}

#[test]
fn image_round_trip() {
    let mut rng = create_rng();
    let (width, height) = (13, 9);
    let pixels = random_image(&mut rng, width, height);
    let image = ImageRef::new(&pixels, width, height).unwrap();
    let context = OperationContext::new().with_parallel(2);

    let data = encode_image(CompressionFormat::Bc7, image, &EncodeOptions::default(), &context)
        .unwrap();
    let decoded = decode_image(
        CompressionFormat::Bc7,
        &data,
        width,
        height,
        &DecodeOptions::default(),
        &context,
    )
    .unwrap();
    assert_eq!(decoded.len(), pixels.len());

    let tiles: Vec<RgbaTile> = pixels.chunks(1).map(|p| RgbaTile::solid(p[0])).collect();
    let decoded_tiles: Vec<RgbaTile> = decoded.chunks(1).map(|p| RgbaTile::solid(p[0])).collect();
    assert!(psnr(&tiles, &decoded_tiles) > 20.0);
}
