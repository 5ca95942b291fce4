use std::hint::black_box;
use std::io::Cursor;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tiscap::capture::{Frame, FrameAccumulator};
use tiscap::hdr::MergeDebevec;
use tiscap::output::{ImageWriter, StandardTiffWriter, TiffCompression, TiffOutputConfig};

fn generate_frame(width: usize, height: usize, channels: usize, seed: usize) -> Frame {
    let mut data = Vec::with_capacity(width * height * channels);
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                data.push(((x + y + c * 40 + seed) % 256) as u8);
            }
        }
    }
    Frame::new(width, height, channels, data).unwrap()
}

fn benchmark_averaging(c: &mut Criterion) {
    let mut group = c.benchmark_group("average_frames");

    for count in [1u32, 4, 16] {
        let frames: Vec<Frame> = (0..count as usize)
            .map(|i| generate_frame(640, 480, 3, i))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &frames, |b, frames| {
            b.iter(|| {
                let mut acc = FrameAccumulator::new(count).unwrap();
                for frame in frames {
                    acc.add(black_box(frame)).unwrap();
                }
                acc.finish(false).unwrap()
            });
        });
    }

    group.finish();
}

fn benchmark_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_debevec");
    let sizes = [(320, 240, "320x240"), (640, 480, "640x480"), (1280, 960, "1280x960")];

    for (width, height, label) in sizes {
        let images: Vec<Frame> = (0..3).map(|i| generate_frame(width, height, 3, i * 50)).collect();
        let times = [0.005f32, 0.01, 0.02];
        group.bench_with_input(BenchmarkId::from_parameter(label), &images, |b, images| {
            let merge = MergeDebevec::new();
            b.iter(|| merge.process(black_box(images), &times).unwrap());
        });
    }

    group.finish();
}

fn benchmark_tiff_output(c: &mut Criterion) {
    let mut group = c.benchmark_group("tiff_output");
    let frame = generate_frame(640, 480, 3, 0);

    let compressions = [
        (TiffCompression::None, "none"),
        (TiffCompression::Lzw, "lzw"),
        (TiffCompression::DeflateFast, "deflate_fast"),
    ];

    for (compression, label) in compressions {
        let config = TiffOutputConfig::builder().compression(compression).build();
        group.bench_with_input(BenchmarkId::from_parameter(label), &frame, |b, frame| {
            b.iter(|| {
                let mut output = Cursor::new(Vec::new());
                StandardTiffWriter
                    .write_frame(black_box(frame), &mut output, &config)
                    .unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_averaging, benchmark_merge, benchmark_tiff_output);
criterion_main!(benches);
