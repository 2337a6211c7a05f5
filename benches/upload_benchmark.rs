//! Upload benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use file_uploadr::upload::limits::parse_shorthand_bytes;
use file_uploadr::upload::{
    AcceptPattern, FieldUpload, PostSizeLimit, UploadEntry, UploadHandler, UploadRequest,
};

fn benchmark_shorthand_parsing(c: &mut Criterion) {
    c.bench_function("parse_shorthand_bytes", |b| {
        b.iter(|| {
            for raw in ["2k", "128M", "1g", "", "bogus"] {
                black_box(parse_shorthand_bytes(black_box(raw)));
            }
        });
    });
}

fn benchmark_raw_body_sizes(c: &mut Criterion) {
    let save = tempfile::tempdir().unwrap();
    let handler = UploadHandler::new("file")
        .with_accept_pattern(AcceptPattern::new(r"/\.bin$/i").unwrap())
        .with_save_path(save.path().to_string_lossy());

    let mut group = c.benchmark_group("raw_body_sizes");

    for size in [1024, 10 * 1024, 100 * 1024, 1024 * 1024].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(format!("{}_bytes", size), size, |b, &size| {
            let data = vec![0u8; size];
            b.iter(|| {
                let mut request = UploadRequest::new()
                    .with_field(
                        "file",
                        FieldUpload::Single(UploadEntry::raw_body("bench.bin")),
                    )
                    .with_content_length(size as u64)
                    .with_body(&data[..]);
                black_box(handler.process(&mut request, PostSizeLimit::UNLIMITED));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_shorthand_parsing, benchmark_raw_body_sizes);
criterion_main!(benches);
