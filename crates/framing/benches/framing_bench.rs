use std::hint::black_box;
use std::io::Cursor;

use bytes::Bytes;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use http::Method;
use micro_framing::codec::{read_request, read_response, LineSource};
use micro_framing::protocol::PayloadItem;
use tokio::runtime::Runtime;

const SMALL_REQUEST: &str = "GET /index.html HTTP/1.1\r\nHost: 127.0.0.1:8080\r\nUser-Agent: curl/7.79.1\r\nAccept: */*\r\n\r\n";

fn large_request() -> String {
    let mut request = String::from("GET /api/v1/items?page=2&size=50 HTTP/1.1\r\nHost: example.com\r\n");
    for i in 0..40 {
        request.push_str(&format!("X-Custom-Header-{i}: value-{i}, another-value-{i}\r\n"));
    }
    request.push_str("\r\n");
    request
}

fn chunked_response(chunks: usize, chunk_size: usize) -> Vec<u8> {
    let mut response = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();
    let chunk = vec![b'x'; chunk_size];
    for _ in 0..chunks {
        response.extend_from_slice(format!("{chunk_size:x}\r\n").as_bytes());
        response.extend_from_slice(&chunk);
        response.extend_from_slice(b"\r\n");
    }
    response.extend_from_slice(b"0\r\nX-Checksum: 1234\r\n\r\n");
    response
}

fn benchmark_request_head(criterion: &mut Criterion) {
    let runtime = Runtime::new().expect("tokio runtime");
    let large = large_request();
    let cases = [("small_header", Bytes::from_static(SMALL_REQUEST.as_bytes())), ("large_header", Bytes::from(large))];

    let mut group = criterion.benchmark_group("request_head");
    for (name, input) in &cases {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), input, |b, input| {
            b.to_async(&runtime).iter(|| async {
                let request = read_request(LineSource::new(Cursor::new(input.clone()))).await.expect("valid request").expect("one request");
                black_box(request.headers().len());
            });
        });
    }
    group.finish();
}

fn benchmark_chunked_body(criterion: &mut Criterion) {
    let runtime = Runtime::new().expect("tokio runtime");
    let cases = [("64x128", Bytes::from(chunked_response(64, 128))), ("16x16k", Bytes::from(chunked_response(16, 16 * 1024)))];

    let mut group = criterion.benchmark_group("chunked_body");
    for (name, input) in &cases {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), input, |b, input| {
            b.to_async(&runtime).iter(|| async {
                let source = LineSource::new(Cursor::new(input.clone()));
                let mut response = read_response(source, &Method::GET).await.expect("valid response");
                let mut total = 0;
                while let PayloadItem::Chunk(bytes) = response.body_mut().read().await.expect("valid body") {
                    total += bytes.len();
                }
                black_box(total);
            });
        });
    }
    group.finish();
}

criterion_group!(framing, benchmark_request_head, benchmark_chunked_body);
criterion_main!(framing);
