//! Benchmarks for channel tree reconstruction and name parsing.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ts6_viewer::domain::{
    build_channel_tree, parse_channel_name, Alignment, Channel, ChannelKind, Client, ClientStatus,
};

const NAMES: [&str; 5] = [
    "Lobby",
    "[cspacer0]---",
    "[*spacer1]Welcome",
    "[rspacer]",
    "Games [lspacer2] Room",
];

/// `count` channels, each parented to an earlier one (or the root).
fn channels(count: usize) -> Vec<Channel> {
    (1..=count)
        .map(|id| Channel {
            id: id.to_string(),
            parent_id: (id / 4).to_string(),
            name: format!("Channel {}", id),
            topic: String::new(),
            kind: ChannelKind::Normal,
            alignment: Alignment::Left,
            repeat: false,
            children: Vec::new(),
            clients: Vec::new(),
        })
        .collect()
}

fn clients(count: usize, channels: usize) -> Vec<Client> {
    (1..=count)
        .map(|id| Client {
            id: id.to_string(),
            channel_id: (id % channels + 1).to_string(),
            nickname: format!("User {}", id),
            platform: "Linux".to_string(),
            version: "3.6.2".to_string(),
            status: ClientStatus::default(),
        })
        .collect()
}

fn bench_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_channel_tree");
    for count in [10usize, 100, 1000] {
        let channels = channels(count);
        let clients = clients(count * 2, count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| build_channel_tree(black_box(channels.clone()), black_box(clients.clone())))
        });
    }
    group.finish();
}

fn bench_names(c: &mut Criterion) {
    c.bench_function("parse_channel_name", |b| {
        b.iter(|| {
            for name in NAMES {
                black_box(parse_channel_name(black_box(name)));
            }
        })
    });
}

criterion_group!(benches, bench_tree, bench_names);
criterion_main!(benches);
