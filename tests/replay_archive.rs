//! End-to-end replay of an archive onto a canvas

use bytes::{BufMut, BytesMut};
use futures::StreamExt;
use image::Rgba;
use paintty::canvas::Canvas;
use paintty::codec::encode_pack;
use paintty::types::{PackType, ReplayEvent};
use paintty::{ReplayConfig, ReplaySession};
use serde_json::json;
use std::time::Duration;

fn stroke(client: &str, layer: &str, brush: serde_json::Value, points: &[(i32, i32)]) -> serde_json::Value {
    let block: Vec<_> = points.iter().map(|&(x, y)| json!({ "x": x, "y": y })).collect();
    json!({ "action": "block", "clientid": client, "layer": layer, "brush": brush, "block": block })
}

fn archive(documents: &[serde_json::Value]) -> bytes::Bytes {
    let mut out = BytesMut::new();
    for (i, doc) in documents.iter().enumerate() {
        let payload = serde_json::to_vec(doc).unwrap();
        out.put_slice(&encode_pack(PackType::Data, &payload, i % 2 == 1).unwrap());
    }
    out.put_slice(&encode_pack(PackType::Manager, b"bye", false).unwrap());
    out.freeze()
}

async fn render(config: ReplayConfig, documents: &[serde_json::Value]) -> (Canvas, Vec<ReplayEvent>) {
    let mut session = ReplaySession::from_bytes(archive(documents), config).unwrap();
    let mut events = session.take_events().unwrap();
    let mut canvas = Canvas::new(40, 20);
    let mut seen = Vec::new();

    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = events.next().await {
            if let ReplayEvent::Draw(draw) = &event {
                canvas.apply(draw).unwrap();
            }
            seen.push(event);
        }
    })
    .await
    .expect("replay finished");

    session.finish().await.unwrap();
    (canvas, seen)
}

#[tokio::test]
async fn strokes_and_erasures_render_in_order() {
    let red = json!({ "name": "BasicBrush", "width": 4, "color": { "red": 255, "green": 0, "blue": 0 } });
    let blue = json!({ "name": "basicbrush", "width": 4, "color": { "red": 0, "green": 0, "blue": 255 } });
    let eraser = json!({ "name": "BasicEraser", "width": 6 });

    let documents = [
        stroke("alice", "0", red, &[(2, 5), (37, 5)]),
        stroke("bob", "1", blue, &[(20, 1), (20, 18)]),
        stroke("alice", "0", eraser, &[(30, 5)]),
    ];
    let config = ReplayConfig { tick_interval_ms: 1, ..ReplayConfig::default() };
    let (canvas, events) = render(config, &documents).await;

    assert_eq!(events.last(), Some(&ReplayEvent::ArchiveParsed));
    let image = canvas.flatten();
    assert_eq!(*image.get_pixel(10, 5), Rgba([255, 0, 0, 255]));
    // blue on layer 1 sits above red on layer 0
    assert_eq!(*image.get_pixel(20, 5), Rgba([0, 0, 255, 255]));
    assert_eq!(*image.get_pixel(30, 5), Rgba([255, 255, 255, 255]));
    assert_eq!(*image.get_pixel(10, 15), Rgba([255, 255, 255, 255]));
}

#[tokio::test]
async fn suppressed_client_is_not_drawn() {
    let black = json!({ "name": "BasicBrush" });
    let documents = [
        stroke("me", "0", black.clone(), &[(5, 5), (10, 5)]),
        stroke("peer", "0", black, &[(5, 15), (10, 15)]),
    ];
    let config = ReplayConfig { suppress_client_id: Some("me".into()), ..ReplayConfig::default() }.fullspeed(true);
    let (canvas, events) = render(config, &documents).await;

    let blocks = events.iter().filter(|e| matches!(e, ReplayEvent::BlockParsed { .. })).count();
    assert_eq!(blocks, 1);
    let image = canvas.flatten();
    assert_eq!(*image.get_pixel(7, 5), Rgba([255, 255, 255, 255]));
    assert_eq!(*image.get_pixel(7, 15), Rgba([0, 0, 0, 255]));
}

#[tokio::test]
async fn strokes_on_unknown_layers_are_skipped() {
    let documents = [stroke("c1", "overlay", json!({ "name": "BasicBrush" }), &[(1, 1), (9, 9)])];
    let (canvas, events) = render(ReplayConfig::default().fullspeed(true), &documents).await;

    assert!(events.iter().any(|e| matches!(e, ReplayEvent::Draw(_))));
    assert_eq!(canvas.applied(), 0);
}
