//! End-to-end tests for the batch pipeline through the public API.
//!
//! Codec behaviour is scripted in memory so every scenario is deterministic;
//! the last group feeds real PNG payloads through the built-in raster codec.

use async_trait::async_trait;
use heic2jpg::{
    derive_output_name, export_all, format_byte_size, CodecError, ConversionConfig,
    ConversionProgressCallback, ConversionSession, ImageCodec, RasterCodec, SourceItem,
    TargetFormat, BATCH_FAILURE_MESSAGE,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::collections::HashSet;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Fails for the configured payloads, otherwise returns `JPEG:` + payload.
struct ScriptedCodec {
    failing: HashSet<Vec<u8>>,
    calls: Mutex<Vec<(Vec<u8>, TargetFormat, f32)>>,
}

impl ScriptedCodec {
    fn always_ok() -> Arc<Self> {
        Self::failing_on(&[])
    }

    fn failing_on(payloads: &[&[u8]]) -> Arc<Self> {
        Arc::new(Self {
            failing: payloads.iter().map(|p| p.to_vec()).collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(Vec<u8>, TargetFormat, f32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageCodec for ScriptedCodec {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn convert(
        &self,
        payload: &[u8],
        target: TargetFormat,
        quality: f32,
    ) -> Result<Vec<u8>, CodecError> {
        self.calls
            .lock()
            .unwrap()
            .push((payload.to_vec(), target, quality));
        tokio::task::yield_now().await;
        if self.failing.contains(payload) {
            return Err(CodecError::Decode {
                detail: "not a HEIF container".into(),
            });
        }
        Ok([b"JPEG:".as_slice(), payload].concat())
    }
}

fn session(codec: Arc<ScriptedCodec>) -> ConversionSession {
    let config = ConversionConfig::builder()
        .codec(codec)
        .build()
        .expect("valid config");
    ConversionSession::new(config).expect("session")
}

fn heic(name: &str) -> SourceItem {
    SourceItem::new(name, name.as_bytes().to_vec())
}

fn output_names(session: &ConversionSession) -> Vec<String> {
    session.outputs().iter().map(|a| a.name.clone()).collect()
}

fn png_payload(w: u32, h: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
        Rgb([(x * 16) as u8, (y * 16) as u8, 128])
    }));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("png encode");
    buf
}

// ── Batch properties ─────────────────────────────────────────────────────────

#[tokio::test]
async fn all_succeed_one_output_per_item() {
    let codec = ScriptedCodec::always_ok();
    let mut s = session(Arc::clone(&codec));
    let names = ["IMG_1.HEIC", "IMG_2.heic", "trip.HeIc", "IMG_1.HEIC"];
    s.select(names.iter().map(|n| heic(n)));

    let report = s.run().await.expect("non-empty roster");

    let expected: Vec<String> = names.iter().map(|n| derive_output_name(n)).collect();
    assert_eq!(output_names(&s), expected);
    assert!(s.last_error().is_none());
    assert!(!s.is_converting());
    assert_eq!(report.stats.converted_items, 4);
    assert_eq!(report.stats.failed_items, 0);
}

#[tokio::test]
async fn codec_receives_jpeg_at_ninety_percent_in_roster_order() {
    let codec = ScriptedCodec::always_ok();
    let mut s = session(Arc::clone(&codec));
    s.select(vec![heic("b.heic"), heic("a.heic")]);
    s.run().await;

    let calls = codec.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, b"b.heic");
    assert_eq!(calls[1].0, b"a.heic");
    for (_, target, quality) in calls {
        assert_eq!(target, TargetFormat::Jpeg);
        assert_eq!(quality, 0.9);
    }
}

#[tokio::test]
async fn middle_failure_is_skipped_and_flagged() {
    let codec = ScriptedCodec::failing_on(&[b"B.heic"]);
    let mut s = session(codec);
    s.select(vec![heic("A.heic"), heic("B.heic"), heic("C.heic")]);

    s.run().await;

    assert_eq!(output_names(&s), vec!["A.jpg", "C.jpg"]);
    assert_eq!(
        s.last_error().map(|e| e.to_string()).as_deref(),
        Some(BATCH_FAILURE_MESSAGE)
    );
    assert!(!s.is_converting());
}

#[tokio::test]
async fn strict_subset_failure_keeps_order_of_successes() {
    let codec = ScriptedCodec::failing_on(&[b"1.heic", b"4.heic"]);
    let mut s = session(codec);
    s.select((0..6).map(|i| heic(&format!("{i}.heic"))));

    s.run().await;

    assert_eq!(output_names(&s), vec!["0.jpg", "2.jpg", "3.jpg", "5.jpg"]);
    assert!(s.last_error().is_some());
}

#[tokio::test]
async fn total_failure_empties_outputs() {
    let codec = ScriptedCodec::failing_on(&[b"y.heic", b"z.heic"]);
    let mut s = session(codec);
    s.select(vec![heic("x.heic")]);
    s.run().await;
    assert_eq!(s.outputs().len(), 1);

    s.clear_roster();
    s.select(vec![heic("y.heic"), heic("z.heic")]);
    let report = s.run().await.unwrap();

    assert!(s.outputs().is_empty());
    assert!(s.last_error().is_some());
    assert!(!s.is_converting());
    assert_eq!(report.stats.failed_items, 2);
}

#[tokio::test]
async fn rerun_after_failure_replaces_previous_outputs() {
    let codec = ScriptedCodec::failing_on(&[b"bad.heic"]);
    let mut s = session(codec);
    s.select(vec![heic("good.heic")]);
    s.run().await;
    assert_eq!(output_names(&s), vec!["good.jpg"]);

    s.clear_roster();
    s.select(vec![heic("bad.heic")]);
    let report = s.run().await.unwrap();

    assert!(s.outputs().is_empty(), "outputs are replaced, not merged");
    assert_eq!(report.superseded.len(), 1);
    assert_eq!(report.superseded[0].name, "good.jpg");
}

#[tokio::test]
async fn empty_roster_is_a_silent_no_op() {
    let codec = ScriptedCodec::failing_on(&[b"bad.heic"]);
    let mut s = session(Arc::clone(&codec));
    s.select(vec![heic("ok.heic"), heic("bad.heic")]);
    s.run().await;
    let outputs = s.outputs().to_vec();
    let error = s.last_error().cloned();

    s.remove_at(1);
    s.remove_at(0);
    assert!(s.roster().is_empty());
    assert!(s.run().await.is_none());

    assert_eq!(s.outputs(), outputs.as_slice());
    assert_eq!(s.last_error().cloned(), error);
    assert!(!s.is_converting());
    assert_eq!(codec.calls().len(), 2, "codec not invoked again");
}

#[tokio::test]
async fn deterministic_codec_gives_identical_names_and_sizes() {
    let mut s = session(ScriptedCodec::always_ok());
    s.select(vec![heic("a.heic"), heic("bb.heic")]);

    s.run().await;
    let first = s.outputs().to_vec();
    s.run().await;
    let second = s.outputs().to_vec();

    let shape = |v: &[heic2jpg::OutputArtifact]| {
        v.iter().map(|a| (a.name.clone(), a.size)).collect::<Vec<_>>()
    };
    assert_eq!(shape(first.as_slice()), shape(second.as_slice()));
    assert!(first.iter().zip(&second).all(|(a, b)| a.handle != b.handle));
}

#[tokio::test]
async fn concurrency_preserves_roster_order() {
    let codec = ScriptedCodec::failing_on(&[b"2.heic"]);
    let config = ConversionConfig::builder()
        .codec(codec)
        .concurrency(4)
        .build()
        .unwrap();
    let mut s = ConversionSession::new(config).unwrap();
    s.select((0..8).map(|i| heic(&format!("{i}.heic"))));

    s.run().await;

    assert_eq!(
        output_names(&s),
        vec!["0.jpg", "1.jpg", "3.jpg", "4.jpg", "5.jpg", "6.jpg", "7.jpg"]
    );
}

// ── Roster behaviour through the session ─────────────────────────────────────

#[test]
fn roster_filters_and_removes_by_position() {
    let mut s = session(ScriptedCodec::always_ok());
    let accepted = s.select(vec![heic("X.heic"), heic("readme.md"), heic("Y.HEIC")]);
    s.drop_in(vec![heic("Z.heic"), heic("photo.jpg")]);
    assert_eq!(accepted, 2);

    let names = |s: &ConversionSession| {
        s.roster()
            .items()
            .iter()
            .map(|i| i.name().to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(names(&s), vec!["X.heic", "Y.HEIC", "Z.heic"]);

    s.remove_at(1);
    assert_eq!(names(&s), vec!["X.heic", "Z.heic"]);
    s.remove_at(5);
    assert_eq!(names(&s), vec!["X.heic", "Z.heic"]);
}

#[test]
fn byte_size_labels() {
    assert_eq!(format_byte_size(0), "0 Bytes");
    assert_eq!(format_byte_size(1024), "1 KB");
    assert_eq!(format_byte_size(1536), "1.5 KB");
}

// ── Progress events ──────────────────────────────────────────────────────────

#[derive(Default)]
struct EventLog(Mutex<Vec<String>>);

impl ConversionProgressCallback for EventLog {
    fn on_batch_start(&self, total: usize) {
        self.0.lock().unwrap().push(format!("start {total}"));
    }
    fn on_item_complete(&self, index: usize, _total: usize, output_name: &str, _size: u64) {
        self.0.lock().unwrap().push(format!("ok {index} {output_name}"));
    }
    fn on_item_error(&self, index: usize, _total: usize, name: &str, _error: &str) {
        self.0.lock().unwrap().push(format!("err {index} {name}"));
    }
    fn on_batch_complete(&self, total: usize, success_count: usize) {
        self.0
            .lock()
            .unwrap()
            .push(format!("done {success_count}/{total}"));
    }
}

#[tokio::test]
async fn progress_events_follow_the_batch() {
    let log = Arc::new(EventLog::default());
    let config = ConversionConfig::builder()
        .codec(ScriptedCodec::failing_on(&[b"b.heic"]))
        .progress_callback(Arc::clone(&log) as Arc<dyn ConversionProgressCallback>)
        .build()
        .unwrap();
    let mut s = ConversionSession::new(config).unwrap();
    s.select(vec![heic("a.heic"), heic("b.heic")]);

    s.run().await;

    assert_eq!(
        *log.0.lock().unwrap(),
        vec!["start 2", "ok 0 a.jpg", "err 1 b.heic", "done 1/2"]
    );
}

// ── Real pixels through the raster codec ─────────────────────────────────────

#[tokio::test]
async fn raster_codec_end_to_end_with_export() {
    let config = ConversionConfig::builder()
        .codec(Arc::new(RasterCodec))
        .build()
        .unwrap();
    let mut s = ConversionSession::new(config).unwrap();
    s.select(vec![
        SourceItem::new("sunset.HEIC", png_payload(16, 12)),
        SourceItem::new("corrupt.heic", b"\0\0\0\x18ftypheic".to_vec()),
    ]);

    s.run().await;
    assert_eq!(output_names(&s), vec!["sunset.jpg"]);
    assert!(s.last_error().is_some());

    let bytes = s.materialize(&s.outputs()[0]).unwrap();
    let decoded = image::load_from_memory(&bytes).expect("valid jpeg");
    assert_eq!((decoded.width(), decoded.height()), (16, 12));
    assert_eq!(s.outputs()[0].size, bytes.len() as u64);

    let dir = tempfile::tempdir().unwrap();
    let outputs = s.outputs().to_vec();
    let paths = export_all(s.store(), &outputs, dir.path()).await.unwrap();
    assert_eq!(paths, vec![dir.path().join("sunset.jpg")]);
    assert!(s.store().is_empty(), "export releases handles");
}

#[tokio::test]
async fn items_read_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("IMG_9.HEIC");
    std::fs::write(&path, png_payload(4, 4)).unwrap();

    let item = SourceItem::from_path(&path).await.unwrap();
    assert_eq!(item.name(), "IMG_9.HEIC");

    let config = ConversionConfig::builder()
        .codec(Arc::new(RasterCodec))
        .build()
        .unwrap();
    let mut s = ConversionSession::new(config).unwrap();
    s.select(vec![item]);
    s.run().await;
    assert_eq!(output_names(&s), vec!["IMG_9.jpg"]);
}

#[test]
fn blocking_callers_can_drive_a_run() {
    let mut s = session(ScriptedCodec::always_ok());
    s.select(vec![heic("a.heic")]);
    let report = tokio_test::block_on(s.run()).expect("non-empty");
    assert_eq!(report.stats.converted_items, 1);
}
