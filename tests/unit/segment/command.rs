use super::*;
use crate::assets::image_ref::DecodedImage;

fn png_ref() -> ImageRef {
    let img = DecodedImage::from_rgba8_straight(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 128]).unwrap();
    ImageRef::from_decoded(img)
}

#[cfg(unix)]
#[test]
fn echo_program_round_trips_through_stdio() {
    let seg = CommandSegmenter::new("cat");
    let out = pollster::block_on(seg.segment(&png_ref())).unwrap();
    let decoded = out.decode().unwrap();
    assert_eq!((decoded.width, decoded.height), (2, 1));
    assert!(out.encoded_bytes().is_some());
}

#[cfg(unix)]
#[test]
fn failing_program_reports_status_and_stderr() {
    let seg = CommandSegmenter::new("sh").args(["-c", "echo nope >&2; exit 3"]);
    let err = pollster::block_on(seg.segment(&png_ref())).unwrap_err();
    let msg = err.to_string();
    assert!(msg.starts_with("segmentation error:"), "{msg}");
    assert!(msg.contains("nope"), "{msg}");
}

#[test]
fn missing_program_is_a_segmentation_error() {
    let seg = CommandSegmenter::new("underlay-no-such-segmenter-binary");
    let err = pollster::block_on(seg.segment(&png_ref())).unwrap_err();
    assert!(matches!(err, UnderlayError::Segmentation(_)));
}

#[cfg(unix)]
#[test]
fn slow_program_leaves_the_first_poll_pending() {
    use std::task::{Context, Waker};
    use std::time::{Duration, Instant};

    let seg = CommandSegmenter::new("sh").args(["-c", "sleep 1; cat"]);
    let img = png_ref();
    let mut fut = std::pin::pin!(seg.segment(&img));
    let mut cx = Context::from_waker(Waker::noop());

    let start = Instant::now();
    assert!(fut.as_mut().poll(&mut cx).is_pending());
    assert!(start.elapsed() < Duration::from_millis(500), "{:?}", start.elapsed());

    let out = pollster::block_on(fut).unwrap();
    assert_eq!(out.decode().unwrap().width, 2);
}

#[cfg(unix)]
#[test]
fn store_stays_editable_while_the_program_runs() {
    use std::cell::RefCell;
    use std::task::{Context, Waker};

    use crate::scene::store::SceneStore;
    use crate::segment::{CommitStatus, SegmentationAdapter};

    let store = RefCell::new(SceneStore::new());
    store.borrow_mut().set_original_image(png_ref());
    let adapter = SegmentationAdapter::new(CommandSegmenter::new("sh").args(["-c", "sleep 1; cat"]));

    let (id, status) = {
        let mut fut = std::pin::pin!(adapter.segment(&store));
        let mut cx = Context::from_waker(Waker::noop());
        assert!(fut.as_mut().poll(&mut cx).is_pending());

        let id = store.borrow_mut().add_text_layer();
        assert!(store.borrow().is_processing());
        (id, pollster::block_on(fut).unwrap())
    };
    assert!(matches!(status, CommitStatus::Applied));
    let store = store.into_inner();
    assert!(store.layer(id).is_some());
    assert!(store.images().unwrap().foreground.is_some());
}
