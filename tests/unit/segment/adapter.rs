use super::*;
use crate::assets::image_ref::DecodedImage;

fn solid(w: u32, h: u32, a: u8) -> ImageRef {
    let px = [a, a, a, a].repeat((w * h) as usize);
    ImageRef::from_decoded(DecodedImage::from_rgba8_premul(w, h, px).unwrap())
}

struct Fixed(UnderlayResult<ImageRef>);

impl Segmenter for Fixed {
    async fn segment(&self, _image: &ImageRef) -> UnderlayResult<ImageRef> {
        match &self.0 {
            Ok(img) => Ok(img.clone()),
            Err(e) => Err(UnderlayError::validation(e.to_string())),
        }
    }
}

/// Replaces the store's original while "segmenting".
struct Racing<'a> {
    store: &'a RefCell<SceneStore>,
    replacement: ImageRef,
}

impl Segmenter for Racing<'_> {
    async fn segment(&self, _image: &ImageRef) -> UnderlayResult<ImageRef> {
        self.store
            .borrow_mut()
            .set_original_image(self.replacement.clone());
        Ok(solid(2, 2, 0))
    }
}

#[test]
fn successful_result_becomes_foreground() {
    let mut store = SceneStore::new();
    store.set_original_image(solid(2, 2, 255));
    let cut = solid(2, 2, 0);
    let adapter = SegmentationAdapter::new(Fixed(Ok(cut.clone())));

    let ticket = adapter.request(&mut store).unwrap();
    assert!(store.is_processing());
    let result = pollster::block_on(adapter.run(&ticket));
    let status = commit(&mut store, &ticket, result);
    assert!(status.is_applied());
    assert!(!store.is_processing());
    assert!(store.images().unwrap().foreground.as_ref().unwrap().same_image(&cut));
}

#[test]
fn failure_clears_processing_and_keeps_background() {
    let store = RefCell::new(SceneStore::new());
    let bg = solid(2, 2, 255);
    store.borrow_mut().set_original_image(bg.clone());
    let adapter = SegmentationAdapter::new(Fixed(Err(UnderlayError::validation("model fault"))));

    let status = pollster::block_on(adapter.segment(&store)).unwrap();
    assert!(matches!(status, CommitStatus::Failed(UnderlayError::Segmentation(_))));
    let s = store.borrow();
    assert!(!s.is_processing());
    assert!(s.images().unwrap().foreground.is_none());
    assert!(s.images().unwrap().background.same_image(&bg));
    assert!(s.last_error().unwrap().contains("model fault"));
}

#[test]
fn undecodable_cutout_is_a_segmentation_error() {
    let adapter = SegmentationAdapter::new(Fixed(Ok(ImageRef::from_encoded(vec![1u8, 2, 3]))));
    let mut store = SceneStore::new();
    store.set_original_image(solid(1, 1, 255));
    let ticket = adapter.request(&mut store).unwrap();
    let err = pollster::block_on(adapter.run(&ticket)).unwrap_err();
    assert!(matches!(err, UnderlayError::Segmentation(_)));
}

#[test]
fn late_result_for_replaced_image_is_discarded() {
    let store = RefCell::new(SceneStore::new());
    store.borrow_mut().set_original_image(solid(2, 2, 255));
    let b = solid(3, 3, 255);
    let adapter = SegmentationAdapter::new(Racing {
        store: &store,
        replacement: b.clone(),
    });

    let status = pollster::block_on(adapter.segment(&store)).unwrap();
    assert!(matches!(status, CommitStatus::Stale));
    let s = store.borrow();
    let images = s.images().unwrap();
    assert!(images.original.same_image(&b));
    assert!(images.foreground.is_none());
    assert!(!s.is_processing());
}

#[test]
fn stale_result_does_not_clear_a_newer_request() {
    let mut store = SceneStore::new();
    store.set_original_image(solid(2, 2, 255));
    let adapter = SegmentationAdapter::new(Fixed(Ok(solid(2, 2, 0))));
    let old = adapter.request(&mut store).unwrap();

    store.set_original_image(solid(4, 4, 255));
    let newer = adapter.request(&mut store).unwrap();

    let status = commit(&mut store, &old, Ok(solid(2, 2, 0)));
    assert!(matches!(status, CommitStatus::Stale));
    assert!(store.is_processing());

    let status = commit(&mut store, &newer, Ok(solid(4, 4, 0)));
    assert!(status.is_applied());
    assert!(!store.is_processing());
}

#[test]
fn no_image_means_no_request() {
    let store = RefCell::new(SceneStore::new());
    let adapter = SegmentationAdapter::new(Fixed(Ok(solid(1, 1, 0))));
    assert!(pollster::block_on(adapter.segment(&store)).is_none());
    assert!(!store.borrow().is_processing());
}
