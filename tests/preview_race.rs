use std::sync::Arc;

use futures::{executor::LocalPool, task::LocalSpawnExt};
use postcraft::{
    CARD_HEIGHT, CARD_WIDTH, LayoutPreset, PendingImage, PostcraftError, PreparedImage,
    PreviewRequest, Previewer, Rgba8, Surface, draw_back_template,
};

fn solid_image(rgb: [u8; 3]) -> PreparedImage {
    let px = [rgb[0], rgb[1], rgb[2], 255u8];
    PreparedImage::from_premul_bytes(16, 12, px.repeat(16 * 12)).unwrap()
}

fn request(photo: PendingImage) -> PreviewRequest {
    let ink = Surface::new(CARD_WIDTH as u32, CARD_HEIGHT as u32).unwrap();
    let mut template = Surface::new(CARD_WIDTH as u32, CARD_HEIGHT as u32).unwrap();
    draw_back_template(&mut template);
    PreviewRequest {
        preset: LayoutPreset::Horizontal,
        photo,
        background: None,
        ink,
        template,
        message: String::new(),
        font: None,
        text_color: Rgba8::BLACK,
    }
}

/// Pixel at the center of the front face, which shows the request's photo.
fn front_center_pixel(preview: &postcraft::Preview) -> [u8; 4] {
    let geo = postcraft::compose::geometry(LayoutPreset::Horizontal);
    let center = geo.front.transform() * kurbo::Point::new(CARD_WIDTH / 2.0, CARD_HEIGHT / 2.0);
    let idx = ((center.y as u32 * preview.width + center.x as u32) * 4) as usize;
    [
        preview.data[idx],
        preview.data[idx + 1],
        preview.data[idx + 2],
        preview.data[idx + 3],
    ]
}

#[test]
fn only_the_newest_request_is_surfaced() {
    let previewer = Arc::new(Previewer::new());
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let (deliver_a, photo_a) = PendingImage::channel();
    let (deliver_b, photo_b) = PendingImage::channel();

    for photo in [photo_a, photo_b] {
        let previewer = Arc::clone(&previewer);
        spawner
            .spawn_local(async move {
                let _ = previewer.compose(request(photo)).await;
            })
            .unwrap();
    }
    pool.run_until_stalled();
    assert!(previewer.current().is_none());

    // B (the newer request) finishes first and becomes current.
    deliver_b.supply(Ok(solid_image([0, 0, 255])));
    pool.run_until_stalled();
    let current = previewer.current().expect("B surfaced");
    assert!(front_center_pixel(&current)[2] >= 250);

    // A's load arrives late; its composition completes but is never
    // surfaced over the newer preview.
    deliver_a.supply(Ok(solid_image([255, 0, 0])));
    pool.run_until_stalled();
    let current = previewer.current().expect("B still surfaced");
    let px = front_center_pixel(&current);
    assert!(px[2] >= 250);
    assert!(px[0] <= 5);
}

#[test]
fn failed_load_is_terminal_and_leaves_current_untouched() {
    let previewer = Previewer::new();

    let ok = futures::executor::block_on(
        previewer.compose(request(PendingImage::ready(solid_image([0, 0, 255])))),
    )
    .unwrap();
    assert_eq!(ok.width, 1600);
    assert!(previewer.current().is_some());

    let (delivery, photo) = PendingImage::channel();
    delivery.supply(Err(PostcraftError::load("photo failed to decode")));
    let err = futures::executor::block_on(previewer.compose(request(photo))).unwrap_err();
    assert!(matches!(err, PostcraftError::Load(_)));

    // The failed attempt did not clobber the surfaced preview.
    let current = previewer.current().expect("previous preview kept");
    assert!(front_center_pixel(&current)[2] >= 250);
}

#[test]
fn dropped_delivery_surfaces_a_load_error() {
    let previewer = Previewer::new();
    let (delivery, photo) = PendingImage::channel();
    drop(delivery);
    let err = futures::executor::block_on(previewer.compose(request(photo))).unwrap_err();
    assert!(matches!(err, PostcraftError::Load(_)));
    assert!(previewer.current().is_none());
}

#[test]
fn ink_snapshots_are_captured_at_request_time() {
    let previewer = Previewer::new();
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let mut ink = Surface::new(CARD_WIDTH as u32, CARD_HEIGHT as u32).unwrap();
    let (delivery, photo) = PendingImage::channel();

    // The request snapshots the (empty) ink surface by value.
    let previewer = Arc::new(previewer);
    {
        let previewer = Arc::clone(&previewer);
        let mut req = request(photo);
        req.ink = ink.clone();
        spawner
            .spawn_local(async move {
                let _ = previewer.compose(req).await;
            })
            .unwrap();
    }
    pool.run_until_stalled();

    // Strokes drawn while the photo is still loading must not appear in the
    // in-flight composition.
    ink.fill_rect(
        kurbo::Rect::new(0.0, 0.0, CARD_WIDTH, CARD_HEIGHT),
        kurbo::Affine::IDENTITY,
        Rgba8::opaque(255, 0, 0),
    );

    delivery.supply(Ok(solid_image([0, 0, 255])));
    pool.run_until_stalled();

    let current = previewer.current().expect("composition surfaced");
    let px = front_center_pixel(&current);
    assert!(px[0] <= 5 && px[2] >= 250, "got {px:?}");
}
