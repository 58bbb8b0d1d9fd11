//! Session housekeeping and zip export

use image::{DynamicImage, Rgb, RgbImage};
use picshrink::image_processor::encode_image;
use picshrink::session::SessionErrorKind;
use picshrink::{
    archive_file_name, build_zip, download_name, IncomingFile, ItemId, OptionsUpdate,
    OutputFormat, PicError, Pipeline, ProcessingOptions, Session, SessionHandle,
};
use std::io::{Cursor, Read};
use std::time::SystemTime;
use zip::ZipArchive;

/// Every entry of an in-memory zip, in archive order
fn unzip(data: Vec<u8>) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(data)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut buffer = Vec::new();
            file.read_to_end(&mut buffer).unwrap();
            (file.name().to_string(), buffer)
        })
        .collect()
}

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([40, 90, 200])));
    encode_image(&img, OutputFormat::Jpeg, 0.9).unwrap()
}

#[tokio::test]
async fn test_zip_export_of_done_items() {
    let session = SessionHandle::new(Session::new());
    session
        .lock()
        .add_files(vec![
            IncomingFile::from_name("img10.jpg", jpeg(16, 16)),
            IncomingFile::from_name("img2.jpg", jpeg(16, 16)),
            IncomingFile::from_name("dup.jpg", jpeg(16, 16)),
            IncomingFile::from_name("dup.jpg", jpeg(8, 8)),
        ])
        .unwrap();
    session.lock().set_options(OptionsUpdate::quality(70));

    Pipeline::new(session.clone()).process_all().await.unwrap();

    let entries = session.lock().export_entries();
    let archive = build_zip(&entries).unwrap();
    let files = unzip(archive);

    let names: Vec<&str> = files.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "dup_webp_70 (1).webp",
            "dup_webp_70.webp",
            "img2_webp_70.webp",
            "img10_webp_70.webp",
        ]
    );
    for ((_, bytes), entry) in files.iter().zip(&entries) {
        assert_eq!(bytes.as_slice(), entry.bytes.as_ref());
    }
}

#[test]
fn test_export_with_nothing_done() {
    let mut session = Session::new();
    session
        .add_files(vec![IncomingFile::from_name("a.jpg", jpeg(4, 4))])
        .unwrap();

    let entries = session.export_entries();
    assert!(entries.is_empty());
    assert!(matches!(build_zip(&entries), Err(PicError::NothingToExport)));
}

#[test]
fn test_names() {
    assert_eq!(download_name("holiday.png", OutputFormat::Avif), "holiday.avif");
    let name = archive_file_name(SystemTime::now());
    assert!(name.starts_with("processed_images_") && name.ends_with(".zip"));
}

#[test]
fn test_intake_rejection_is_all_or_nothing() {
    let mut session = Session::new();
    let result = session.add_files(vec![
        IncomingFile::from_name("a.jpg", jpeg(4, 4)),
        IncomingFile::new("b.svg", "image/svg+xml", b"<svg/>".to_vec()),
    ]);

    assert!(matches!(result, Err(PicError::IntakeRejected { .. })));
    assert!(session.is_empty());
    assert_eq!(session.error().unwrap().kind, SessionErrorKind::Intake);
}

#[tokio::test]
async fn test_remove_releases_previews() {
    let session = SessionHandle::new(Session::new());
    let ids = session
        .lock()
        .add_files(vec![IncomingFile::from_name("a.jpg", jpeg(8, 8))])
        .unwrap();
    Pipeline::new(session.clone()).process_all().await.unwrap();

    let mut session = session.lock();
    let item = session.get(ids[0]).unwrap().clone();
    let original = item.original.preview;
    let processed = item.processed.unwrap().preview;
    assert!(session.preview(original).is_ok());

    assert!(session.remove(ids[0]));
    assert!(matches!(session.preview(original), Err(PicError::PreviewReleased(_))));
    assert!(matches!(session.preview(processed), Err(PicError::PreviewReleased(_))));

    // Gone ids are a no-op
    assert!(!session.remove(ids[0]));
}

#[test]
fn test_reset_restores_defaults() {
    let defaults = ProcessingOptions {
        format: OutputFormat::Jpeg,
        quality: 60,
        ..Default::default()
    };
    let mut session = Session::with_defaults(defaults);
    let ids: Vec<ItemId> = session
        .add_files(vec![IncomingFile::from_name("a.jpg", jpeg(4, 4))])
        .unwrap();
    session.set_options(OptionsUpdate::format(OutputFormat::Gif));

    session.reset();

    assert!(session.get(ids[0]).is_none());
    assert_eq!(session.options(), defaults);
    assert_eq!(session.live_previews(), 0);
}
