use camsync_core::{
    BehaviorAfterUpload, CreatedBy, ExtensionMimeResolver, MediaCategory, MediaKind,
    UploadIntent, classify,
};
use std::path::Path;

#[test]
fn camera_file_names_map_to_categories() {
    let resolver = ExtensionMimeResolver;

    let (kind, mime) = classify("IMG_0001.jpg", &resolver);
    assert_eq!(kind, MediaKind::Picture);
    assert_eq!(mime, "image/jpeg");

    let (kind, mime) = classify("VID_0002.mp4", &resolver);
    assert_eq!(kind, MediaKind::Video);
    assert_eq!(mime, "video/mp4");

    let (kind, _) = classify("readme.txt", &resolver);
    assert_eq!(kind, MediaKind::Other);
}

#[test]
fn extension_lookup_ignores_case() {
    let resolver = ExtensionMimeResolver;
    assert_eq!(classify("IMG_0003.JPG", &resolver).0, MediaKind::Picture);
    assert_eq!(classify("clip.MOV", &resolver).0, MediaKind::Video);
    assert_eq!(classify("photo.png", &resolver).0, MediaKind::Picture);
}

#[test]
fn categories_match_their_kind() {
    assert_eq!(MediaCategory::Pictures.kind(), MediaKind::Picture);
    assert_eq!(MediaCategory::Videos.kind(), MediaKind::Video);
    assert_eq!(
        MediaCategory::ALL,
        [MediaCategory::Pictures, MediaCategory::Videos]
    );
}

#[test]
fn intent_serializes_with_tags() {
    let intent = UploadIntent::for_file(
        MediaCategory::Pictures,
        Path::new("/home/u/Pictures"),
        "/CameraUpload/",
        "IMG_0001.jpg",
        "image/jpeg",
        None,
        BehaviorAfterUpload::Forget,
    )
    .unwrap();

    let value = serde_json::to_value(&intent).unwrap();
    assert_eq!(value["created_by"], "camera-upload-picture");
    assert_eq!(value["behavior"], "forget");
    assert_eq!(value["remote_path"], "/CameraUpload/IMG_0001.jpg");
    assert!(value["account"].is_null());
    assert_eq!(intent.created_by, CreatedBy::CameraUploadPicture);
}
