use bcast_core::{DurableStore, StoreError};
use bcast_media::{FsMediaStore, MediaConfig, content_hash};

#[tokio::test]
async fn inline_images_are_written_once_and_addressed_by_hash() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsMediaStore::new(dir.path().join("media"), Some("https://media.example.com".into()));

    let uri = "data:image/png;base64,iVBORw0KGgo=";
    let first = store.materialize(uri).await.unwrap();
    let second = store.materialize(uri).await.unwrap();
    assert_eq!(first, second);

    let bytes = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    let name = format!("{}.png", content_hash(&bytes));
    assert_eq!(first, format!("https://media.example.com/{name}"));
    assert_eq!(std::fs::read(dir.path().join("media").join(&name)).unwrap(), bytes);
    assert_eq!(std::fs::read_dir(dir.path().join("media")).unwrap().count(), 1);
}

#[tokio::test]
async fn durable_urls_pass_through_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsMediaStore::new(dir.path(), None);
    let url = store
        .materialize("https://cdn.example.com/promo.jpg")
        .await
        .unwrap();
    assert_eq!(url, "https://cdn.example.com/promo.jpg");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn opaque_references_are_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsMediaStore::new(dir.path(), None);
    let err = store.materialize("blob:http://localhost/42").await.unwrap_err();
    assert!(matches!(err, StoreError::Unsupported(_)));
}

#[test]
fn config_reads_dir_and_base_url() {
    let cfg = MediaConfig::from_lookup(|key| match key {
        "BCAST_MEDIA_DIR" => Some("/var/lib/bcast".into()),
        "BCAST_MEDIA_BASE_URL" => Some("https://m.example.com/".into()),
        _ => None,
    });
    let store = cfg.build();
    assert_eq!(store.root(), std::path::Path::new("/var/lib/bcast"));
    assert_eq!(store.base_url(), "https://m.example.com");
    assert_eq!(MediaConfig::from_lookup(|_| None), MediaConfig::default());
}
