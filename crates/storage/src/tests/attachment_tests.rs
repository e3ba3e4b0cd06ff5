use super::create_test_storage;

#[test]
fn test_save_and_get_attachment() {
    let (storage, _temp_dir) = create_test_storage();
    storage
        .save_attachment("PROJ", "att-1", "screen.png", Some("image/png"), &[1, 2, 3, 4])
        .unwrap();

    let stored = storage.get_attachment("PROJ", "att-1").unwrap().unwrap();
    assert_eq!(stored.filename, "screen.png");
    assert_eq!(stored.content_type.as_deref(), Some("image/png"));
    assert_eq!(stored.content, vec![1, 2, 3, 4]);
    assert_eq!(stored.size, 4);
}

#[test]
fn test_resave_overwrites_blob() {
    let (storage, _temp_dir) = create_test_storage();
    storage.save_attachment("PROJ", "att-1", "a.txt", None, b"first").unwrap();
    storage.save_attachment("PROJ", "att-1", "a.txt", Some("text/plain"), b"second!").unwrap();

    let stored = storage.get_attachment("PROJ", "att-1").unwrap().unwrap();
    assert_eq!(stored.content, b"second!".to_vec());
    assert_eq!(stored.size, 7);
    assert!(storage.get_attachment("OTHER", "att-1").unwrap().is_none());
}
