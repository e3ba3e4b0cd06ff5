use ztoq_core::MappingType;

use super::create_test_storage;

#[test]
fn test_record_mapping_first_write_wins() {
    let (storage, _temp_dir) = create_test_storage();

    assert!(storage.record_mapping("PROJ", MappingType::FolderToModule, "10", "500").unwrap());
    assert!(!storage.record_mapping("PROJ", MappingType::FolderToModule, "10", "999").unwrap());

    let mapping =
        storage.get_mapping("PROJ", MappingType::FolderToModule, "10").unwrap().unwrap();
    assert_eq!(mapping.target_id, "500");
}

#[test]
fn test_get_mappings_filters_by_type() {
    let (storage, _temp_dir) = create_test_storage();
    storage.record_mapping("PROJ", MappingType::FolderToModule, "1", "a").unwrap();
    storage.record_mapping("PROJ", MappingType::TestCaseToTestCase, "2", "b").unwrap();
    storage.record_mapping("PROJ", MappingType::FolderToModule, "3", "c").unwrap();
    storage.record_mapping("OTHER", MappingType::FolderToModule, "4", "d").unwrap();

    let all = storage.get_mappings("PROJ", None).unwrap();
    assert_eq!(all.len(), 3);

    let folders = storage.get_mappings("PROJ", Some(MappingType::FolderToModule)).unwrap();
    let sources: Vec<&str> = folders.iter().map(|m| m.source_id.as_str()).collect();
    assert_eq!(sources, vec!["1", "3"]);
}

#[test]
fn test_missing_mapping_is_none() {
    let (storage, _temp_dir) = create_test_storage();
    assert!(storage.get_mapping("PROJ", MappingType::TestCycleToTestCycle, "x").unwrap().is_none());
}
