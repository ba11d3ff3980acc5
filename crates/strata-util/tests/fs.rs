use std::fs;

use strata_util::fs::{find_ancestor_dir, list_toml_files};
use tempfile::TempDir;

#[test]
fn test_list_toml_files_sorted() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("zlib.toml"), "").unwrap();
    fs::write(tmp.path().join("mesa.toml"), "").unwrap();
    fs::write(tmp.path().join("notes.txt"), "").unwrap();

    let files = list_toml_files(tmp.path()).unwrap();
    assert_eq!(files.len(), 2);
    assert!(files[0].ends_with("mesa.toml"));
    assert!(files[1].ends_with("zlib.toml"));
}

#[test]
fn test_list_toml_files_missing_dir() {
    let tmp = TempDir::new().unwrap();
    let result = list_toml_files(&tmp.path().join("nope"));
    assert!(result.is_err());
}

#[test]
fn test_find_ancestor_dir() {
    let tmp = TempDir::new().unwrap();
    let recipes = tmp.path().join("recipes");
    let nested = tmp.path().join("a").join("b");
    fs::create_dir_all(&recipes).unwrap();
    fs::create_dir_all(&nested).unwrap();

    let found = find_ancestor_dir(&nested, "recipes").unwrap();
    assert_eq!(found, recipes);
}

#[test]
fn test_find_ancestor_dir_not_found() {
    let tmp = TempDir::new().unwrap();
    assert!(find_ancestor_dir(tmp.path(), "no-such-dir-name-xyz").is_none());
}
