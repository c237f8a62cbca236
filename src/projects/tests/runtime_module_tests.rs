use super::*;

#[test]
fn runtime_exports_the_cache_hook() {
    assert!(RUNTIME_SOURCE.contains(&format!("export function {CREATE_CACHE_EXPORT}(size)")));
    assert!(RUNTIME_SOURCE.contains("return [ref.current.slots, ref.current.commit, UNSET];"));
    assert!(runtime_import_hint().ends_with("from \"@react-unforget/runtime\";"));
}

#[test]
fn runtime_is_written_into_new_directories() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join("vendor/unforget/runtime.js");

    write_runtime_module(&path).expect("runtime should be written");

    let written = fs::read_to_string(&path).expect("runtime should be readable");
    assert_eq!(written, RUNTIME_SOURCE);
}
