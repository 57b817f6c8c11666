#![no_main]
use covmap::locator::FileLocator;
use covmap::model::InputFile;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // First line is the query, the rest are indexed paths.
    let mut lines = text.lines();
    let Some(query) = lines.next() else {
        return;
    };
    let locator = FileLocator::new(lines.map(|p| InputFile::new(p, 1))).with_base_dir("/base");
    if let Some(file) = locator.resolve(query) {
        assert!(locator.files().iter().any(|f| f.relative_path == file.relative_path));
    }
});
