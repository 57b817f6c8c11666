#![no_main]
use covmap::locator::FileLocator;
use covmap::model::InputFile;
use covmap::parsers::Parser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let locator = FileLocator::new([InputFile::new("src/main.rs", 100), InputFile::new("src/lib.rs", 10)]);
    // Parser must not panic on any input.
    let _ = covmap::parsers::lcov::LcovParser.parse(&locator, "fuzz.info", data);
});
