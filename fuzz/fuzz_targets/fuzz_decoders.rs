#![no_main]

use libfuzzer_sys::fuzz_target;

use mzlib::formats::mzdata::MzDataDecoder;
use mzlib::formats::mzxml::MzXmlDecoder;

fuzz_target!(|data: &[u8]| {
    // Both decoders must return an error on bad input, never panic
    let _ = MzXmlDecoder::default().decode(data);
    let _ = MzDataDecoder::default().decode(data);
});
