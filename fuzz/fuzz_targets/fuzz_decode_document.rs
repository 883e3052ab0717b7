#![no_main]

use libfuzzer_sys::fuzz_target;
use sifen::parser::{clean_document_content, decode_document, extract_document_fragment};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // The scan tier never fails, so the cascade must always yield a document.
        let fragment = extract_document_fragment(&clean_document_content(s));
        assert!(decode_document(&fragment.text).is_ok());
    }
});
