#![no_main]
use libfuzzer_sys::fuzz_target;
use minixml::locate::Descend;
use minixml::parser::{load_bytes, ParseOptions};

fuzz_target!(|data: &[u8]| {
    // Loading arbitrary bytes must never panic, and a loaded tree must be
    // fully walkable.
    if let Ok(doc) = load_bytes(data, &ParseOptions::default()) {
        if let Some(root) = doc.root() {
            let mut node = root;
            while let Some(next) = doc.walk_next(node, root, Descend::Yes) {
                node = next;
            }
            let _ = doc.find_element(root, root, Some("a"), None, None, Descend::Yes);
        }
    }
});
