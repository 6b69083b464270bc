#![no_main]
use libfuzzer_sys::fuzz_target;
use minixml::parser::{load_str_with_options, ParseOptions, TypeAttributeClassifier};
use minixml::serial::{save_to_string, HtmlWhitespace, SaveOptions};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let opts = ParseOptions::default()
            .classifier(TypeAttributeClassifier)
            .max_depth(64);
        // Load -> save -> load must never panic
        if let Ok(doc) = load_str_with_options(s, &opts) {
            if let Some(root) = doc.root() {
                let plain = save_to_string(&doc, root, &SaveOptions::default());
                let formatted =
                    save_to_string(&doc, root, &SaveOptions::default().whitespace(HtmlWhitespace));
                for output in [plain, formatted].into_iter().flatten() {
                    let _ = load_str_with_options(&output, &opts);
                }
            }
        }
    }
});
