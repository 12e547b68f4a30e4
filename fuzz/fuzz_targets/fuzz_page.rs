//! Fuzz testing for page file parsing.
//!
//! Feeds arbitrary bytes to `PageView` and decodes every slot as an
//! `AddressNode`. Damaged pages must be reported as errors, never panic or
//! read outside the buffer.

#![no_main]

use libfuzzer_sys::fuzz_target;

use geodict::storage::PageView;
use geodict::AddressNode;

fuzz_target!(|data: &[u8]| {
    if let Ok(view) = PageView::parse(data) {
        let _ = view.verify();
        for slot in 0..view.record_count() {
            if let Ok(bytes) = view.record_bytes(slot) {
                let _ = <AddressNode as geodict::storage::Record>::decode(bytes);
            }
        }
        let _ = view.decode_all::<AddressNode>();
    }
});
