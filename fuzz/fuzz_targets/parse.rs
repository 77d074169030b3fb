#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use pcos_codec::Document;

fuzz_target!(|data: &[u8]| {
    // Parsing must never panic on arbitrary input. When it succeeds, every
    // directory entry must resolve, every block must be readable to its
    // declared end, and re-encoding must not panic. Byte equality is not
    // asserted: the parser tolerates trailing slack, duplicate names, and
    // overlong varints that a re-encode would normalize away.
    let buf = Bytes::copy_from_slice(data);
    let Ok(doc) = Document::parse(buf) else {
        return;
    };

    let names: Vec<String> = doc.block_names().map(String::from).collect();
    for name in names {
        let mut block = doc.block(&name).expect("directory entry must resolve");
        let size = block.size();
        block.read_bytes(size).expect("block body must be in bounds");
    }

    let reencoded = doc.encode();
    assert_eq!(reencoded.len(), doc.encode_size());
});
