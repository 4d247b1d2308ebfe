//! Golden vectors for the canonical chunk payload.
//!
//! Each vector pins the exact bytes that get hashed and encrypted for a
//! segment. Any change to key order, integer width or string encoding
//! shows up here before it silently breaks verification of stored chains.

use chainseal_core::{canonical::item_to_value, canonical_payload, ChunkHash, PrevHash, Question};

/// A golden payload vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Segment items.
    pub items: Vec<Question>,
    /// Back-link text: `GENESIS` or 64 hex chars.
    pub prev_hash: &'static str,
    /// Chain position.
    pub index: u32,
    /// Expected canonical payload (hex).
    pub expected_payload: &'static str,
}

/// All golden vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "empty genesis segment",
            items: vec![],
            prev_hash: "GENESIS",
            index: 0,
            expected_payload: "a365696e64657800656974656d73806870726576486173686747454e45534953",
        },
        GoldenVector {
            name: "single question at genesis",
            items: vec![Question::new("2 + 2?", ["3", "4"], 1)],
            prev_hash: "GENESIS",
            index: 0,
            expected_payload: concat!(
                "a365696e64657800656974656d7381a364746578746632202b20323f676f7074",
                "696f6e7382613361346e636f72726563745f6f7074696f6e0168707265764861",
                "73686747454e45534953",
            ),
        },
        GoldenVector {
            name: "linked segment with two questions",
            items: vec![
                Question::new("Capital of France?", ["Paris", "Rome", "Madrid"], 0),
                Question::new("Largest planet?", ["Mars", "Jupiter"], 1),
            ],
            prev_hash: "1111111111111111111111111111111111111111111111111111111111111111",
            index: 1,
            expected_payload: concat!(
                "a365696e64657801656974656d7382a36474657874724361706974616c206f66",
                "204672616e63653f676f7074696f6e738365506172697364526f6d65664d6164",
                "7269646e636f72726563745f6f7074696f6e00a364746578746f4c6172676573",
                "7420706c616e65743f676f7074696f6e7382644d617273674a7570697465726e",
                "636f72726563745f6f7074696f6e016870726576486173687840313131313131",
                "3131313131313131313131313131313131313131313131313131313131313131",
                "3131313131313131313131313131313131313131313131313131",
            ),
        },
        GoldenVector {
            name: "two-byte index",
            items: vec![Question::new("Q", Vec::<String>::new(), 0)],
            prev_hash: "abababababababababababababababababababababababababababababababab",
            index: 300,
            expected_payload: concat!(
                "a365696e64657819012c656974656d7381a364746578746151676f7074696f6e",
                "73806e636f72726563745f6f7074696f6e006870726576486173687840616261",
                "6261626162616261626162616261626162616261626162616261626162616261",
                "6261626162616261626162616261626162616261626162616261626162",
            ),
        },
    ]
}

/// Encode a vector's payload.
pub fn payload_for_vector(vector: &GoldenVector) -> Vec<u8> {
    let items: Vec<_> = vector
        .items
        .iter()
        .map(|item| item_to_value(item).expect("questions always encode"))
        .collect();
    let prev: PrevHash = vector.prev_hash.parse().expect("vector prev_hash is valid");
    canonical_payload(&items, &prev, vector.index).expect("vector payload encodes")
}

/// Check every vector. Returns `(name, matches, actual_hex, hash_hex)`.
pub fn verify_all_vectors() -> Vec<(String, bool, String, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let bytes = payload_for_vector(v);
            let hex = hex::encode(&bytes);
            let hash = ChunkHash::hash(&bytes).to_hex();
            (v.name.to_string(), hex == v.expected_payload, hex, hash)
        })
        .collect()
}
