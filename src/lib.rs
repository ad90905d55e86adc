use std::cmp::Ordering;
use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::Deserialize;
use unicode_canonical_combining_class::get_canonical_combining_class as get_ccc;
use unicode_normalization::UnicodeNormalization;

//
// Structs etc.
//

#[derive(Deserialize)]
pub struct CollationTable {
    bucket_index: Vec<u32>,
    packed: Vec<u32>,
}

//
// Static/const
//

// Layout contract shared with the offline table compiler. Each packed entry
// starts with a header word: bit 31 flags the last entry in its hash bucket;
// the key length, value length, and first key codepoint occupy the fields
// below it. The remaining key codepoints follow the header, then the weights.
pub const HASH_BUCKETS: usize = 1021;
pub const HASH_MULTIPLIER: u64 = 37;
pub const LONGEST_KEY: usize = 3;

const KEY_LEN_BITS: u32 = 3;
const VALUE_LEN_BITS: u32 = 7;
const CODEPOINT_BITS: u32 = 21;

const LAST_IN_BUCKET: u32 = 1 << 31;
const KEY_LEN_SHIFT: u32 = 31 - KEY_LEN_BITS;
const VALUE_LEN_SHIFT: u32 = KEY_LEN_SHIFT - VALUE_LEN_BITS;
const KEY_LEN_MASK: u32 = (1 << KEY_LEN_BITS) - 1;
const VALUE_LEN_MASK: u32 = (1 << VALUE_LEN_BITS) - 1;
const CODEPOINT_MASK: u32 = (1 << CODEPOINT_BITS) - 1;

// Bases for synthesized weights, per UTS #10 §7.1.
const DERIVED_BASE_HAN_CORE: u32 = 0xFB40;
const DERIVED_BASE_HAN_EXT: u32 = 0xFB80;
const DERIVED_BASE_DEFAULT: u32 = 0xFBC0;

// CJK compatibility ideographs that take the core Han base; every other
// codepoint in their block decomposes canonically and never reaches the
// synthesizer.
const HAN_COMPATIBILITY: [u32; 12] = [
    0xFA0E, 0xFA0F, 0xFA11, 0xFA13, 0xFA14, 0xFA1F, 0xFA21, 0xFA23, 0xFA24, 0xFA27, 0xFA28,
    0xFA29,
];

static DUCET_LEVEL1: &[u8; 5_068] = include_bytes!("bincode/ducet_level1");

static TABLE: Lazy<CollationTable> = Lazy::new(|| {
    let table: CollationTable =
        bincode::deserialize(DUCET_LEVEL1).expect("collation table artifact failed to decode");

    assert_eq!(
        table.bucket_index.len(),
        HASH_BUCKETS,
        "collation table artifact does not match the compiled layout constants"
    );

    table
});

//
// Functions, public
//

pub fn match_key(input: &str) -> Vec<u32> {
    nfd_to_match_key(get_nfd(input))
}

pub fn nfd_to_match_key(mut codepoints: Vec<u32>) -> Vec<u32> {
    let table = CollationTable::shared();
    let mut key = Vec::with_capacity(codepoints.len());

    let mut i = 0;
    while i < codepoints.len() {
        i += append_weights(table, &mut codepoints, i, &mut key);
    }

    key
}

pub fn get_nfd(input: &str) -> Vec<u32> {
    UnicodeNormalization::nfd(input).map(|c| c as u32).collect()
}

pub fn collate(str_a: &str, str_b: &str) -> Ordering {
    compare_match_keys(&match_key(str_a), &match_key(str_b))
}

pub fn compare_match_keys(a: &[u32], b: &[u32]) -> Ordering {
    a.cmp(b)
}

impl CollationTable {
    pub fn shared() -> &'static Self {
        &TABLE
    }

    pub fn lookup(&self, span: &[u32]) -> Option<&[u32]> {
        let mut pos = self.bucket_index[hash_key(span)] as usize;

        while pos < self.packed.len() {
            let header = self.packed[pos];
            let key_len = ((header >> KEY_LEN_SHIFT) & KEY_LEN_MASK) as usize;
            let value_len = ((header >> VALUE_LEN_SHIFT) & VALUE_LEN_MASK) as usize;
            let first = header & CODEPOINT_MASK;

            if key_len == span.len()
                && first == span[0]
                && self.packed[pos + 1..pos + key_len] == span[1..]
            {
                let start = pos + key_len;
                return Some(&self.packed[start..start + value_len]);
            }

            if header & LAST_IN_BUCKET != 0 {
                return None;
            }

            pos += key_len + value_len;
        }

        None
    }
}

//
// Functions, private
//

fn hash_key(span: &[u32]) -> usize {
    let mut hash: u64 = 0;

    for &codepoint in span {
        hash = (hash * HASH_MULTIPLIER + u64::from(codepoint)) % HASH_BUCKETS as u64;
    }

    hash as usize
}

fn append_weights(
    table: &CollationTable,
    codepoints: &mut [u32],
    i: usize,
    key: &mut Vec<u32>,
) -> usize {
    let remaining = codepoints.len() - i;

    // S2.1: find the longest initial span with a table entry. An entry with
    // an empty value still counts as a match.
    let mut best: Option<&[u32]> = None;
    let mut best_len = 0;

    for j in 1..=LONGEST_KEY.min(remaining) {
        if let Some(elements) = table.lookup(&codepoints[i..i + j]) {
            best = Some(elements);
            best_len = j;
        }
    }

    if let Some(mut elements) = best {
        // S2.1.1: scan the non-starters following the match. A combining
        // class becomes blocking once a non-starter of that class has been
        // passed; any starter ends the scan.
        let mut blocked_classes = HashSet::new();
        let mut j = best_len;

        while i + j < codepoints.len() {
            let candidate = codepoints[i + j];
            let ccc = combining_class(candidate);
            if ccc == 0 {
                break;
            }

            // S2.1.2: try the current best key plus the unblocked non-starter
            if !blocked_classes.contains(&ccc) {
                let mut extended = Vec::with_capacity(best_len + 1);
                extended.extend_from_slice(&codepoints[i..i + best_len]);
                extended.push(candidate);

                if let Some(found) = table.lookup(&extended) {
                    // S2.1.3: splice the candidate back to follow the key,
                    // shifting the intervening marks right by one. Only one
                    // discontiguous combination is taken per step.
                    codepoints[i + best_len..=i + j].rotate_right(1);
                    elements = found;
                    best_len += 1;
                    break;
                }
            }

            blocked_classes.insert(ccc);
            j += 1;
        }

        // S2.2: emit the elements of the longest match
        key.extend_from_slice(elements);
        return best_len;
    }

    // No match at any length; synthesize weights for one codepoint
    let [high, low] = derived_weights(codepoints[i]);
    key.push(high);
    key.push(low);

    1
}

fn combining_class(codepoint: u32) -> u8 {
    // The pre-decoded entry point admits values that are not Unicode scalars;
    // those are starters as far as the tokenizer is concerned.
    char::from_u32(codepoint).map_or(0, |c| get_ccc(c) as u8)
}

fn derived_weights(codepoint: u32) -> [u32; 2] {
    let base = if is_han_core(codepoint) {
        DERIVED_BASE_HAN_CORE
    } else if is_han_extension(codepoint) {
        DERIVED_BASE_HAN_EXT
    } else {
        DERIVED_BASE_DEFAULT
    };

    [base + (codepoint >> 15), (codepoint & 0x7FFF) | 0x8000]
}

fn is_han_core(codepoint: u32) -> bool {
    (0x4E00..=0x9FCC).contains(&codepoint) || HAN_COMPATIBILITY.contains(&codepoint)
}

fn is_han_extension(codepoint: u32) -> bool {
    (0x3400..=0x4DB5).contains(&codepoint)
        || (0x2_0000..=0x2_A6D6).contains(&codepoint)
        || (0x2_A700..=0x2_B734).contains(&codepoint)
        || (0x2_B740..=0x2_B81D).contains(&codepoint)
}
