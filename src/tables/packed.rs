//! Bit-packed distance storage.
//!
//! [`Packed2`] keeps 16 entries of 2 bits in each `u32`: entry `i` lives in word `i / 16` at bit
//! `2 * (i % 16)`. The value 3 marks an entry that hasn't been reached yet.
//!
//! [`TritTable`] keeps 5 base-3 digits per byte for the tetra-indexed table. Each tetra layer of
//! `ENTRIES_PER_TETRA` digits is split at `4 * G_SPLIT`: entry `i < 4 * G_SPLIT` is digit `i % 4`
//! of byte `i / 4`, and entry `i >= 4 * G_SPLIT` is digit 4 of byte `i - 4 * G_SPLIT`.

use crate::prelude::*;

pub const UNVISITED: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packed2 {
    words: Vec<u32>,
    len: usize,
}

impl Packed2 {
    /// A table of `len` entries that are all unvisited.
    pub fn unvisited(len: usize) -> Packed2 {
        Packed2 {
            words: vec![u32::MAX; len.div_ceil(16)],
            len,
        }
    }

    pub fn from_words(words: Vec<u32>, len: usize) -> anyhow::Result<Packed2> {
        anyhow::ensure!(
            words.len() == len.div_ceil(16),
            "{} words can't hold {} entries",
            words.len(),
            len
        );
        Ok(Packed2 { words, len })
    }

    pub fn words_for(len: usize) -> usize {
        len.div_ceil(16)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn into_words(self) -> Vec<u32> {
        self.words
    }

    #[inline]
    pub fn get(&self, i: usize) -> u8 {
        ((self.words[i >> 4] >> ((i & 15) * 2)) & 3) as u8
    }

    #[inline]
    pub fn set(&mut self, i: usize, value: u8) {
        let shift = (i & 15) * 2;
        let word = &mut self.words[i >> 4];
        *word = (*word & !(3 << shift)) | (u32::from(value & 3) << shift);
    }

    /// The word holding entries `i..i + 16`, when `i` starts a word and the run fits the table.
    #[inline]
    pub fn word_at(&self, i: usize) -> Option<u32> {
        (i & 15 == 0 && i + 16 <= self.len).then(|| self.words[i >> 4])
    }
}

/// One bit per entry of a packed word, set where the entry equals `value`.
#[inline]
pub fn entries_equal(word: u32, value: u8) -> u32 {
    const PATTERNS: [u32; 4] = [0, 0x5555_5555, 0xAAAA_AAAA, 0xFFFF_FFFF];
    let x = !(word ^ PATTERNS[value as usize & 3]);
    x & (x >> 1) & 0x5555_5555
}

/// Packed 2-bit entries split across layers of equal length, so each layer can be dropped on its
/// own once it has been consumed.
#[derive(Debug)]
pub struct Layered2 {
    layers: Vec<Packed2>,
    layer_len: usize,
}

impl Layered2 {
    pub fn unvisited(layers: usize, layer_len: usize) -> Layered2 {
        Layered2 {
            layers: (0..layers).map(|_| Packed2::unvisited(layer_len)).collect(),
            layer_len,
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len() * self.layer_len
    }

    #[inline]
    fn locate(&self, i: usize) -> (usize, usize) {
        if self.layers.len() == 1 {
            (0, i)
        } else {
            (i / self.layer_len, i % self.layer_len)
        }
    }

    #[inline]
    pub fn get(&self, i: usize) -> u8 {
        let (layer, i) = self.locate(i);
        self.layers[layer].get(i)
    }

    #[inline]
    pub fn set(&mut self, i: usize, value: u8) {
        let (layer, i) = self.locate(i);
        self.layers[layer].set(i, value)
    }

    #[inline]
    pub fn word_at(&self, i: usize) -> Option<u32> {
        let (layer, i) = self.locate(i);
        self.layers[layer].word_at(i)
    }

    pub fn into_layers(self) -> Vec<Packed2> {
        self.layers
    }
}

pub const ENTRIES_PER_TETRA: usize = N_FLIPSLICE_CLASS * N_TWIST;
pub const G_SPLIT: usize = (N_FLIPSLICE_CLASS / 5) * N_TWIST;
pub const BYTES_PER_TETRA: usize = G_SPLIT;

const fn unpack_table() -> [[u8; 5]; 243] {
    let mut table = [[0; 5]; 243];
    let mut b = 0;
    while b < 243 {
        let mut v = b;
        let mut slot = 0;
        while slot < 5 {
            table[b][slot] = (v % 3) as u8;
            v /= 3;
            slot += 1;
        }
        b += 1;
    }
    table
}

const UNPACK: [[u8; 5]; 243] = unpack_table();

pub fn pack5(digits: [u8; 5]) -> u8 {
    digits
        .iter()
        .rev()
        .fold(0, |acc, &d| acc * 3 + d)
}

/// The tetra-indexed distance table, 5 digits mod 3 per byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TritTable {
    bytes: Vec<u8>,
}

impl TritTable {
    pub const LEN: usize = N_TETRA * BYTES_PER_TETRA;

    pub fn from_bytes(bytes: Vec<u8>) -> anyhow::Result<TritTable> {
        anyhow::ensure!(
            bytes.len() == Self::LEN,
            "tetra table has {} bytes, expected {}",
            bytes.len(),
            Self::LEN
        );
        Ok(TritTable { bytes })
    }

    /// Packs one tetra layer of 2-bit distances. Unvisited entries must not remain.
    pub fn pack_layer(layer: &Packed2, out: &mut Vec<u8>) {
        out.clear();
        out.extend((0..G_SPLIT).map(|i| {
            pack5([
                layer.get(4 * i),
                layer.get(4 * i + 1),
                layer.get(4 * i + 2),
                layer.get(4 * i + 3),
                layer.get(4 * G_SPLIT + i),
            ])
        }));
    }

    /// Distance mod 3 of entry `i` of the layer for `tetra`.
    #[inline]
    pub fn get(&self, tetra: usize, i: usize) -> u8 {
        let base = tetra * BYTES_PER_TETRA;
        layer_digit(&self.bytes[base..base + BYTES_PER_TETRA], i)
    }
}

#[inline]
fn layer_digit(layer: &[u8], i: usize) -> u8 {
    if i < 4 * G_SPLIT {
        UNPACK[layer[i >> 2] as usize][i & 3]
    } else {
        UNPACK[layer[i - 4 * G_SPLIT] as usize][4]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_after_set() {
        let mut p = Packed2::unvisited(40);
        assert!((0..40).all(|i| p.get(i) == UNVISITED));

        p.set(0, 0);
        p.set(17, 1);
        p.set(39, 2);
        assert_eq!(p.get(0), 0);
        assert_eq!(p.get(17), 1);
        assert_eq!(p.get(39), 2);
        assert_eq!(p.get(16), UNVISITED);
        assert_eq!(p.get(18), UNVISITED);

        p.set(17, 3);
        assert_eq!(p.get(17), UNVISITED);
    }

    #[test]
    fn words_only_cover_whole_runs() {
        let p = Packed2::unvisited(40);
        assert_eq!(p.word_at(0), Some(u32::MAX));
        assert_eq!(p.word_at(16), Some(u32::MAX));
        assert_eq!(p.word_at(32), None);
        assert_eq!(p.word_at(3), None);
    }

    #[test]
    fn finds_equal_entries() {
        let mut p = Packed2::unvisited(16);
        p.set(2, 0);
        p.set(5, 1);
        p.set(9, 2);
        let w = p.words()[0];

        assert_eq!(entries_equal(w, 0), 1 << 4);
        assert_eq!(entries_equal(w, 1), 1 << 10);
        assert_eq!(entries_equal(w, 2), 1 << 18);
        assert_eq!(entries_equal(w, 3).count_ones(), 13);
        assert_eq!(entries_equal(u32::MAX, 0), 0);
    }

    #[test]
    fn layers_are_independent() {
        let mut l = Layered2::unvisited(3, 21);
        l.set(20, 0);
        l.set(21, 1);
        l.set(62, 2);
        assert_eq!(l.len(), 63);
        assert_eq!(l.get(20), 0);
        assert_eq!(l.get(21), 1);
        assert_eq!(l.get(62), 2);

        assert_eq!(l.word_at(21), Some(u32::MAX - 2));
        assert_eq!(l.word_at(16), None);

        let layers = l.into_layers();
        assert_eq!(layers[1].get(0), 1);
        assert_eq!(layers[2].get(20), 2);
    }

    #[test]
    fn pack5_digits() {
        assert_eq!(pack5([0; 5]), 0);
        assert_eq!(pack5([2; 5]), 242);
        assert_eq!(pack5([1, 2, 0, 1, 2]), 1 + 6 + 27 + 162);
        for b in 0..243u8 {
            assert_eq!(pack5(UNPACK[b as usize]), b);
        }
    }

    #[test]
    fn split_layout() {
        assert_eq!(5 * G_SPLIT, ENTRIES_PER_TETRA);

        let mut layer =
            Packed2::from_words(vec![0; Packed2::words_for(ENTRIES_PER_TETRA)], ENTRIES_PER_TETRA)
                .unwrap();
        for i in [1, 3, 4, 4 * G_SPLIT - 1, 4 * G_SPLIT, ENTRIES_PER_TETRA - 1] {
            layer.set(i, (i % 3) as u8);
        }
        let mut bytes = Vec::new();
        TritTable::pack_layer(&layer, &mut bytes);
        assert_eq!(bytes.len(), BYTES_PER_TETRA);

        for i in [0, 1, 2, 3, 4, 4 * G_SPLIT - 1, 4 * G_SPLIT, ENTRIES_PER_TETRA - 1] {
            let expected = if i == 2 { 0 } else { (i % 3) as u8 };
            assert_eq!(layer_digit(&bytes, i), expected, "entry {}", i);
        }
    }
}
