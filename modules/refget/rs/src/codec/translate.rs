//! Nucleotide to amino acid translation with the standard genetic code.

/// Amino acid for an unknown or partial codon.
pub const UNKNOWN: u8 = b'X';

// Indexed by the classes of the 1st, 2nd and 3rd base
const CODONS: [[&[u8; 5]; 5]; 5] = [
    [b"KNKNX", b"TTTTX", b"RSRSX", b"IIMIX", b"XXXXX"],
    [b"QHQHX", b"PPPPX", b"RRRRX", b"LLLLX", b"XXXXX"],
    [b"EDEDX", b"AAAAX", b"GGGGX", b"VVVVX", b"XXXXX"],
    [b"*Y*YX", b"SSSSX", b"*CWCX", b"LFLFX", b"XXXXX"],
    [b"XXXXX", b"XXXXX", b"XXXXX", b"XXXXX", b"XXXXX"],
];

// Class of a base: A = 0, C = 1, G = 2, T/U = 3, anything else = 4
const CLASS: [u8; 256] = {
    let mut table = [4; 256];
    let bases = [(b'A', 0), (b'C', 1), (b'G', 2), (b'T', 3), (b'U', 3)];
    let mut i = 0;
    while i < bases.len() {
        let (base, class) = bases[i];
        table[base as usize] = class;
        table[base.to_ascii_lowercase() as usize] = class;
        i += 1;
    }
    table
};

// Class of the complement of a base
const COMPLEMENT_CLASS: [u8; 256] = {
    let mut table = [4; 256];
    let mut i = 0;
    while i < 256 {
        if CLASS[i] < 4 {
            table[i] = 3 - CLASS[i];
        }
        i += 1;
    }
    table
};

#[inline(always)]
fn codon(first: u8, second: u8, third: u8) -> u8 {
    CODONS[first as usize][second as usize][third as usize]
}

/// Translate the sequence and append amino acids to the output. Trailing 1-2 bases that don't form
/// a full codon produce one more amino acid, always `X`.
pub fn translate(seq: &[u8], out: &mut Vec<u8>) {
    let class = |x: &u8| CLASS[*x as usize];

    let mut codons = seq.chunks_exact(3);
    out.extend((&mut codons).map(|x| codon(class(&x[0]), class(&x[1]), class(&x[2]))));

    let partial = codons.remainder();
    if let Some(first) = partial.first() {
        let second = partial.get(1).map_or(4, class);
        out.push(codon(class(first), second, 4));
    }
}

/// Same as `translate(&revcomp(seq), out)` without materializing the reverse complement: codons
/// are read forward through the complement classes and the amino acids are reversed at the end.
pub fn translate_revcomp(seq: &[u8], out: &mut Vec<u8>) {
    let class = |x: &u8| COMPLEMENT_CLASS[*x as usize];
    let start = out.len();

    // The partial codon of the reverse complement sits at the start of the forward sequence
    let (partial, codons) = seq.split_at(seq.len() % 3);
    if let Some(last) = partial.last() {
        let second = if partial.len() == 2 { class(&partial[0]) } else { 4 };
        out.push(codon(class(last), second, 4));
    }
    out.extend(
        codons
            .chunks_exact(3)
            .map(|x| codon(class(&x[2]), class(&x[1]), class(&x[0]))),
    );

    out[start..].reverse();
}

/// Number of amino acids produced by translating `bases` bases.
pub fn translated_len(bases: u64) -> u64 {
    bases.div_ceil(3)
}
