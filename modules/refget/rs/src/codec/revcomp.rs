/// Complement of every byte. Case is preserved, IUPAC ambiguity codes map to their complements and
/// anything else becomes `N` (`n` for lower-case letters).
pub const COMPLEMENT: [u8; 256] = {
    let mut table = [b'N'; 256];
    let mut letter = b'a';
    while letter <= b'z' {
        table[letter as usize] = b'n';
        letter += 1;
    }

    let pairs = [
        (b'A', b'T'),
        (b'T', b'A'),
        (b'U', b'A'),
        (b'C', b'G'),
        (b'G', b'C'),
        (b'R', b'Y'),
        (b'Y', b'R'),
        (b'K', b'M'),
        (b'M', b'K'),
        (b'B', b'V'),
        (b'V', b'B'),
        (b'D', b'H'),
        (b'H', b'D'),
        (b'S', b'S'),
        (b'W', b'W'),
        (b'N', b'N'),
    ];
    let mut i = 0;
    while i < pairs.len() {
        let (from, to) = pairs[i];
        table[from as usize] = to;
        table[from.to_ascii_lowercase() as usize] = to.to_ascii_lowercase();
        i += 1;
    }
    table
};

#[inline(always)]
pub fn complement(base: u8) -> u8 {
    COMPLEMENT[base as usize]
}

/// Reverse-complement the sequence in place. Newlines keep their positions, only the bases
/// between them are reversed.
pub fn revcomp_in_place(seq: &mut [u8]) {
    let (mut left, mut right) = (0, seq.len());
    loop {
        while left < right && seq[left] == b'\n' {
            left += 1;
        }
        while left < right && seq[right - 1] == b'\n' {
            right -= 1;
        }
        if left >= right {
            break;
        }

        right -= 1;
        if left == right {
            seq[left] = complement(seq[left]);
            break;
        }
        let tmp = complement(seq[left]);
        seq[left] = complement(seq[right]);
        seq[right] = tmp;
        left += 1;
    }
}

pub fn revcomp(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|x| complement(*x)).collect()
}
