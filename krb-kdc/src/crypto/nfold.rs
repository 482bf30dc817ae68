//! [n-fold](https://www.rfc-editor.org/rfc/rfc3961#section-5.1) operation.

/// Folds `data` into `size` bytes.
///
/// The input is replicated up to the least common multiple of both lengths, each copy rotated right by 13 bits
/// relative to the previous one, and the resulting `size`-byte blocks are summed with one's-complement addition.
pub fn n_fold(data: &[u8], size: usize) -> Vec<u8> {
    if size == 0 || data.is_empty() {
        return Vec::new();
    }

    let lcm = lcm(data.len(), size);

    let mut replicated = Vec::with_capacity(lcm);
    let mut copy = data.to_vec();
    while replicated.len() < lcm {
        replicated.extend_from_slice(&copy);
        copy = rotate_right(&copy, 13);
    }

    let mut sum = vec![0; size];
    for block in replicated.chunks_exact(size) {
        add_ones_complement(&mut sum, block);
    }

    sum
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let rem = a % b;
        a = b;
        b = rem;
    }

    a
}

fn lcm(a: usize, b: usize) -> usize {
    a / gcd(a, b) * b
}

/// Rotates the whole byte string right by `bits`, treating it as one big-endian bit string.
fn rotate_right(data: &[u8], bits: usize) -> Vec<u8> {
    let len = data.len();
    let shift = bits % (len * 8);
    let byte_shift = shift / 8;
    let bit_shift = shift % 8;

    (0..len)
        .map(|i| {
            let high = data[(i + 2 * len - byte_shift - 1) % len];
            let low = data[(i + len - byte_shift) % len];

            ((u16::from(high) << 8 | u16::from(low)) >> bit_shift) as u8
        })
        .collect()
}

/// One's-complement addition with end-around carry.
fn add_ones_complement(acc: &mut [u8], block: &[u8]) {
    let mut carry = 0_u16;
    for (a, b) in acc.iter_mut().zip(block.iter()).rev() {
        let sum = u16::from(*a) + u16::from(*b) + carry;
        *a = sum as u8;
        carry = sum >> 8;
    }

    while carry != 0 {
        for a in acc.iter_mut().rev() {
            let sum = u16::from(*a) + carry;
            *a = sum as u8;
            carry = sum >> 8;

            if carry == 0 {
                break;
            }
        }
    }
}
