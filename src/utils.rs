//!
//! Generally useful functions: hex formatting and the little-endian
//! coefficient codecs the byte layouts are built from.
//!

use std::io::Cursor;
// ---
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use hex::encode;

/// Formats the given bytes as a lowercase hex String and returns it.
pub fn to_hex(buffer: &[u8]) -> String {
    encode(buffer)
}

pub fn shorten(string: &str, max_len: usize) -> String {
    if string.len() <= max_len {
        string.to_string()
    } else {
        let mut res = String::new();
        let half = (max_len + 2) / 2;
        res.push_str(&string[..half]);
        res.push_str("..");
        res.push_str(&string[(string.len() - half)..]);
        res
    }
}

/// Appends each value as a 24-bit little-endian group. Values must already be
/// canonical residues in [0, 2^24).
pub fn write_u24_coeffs(out: &mut Vec<u8>, coeffs: &[i32]) {
    for &c in coeffs {
        let c = c as u32;
        out.push((c & 0xff) as u8);
        out.push(((c >> 8) & 0xff) as u8);
        out.push(((c >> 16) & 0xff) as u8);
    }
}

/// Reads `n` 24-bit little-endian groups from the front of `input`.
pub fn read_u24_coeffs(input: &[u8], n: usize) -> Vec<i32> {
    let mut res = Vec::with_capacity(n);
    for i in 0..n {
        let c = (input[i * 3] as u32)
            | ((input[i * 3 + 1] as u32) << 8)
            | ((input[i * 3 + 2] as u32) << 16);
        res.push(c as i32);
    }
    res
}

/// Appends each value as a signed 32-bit little-endian word.
pub fn write_i32_coeffs(out: &mut Vec<u8>, coeffs: &[i32]) {
    for &c in coeffs {
        out.write_i32::<LittleEndian>(c)
            .expect("writing to a Vec cannot fail");
    }
}

/// Reads `n` signed 32-bit little-endian words from the front of `input`.
pub fn read_i32_coeffs(input: &[u8], n: usize) -> Vec<i32> {
    let mut cursor = Cursor::new(input);
    let mut res = Vec::with_capacity(n);
    for _ in 0..n {
        res.push(
            cursor
                .read_i32::<LittleEndian>()
                .expect("caller checked the input length"),
        );
    }
    res
}
