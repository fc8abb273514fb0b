/*
    FluxFox
    https://github.com/dbalsom/fluxfox

    Copyright 2024 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------
*/

//! Small standalone helpers with no home in a data-model module: hex-dumping
//! byte slices for diagnostics, and a natural sort order for disk image
//! filenames. Checksum helpers live in [`crate::crc16`].

use regex::Regex;
use std::cmp::Ordering;
use std::io::{self, Write};
use std::path::PathBuf;

pub fn dump_slice<W: Write>(
    data_slice: &[u8],
    start_address: usize,
    bytes_per_row: usize,
    mut out: W,
) -> io::Result<()> {
    let rows = data_slice.len() / bytes_per_row;
    let last_row_size = data_slice.len() % bytes_per_row;

    // Print all full rows.
    for r in 0..rows {
        write!(out, "{:05X} | ", r * bytes_per_row + start_address)?;
        for b in 0..bytes_per_row {
            write!(out, "{:02X} ", data_slice[r * bytes_per_row + b])?;
        }
        write!(out, "| ")?;
        for b in 0..bytes_per_row {
            let byte = data_slice[r * bytes_per_row + b];
            write!(out, "{}", if (40..=126).contains(&byte) { byte as char } else { '.' })?;
        }
        writeln!(out)?;
    }

    // Print last incomplete row, if any bytes left over.
    if last_row_size > 0 {
        write!(out, "{:05X} | ", rows * bytes_per_row)?;
        for b in 0..bytes_per_row {
            if b < last_row_size {
                write!(out, "{:02X} ", data_slice[rows * bytes_per_row + b])?;
            }
            else {
                write!(out, "   ")?;
            }
        }
        write!(out, "| ")?;
        for b in 0..bytes_per_row {
            if b < last_row_size {
                let byte = data_slice[rows * bytes_per_row + b];
                write!(out, "{}", if (40..=126).contains(&byte) { byte as char } else { '.' })?;
            }
            else {
                write!(out, " ")?;
            }
        }
        writeln!(out)?;
    }

    Ok(())
}

pub fn dump_string(data_slice: &[u8]) -> String {
    let mut out = String::new();
    for &byte in data_slice {
        out.push(if (40..=126).contains(&byte) { byte as char } else { '.' });
    }
    out
}

/// Sort `PathBuf`s in a natural order, by breaking them down into numeric and non-numeric parts.
/// This function is used to sort directory names in a natural order, so that Disk11 is sorted after
/// Disk2, etc.
#[allow(clippy::ptr_arg)]
pub fn natural_sort(a: &PathBuf, b: &PathBuf) -> Ordering {
    let re = Regex::new(r"(\D+)|(\d+)").expect("Invalid regex");

    let a_str = a.iter().next().and_then(|s| s.to_str()).unwrap_or("");
    let b_str = b.iter().next().and_then(|s| s.to_str()).unwrap_or("");

    let a_parts = re.captures_iter(a_str);
    let b_parts = re.captures_iter(b_str);

    for (a_part, b_part) in a_parts.zip(b_parts) {
        // Handle non-numeric parts, converting to lowercase for case-insensitive comparison
        if let (Some(a_text), Some(b_text)) = (a_part.get(1), b_part.get(1)) {
            let ordering = a_text.as_str().to_lowercase().cmp(&b_text.as_str().to_lowercase());
            if ordering != Ordering::Equal {
                return ordering;
            }
            continue;
        }

        // Handle numeric parts
        let a_num = a_part.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
        let b_num = b_part.get(2).and_then(|m| m.as_str().parse::<u32>().ok());

        match (a_num, b_num) {
            (Some(a_num), Some(b_num)) => {
                let ordering = a_num.cmp(&b_num);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            // Fallback to lexicographic comparison if parsing fails
            _ => return a_str.to_lowercase().cmp(&b_str.to_lowercase()),
        }
    }

    // Fallback to comparing the full path if the directory names are identical
    a_str.to_lowercase().cmp(&b_str.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_natural_sort() {
        let mut paths = vec![
            PathBuf::from("Disk1"),
            PathBuf::from("disk10"),
            PathBuf::from("Disk2"),
            PathBuf::from("Disk3"),
            PathBuf::from("disk11"),
            PathBuf::from("Disk12"),
            PathBuf::from("Disk9"),
        ];

        paths.sort_by(natural_sort);

        let expected_order = vec![
            PathBuf::from("Disk1"),
            PathBuf::from("Disk2"),
            PathBuf::from("Disk3"),
            PathBuf::from("Disk9"),
            PathBuf::from("disk10"),
            PathBuf::from("disk11"),
            PathBuf::from("Disk12"),
        ];

        assert_eq!(paths, expected_order);
    }

    #[test]
    fn test_dump_slice_formats_partial_last_row() {
        let mut out = Vec::new();
        dump_slice(&[0x41, 0x42, 0x43], 0, 16, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("41 42 43"));
        assert!(text.contains("ABC"));
    }

    #[test]
    fn test_dump_string_replaces_nonprintable() {
        assert_eq!(dump_string(&[0x41, 0x00, 0x42]), "A.B");
    }
}
