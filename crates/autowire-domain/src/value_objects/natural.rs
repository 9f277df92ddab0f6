//! Natural ordering of service names
//!
//! Candidate lists in error messages and collected `Services(type)` arguments
//! are ordered case-insensitively with digit runs compared by value, so
//! `["Zebra", "apple", "Banana"]` becomes `["apple", "Banana", "Zebra"]` and
//! `cache2` sorts before `cache10`.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

/// Compare two strings in natural, case-insensitive order
///
/// Falls back to byte order when both sides are naturally equal so that the
/// ordering is total and deterministic.
pub fn compare(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        let (l, r) = match (left.peek(), right.peek()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => (*l, *r),
        };

        if l.is_ascii_digit() && r.is_ascii_digit() {
            let ln = take_digits(&mut left);
            let rn = take_digits(&mut right);
            let order = compare_digits(&ln, &rn);
            if order != Ordering::Equal {
                return order;
            }
            continue;
        }

        left.next();
        right.next();
        let order = l.to_lowercase().cmp(r.to_lowercase());
        if order != Ordering::Equal {
            return order;
        }
    }
}

/// Sort names in place in natural order
pub fn sort(names: &mut [String]) {
    names.sort_by(|a, b| compare(a, b));
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits
}

fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
