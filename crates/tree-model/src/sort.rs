//! Ordering helpers shared by search results and column sorting.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

/// Compare two display names the way a file browser does.
///
/// Runs of ASCII digits compare by numeric value (`tex2` < `tex10`), other
/// characters compare case-insensitively. Names that only differ in case or
/// leading zeros fall back to a plain byte comparison so the order is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => break,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let x_run = take_digits(&mut left);
                let y_run = take_digits(&mut right);
                let ord = compare_digit_runs(&x_run, &y_run);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                left.next();
                right.next();
                let ord = x.to_lowercase().cmp(y.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }

    a.cmp(b)
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trimmed = a.trim_start_matches('0');
    let b_trimmed = b.trim_start_matches('0');
    a_trimmed
        .len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
        .then_with(|| a.len().cmp(&b.len()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// A sortable column over items of type `T`.
pub trait Column<T> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// One entry of a multi-column sort: the first spec is the primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<C> {
    pub column: C,
    pub direction: SortDirection,
}

impl<C> SortSpec<C> {
    pub fn ascending(column: C) -> Self {
        Self {
            column,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: C) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
        }
    }
}

/// Compare two items by a list of columns, later columns breaking ties.
pub fn compare_by<T, C: Column<T>>(specs: &[SortSpec<C>], a: &T, b: &T) -> Ordering {
    specs.iter().fold(Ordering::Equal, |acc, spec| {
        acc.then_with(|| spec.direction.apply(spec.column.compare(a, b)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_cmp_numbers() {
        assert_eq!(natural_cmp("tex2.png", "tex10.png"), Ordering::Less);
        assert_eq!(natural_cmp("tex10.png", "tex9.png"), Ordering::Greater);
        assert_eq!(natural_cmp("a/1/b", "a/01/b"), Ordering::Less);
    }

    #[test]
    fn test_natural_cmp_case_insensitive() {
        assert_eq!(natural_cmp("Apple", "banana"), Ordering::Less);
        assert_eq!(natural_cmp("apple", "Banana"), Ordering::Less);
        // Total order: case-only differences still resolve
        assert_ne!(natural_cmp("abc", "ABC"), Ordering::Equal);
        assert_eq!(natural_cmp("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_natural_cmp_prefix() {
        assert_eq!(natural_cmp("tex", "tex1"), Ordering::Less);
        assert_eq!(natural_cmp("tex1", "tex"), Ordering::Greater);
    }

    #[test]
    fn test_sorting_with_natural_cmp() {
        let mut names = vec!["img12", "Img3", "img1", "b", "A"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["A", "b", "img1", "Img3", "img12"]);
    }

    enum Col {
        Len,
        Text,
    }

    impl Column<&str> for Col {
        fn compare(&self, a: &&str, b: &&str) -> Ordering {
            match self {
                Col::Len => a.len().cmp(&b.len()),
                Col::Text => a.cmp(b),
            }
        }
    }

    #[test]
    fn test_compare_by_multiple_columns() {
        let specs = [
            SortSpec::descending(Col::Len),
            SortSpec::ascending(Col::Text),
        ];
        let mut words = vec!["bb", "a", "aa", "ccc"];
        words.sort_by(|a, b| compare_by(&specs, a, b));
        assert_eq!(words, vec!["ccc", "aa", "bb", "a"]);
    }
}
