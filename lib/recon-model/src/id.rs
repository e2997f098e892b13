use serde::{Deserialize, Serialize};

/// Sentinel byte leading every placeholder identifier. Real identifiers,
/// whether minted by the cloud or read back from an extended attribute,
/// never start with it, so membership in either domain is a cheap prefix
/// check rather than a lookup against a side table.
const PLACEHOLDER_SENTINEL: char = '\0';

/// An opaque, stable node identifier.
///
/// Two disjoint domains share this type: identifiers the cloud assigned
/// (`Id::real`), and identifiers the local walk mints before an `AddFile`/
/// `AddDir` is acknowledged by the cloud (`Id::placeholder`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id(String);

impl Id {
    pub fn real(id: impl ToString) -> Id {
        let id = id.to_string();
        debug_assert!(
            !id.starts_with(PLACEHOLDER_SENTINEL),
            "real id collides with placeholder sentinel: {id:?}"
        );
        Id(id)
    }

    pub fn placeholder(counter: u64) -> Id {
        Id(format!("{PLACEHOLDER_SENTINEL}{counter}"))
    }

    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(PLACEHOLDER_SENTINEL)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_placeholder() {
            write!(f, "<placeholder:{}>", &self.0[1..])
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Mints a fresh placeholder id on every call, in the order the local walk
/// discovers entries.
#[derive(Debug, Default)]
pub struct PlaceholderCounter(u64);
impl PlaceholderCounter {
    pub fn new() -> PlaceholderCounter {
        PlaceholderCounter(0)
    }
    pub fn next(&mut self) -> Id {
        self.0 += 1;
        Id::placeholder(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{Id, PlaceholderCounter};

    #[test]
    fn placeholder_and_real_are_disjoint() {
        let mut counter = PlaceholderCounter::new();
        let a = counter.next();
        let b = counter.next();
        assert_ne!(a, b);
        assert!(a.is_placeholder());
        assert!(b.is_placeholder());
        assert!(!Id::real("01AB2C").is_placeholder());
    }

    #[test]
    fn display_does_not_leak_sentinel() {
        let id = Id::placeholder(7);
        assert!(!id.to_string().contains('\0'));
    }
}
