/// Where a piece of output data came from.
///
/// Fallback data is placeholder content for display only. It must never be
/// mistaken for the account's real holdings, so every output carries the tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Sourced<T> {
    Live(T),
    Fallback(T),
}

impl<T> Sourced<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Sourced::Fallback(_))
    }

    pub fn value(&self) -> &T {
        match self {
            Sourced::Live(v) | Sourced::Fallback(v) => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Sourced::Live(v) | Sourced::Fallback(v) => v,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        match self {
            Sourced::Live(v) => Sourced::Live(f(v)),
            Sourced::Fallback(v) => Sourced::Fallback(f(v)),
        }
    }
}
