//! Iterates in parallel with rayon if the `parallel` feature is enabled, sequentially otherwise.
//! Both iterator kinds share the adapter names used in this crate (`enumerate`, `filter`, `map`, `collect`),
//! so callers are written once.

#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

pub trait MaybeParallelRefIterator<'a> {
    type Iter;

    fn maybe_par_iter(&'a self) -> Self::Iter;
}

#[cfg(feature = "parallel")]
impl<'a, T: Sync + 'a> MaybeParallelRefIterator<'a> for [T] {
    type Iter = rayon::slice::Iter<'a, T>;

    fn maybe_par_iter(&'a self) -> Self::Iter {
        self.par_iter()
    }
}

#[cfg(not(feature = "parallel"))]
impl<'a, T: 'a> MaybeParallelRefIterator<'a> for [T] {
    type Iter = std::slice::Iter<'a, T>;

    fn maybe_par_iter(&'a self) -> Self::Iter {
        self.iter()
    }
}
