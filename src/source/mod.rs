pub(crate) mod idx;
pub(crate) mod sprite;
