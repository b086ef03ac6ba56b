pub(crate) mod bounce;
pub(crate) mod digit;
