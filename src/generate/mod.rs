pub(crate) mod subset;
