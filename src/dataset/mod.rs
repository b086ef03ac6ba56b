pub(crate) mod writer;
pub(crate) mod yolo;
