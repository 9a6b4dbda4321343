/// The one unrecoverable per-file failure: a line whose depth points at an
/// ancestor that was never opened, leaving nothing to attach the node to.
#[derive(Debug)]
pub struct Error {
	/// 0-based index into the source lines.
	pub ln: usize,
	pub msg: anyhow::Error,
}
