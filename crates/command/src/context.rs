use weft_primitives::ModelRoot;

/// Working state handed to a [`Command`](crate::Command).
///
/// Holds a private copy of the current root; nothing is visible to other
/// components until the stack swaps the finished copy in.
#[derive(Debug, Clone)]
pub struct CommandExecutionContext {
	root: ModelRoot,
	root_replaced: bool,
}

impl CommandExecutionContext {
	pub fn new(root: ModelRoot) -> Self {
		Self {
			root,
			root_replaced: false,
		}
	}

	pub fn root(&self) -> &ModelRoot {
		&self.root
	}

	pub fn root_mut(&mut self) -> &mut ModelRoot {
		&mut self.root
	}

	/// Swaps in a whole new root and marks the execution as model-root-changing.
	pub fn replace_root(&mut self, root: ModelRoot) {
		self.root = root;
		self.root_replaced = true;
	}

	/// Returns true once [`replace_root`](Self::replace_root) was called.
	pub fn model_root_changed(&self) -> bool {
		self.root_replaced
	}

	pub fn into_root(self) -> ModelRoot {
		self.root
	}
}
