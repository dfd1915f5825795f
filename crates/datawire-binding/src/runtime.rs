//! Event Loop
//!
//! Components never set themselves up inside their constructor. Setup is
//! posted to an [`EventLoop`] as a zero-delay task and runs on a later
//! turn, after the host has finished initializing the model.
//!
//! The loop is single-threaded and owns nothing but a FIFO queue. Hosts
//! drive it explicitly with [`EventLoop::run_once`] or
//! [`EventLoop::run_until_idle`].
//!
//! ## Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use datawire_binding::runtime::EventLoop;
//!
//! let event_loop = EventLoop::new();
//! let ran = Rc::new(Cell::new(false));
//! let flag = Rc::clone(&ran);
//! event_loop.next_tick(move || {
//!     flag.set(true);
//!     Ok(())
//! });
//!
//! assert!(!ran.get());
//! assert_eq!(event_loop.run_until_idle().unwrap(), 1);
//! assert!(ran.get());
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::error::Result;

/// A deferred unit of work.
pub type Task = Box<dyn FnOnce() -> Result<()>>;

/// Single-threaded task queue.
///
/// Cloning shares the queue, so a task may post follow-up tasks.
#[derive(Clone, Default)]
pub struct EventLoop {
	queue: Rc<RefCell<VecDeque<Task>>>,
}

impl EventLoop {
	/// Creates an empty loop.
	pub fn new() -> Self {
		Self::default()
	}

	/// Posts `task` to run on a later turn.
	pub fn next_tick<F>(&self, task: F)
	where
		F: FnOnce() -> Result<()> + 'static,
	{
		self.queue.borrow_mut().push_back(Box::new(task));
	}

	/// Number of queued tasks.
	pub fn pending(&self) -> usize {
		self.queue.borrow().len()
	}

	/// Returns true if nothing is queued.
	pub fn is_idle(&self) -> bool {
		self.queue.borrow().is_empty()
	}

	/// Runs the oldest queued task. Returns `None` when the queue is empty.
	pub fn run_once(&self) -> Option<Result<()>> {
		// Pop before running so the task can post more work.
		let task = self.queue.borrow_mut().pop_front()?;
		Some(task())
	}

	/// Runs tasks until the queue is empty, including tasks posted along the
	/// way. Returns how many ran.
	///
	/// A failing task does not hold up the ones behind it: every failure is
	/// logged and the queue keeps draining.
	///
	/// # Errors
	///
	/// Returns the first task error once the queue is empty.
	pub fn run_until_idle(&self) -> Result<usize> {
		let mut ran = 0;
		let mut first_error = None;
		while let Some(result) = self.run_once() {
			ran += 1;
			if let Err(e) = result {
				tracing::warn!(error = %e, ran, "event loop task failed");
				if first_error.is_none() {
					first_error = Some(e);
				}
			}
		}
		match first_error {
			Some(e) => Err(e),
			None => Ok(ran),
		}
	}
}

impl fmt::Debug for EventLoop {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EventLoop")
			.field("pending", &self.pending())
			.finish()
	}
}
