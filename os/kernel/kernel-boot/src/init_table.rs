//! # Static Initialization
//!
//! An explicit, ordered table of zero-argument routines assembled at compile
//! time, run before the module bootstrap (constructors) and, if the boot
//! body ever returns, after it (destructors).
//!
//! ```rust
//! use kernel_boot::{InitFn, InitTable};
//!
//! fn bring_up_uart() {}
//! fn install_logger() {}
//!
//! static CONSTRUCTORS: [Option<InitFn>; 3] = [Some(bring_up_uart), None, Some(install_logger)];
//! static INIT: InitTable<'static> = InitTable::new(&CONSTRUCTORS, &[]);
//! INIT.run_constructors();
//! ```
//!
//! Routines report nothing back. A constructor that needs to signal failure
//! has to record it itself; at this layer a failing constructor looks exactly
//! like a succeeding one.

/// A static initialization or finalization routine.
pub type InitFn = fn();

/// Constructor and destructor routines, each run in ascending table order.
/// `None` entries are skipped.
#[derive(Debug, Copy, Clone)]
pub struct InitTable<'a> {
    constructors: &'a [Option<InitFn>],
    destructors: &'a [Option<InitFn>],
}

impl<'a> InitTable<'a> {
    pub const EMPTY: InitTable<'static> = InitTable::new(&[], &[]);

    #[must_use]
    pub const fn new(constructors: &'a [Option<InitFn>], destructors: &'a [Option<InitFn>]) -> Self {
        Self {
            constructors,
            destructors,
        }
    }

    /// Runs every constructor once, in table order.
    pub fn run_constructors(&self) {
        run_in_order(self.constructors);
    }

    /// Runs every destructor once, in table order.
    pub fn run_destructors(&self) {
        run_in_order(self.destructors);
    }
}

fn run_in_order(routines: &[Option<InitFn>]) {
    for routine in routines.iter().flatten() {
        routine();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    thread_local! {
        static TRACE: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
    }

    fn first() {
        TRACE.with(|t| t.borrow_mut().push("first"));
    }

    fn second() {
        TRACE.with(|t| t.borrow_mut().push("second"));
    }

    fn third() {
        TRACE.with(|t| t.borrow_mut().push("third"));
    }

    fn take_trace() -> Vec<&'static str> {
        TRACE.with(|t| t.borrow_mut().drain(..).collect())
    }

    #[test]
    fn constructors_run_in_ascending_order_skipping_empty_slots() {
        let constructors: [Option<InitFn>; 5] = [Some(first), None, Some(second), None, Some(third)];
        let table = InitTable::new(&constructors, &[]);
        table.run_constructors();
        assert_eq!(take_trace(), ["first", "second", "third"]);
    }

    #[test]
    fn destructors_are_separate_from_constructors() {
        let constructors: [Option<InitFn>; 1] = [Some(first)];
        let destructors: [Option<InitFn>; 2] = [Some(second), Some(third)];
        let table = InitTable::new(&constructors, &destructors);
        table.run_constructors();
        assert_eq!(take_trace(), ["first"]);
        table.run_destructors();
        assert_eq!(take_trace(), ["second", "third"]);
    }

    #[test]
    fn empty_table_runs_nothing() {
        InitTable::EMPTY.run_constructors();
        InitTable::EMPTY.run_destructors();
        assert!(take_trace().is_empty());
    }
}
