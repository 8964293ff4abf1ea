use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use parking_lot::Mutex;

/// Returned when the host does not need a request code for this operation.
pub const NOT_APPLICABLE_REQUEST_CODE: i32 = 0;
/// Returned when registration was refused.
pub const INVALID_REQUEST_CODE: i32 = -1;
/// Lowest code ever handed out.
pub const MIN_REQUEST_CODE: i32 = 1;

struct Registration<H: ?Sized> {
    handler: Arc<H>,
    part_of_block: bool,
}

/// Maps small integer request codes to handlers so that host callbacks carrying
/// a code can be routed back to whoever started the operation.
///
/// Every method takes the lock exactly once. Handlers are compared by identity
/// (`Arc::ptr_eq`), never by value.
pub struct ResultHandlerRegistry<H: ?Sized> {
    entries: Mutex<BTreeMap<i32, Registration<H>>>,
}

impl<H: ?Sized> ResultHandlerRegistry<H> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Assigns the lowest free code, scanning upward from [`MIN_REQUEST_CODE`] and
    /// wrapping back to it on overflow.
    ///
    /// Returns [`INVALID_REQUEST_CODE`] only if every positive code is taken.
    pub fn register(&self, handler: &Arc<H>) -> i32 {
        let mut entries = self.entries.lock();
        if entries.len() >= i32::MAX as usize {
            return INVALID_REQUEST_CODE;
        }

        let mut code = MIN_REQUEST_CODE;
        while entries.contains_key(&code) {
            code = code.checked_add(1).unwrap_or(MIN_REQUEST_CODE);
        }

        entries.insert(
            code,
            Registration {
                handler: Arc::clone(handler),
                part_of_block: false,
            },
        );
        code
    }

    /// Assigns `count` contiguous codes to one handler and returns the first.
    ///
    /// The block starts at [`MIN_REQUEST_CODE`] when nothing is registered, otherwise
    /// right after the highest active code; gaps below it are not reused.
    /// Returns [`INVALID_REQUEST_CODE`] for `count < 1` or if the block would run past `i32::MAX`.
    pub fn register_block(&self, handler: &Arc<H>, count: i32) -> i32 {
        if count < 1 {
            return INVALID_REQUEST_CODE;
        }

        let mut entries = self.entries.lock();
        let max_active = entries.last_key_value().map(|(&code, _)| code);
        let Some(block) = block_range(max_active, count) else {
            return INVALID_REQUEST_CODE;
        };

        let start = *block.start();
        for code in block {
            entries.insert(
                code,
                Registration {
                    handler: Arc::clone(handler),
                    part_of_block: true,
                },
            );
        }
        start
    }

    /// Removes every code mapped to this exact handler and returns them ascending,
    /// so callers can release side tables keyed by the same codes.
    pub fn unregister(&self, handler: &Arc<H>) -> Vec<i32> {
        let mut entries = self.entries.lock();
        let freed: Vec<i32> = entries
            .iter()
            .filter(|(_, reg)| Arc::ptr_eq(&reg.handler, handler))
            .map(|(&code, _)| code)
            .collect();

        for code in &freed {
            entries.remove(code);
        }
        freed
    }

    pub fn lookup(&self, code: i32) -> Option<Arc<H>> {
        self.entries
            .lock()
            .get(&code)
            .map(|reg| Arc::clone(&reg.handler))
    }

    /// True if `code` is active and was allocated as part of a contiguous block.
    pub fn is_block_code(&self, code: i32) -> bool {
        self.entries
            .lock()
            .get(&code)
            .is_some_and(|reg| reg.part_of_block)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Codes for a `count`-long block placed after `max_active`, or `None` if the
/// last code would not fit in an `i32`. `count` must be at least 1.
fn block_range(max_active: Option<i32>, count: i32) -> Option<RangeInclusive<i32>> {
    let start = match max_active {
        None => MIN_REQUEST_CODE,
        Some(max) => max.checked_add(1)?,
    };
    let end = start.checked_add(count - 1)?;
    Some(start..=end)
}

impl<H: ?Sized> Default for ResultHandlerRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized> std::fmt::Debug for ResultHandlerRegistry<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let codes: Vec<i32> = self.entries.lock().keys().copied().collect();
        f.debug_struct("ResultHandlerRegistry")
            .field("codes", &codes)
            .finish()
    }
}
