//! Flag declarations.
//!
//! A [`Flag`] is declared once on a [`Command`](crate::Command) and shared by
//! reference ([`FlagRef`]) with every parsing context built for that command
//! or, when persistent, for its descendants. Setting a flag during parsing
//! mutates that shared instance, so the new value stays visible to the host
//! for the rest of the process.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::value::{BOOL_TYPE, BoolValue, IntValue, IpValue, StringValue, Value, ValueError};

/// Shared handle to a declared flag.
pub type FlagRef = Rc<Flag>;

/// A named option.
///
/// # Examples
///
/// ```
/// use argtree_core::Flag;
///
/// let thread = Flag::int("thread", 2)
///     .with_short('t')
///     .with_usage("specify the number of threads");
/// assert_eq!(thread.name(), "thread");
/// assert_eq!(thread.short(), Some('t'));
/// assert!(!thread.is_optional_value());
/// assert_eq!(thread.value_string(), "2");
///
/// let verbose = Flag::bool("verbose", false).persistent();
/// assert!(verbose.is_persistent());
/// assert!(verbose.is_optional_value());
/// ```
pub struct Flag {
    name: String,
    short: Option<char>,
    usage: String,
    persist: bool,
    value: RefCell<Box<dyn Value>>,
}

impl Flag {
    /// Declares a flag holding an arbitrary [`Value`].
    pub fn new(name: impl Into<String>, value: impl Value) -> Self {
        Self {
            name: name.into(),
            short: None,
            usage: String::new(),
            persist: false,
            value: RefCell::new(Box::new(value)),
        }
    }

    pub fn string(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self::new(name, StringValue::new(default))
    }

    pub fn int(name: impl Into<String>, default: i64) -> Self {
        Self::new(name, IntValue::new(default))
    }

    pub fn bool(name: impl Into<String>, default: bool) -> Self {
        Self::new(name, BoolValue::new(default))
    }

    /// Declares an IP flag. An unparsable `default` leaves the address unset.
    pub fn ip(name: impl Into<String>, default: &str) -> Self {
        Self::new(name, IpValue::parse_or_unset(default))
    }

    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    /// Makes the flag visible to every descendant of the declaring command.
    pub fn persistent(mut self) -> Self {
        self.persist = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short(&self) -> Option<char> {
        self.short
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn is_persistent(&self) -> bool {
        self.persist
    }

    /// True when the flag never needs an explicit argument token, which is
    /// exactly when its value is a boolean.
    pub fn is_optional_value(&self) -> bool {
        self.type_name() == BOOL_TYPE
    }

    pub fn type_name(&self) -> &'static str {
        self.value.borrow().type_name()
    }

    /// Borrows the held value.
    ///
    /// # Panics
    ///
    /// Panics if called while the value is being set, which only a
    /// re-entrant [`Value::set`] implementation could cause.
    pub fn value(&self) -> Ref<'_, dyn Value> {
        Ref::map(self.value.borrow(), |value| &**value)
    }

    /// Renders the current value as text.
    pub fn value_string(&self) -> String {
        self.value.borrow().to_string()
    }

    /// Sets the value from command-line text.
    pub fn set(&self, text: &str) -> Result<(), ValueError> {
        self.value.borrow_mut().set(text)
    }

    /// Reads the value as a concrete type, `None` on a type mismatch.
    pub(crate) fn downcast<T: Value, R>(&self, read: impl FnOnce(&T) -> R) -> Option<R> {
        self.value.borrow().as_any().downcast_ref::<T>().map(read)
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("name", &self.name)
            .field("short", &self.short)
            .field("persist", &self.persist)
            .field("value", &self.value.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_mutates_through_shared_handle() {
        let flag: FlagRef = Rc::new(Flag::int("count", 0));
        let other = Rc::clone(&flag);
        other.set("5").unwrap();
        assert_eq!(flag.value_string(), "5");
    }

    #[test]
    fn test_optional_value_follows_type() {
        assert!(Flag::bool("verbose", false).is_optional_value());
        assert!(!Flag::string("name", "").is_optional_value());
        assert!(!Flag::ip("address", "127.0.0.1").is_optional_value());
    }

    #[test]
    fn test_downcast_mismatch_is_none() {
        let flag = Flag::string("name", "x");
        assert_eq!(flag.downcast::<IntValue, _>(|v| v.get()), None);
        assert_eq!(
            flag.downcast::<StringValue, _>(|v| v.get().to_string()),
            Some("x".to_string())
        );
    }
}
