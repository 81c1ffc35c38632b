//! Constructor tables and constructor selection.
//!
//! Rust has no runtime constructor reflection, so a type that wants to be
//! built by the registry declares its constructors up front through
//! [`Injectable`]. Each [`Constructor`] lists its parameter types in the
//! order its builder closure consumes them. The registry then picks one
//! with [`select_constructor`] and feeds it the resolved [`Arguments`].
//!
//! # Examples
//! ```
//! use chauffeur_registry::constructor::{Arguments, Constructor, Injectable};
//!
//! #[derive(Default)]
//! struct Settings;
//!
//! struct Publisher {
//!     settings: Option<Settings>,
//! }
//!
//! impl Injectable for Publisher {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![
//!             Constructor::new("Publisher::new", |_| Publisher { settings: None }),
//!             Constructor::new("Publisher::with_settings", |args: &mut Arguments| Publisher {
//!                 settings: args.next::<Settings>(),
//!             })
//!             .param::<Settings>(),
//!         ]
//!     }
//! }
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use tracing::warn;

use crate::key::TypeKey;

/// A type-erased, freshly built value.
pub type Instance = Box<dyn Any>;

/// A type the registry can build by choosing one of its constructors.
pub trait Injectable: Sized + 'static {
    /// Every constructor the registry may choose from, in declaration order.
    fn constructors() -> Vec<Constructor<Self>>;
}

/// How a parameter is classified for constructor selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Resolved through the registry.
    Dependency,
    /// A textual literal the registry cannot synthesize.
    Text,
    /// A boolean literal the registry cannot synthesize.
    Flag,
}

impl ParamKind {
    /// Classifies a parameter type.
    ///
    /// `String`, `&'static str`, `Box<str>` and `Rc<str>` are [`ParamKind::Text`],
    /// `bool` is [`ParamKind::Flag`], everything else is a dependency.
    pub fn classify(type_id: TypeId) -> Self {
        if type_id == TypeId::of::<String>()
            || type_id == TypeId::of::<&'static str>()
            || type_id == TypeId::of::<Box<str>>()
            || type_id == TypeId::of::<Rc<str>>()
        {
            Self::Text
        } else if type_id == TypeId::of::<bool>() {
            Self::Flag
        } else {
            Self::Dependency
        }
    }

    /// Returns `true` for literal kinds that disqualify a constructor.
    #[inline]
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Text | Self::Flag)
    }
}

/// One declared constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    key: TypeKey,
    kind: ParamKind,
}

impl Param {
    /// Declares a parameter of type `P`.
    pub fn of<P: 'static>() -> Self {
        let key = TypeKey::of::<P>();
        Self {
            key,
            kind: ParamKind::classify(key.type_id()),
        }
    }

    /// The declared parameter type.
    #[inline]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// The parameter's selection class.
    #[inline]
    pub fn kind(&self) -> ParamKind {
        self.kind
    }
}

/// Resolved values for a constructor call, in parameter order.
///
/// A slot is `None` when the dependency was not registered or resolved
/// to nothing; constructors decide what an absent collaborator means.
pub struct Arguments {
    values: std::vec::IntoIter<Option<Instance>>,
    position: usize,
}

impl Arguments {
    /// Wraps already-resolved values, one slot per declared parameter.
    pub fn new(values: Vec<Option<Instance>>) -> Self {
        Self {
            values: values.into_iter(),
            position: 0,
        }
    }

    /// Takes the next argument as a `P`.
    ///
    /// Returns `None` for an absent dependency, when the arguments are
    /// exhausted, or when the value is not a `P`.
    pub fn next<P: 'static>(&mut self) -> Option<P> {
        let position = self.position;
        self.position += 1;

        let value = self.values.next().flatten()?;
        match value.downcast::<P>() {
            Ok(value) => Some(*value),
            Err(_) => {
                warn!(
                    position,
                    expected = std::any::type_name::<P>(),
                    "Constructor argument has an unexpected type, treating it as absent"
                );
                None
            }
        }
    }

    /// Takes the next argument, falling back to `P::default()` when absent.
    pub fn next_or_default<P: Default + 'static>(&mut self) -> P {
        self.next().unwrap_or_default()
    }

    /// Number of arguments not consumed yet.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

type MakeFn<T> = Rc<dyn Fn(&mut Arguments) -> T>;

/// A statically declared constructor of `T`.
pub struct Constructor<T> {
    label: &'static str,
    params: Vec<Param>,
    make: MakeFn<T>,
}

impl<T: 'static> Constructor<T> {
    /// Declares a constructor with no parameters yet.
    ///
    /// Add parameters with [`param`](Constructor::param) in the order
    /// `make` reads them from its [`Arguments`].
    pub fn new(label: &'static str, make: impl Fn(&mut Arguments) -> T + 'static) -> Self {
        Self {
            label,
            params: Vec::new(),
            make: Rc::new(make),
        }
    }

    /// Appends a parameter of type `P`.
    pub fn param<P: 'static>(mut self) -> Self {
        self.params.push(Param::of::<P>());
        self
    }

    /// The constructor's label, used in diagnostics.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Declared parameters, in call order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Calls the constructor with already-resolved arguments.
    pub fn invoke(&self, mut args: Arguments) -> T {
        (self.make)(&mut args)
    }

    pub(crate) fn erase(self) -> ErasedConstructor {
        let make = self.make;
        ErasedConstructor {
            label: self.label,
            params: self.params,
            make: Rc::new(move |args: &mut Arguments| Box::new(make(args)) as Instance),
        }
    }
}

impl<T> fmt::Debug for Constructor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("label", &self.label)
            .field("params", &self.params)
            .finish()
    }
}

/// A constructor stored inside a registration record.
pub(crate) struct ErasedConstructor {
    label: &'static str,
    params: Vec<Param>,
    make: MakeFn<Instance>,
}

impl ErasedConstructor {
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn invoke(&self, mut args: Arguments) -> Instance {
        (self.make)(&mut args)
    }
}

impl fmt::Debug for ErasedConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedConstructor")
            .field("label", &self.label)
            .field("params", &self.params)
            .finish()
    }
}

/// Picks the constructor to call from a list of parameter lists.
///
/// Candidates declaring any text or bool parameter are excluded. Among
/// the rest the one with the MOST parameters wins; on a tie the one
/// declared last wins. Returns `None` when nothing survives.
///
/// ```
/// use chauffeur_registry::constructor::{select_constructor, Param};
///
/// struct Output;
/// struct Settings;
///
/// let empty: Vec<Param> = vec![];
/// let rich = vec![Param::of::<Output>(), Param::of::<Settings>()];
/// let literal = vec![Param::of::<Output>(), Param::of::<Settings>(), Param::of::<String>()];
///
/// let picked = select_constructor([empty.as_slice(), rich.as_slice(), literal.as_slice()]);
/// assert_eq!(picked, Some(1));
/// ```
pub fn select_constructor<'a>(candidates: impl IntoIterator<Item = &'a [Param]>) -> Option<usize> {
    candidates
        .into_iter()
        .enumerate()
        .filter(|(_, params)| !params.iter().any(|p| p.kind().is_literal()))
        // max_by_key returns the last of equal maxima
        .max_by_key(|(_, params)| params.len())
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Output;
    struct Settings;

    fn params(list: &[Param]) -> Vec<Param> {
        list.to_vec()
    }

    #[test]
    fn classify_literal_kinds() {
        assert_eq!(Param::of::<String>().kind(), ParamKind::Text);
        assert_eq!(Param::of::<&'static str>().kind(), ParamKind::Text);
        assert_eq!(Param::of::<Box<str>>().kind(), ParamKind::Text);
        assert_eq!(Param::of::<Rc<str>>().kind(), ParamKind::Text);
        assert_eq!(Param::of::<bool>().kind(), ParamKind::Flag);
        assert_eq!(Param::of::<Output>().kind(), ParamKind::Dependency);
        assert_eq!(Param::of::<i64>().kind(), ParamKind::Dependency);
    }

    #[test]
    fn prefers_richest_usable_constructor() {
        let zero = params(&[]);
        let one = params(&[Param::of::<Output>()]);
        let two = params(&[Param::of::<Output>(), Param::of::<Settings>()]);

        let picked = select_constructor([zero.as_slice(), two.as_slice(), one.as_slice()]);
        assert_eq!(picked, Some(1));
    }

    // Pinned behavior: a text or bool parameter disqualifies the whole
    // constructor, even when it is the richest one.
    #[test]
    fn excludes_constructors_with_literal_parameters() {
        let one = params(&[Param::of::<Output>()]);
        let with_text = params(&[Param::of::<Output>(), Param::of::<String>()]);
        let with_flag =
            params(&[Param::of::<Output>(), Param::of::<Settings>(), Param::of::<bool>()]);

        let picked =
            select_constructor([with_text.as_slice(), one.as_slice(), with_flag.as_slice()]);
        assert_eq!(picked, Some(1));
    }

    // Pinned behavior: equal parameter counts resolve to the later declaration.
    #[test]
    fn ties_pick_last_declared() {
        let first = params(&[Param::of::<Output>()]);
        let second = params(&[Param::of::<Settings>()]);

        assert_eq!(select_constructor([first.as_slice(), second.as_slice()]), Some(1));
    }

    #[test]
    fn nothing_survives() {
        let with_text = params(&[Param::of::<String>()]);
        assert_eq!(select_constructor([with_text.as_slice()]), None);
        assert_eq!(select_constructor(std::iter::empty::<&[Param]>()), None);
    }

    #[test]
    fn arguments_yield_in_order_and_absent_as_none() {
        let mut args = Arguments::new(vec![
            Some(Box::new(7u32) as Instance),
            None,
            Some(Box::new("x".to_string()) as Instance),
        ]);

        assert_eq!(args.remaining(), 3);
        assert_eq!(args.next::<u32>(), Some(7));
        assert_eq!(args.next::<Output>().map(|_| ()), None);
        assert_eq!(args.next_or_default::<String>(), "x");
        assert_eq!(args.next::<u8>(), None);
    }

    #[test]
    fn mismatched_argument_is_absent() {
        let mut args = Arguments::new(vec![Some(Box::new(7u32) as Instance)]);
        assert_eq!(args.next::<i64>(), None);
    }

    #[test]
    fn constructor_invokes_with_arguments() {
        struct Pair(u32, Option<Settings>);

        let ctor = Constructor::new("Pair::new", |args: &mut Arguments| {
            Pair(args.next_or_default::<u32>(), args.next::<Settings>())
        })
        .param::<u32>()
        .param::<Settings>();

        assert_eq!(ctor.params().len(), 2);
        assert_eq!(ctor.label(), "Pair::new");

        let pair = ctor.invoke(Arguments::new(vec![Some(Box::new(3u32) as Instance), None]));
        assert_eq!(pair.0, 3);
        assert!(pair.1.is_none());
    }

    #[test]
    fn erased_constructor_boxes_the_value() {
        let ctor = Constructor::new("u8::answer", |_| 42u8).erase();
        let instance = ctor.invoke(Arguments::new(vec![]));
        assert_eq!(instance.downcast_ref::<u8>(), Some(&42));
    }
}
