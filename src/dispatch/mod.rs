//! Closed-world dispatch from runtime element types to specialised routines.
//!
//! Resolution runs in two steps: the input element type selects a routine
//! family, the configured output type selects a routine within it. Only the
//! pairs a stage's author wires in exist; any other pair resolves to a
//! [`DispatchError`], which is an expected outcome rather than a bug.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::ElementType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("input element type {0} not supported")]
    UnsupportedInput(ElementType),

    #[error("output element type {output} not supported for input {input}")]
    UnsupportedOutput { input: ElementType, output: ElementType },
}

/// Routines sharing one input element type, keyed by output type
#[derive(Debug, Clone)]
pub struct RoutineFamily<F> {
    input: ElementType,
    routines: BTreeMap<ElementType, F>,
}

impl<F: Copy> RoutineFamily<F> {
    pub fn input(&self) -> ElementType {
        self.input
    }

    pub fn resolve(&self, output: ElementType) -> Result<F, DispatchError> {
        self.routines
            .get(&output)
            .copied()
            .ok_or(DispatchError::UnsupportedOutput {
                input: self.input,
                output,
            })
    }

    pub fn outputs(&self) -> impl Iterator<Item = ElementType> + '_ {
        self.routines.keys().copied()
    }
}

/// Finite `(input, output) -> routine` mapping, fixed once built
#[derive(Debug, Clone)]
pub struct DispatchTable<F> {
    families: BTreeMap<ElementType, RoutineFamily<F>>,
}

impl<F: Copy> DispatchTable<F> {
    pub fn builder() -> DispatchTableBuilder<F> {
        DispatchTableBuilder {
            families: BTreeMap::new(),
        }
    }

    /// First step: select the family for `input`
    pub fn family(&self, input: ElementType) -> Result<&RoutineFamily<F>, DispatchError> {
        self.families
            .get(&input)
            .ok_or(DispatchError::UnsupportedInput(input))
    }

    pub fn resolve(&self, input: ElementType, output: ElementType) -> Result<F, DispatchError> {
        self.family(input)?.resolve(output)
    }

    pub fn supports(&self, input: ElementType, output: ElementType) -> bool {
        self.resolve(input, output).is_ok()
    }

    /// Every wired `(input, output)` pair
    pub fn pairs(&self) -> Vec<(ElementType, ElementType)> {
        self.families
            .values()
            .flat_map(|family| family.outputs().map(move |output| (family.input, output)))
            .collect()
    }

    pub fn inputs(&self) -> impl Iterator<Item = ElementType> + '_ {
        self.families.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.families.values().map(|f| f.routines.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct DispatchTableBuilder<F> {
    families: BTreeMap<ElementType, RoutineFamily<F>>,
}

impl<F: Copy> DispatchTableBuilder<F> {
    pub fn route(mut self, input: ElementType, output: ElementType, routine: F) -> Self {
        self.families
            .entry(input)
            .or_insert_with(|| RoutineFamily {
                input,
                routines: BTreeMap::new(),
            })
            .routines
            .insert(output, routine);
        self
    }

    pub fn build(self) -> DispatchTable<F> {
        DispatchTable {
            families: self.families,
        }
    }
}

/// Declare a dispatch table by listing, per input primitive, the output
/// primitives a generic routine is instantiated for.
///
/// ```ignore
/// let table = dispatch_table!(Routine, transform; i16 => [i16, f32], f32 => [i16, f32]);
/// ```
#[macro_export]
macro_rules! dispatch_table {
    ($routine_ty:ty, $routine:ident; $($input:ty => [$($output:ty),+ $(,)?]),+ $(,)?) => {{
        let builder = $crate::dispatch::DispatchTable::<$routine_ty>::builder();
        $($(
            let builder = builder.route(
                <$input as $crate::core::Element>::TYPE,
                <$output as $crate::core::Element>::TYPE,
                $routine::<$input, $output>,
            );
        )+)+
        builder.build()
    }};
}
