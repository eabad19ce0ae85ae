// Copyright (c) 2025 knix
// All rights reserved.

//! Decoding values through their layout tables, and the inverse.

use log::trace;

use crate::dispatch::Runtime;
use crate::error::{ErrorKind, RttiResult};
use crate::heap::{WORD_BYTES, Word, word_to_float};
use crate::layout::{BuiltinKind, FunctorRep, LayoutView, SimpleVector, TypeFunctors};
use crate::names::Name;
use crate::typeinfo::TypeInfo;
use crate::{SV4, SV8, errf, failf};

/// A constructor application taken apart: its arguments paired with their
/// concrete types.
#[derive(Debug, Clone, PartialEq)]
pub struct Functor {
    pub name: Name,
    pub ordinal: u32,
    pub args: SV4<(TypeInfo, Word)>,
}

impl Functor {
    pub fn arity(&self) -> u32 {
        self.args.len() as u32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Functor(Functor),
    Int(i64),
    Character(char),
    Float(f64),
    String(String),
    Univ { type_info: TypeInfo, value: Word },
    Array { elem: TypeInfo, elems: Vec<Word> },
    TypeInfo(TypeInfo),
    /// Closure of a predicate or function type
    Predicate(Word),
    CPointer(Word),
    Void,
}

impl Decoded {
    pub fn expect_functor(&self) -> &Functor {
        match self {
            Decoded::Functor(f) => f,
            other => panic!("expect_functor called on: {:?}", other),
        }
    }
}

impl Runtime {
    fn arg_types(&self, ti: &TypeInfo, sv: &SimpleVector) -> RttiResult<SV4<TypeInfo>> {
        sv.arg_types
            .iter()
            .map(|pti| {
                pti.instantiate(ti.args()).ok_or_else(|| {
                    errf!(
                        ErrorKind::Decode,
                        "argument type {} of {} is not bound by {}",
                        self.table.pseudo_to_string(pti),
                        self.table.name(sv.name),
                        self.type_info_to_string(ti)
                    )
                })
            })
            .collect()
    }

    fn read_args(&self, ti: &TypeInfo, sv: &SimpleVector, addr: Word) -> RttiResult<Functor> {
        let arg_types = self.arg_types(ti, sv)?;
        let Some(words) = self.heap.slice(addr, arg_types.len()) else {
            return failf!(
                ErrorKind::Decode,
                "arguments of {} at {addr:#x} are not on the heap",
                self.table.name(sv.name)
            );
        };
        let args = arg_types.into_iter().zip(words.iter().copied()).collect();
        Ok(Functor { name: sv.name, ordinal: sv.ordinal, args })
    }

    /// Takes `value` apart according to the layout of `ti`.
    pub fn deconstruct(&self, ti: &TypeInfo, value: Word) -> RttiResult<Decoded> {
        if ti.is_higher_order() {
            return Ok(Decoded::Predicate(value));
        }
        let ti = self.table.expand_equivs(ti);
        let base = self.table.ctor(ti.expect_ctor());
        let bits = self.table.tag_bits();
        let tag = bits.tag(value);
        trace!("deconstruct {} tag {} value {:#x}", self.type_info_to_string(&ti), tag, value);

        match base.classify(tag) {
            LayoutView::Unassigned => {
                failf!(ErrorKind::Decode, "{value:#x} has unassigned tag {tag} for {}", self.type_info_to_string(&ti))
            }
            LayoutView::Const(ev) => {
                let index = if ev.is_enum { value } else { bits.unmkbody(value) };
                let Some(constant) = ev.get(index) else {
                    return failf!(
                        ErrorKind::Decode,
                        "{index} is not a constant of {}",
                        self.type_info_to_string(&ti)
                    );
                };
                Ok(Decoded::Functor(Functor {
                    name: constant.name,
                    ordinal: constant.ordinal,
                    args: SV4::new(),
                }))
            }
            LayoutView::Simple(sv) => Ok(Decoded::Functor(self.read_args(&ti, sv, bits.strip(value))?)),
            LayoutView::Complicated(view) => {
                let addr = bits.strip(value);
                // The secondary tag is read before anything else in the cell
                let Some(sectag) = self.heap.get(addr) else {
                    return failf!(ErrorKind::Decode, "no secondary tag at {addr:#x}");
                };
                let Some(sv) = view.get(sectag) else {
                    return failf!(
                        ErrorKind::Decode,
                        "secondary tag {sectag} out of range ({} sharers) for {}",
                        view.num_sharers(),
                        self.type_info_to_string(&ti)
                    );
                };
                Ok(Decoded::Functor(self.read_args(&ti, sv, addr + WORD_BYTES)?))
            }
            LayoutView::NoTag(sv) => {
                let arg_types = self.arg_types(&ti, sv)?;
                let args = arg_types.into_iter().map(|arg_ti| (arg_ti, value)).collect();
                Ok(Decoded::Functor(Functor { name: sv.name, ordinal: 0, args }))
            }
            LayoutView::Equiv(_) => {
                failf!(ErrorKind::Decode, "equivalence left after expansion of {}", self.type_info_to_string(&ti))
            }
            LayoutView::Builtin(kind) => self.deconstruct_builtin(&ti, kind, value),
        }
    }

    fn deconstruct_builtin(&self, ti: &TypeInfo, kind: BuiltinKind, value: Word) -> RttiResult<Decoded> {
        match kind {
            BuiltinKind::Int => Ok(Decoded::Int(value as i64)),
            BuiltinKind::Character => char::from_u32(value as u32)
                .map(Decoded::Character)
                .ok_or_else(|| errf!(ErrorKind::Decode, "{value:#x} is not a character")),
            BuiltinKind::Float => Ok(Decoded::Float(word_to_float(value))),
            BuiltinKind::String => self
                .heap
                .read_string(value)
                .map(Decoded::String)
                .ok_or_else(|| errf!(ErrorKind::Decode, "no string at {value:#x}")),
            BuiltinKind::Univ => {
                let univ = crate::univ::Univ::from_word(value);
                match (univ.type_info(self), univ.value(self)) {
                    (Some(type_info), Some(value)) => Ok(Decoded::Univ { type_info, value }),
                    _ => failf!(ErrorKind::Decode, "no univ at {value:#x}"),
                }
            }
            BuiltinKind::Array => {
                let Some(elem) = ti.args().first() else {
                    return failf!(ErrorKind::Decode, "array type info without element type");
                };
                let size = self.heap.get(value).ok_or_else(|| errf!(ErrorKind::Decode, "no array at {value:#x}"))?;
                let Some(elems) = self.heap.slice(value + WORD_BYTES, size as usize) else {
                    return failf!(ErrorKind::Decode, "array at {value:#x} runs off the heap");
                };
                Ok(Decoded::Array { elem: elem.clone(), elems: elems.to_vec() })
            }
            BuiltinKind::TypeInfo => TypeInfo::from_word(&self.table, &self.heap, value)
                .map(Decoded::TypeInfo)
                .ok_or_else(|| errf!(ErrorKind::Decode, "no type info at {value:#x}")),
            BuiltinKind::Predicate => Ok(Decoded::Predicate(value)),
            BuiltinKind::CPointer => Ok(Decoded::CPointer(value)),
            BuiltinKind::Void => Ok(Decoded::Void),
            BuiltinKind::Unassigned | BuiltinKind::Unused => {
                failf!(ErrorKind::Decode, "{} has no representation", self.type_info_to_string(ti))
            }
        }
    }

    /// Builds the value of constructor `ordinal` of `ti` from argument words.
    pub fn construct(&mut self, ti: &TypeInfo, ordinal: u32, args: &[Word]) -> RttiResult<Word> {
        let ti = self.table.expand_equivs(ti);
        let Some(ctor) = ti.as_ctor() else {
            return failf!(ErrorKind::Decode, "cannot construct a value of {}", self.type_info_to_string(&ti));
        };
        let bits = self.table.tag_bits();
        let base = self.table.ctor(ctor);
        let sv = match &base.functors {
            TypeFunctors::Enum(ev) => {
                if ordinal >= ev.num_functors() || !args.is_empty() {
                    return failf!(
                        ErrorKind::Decode,
                        "{} has no constant with ordinal {ordinal}",
                        self.type_info_to_string(&ti)
                    );
                }
                return Ok(ordinal as Word);
            }
            TypeFunctors::Du(_) | TypeFunctors::NoTag(_) => match base.functors.functor(ordinal) {
                Some(sv) => sv,
                None => {
                    return failf!(
                        ErrorKind::Decode,
                        "{} has no constructor with ordinal {ordinal}",
                        self.type_info_to_string(&ti)
                    );
                }
            },
            TypeFunctors::Equiv(_) | TypeFunctors::Special | TypeFunctors::Univ => {
                return failf!(ErrorKind::Decode, "cannot construct a value of {}", self.type_info_to_string(&ti));
            }
        };
        if sv.arity() as usize != args.len() {
            return failf!(
                ErrorKind::Decode,
                "{}/{} given {} arguments",
                self.table.name(sv.name),
                sv.arity(),
                args.len()
            );
        }
        let rep = sv.rep;
        let word = match rep {
            FunctorRep::Enum { value } => value as Word,
            FunctorRep::Const { tag, value } => bits.mkword(tag, bits.mkbody(value as Word)),
            FunctorRep::Unshared { tag } => {
                let addr = self.heap.alloc(args);
                bits.mkword(tag, addr)
            }
            FunctorRep::Shared { tag, sectag } => {
                let mut cell: SV8<Word> = SV8::with_capacity(args.len() + 1);
                cell.push(sectag as Word);
                cell.extend_from_slice(args);
                let addr = self.heap.alloc(&cell);
                bits.mkword(tag, addr)
            }
            FunctorRep::NoTag => args[0],
        };
        Ok(word)
    }

    /// [`Runtime::construct`] by constructor name and arity.
    pub fn construct_named(&mut self, ti: &TypeInfo, name: &str, args: &[Word]) -> RttiResult<Word> {
        let ordinal = self.functor_ordinal(ti, name, args.len() as u32)?;
        self.construct(ti, ordinal, args)
    }

    pub fn functor_ordinal(&self, ti: &TypeInfo, name: &str, arity: u32) -> RttiResult<u32> {
        let expanded = self.table.expand_equivs(ti);
        let not_found =
            || errf!(ErrorKind::Decode, "{} has no constructor {name}/{arity}", self.type_info_to_string(ti));
        let ctor = expanded.as_ctor().ok_or_else(not_found)?;
        let name = self.table.names.find(name).ok_or_else(not_found)?;
        let found = match &self.table.ctor(ctor).functors {
            TypeFunctors::Enum(ev) if arity == 0 => {
                ev.constants.iter().find(|c| c.name == name).map(|c| c.ordinal)
            }
            TypeFunctors::Du(functors) => {
                functors.iter().find(|sv| sv.name == name && sv.arity() == arity).map(|sv| sv.ordinal)
            }
            TypeFunctors::NoTag(sv) if sv.name == name && arity == 1 => Some(0),
            _ => None,
        };
        found.ok_or_else(not_found)
    }

    pub fn functor_name(&self, functor: &Functor) -> &str {
        self.table.name(functor.name)
    }
}
